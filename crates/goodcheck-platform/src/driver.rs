//! Packet filter driver control
//!
//! The shaper engine loads the WinDivert kernel driver. It outlives the
//! engine process, so it has to be stopped explicitly between strategies.

use tracing::{debug, trace};

/// Service name of the WinDivert driver
pub const DEFAULT_SERVICE: &str = "windivert";

/// Handle on the packet filter driver service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDriver {
    service: String,
}

impl FilterDriver {
    /// Driver with a custom service name
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Service name
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Stop the driver service; failures are logged only
    pub async fn release(&self) {
        trace!(service = %self.service, "Releasing filter driver");

        #[cfg(windows)]
        {
            let output = tokio::process::Command::new("sc")
                .args(["stop", self.service.as_str()])
                .output()
                .await;
            self.log_stop(output);
        }

        #[cfg(not(windows))]
        debug!("No filter driver on this platform");
    }

    /// Blocking variant of [`release`](Self::release), usable from `Drop`
    pub fn release_blocking(&self) {
        trace!(service = %self.service, "Releasing filter driver");

        #[cfg(windows)]
        {
            let output = std::process::Command::new("sc")
                .args(["stop", self.service.as_str()])
                .output();
            self.log_stop(output);
        }

        #[cfg(not(windows))]
        debug!("No filter driver on this platform");
    }

    #[cfg_attr(not(windows), allow(dead_code))]
    fn log_stop(&self, output: std::io::Result<std::process::Output>) {
        match output {
            Ok(o) if o.status.success() => debug!(service = %self.service, "Filter driver stopped"),
            Ok(o) => {
                let stdout = String::from_utf8_lossy(&o.stdout);
                // Service might not be running
                debug!(service = %self.service, output = %stdout.trim(), "sc stop returned non-zero");
            }
            Err(e) => debug!(service = %self.service, error = %e, "Failed to execute sc"),
        }
    }
}

impl Default for FilterDriver {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE)
    }
}
