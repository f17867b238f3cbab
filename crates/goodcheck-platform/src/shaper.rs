//! Process-backed shaper engine
//!
//! Runs the shaper executable (e.g. `winws.exe`) as a child process for the
//! lifetime of one strategy.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use goodcheck_core::{ShaperEngine, Strategy};
use tokio::process::{Child, Command};
use tracing::{debug, info, instrument, warn};

use crate::driver::FilterDriver;
use crate::error::{PlatformError, Result};

/// Default time a stopping shaper gets before it is force-killed
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(3);

/// Shaper engine running as a child process
#[derive(Debug)]
pub struct ProcessShaper {
    executable: PathBuf,
    stop_grace: Duration,
    driver: FilterDriver,
    child: Option<Child>,
}

impl ProcessShaper {
    /// Create a shaper for `executable`
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            stop_grace: DEFAULT_STOP_GRACE,
            driver: FilterDriver::default(),
            child: None,
        }
    }

    /// Set the grace period between the termination request and a force kill
    #[must_use]
    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    /// Use a specific packet filter driver service
    #[must_use]
    pub fn with_driver(mut self, driver: FilterDriver) -> Self {
        self.driver = driver;
        self
    }

    /// Shaper executable
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Process id of the running shaper
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Whether a shaper process is alive
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(None)) => true,
            Some(Ok(Some(_)) | Err(_)) | None => false,
        }
    }

    fn display_name(&self) -> String {
        self.executable.display().to_string()
    }

    fn spawn(&self, args: &[String]) -> Result<Child> {
        let mut command = Command::new(&self.executable);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        #[cfg(windows)]
        command.creation_flags(winapi::um::winbase::CREATE_NEW_CONSOLE);

        command
            .spawn()
            .map_err(|source| PlatformError::spawn(self.display_name(), source))
    }

    async fn launch(&mut self, strategy: &Strategy) -> Result<()> {
        if self.child.is_some() {
            warn!("Previous shaper still registered, stopping it first");
            self.shutdown().await?;
        }

        let args = strategy
            .arguments()
            .map_err(|e| PlatformError::Arguments(e.to_string()))?;
        let mut child = self.spawn(&args)?;

        if let Some(status) = child.try_wait()? {
            return Err(PlatformError::EngineExited {
                executable: self.display_name(),
                status: status.to_string(),
            });
        }

        info!(
            strategy = strategy.index,
            pid = child.id(),
            executable = %self.executable.display(),
            "Shaper launched"
        );
        self.child = Some(child);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        #[cfg(windows)]
        self.kill_image().await;

        let result = match self.child.take() {
            Some(child) => terminate(child, self.stop_grace).await,
            None => Ok(()),
        };

        self.driver.release().await;
        result
    }

    /// `taskkill` the whole image tree, catching engines that re-spawned
    #[cfg(windows)]
    async fn kill_image(&self) {
        let Some(image) = self.executable.file_name() else {
            return;
        };
        let output = Command::new("taskkill")
            .args(["/F", "/T", "/IM"])
            .arg(image)
            .stdin(Stdio::null())
            .output()
            .await;
        log_taskkill(image, output);
    }

    /// Blocking variant of [`kill_image`](Self::kill_image) for `abort`
    #[cfg(windows)]
    fn kill_image_blocking(&self) {
        let Some(image) = self.executable.file_name() else {
            return;
        };
        let output = std::process::Command::new("taskkill")
            .args(["/F", "/T", "/IM"])
            .arg(image)
            .stdin(Stdio::null())
            .output();
        log_taskkill(image, output);
    }
}

#[cfg(windows)]
fn log_taskkill(image: &std::ffi::OsStr, output: std::io::Result<std::process::Output>) {
    match output {
        Ok(o) if o.status.success() => debug!(image = ?image, "taskkill succeeded"),
        Ok(o) => debug!(image = ?image, status = %o.status, "taskkill found nothing to kill"),
        Err(e) => warn!(error = %e, "Failed to execute taskkill"),
    }
}

#[async_trait]
impl ShaperEngine for ProcessShaper {
    #[instrument(skip_all, fields(strategy = strategy.index))]
    async fn start(&mut self, strategy: &Strategy) -> goodcheck_core::Result<()> {
        self.launch(strategy).await.map_err(Into::into)
    }

    #[instrument(skip_all)]
    async fn stop(&mut self) -> goodcheck_core::Result<()> {
        self.shutdown().await.map_err(Into::into)
    }

    fn abort(&mut self) {
        if let Some(mut child) = self.child.take() {
            match child.start_kill() {
                Ok(()) => debug!(pid = child.id(), "Shaper killed"),
                Err(e) => warn!(error = %e, "Failed to kill shaper"),
            }
        }

        #[cfg(windows)]
        self.kill_image_blocking();

        self.driver.release_blocking();
    }
}

impl Drop for ProcessShaper {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.abort();
        }
    }
}

/// Ask the child to exit, wait up to `grace`, then force-kill it
async fn terminate(mut child: Child, grace: Duration) -> Result<()> {
    if let Ok(Some(status)) = child.try_wait() {
        debug!(%status, "Shaper had already exited");
        return Ok(());
    }

    request_exit(&mut child);

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(Ok(status)) => {
            debug!(%status, "Shaper exited");
            return Ok(());
        }
        Ok(Err(e)) => warn!(error = %e, "Failed to wait for shaper"),
        Err(_) => warn!(grace_ms = grace.as_millis(), "Shaper did not exit in time, killing"),
    }

    child.kill().await.map_err(PlatformError::Kill)
}

/// Send SIGTERM; a failed delivery leaves the force kill to the grace timeout
#[cfg(unix)]
fn request_exit(child: &mut Child) {
    let Some(pid) = child.id() else {
        return;
    };
    let Ok(raw) = libc::pid_t::try_from(pid) else {
        warn!(pid, "Shaper pid out of range for SIGTERM");
        return;
    };
    // SAFETY: plain syscall on a pid owned by `child`, which has not been reaped yet
    if unsafe { libc::kill(raw, libc::SIGTERM) } == 0 {
        debug!(pid, "Sent SIGTERM to shaper");
    } else {
        let e = std::io::Error::last_os_error();
        debug!(pid, error = %e, "SIGTERM delivery failed");
    }
}

#[cfg(not(unix))]
fn request_exit(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "Shaper already gone");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_stop_without_start() {
        let mut shaper = ProcessShaper::new("sleep");
        assert!(shaper.stop().await.is_ok());
        assert!(!shaper.is_running());
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let mut shaper = ProcessShaper::new("sleep").with_stop_grace(Duration::from_secs(2));
        shaper.start(&Strategy::new(1, "30")).await.unwrap();
        assert!(shaper.is_running());
        assert!(shaper.pid().is_some());

        let started = Instant::now();
        shaper.stop().await.unwrap();
        assert!(!shaper.is_running());
        assert!(shaper.pid().is_none());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_missing_executable_fails() {
        let mut shaper = ProcessShaper::new("/nonexistent/winws");
        let err = shaper.start(&Strategy::new(1, "--wf-tcp=443")).await.unwrap_err();
        assert!(matches!(err, goodcheck_core::Error::Shaper { .. }));
        assert!(err.to_string().contains("/nonexistent/winws"));
    }

    #[tokio::test]
    async fn test_unbalanced_arguments_fail() {
        let mut shaper = ProcessShaper::new("sleep");
        let err = shaper.start(&Strategy::new(1, "\"30")).await.unwrap_err();
        assert!(err.to_string().contains("Invalid shaper arguments"));
        assert!(!shaper.is_running());
    }

    #[tokio::test]
    async fn test_term_ignored_falls_back_to_kill() {
        let mut shaper = ProcessShaper::new("sh").with_stop_grace(Duration::from_millis(200));
        shaper
            .start(&Strategy::new(1, "-c \"trap '' TERM; while :; do sleep 1; done\""))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let started = Instant::now();
        shaper.stop().await.unwrap();
        assert!(!shaper.is_running());
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_stop_delivers_sigterm_before_kill() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("terminated");
        let script = format!(
            "-c \"trap 'touch {}; exit 0' TERM; while :; do sleep 1; done\"",
            marker.display()
        );

        let mut shaper = ProcessShaper::new("/bin/sh").with_stop_grace(Duration::from_secs(5));
        shaper.start(&Strategy::new(1, script)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        shaper.stop().await.unwrap();
        assert!(marker.exists(), "shaper was killed without a graceful SIGTERM");
    }

    #[tokio::test]
    async fn test_abort_clears_child() {
        let mut shaper = ProcessShaper::new("sleep");
        shaper.start(&Strategy::new(1, "30")).await.unwrap();
        shaper.abort();
        assert!(shaper.pid().is_none());
        assert!(!shaper.is_running());
    }

    #[tokio::test]
    async fn test_restart_replaces_previous() {
        let mut shaper = ProcessShaper::new("sleep").with_stop_grace(Duration::from_secs(1));
        shaper.start(&Strategy::new(1, "30")).await.unwrap();
        let first = shaper.pid();
        shaper.start(&Strategy::new(2, "30")).await.unwrap();
        assert_ne!(shaper.pid(), first);
        shaper.stop().await.unwrap();
    }
}
