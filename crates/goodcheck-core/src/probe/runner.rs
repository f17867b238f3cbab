//! curl-backed probe executor

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace, warn};

use super::classify::{classify, OK_THRESHOLD_BYTES};
use super::{ProbeExecutor, ProbeOutcome};

/// `--write-out` template producing the machine-readable trailer
pub const WRITE_OUT: &str = "HTTP_CODE=%{http_code};SIZE=%{size_download};IP=%{remote_ip};ERR=%{errormsg}";

pub(crate) const DEFAULT_HTTP_CODE: &str = "000";
pub(crate) const DEFAULT_REMOTE_IP: &str = "unknown";

const INSECURE: &str = "--insecure";

fn null_device() -> &'static str {
    if cfg!(windows) {
        "NUL"
    } else {
        "/dev/null"
    }
}

/// Fields parsed from the probe tool's output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trailer {
    /// HTTP status code
    pub http_code: String,
    /// Downloaded byte count
    pub bytes_downloaded: u64,
    /// Remote IP address
    pub remote_ip: String,
    /// Tool-reported error, or the first non-trailer output line
    pub error_message: String,
}

impl Default for Trailer {
    fn default() -> Self {
        Self {
            http_code: DEFAULT_HTTP_CODE.to_string(),
            bytes_downloaded: 0,
            remote_ip: DEFAULT_REMOTE_IP.to_string(),
            error_message: String::new(),
        }
    }
}

/// Parse the `HTTP_CODE=..;SIZE=..;IP=..;ERR=..` trailer out of tool output.
///
/// Missing or empty fields keep their defaults. When `ERR` is empty the first
/// non-trailer line (usually curl's `--show-error` text) is used instead.
pub fn parse_trailer(output: &str) -> Trailer {
    let mut meta = None;
    let mut first_other = None;

    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.contains("HTTP_CODE=") {
            meta = Some(line);
        } else if first_other.is_none() {
            first_other = Some(line);
        }
    }

    let mut trailer = Trailer::default();
    if let Some(meta) = meta {
        for chunk in meta.split(';') {
            let (key, value) = chunk.split_once('=').unwrap_or((chunk, ""));
            let value = value.trim();
            match key.trim().to_ascii_uppercase().as_str() {
                "HTTP_CODE" if !value.is_empty() => trailer.http_code = value.to_string(),
                "SIZE" => {
                    trailer.bytes_downloaded = value
                        .split('.')
                        .next()
                        .and_then(|whole| whole.parse().ok())
                        .unwrap_or(0);
                }
                "IP" if !value.is_empty() => trailer.remote_ip = value.to_string(),
                "ERR" => trailer.error_message = value.to_string(),
                _ => {}
            }
        }
    }

    if trailer.error_message.is_empty() {
        if let Some(line) = first_other {
            trailer.error_message = line.to_string();
        }
    }

    trailer
}

/// Result of the connectivity check run before evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preflight {
    /// The check URL was reachable as-is
    Reachable,
    /// Reachable only with certificate verification disabled
    RequiresInsecure,
    /// Not reachable; probes will likely report DETECTED/FAIL
    Unreachable,
}

/// Runs probes through an external curl executable
#[derive(Debug, Clone)]
pub struct CurlProbe {
    executable: PathBuf,
    extra_args: Vec<String>,
    timeout_secs: u64,
}

impl CurlProbe {
    /// Create a probe runner
    pub fn new(executable: impl Into<PathBuf>, extra_args: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            executable: executable.into(),
            extra_args,
            timeout_secs: timeout_secs.max(1),
        }
    }

    /// Path of the probe executable
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Extra arguments placed before the fixed flag set
    pub fn extra_args(&self) -> &[String] {
        &self.extra_args
    }

    /// Per-probe timeout in seconds
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Add `--insecure` to the extra arguments unless already present
    pub fn allow_insecure(&mut self) {
        if !self.extra_args.iter().any(|a| a == INSECURE) {
            self.extra_args.push(INSECURE.to_string());
        }
    }

    /// Full argument list for one probe against `url`
    pub fn command_args(&self, url: &str) -> Vec<String> {
        let timeout = self.timeout_secs.to_string();
        let range = format!("0-{}", OK_THRESHOLD_BYTES - 1);

        let mut args = self.extra_args.clone();
        args.extend(
            [
                "--silent",
                "--show-error",
                "--no-progress-meter",
                "--max-time",
                timeout.as_str(),
                "--connect-timeout",
                timeout.as_str(),
                "--range",
                range.as_str(),
                "--output",
                null_device(),
                "--write-out",
                WRITE_OUT,
                url,
            ]
            .map(String::from),
        );
        args
    }

    /// Check general connectivity, retrying with `--insecure` on failure
    pub async fn preflight(&self, url: &str, timeout_secs: u64) -> Preflight {
        if self.fetch_quiet(url, timeout_secs, false).await {
            return Preflight::Reachable;
        }

        warn!(url, "Pre-flight check failed, retrying with --insecure");
        if self.fetch_quiet(url, timeout_secs, true).await {
            Preflight::RequiresInsecure
        } else {
            Preflight::Unreachable
        }
    }

    async fn fetch_quiet(&self, url: &str, timeout_secs: u64, insecure: bool) -> bool {
        let timeout = timeout_secs.max(1).to_string();
        let mut command = Command::new(&self.executable);
        command.args(&self.extra_args);
        if insecure {
            command.arg(INSECURE);
        }
        command
            .args(["--silent", "--show-error", "--max-time", timeout.as_str(), "--output"])
            .arg(null_device())
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match command.status().await {
            Ok(status) => status.success(),
            Err(e) => {
                debug!(error = %e, "Failed to run pre-flight probe");
                false
            }
        }
    }
}

#[async_trait]
impl ProbeExecutor for CurlProbe {
    async fn execute(&self, url: &str) -> ProbeOutcome {
        let output = Command::new(&self.executable)
            .args(self.command_args(url))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                warn!(executable = %self.executable.display(), error = %e, "Failed to start probe");
                return ProbeOutcome::failed(format!(
                    "failed to start {}: {e}",
                    self.executable.display()
                ));
            }
        };

        let combined = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let trailer = parse_trailer(&combined);
        let exit_code = output.status.code().unwrap_or(-1);
        trace!(url, exit_code, ?trailer, "Probe finished");

        classify(
            exit_code,
            &trailer.http_code,
            trailer.bytes_downloaded,
            &trailer.remote_ip,
            &trailer.error_message,
        )
    }
}
