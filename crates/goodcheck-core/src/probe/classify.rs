//! Probe outcome classification

use super::{ProbeOutcome, ProbeStatus};

/// Bytes that must arrive for a probe to count as undetected
pub const OK_THRESHOLD_BYTES: u64 = 65536;

/// curl's "operation timed out" exit code
pub const TIMEOUT_EXIT_CODE: i32 = 28;

pub(crate) const FAIL_TEXT: &str = "Failed to complete";

/// Classify a finished probe.
///
/// Pure and total over its inputs. `exit_code` is `-1` when the tool was
/// terminated without one. An empty `error_message` is reported as `none`,
/// except for failures, which fall back to `exit <code>`.
pub fn classify(
    exit_code: i32,
    http_code: &str,
    bytes_downloaded: u64,
    remote_ip: &str,
    error_message: &str,
) -> ProbeOutcome {
    let mut error_message = error_message.to_string();

    let (status, status_text) = match exit_code {
        0 if bytes_downloaded >= OK_THRESHOLD_BYTES => (ProbeStatus::Ok, "Not detected"),
        0 => (ProbeStatus::Warn, "Possibly detected"),
        TIMEOUT_EXIT_CODE if http_code == "000" => {
            (ProbeStatus::Detected, "Detected (timeout without HTTP)")
        }
        TIMEOUT_EXIT_CODE => (ProbeStatus::Detected, "Detected"),
        code => {
            if error_message.is_empty() {
                error_message = format!("exit {code}");
            }
            (ProbeStatus::Fail, FAIL_TEXT)
        }
    };

    if error_message.is_empty() {
        error_message = "none".to_string();
    }

    ProbeOutcome {
        status,
        status_text: status_text.to_string(),
        bytes_downloaded,
        http_code: http_code.to_string(),
        remote_ip: remote_ip.to_string(),
        error_message,
    }
}
