//! HTTP probes and their outcome taxonomy
//!
//! A probe is one HTTP request issued through an external tool while a
//! strategy is active. [`ProbeSuite`] runs the fixed [`PROBE_CASES`] matrix
//! once per pass.

mod cache;
mod classify;
mod runner;
mod suite;

pub use cache::CacheBuster;
pub use classify::{classify, OK_THRESHOLD_BYTES, TIMEOUT_EXIT_CODE};
pub use runner::{parse_trailer, CurlProbe, Preflight, Trailer, WRITE_OUT};
pub use suite::ProbeSuite;

use async_trait::async_trait;
use std::fmt;

/// One entry of the fixed probe matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeCase {
    /// Case identifier, e.g. `CF-01`
    pub id: &'static str,
    /// CDN provider name
    pub provider: &'static str,
    /// Target URL
    pub url: &'static str,
    /// Number of attempts per pass
    pub repeat: u32,
}

impl ProbeCase {
    const fn new(id: &'static str, provider: &'static str, url: &'static str, repeat: u32) -> Self {
        Self {
            id,
            provider,
            url,
            repeat,
        }
    }

    /// Attempts per pass, never less than one
    pub fn attempts(&self) -> u32 {
        self.repeat.max(1)
    }
}

/// The fixed probe matrix
pub const PROBE_CASES: [ProbeCase; 12] = [
    ProbeCase::new("CF-01", "Cloudflare", "https://speed.cloudflare.com/__down?bytes=65536", 1),
    ProbeCase::new("CF-02", "Cloudflare", "https://www.cloudflare.com/cdn-cgi/trace", 1),
    ProbeCase::new("HZ-01", "Hetzner", "https://mirror.hetzner.com/100MB.bin", 1),
    ProbeCase::new("OVH-01", "OVH", "https://proof.ovh.net/files/1Mb.dat", 1),
    ProbeCase::new("OVH-02", "OVH", "https://ovh.sfx.ovh/10M.bin", 1),
    ProbeCase::new("OR-01", "Oracle", "https://oracle.sfx.ovh/10M.bin", 1),
    ProbeCase::new("AWS-01", "AWS", "https://tms.delta.com/delta/dl_anderson/Bootstrap.js", 1),
    ProbeCase::new(
        "AWS-02",
        "AWS",
        "https://corp.kaltura.com/wp-content/cache/min/1/wp-content/themes/airfleet/dist/styles/theme.css",
        1,
    ),
    ProbeCase::new(
        "FST-01",
        "Fastly",
        "https://www.juniper.net/content/dam/www/assets/images/diy/DIY_th.jpg/jcr:content/renditions/600x600.jpeg",
        1,
    ),
    ProbeCase::new(
        "FST-02",
        "Fastly",
        "https://www.graco.com/etc.clientlibs/clientlib-site/resources/fonts/lato/Lato-Regular.woff2",
        1,
    ),
    ProbeCase::new("AKM-01", "Akamai", "https://www.lg.com/lg5-common-gp/library/jquery.min.js", 1),
    ProbeCase::new(
        "AKM-02",
        "Akamai",
        "https://media-assets.stryker.com/is/image/stryker/gateway_1?$max_width_1410$",
        1,
    ),
];

/// Classified probe result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeStatus {
    /// Full range downloaded
    Ok,
    /// Completed but short
    Warn,
    /// Timed out
    Detected,
    /// Any other failure
    Fail,
}

impl ProbeStatus {
    /// Upper-case label used in reports
    pub fn label(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warn => "WARN",
            Self::Detected => "DETECTED",
            Self::Fail => "FAIL",
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of a single probe invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Classified status
    pub status: ProbeStatus,
    /// Human-readable status text
    pub status_text: String,
    /// Bytes received
    pub bytes_downloaded: u64,
    /// HTTP status code as reported by the tool (`000` when none)
    pub http_code: String,
    /// Remote address (`unknown` when none)
    pub remote_ip: String,
    /// Error reported by the tool, or `none`
    pub error_message: String,
}

impl ProbeOutcome {
    /// Outcome for a probe that could not be run at all
    pub fn failed(error_message: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Fail,
            status_text: classify::FAIL_TEXT.to_string(),
            bytes_downloaded: 0,
            http_code: runner::DEFAULT_HTTP_CODE.to_string(),
            remote_ip: runner::DEFAULT_REMOTE_IP.to_string(),
            error_message: error_message.into(),
        }
    }
}

/// Executes single probes against a URL
///
/// Implementations must never fail: every problem is folded into a
/// [`ProbeStatus::Fail`] outcome.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProbeExecutor: Send + Sync {
    /// Run one probe against `url`
    async fn execute(&self, url: &str) -> ProbeOutcome;
}

/// Per-status tallies of one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// `OK` outcomes
    pub ok: u32,
    /// `WARN` outcomes
    pub warn: u32,
    /// `DETECTED` outcomes
    pub detected: u32,
    /// `FAIL` outcomes
    pub fail: u32,
}

impl Summary {
    /// Count one outcome
    pub fn record(&mut self, status: ProbeStatus) {
        match status {
            ProbeStatus::Ok => self.ok += 1,
            ProbeStatus::Warn => self.warn += 1,
            ProbeStatus::Detected => self.detected += 1,
            ProbeStatus::Fail => self.fail += 1,
        }
    }

    /// Total outcomes counted
    pub fn total(&self) -> u32 {
        self.ok + self.warn + self.detected + self.fail
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OK:{}, Warn:{}, Detected:{}, Fail:{}",
            self.ok, self.warn, self.detected, self.fail
        )
    }
}

/// One probe invocation within a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// The case probed
    pub case: ProbeCase,
    /// Attempt number, starting at 1
    pub attempt: u32,
    /// Attempts for this case in the pass
    pub repeats: u32,
    /// Classified result
    pub outcome: ProbeOutcome,
}

/// Result of one pass over the probe matrix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassResult {
    /// Status tallies
    pub summary: Summary,
    /// Individual probes in submission order
    pub reports: Vec<ProbeReport>,
}

impl PassResult {
    /// Number of `OK` outcomes
    pub fn score(&self) -> u32 {
        self.summary.ok
    }
}

/// Total probe invocations per pass for a case table
pub fn total_checks(cases: &[ProbeCase]) -> u32 {
    cases.iter().map(ProbeCase::attempts).sum()
}
