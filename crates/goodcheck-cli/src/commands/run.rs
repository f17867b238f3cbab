//! Run command - evaluate every strategy of a strategy file

use anyhow::{bail, Context, Result};
use clap::Args;
use goodcheck_core::probe::Preflight;
use goodcheck_core::{Config, CurlProbe, Evaluator, ProbeSuite, StrategyLoader};
use goodcheck_platform::ProcessShaper;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::report::{self, ConsoleReporter};

/// Run command arguments
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Shaper engine executable (e.g. winws.exe)
    #[arg(long, value_name = "EXE")]
    pub shaper: PathBuf,

    /// Strategy file
    #[arg(short = 's', long, value_name = "FILE")]
    pub strategies: PathBuf,

    /// Probe executable (default: curl from config)
    #[arg(long, value_name = "EXE")]
    pub probe: Option<PathBuf>,

    /// Passes per strategy (1-9)
    #[arg(short = 'p', long, value_parser = clap::value_parser!(u8).range(1..=9))]
    pub passes: Option<u8>,

    /// Per-probe timeout in seconds
    #[arg(short = 't', long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum concurrent probes
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Delay between shaper start and the first probe, in milliseconds
    #[arg(long, value_name = "MS")]
    pub settle_ms: Option<u64>,

    /// Skip the network check before evaluation
    #[arg(long)]
    pub skip_preflight: bool,
}

impl RunArgs {
    /// Apply command-line overrides on top of the file configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(ref probe) = self.probe {
            config.probe.executable = probe.display().to_string();
        }
        if let Some(passes) = self.passes {
            config.evaluation.passes = passes;
        }
        if let Some(timeout) = self.timeout {
            config.probe.timeout_secs = timeout;
        }
        if let Some(workers) = self.workers {
            config.probe.max_workers = workers;
        }
        if let Some(settle_ms) = self.settle_ms {
            config.evaluation.settle_delay_ms = settle_ms;
        }
        if self.skip_preflight {
            config.preflight.enabled = false;
        }
    }
}

/// Execute the run command
pub async fn execute(args: RunArgs, mut config: Config) -> Result<()> {
    args.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;

    let set = StrategyLoader::new()
        .with_overrides(config.placeholders.clone())
        .load(&args.strategies)
        .with_context(|| format!("Failed to load strategies from {}", args.strategies.display()))?;

    let mut probe = CurlProbe::new(
        &config.probe.executable,
        set.probe_args.clone(),
        config.probe.timeout_secs,
    );

    if config.preflight.enabled {
        match probe
            .preflight(&config.preflight.url, config.preflight.timeout_secs)
            .await
        {
            Preflight::Reachable => info!(url = %config.preflight.url, "Network check passed"),
            Preflight::RequiresInsecure => {
                report::warning("HTTPS check failed, probes will run with --insecure.");
                probe.allow_insecure();
            }
            Preflight::Unreachable => report::warning(
                "Network check failed. Probes may report DETECTED/FAIL until \
                 connectivity problems are fixed.",
            ),
        }
    }

    let suite = ProbeSuite::new().with_max_workers(config.probe.max_workers);
    let total_checks = suite.total_checks();

    println!("Loaded strategies: {}", set.len());
    println!("{total_checks} HTTP checks will run per pass.");

    let interrupt = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupt);
    ctrlc::set_handler(move || {
        info!("Received interrupt signal, finishing current pass...");
        flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let shaper = ProcessShaper::new(&args.shaper)
        .with_stop_grace(Duration::from_millis(config.evaluation.stop_grace_ms));

    let mut evaluator = Evaluator::new(shaper, suite, Arc::new(probe))
        .with_passes(config.evaluation.passes)?
        .with_settle_delay(Duration::from_millis(config.evaluation.settle_delay_ms))
        .with_interrupt(interrupt)
        .with_observer(Box::new(ConsoleReporter::new(total_checks)));

    let evaluation = evaluator.evaluate(&set.strategies).await;
    report::print_summary(&evaluation);

    info!(
        scored = evaluation.results.len(),
        aborted = evaluation.aborted.len(),
        interrupted = evaluation.interrupted,
        "Evaluation finished"
    );

    if evaluation.results.is_empty() && !evaluation.aborted.is_empty() && !evaluation.interrupted {
        warn!(shaper = %args.shaper.display(), "No strategy could be evaluated");
        bail!("Shaper failed to start for every strategy");
    }

    println!();
    println!("Done.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            shaper: PathBuf::from("winws.exe"),
            strategies: PathBuf::from("list.txt"),
            probe: None,
            passes: None,
            timeout: None,
            workers: None,
            settle_ms: None,
            skip_preflight: false,
        }
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let mut config = Config::default();
        args().apply_overrides(&mut config);
        assert_eq!(config.probe.executable, "curl");
        assert_eq!(config.evaluation.passes, 1);
        assert!(config.preflight.enabled);
    }

    #[test]
    fn test_overrides_applied() {
        let mut config = Config::default();
        let args = RunArgs {
            probe: Some(PathBuf::from("/usr/bin/curl")),
            passes: Some(3),
            timeout: Some(9),
            workers: Some(2),
            settle_ms: Some(0),
            skip_preflight: true,
            ..args()
        };
        args.apply_overrides(&mut config);

        assert_eq!(config.probe.executable, "/usr/bin/curl");
        assert_eq!(config.evaluation.passes, 3);
        assert_eq!(config.probe.timeout_secs, 9);
        assert_eq!(config.probe.max_workers, 2);
        assert_eq!(config.evaluation.settle_delay_ms, 0);
        assert!(!config.preflight.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_workers_fails_validation() {
        let mut config = Config::default();
        RunArgs {
            workers: Some(0),
            ..args()
        }
        .apply_overrides(&mut config);
        assert!(config.validate().is_err());
    }
}
