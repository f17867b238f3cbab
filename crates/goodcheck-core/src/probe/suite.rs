//! Concurrent execution of the probe matrix

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use super::{
    total_checks, CacheBuster, PassResult, ProbeCase, ProbeExecutor, ProbeOutcome, ProbeReport,
    PROBE_CASES,
};

/// Default upper bound on simultaneous probes
pub const DEFAULT_MAX_WORKERS: usize = 8;

struct Task {
    case: ProbeCase,
    attempt: u32,
    repeats: u32,
}

/// Runs every probe case once per pass over a bounded worker pool
pub struct ProbeSuite {
    cases: Vec<ProbeCase>,
    max_workers: usize,
    cache_buster: Arc<CacheBuster>,
}

impl ProbeSuite {
    /// Suite over [`PROBE_CASES`] with the default worker bound
    pub fn new() -> Self {
        Self {
            cases: PROBE_CASES.to_vec(),
            max_workers: DEFAULT_MAX_WORKERS,
            cache_buster: Arc::new(CacheBuster::new()),
        }
    }

    /// Replace the case table
    #[must_use]
    pub fn with_cases(mut self, cases: Vec<ProbeCase>) -> Self {
        self.cases = cases;
        self
    }

    /// Set the maximum number of probes in flight
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Use a specific cache buster (seeded ones make URLs reproducible)
    #[must_use]
    pub fn with_cache_buster(mut self, cache_buster: CacheBuster) -> Self {
        self.cache_buster = Arc::new(cache_buster);
        self
    }

    /// Case table in submission order
    pub fn cases(&self) -> &[ProbeCase] {
        &self.cases
    }

    /// Probe invocations per pass
    pub fn total_checks(&self) -> u32 {
        total_checks(&self.cases)
    }

    /// Run one pass.
    ///
    /// Every attempt of every case is submitted at once and gated by a
    /// semaphore sized `min(max_workers, total)`. Reports come back in
    /// submission order (case order, then attempt) whatever order the probes
    /// finish in.
    #[instrument(skip_all, fields(total = self.total_checks()))]
    pub async fn run(&self, executor: Arc<dyn ProbeExecutor>) -> PassResult {
        let tasks = self.tasks();
        if tasks.is_empty() {
            return PassResult::default();
        }

        let workers = self.max_workers.min(tasks.len()).max(1);
        debug!(workers, "Submitting probes");
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut set = JoinSet::new();

        for (seq, task) in tasks.iter().enumerate() {
            let url = self.cache_buster.apply(task.case.url);
            let semaphore = Arc::clone(&semaphore);
            let executor = Arc::clone(&executor);

            set.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => executor.execute(&url).await,
                    Err(e) => ProbeOutcome::failed(format!("worker pool closed: {e}")),
                };
                (seq, outcome)
            });
        }

        let mut finished: Vec<Option<ProbeOutcome>> = vec![None; tasks.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((seq, outcome)) => finished[seq] = Some(outcome),
                Err(e) => warn!(error = %e, "Probe task did not complete"),
            }
        }

        let mut result = PassResult::default();
        for (task, outcome) in tasks.into_iter().zip(finished) {
            let outcome = outcome.unwrap_or_else(|| ProbeOutcome::failed("probe task panicked"));
            result.summary.record(outcome.status);
            result.reports.push(ProbeReport {
                case: task.case,
                attempt: task.attempt,
                repeats: task.repeats,
                outcome,
            });
        }

        debug!(summary = %result.summary, "Pass complete");
        result
    }

    fn tasks(&self) -> Vec<Task> {
        self.cases
            .iter()
            .flat_map(|case| {
                let repeats = case.attempts();
                (1..=repeats).map(move |attempt| Task {
                    case: *case,
                    attempt,
                    repeats,
                })
            })
            .collect()
    }
}

impl Default for ProbeSuite {
    fn default() -> Self {
        Self::new()
    }
}
