//! Strategy evaluation
//!
//! Runs every strategy under the shaper engine, probes it for the configured
//! number of passes and scores it by its worst pass.

mod ranking;

pub use ranking::{Ranking, ScoreGroup};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::config::MAX_PASSES;
use crate::error::{Error, Result};
use crate::probe::{PassResult, ProbeExecutor, ProbeSuite, Summary};
use crate::shaper::{ShaperEngine, ShaperSession};
use crate::strategy::Strategy;

/// Default delay between shaper start and the first probe
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Score of one fully evaluated strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyResult {
    /// The strategy
    pub strategy: Strategy,
    /// Minimum `OK` count over all passes
    pub score: u32,
    /// Summary of the pass that produced the score
    pub summary: Summary,
}

/// A strategy whose shaper engine could not be started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbortedStrategy {
    /// The strategy
    pub strategy: Strategy,
    /// Why the start failed
    pub error: String,
}

/// Outcome of evaluating a strategy list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Scored strategies in evaluation order
    pub results: Vec<StrategyResult>,
    /// Strategies skipped because the shaper failed to start
    pub aborted: Vec<AbortedStrategy>,
    /// Evaluation stopped early on the interrupt flag
    pub interrupted: bool,
}

impl Evaluation {
    /// Scored results grouped by score
    pub fn ranking(&self) -> Ranking {
        Ranking::new(&self.results)
    }
}

/// Progress callbacks; every method defaults to a no-op
#[allow(unused_variables)]
pub trait EvaluationObserver: Send {
    /// A strategy is about to start; `total` is the list length
    fn strategy_started(&mut self, strategy: &Strategy, total: usize) {}

    /// The shaper could not be started for a strategy
    fn strategy_aborted(&mut self, strategy: &Strategy, error: &Error) {}

    /// One probe pass finished (`pass` counts from 1)
    fn pass_completed(&mut self, strategy: &Strategy, pass: u8, passes: u8, result: &PassResult) {}

    /// A strategy was scored
    fn strategy_scored(&mut self, result: &StrategyResult) {}
}

/// Drives the shaper engine and probe suite over a strategy list
pub struct Evaluator<S: ShaperEngine> {
    shaper: S,
    suite: ProbeSuite,
    executor: Arc<dyn ProbeExecutor>,
    passes: u8,
    settle_delay: Duration,
    interrupt: Option<Arc<AtomicBool>>,
    observer: Option<Box<dyn EvaluationObserver>>,
}

impl<S: ShaperEngine> Evaluator<S> {
    /// Create an evaluator running one pass per strategy
    pub fn new(shaper: S, suite: ProbeSuite, executor: Arc<dyn ProbeExecutor>) -> Self {
        Self {
            shaper,
            suite,
            executor,
            passes: 1,
            settle_delay: DEFAULT_SETTLE_DELAY,
            interrupt: None,
            observer: None,
        }
    }

    /// Set the number of passes per strategy (1-9)
    pub fn with_passes(mut self, passes: u8) -> Result<Self> {
        if !(1..=MAX_PASSES).contains(&passes) {
            return Err(Error::config_value(
                "passes",
                format!("Must be between 1 and {MAX_PASSES}, got {passes}"),
            ));
        }
        self.passes = passes;
        Ok(self)
    }

    /// Set the delay between shaper start and the first pass
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Stop between strategies and passes once `flag` is set
    #[must_use]
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Receive progress callbacks
    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn EvaluationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Passes per strategy
    pub fn passes(&self) -> u8 {
        self.passes
    }

    /// The shaper engine
    pub fn shaper(&self) -> &S {
        &self.shaper
    }

    /// Evaluate strategies strictly one after another.
    ///
    /// A strategy whose shaper fails to start is recorded in
    /// [`Evaluation::aborted`] and skipped. A strategy interrupted mid-way is
    /// not scored, but its shaper is still stopped.
    #[instrument(skip_all, fields(strategies = strategies.len(), passes = self.passes))]
    pub async fn evaluate(&mut self, strategies: &[Strategy]) -> Evaluation {
        let Self {
            shaper,
            suite,
            executor,
            passes,
            settle_delay,
            interrupt,
            observer,
        } = self;
        let passes = *passes;
        let is_interrupted = || interrupt.as_ref().is_some_and(|f| f.load(Ordering::SeqCst));

        let mut evaluation = Evaluation::default();

        for strategy in strategies {
            if is_interrupted() {
                info!("Interrupted, skipping remaining strategies");
                evaluation.interrupted = true;
                break;
            }

            info!(strategy = strategy.index, total = strategies.len(), "Evaluating strategy");
            if let Some(observer) = observer.as_mut() {
                observer.strategy_started(strategy, strategies.len());
            }

            let session = match ShaperSession::start(&mut *shaper, strategy).await {
                Ok(session) => session,
                Err(e) => {
                    if let Some(observer) = observer.as_mut() {
                        observer.strategy_aborted(strategy, &e);
                    }
                    evaluation.aborted.push(AbortedStrategy {
                        strategy: strategy.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            tokio::time::sleep(*settle_delay).await;

            let mut worst: Option<(u32, Summary)> = None;
            let mut completed = 0u8;
            for pass in 1..=passes {
                if is_interrupted() {
                    evaluation.interrupted = true;
                    break;
                }

                let result = suite.run(Arc::clone(executor)).await;
                debug!(strategy = strategy.index, pass, summary = %result.summary, "Pass finished");
                if let Some(observer) = observer.as_mut() {
                    observer.pass_completed(strategy, pass, passes, &result);
                }

                let score = result.score();
                if worst.map_or(true, |(min, _)| score < min) {
                    worst = Some((score, result.summary));
                }
                completed = pass;
            }

            session.finish().await;

            match worst {
                Some((score, summary)) if completed == passes => {
                    let result = StrategyResult {
                        strategy: strategy.clone(),
                        score,
                        summary,
                    };
                    info!(strategy = strategy.index, score, %summary, "Strategy scored");
                    if let Some(observer) = observer.as_mut() {
                        observer.strategy_scored(&result);
                    }
                    evaluation.results.push(result);
                }
                _ => {
                    warn!(strategy = strategy.index, completed, "Strategy not scored, evaluation interrupted");
                    break;
                }
            }
        }

        evaluation
    }
}
