//! # GoodCheck Core
//!
//! Platform-independent core library for evaluating DPI circumvention
//! strategies.
//!
//! ## Architecture
//!
//! This crate provides:
//! - **Strategy compilation** - Directive files merged into shaper command lines
//! - **Probing** - HTTP probes through an external tool, classified into outcomes
//! - **Probe suite** - The fixed probe matrix fanned out over a bounded pool
//! - **Evaluation** - Shaper lifecycle per strategy and worst-case ranking
//! - **Configuration** - TOML-backed settings
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use goodcheck_core::{Config, CurlProbe, Evaluator, ProbeSuite, StrategyLoader};
//! # use goodcheck_core::{ShaperEngine, Strategy};
//! # struct Engine;
//! # #[async_trait::async_trait]
//! # impl ShaperEngine for Engine {
//! #     async fn start(&mut self, _: &Strategy) -> goodcheck_core::Result<()> { Ok(()) }
//! #     async fn stop(&mut self) -> goodcheck_core::Result<()> { Ok(()) }
//! #     fn abort(&mut self) {}
//! # }
//! # async fn demo() -> goodcheck_core::Result<()> {
//! let config = Config::load("goodcheck.toml")?;
//! let set = StrategyLoader::new()
//!     .with_overrides(config.placeholders.clone())
//!     .load("strategies.txt")?;
//!
//! let probe = Arc::new(CurlProbe::new("curl", set.probe_args.clone(), 5));
//! let suite = ProbeSuite::new().with_max_workers(8);
//! let mut evaluator = Evaluator::new(Engine, suite, probe).with_passes(2)?;
//!
//! let evaluation = evaluator.evaluate(&set.strategies).await;
//! for group in evaluation.ranking().groups() {
//!     println!("{} successes: {} strategies", group.score, group.results.len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod evaluator;
pub mod probe;
pub mod shaper;
pub mod strategy;

// Re-exports for convenience
pub use config::Config;
pub use error::{Error, Result};
pub use evaluator::{Evaluation, Evaluator, Ranking, StrategyResult};
pub use probe::{
    CacheBuster, CurlProbe, PassResult, ProbeCase, ProbeExecutor, ProbeOutcome, ProbeStatus,
    ProbeSuite, Summary, PROBE_CASES,
};
pub use shaper::ShaperEngine;
pub use strategy::{Placeholders, Strategy, StrategyLoader, StrategySet};
