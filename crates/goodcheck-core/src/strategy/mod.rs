//! Strategies and the strategy file compiler
//!
//! A [`Strategy`] is one candidate argument set for the shaper engine.
//! [`StrategyLoader`] turns a directive file into a numbered list of them.

pub mod args;
mod loader;
mod placeholders;

pub use args::split_arguments;
pub use loader::{DirectiveSet, StrategyLoader, FILTER_TCP_443, FILTER_TCP_80};
pub use placeholders::{Placeholders, FAKE_HEX, FAKE_SNI};

use std::fmt;

use crate::error::Result;

/// One candidate shaper command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    /// Position in the strategy file, starting at 1
    pub index: u32,
    /// Command-line argument string for the shaper engine
    pub text: String,
}

impl Strategy {
    /// Create a strategy
    pub fn new(index: u32, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// Split the strategy text into shaper argument tokens
    pub fn arguments(&self) -> Result<Vec<String>> {
        split_arguments(&self.text)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.index, self.text)
    }
}

/// Output of compiling a strategy file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategySet {
    /// Strategies in emission order, indices `1..=N`
    pub strategies: Vec<Strategy>,
    /// Extra probe arguments from `_strategyCurlExtraKeys`
    pub probe_args: Vec<String>,
}

impl StrategySet {
    /// Number of strategies
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether the set is empty (never true for a loaded set)
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
