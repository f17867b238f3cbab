//! Error types for goodcheck-core
//!
//! Centralized error handling using `thiserror` for ergonomic error definitions.

use thiserror::Error;

/// Main error type for goodcheck-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Strategy file could not be read
    #[error("Strategy file error for '{path}': {message}")]
    StrategyFile {
        /// Path to the strategy file
        path: String,
        /// Error message
        message: String,
    },

    /// Strategy file produced no strategies
    #[error("Strategy file contains no strategies")]
    NoStrategies,

    /// Port-80 directives present without anything to pair them with
    #[error("Combined strategies require at least one port-443 entry")]
    MissingPort443,

    /// A combined strategy lost one of its filter tokens
    #[error("Combined strategy must contain exactly one '{token}': {strategy}")]
    MissingFilterToken {
        /// The filter token that is missing or duplicated
        token: &'static str,
        /// The offending strategy text
        strategy: String,
    },

    /// Argument string has an unterminated quote
    #[error("Unbalanced quote in arguments: {input}")]
    UnbalancedQuote {
        /// The argument string being split
        input: String,
    },

    /// Shaper engine failed to start or stop
    #[error("Shaper engine error: {message}")]
    Shaper {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path to the missing config file
        path: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    ConfigValue {
        /// Configuration key
        key: String,
        /// Error message
        message: String,
    },

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a strategy file error
    pub fn strategy_file(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StrategyFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a shaper error
    pub fn shaper(message: impl Into<String>) -> Self {
        Self::Shaper {
            message: message.into(),
        }
    }

    /// Create a config value error
    pub fn config_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValue {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Whether this error is raised while compiling a strategy file
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::StrategyFile { .. }
                | Self::NoStrategies
                | Self::MissingPort443
                | Self::MissingFilterToken { .. }
                | Self::UnbalancedQuote { .. }
        )
    }
}
