//! CLI commands

pub mod completions;
pub mod config;
pub mod run;
pub mod strategies;

use clap::Subcommand;

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate every strategy in a strategy file (main command)
    Run(run::RunArgs),

    /// Compile a strategy file and list the resulting strategies
    Strategies(strategies::StrategiesArgs),

    /// Configuration management
    Config(config::ConfigArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}
