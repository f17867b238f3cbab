//! Strategies command - compile a strategy file without running anything

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use goodcheck_core::{Config, StrategyLoader, StrategySet};
use std::path::PathBuf;

/// Strategies command arguments
#[derive(Args, Debug)]
pub struct StrategiesArgs {
    /// Strategy file to compile
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Also print each strategy's argument tokens
    #[arg(long)]
    pub tokens: bool,
}

/// Execute strategies command
pub fn execute(args: StrategiesArgs, config: &Config) -> Result<()> {
    let set = StrategyLoader::new()
        .with_overrides(config.placeholders.clone())
        .load(&args.file)
        .with_context(|| format!("Failed to load strategies from {}", args.file.display()))?;

    print_set(&set, args.tokens)
}

fn print_set(set: &StrategySet, tokens: bool) -> Result<()> {
    println!("Loaded {} strategies", set.len().to_string().green().bold());
    if !set.probe_args.is_empty() {
        println!("Extra probe arguments: {}", set.probe_args.join(" ").cyan());
    }
    println!();

    for strategy in &set.strategies {
        println!("{strategy}");
        if tokens {
            let args = strategy
                .arguments()
                .with_context(|| format!("Strategy #{} has invalid arguments", strategy.index))?;
            for arg in args {
                println!("    {arg}");
            }
        }
    }
    Ok(())
}
