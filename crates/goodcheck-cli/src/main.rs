//! GoodCheck CLI
//!
//! Command-line interface for ranking DPI circumvention strategies.

mod args;
mod commands;
mod logging;
mod report;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use args::Args;
use commands::Command;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Config first: it carries the logging defaults
    let config = commands::config::resolve(args.config.as_deref())?;
    let _log_guard = logging::init(&args, &config.logging)?;

    if !args.quiet && matches!(args.command, Command::Run(_)) {
        print_banner();
    }

    let result = run(args.command, config).await;

    if let Err(ref e) = result {
        error!("Fatal error: {:#}", e);
    }

    result
}

async fn run(command: Command, config: goodcheck_core::Config) -> Result<()> {
    match command {
        Command::Run(run_args) => commands::run::execute(run_args, config).await,
        Command::Strategies(strategies_args) => {
            commands::strategies::execute(strategies_args, &config)
        }
        Command::Config(config_args) => commands::config::execute(config_args, &config),
        Command::Completions(comp_args) => commands::completions::execute(comp_args),
    }
}

fn print_banner() {
    use colored::Colorize;

    println!();
    println!("{}", "==============================".cyan());
    println!("{}", format!("GoodCheck v{}", env!("CARGO_PKG_VERSION")).green().bold());
    println!("{}", "==============================".cyan());
    println!();
}
