//! Command-line argument parsing

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::commands::Command;

/// GoodCheck - DPI circumvention strategy checker
///
/// Runs every strategy from a strategy file under the shaper engine, probes a
/// fixed set of CDN endpoints and ranks strategies by their worst pass.
#[derive(Parser, Debug)]
#[command(name = "goodcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", global = true, env = "GOODCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format for logs
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormat>,

    /// Log file path
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// Compact format
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    #[test]
    fn test_verbose() {
        let args = Args::parse_from(["goodcheck", "-v", "strategies", "list.txt"]);
        assert_eq!(args.verbose, 1);

        let args = Args::parse_from(["goodcheck", "strategies", "list.txt", "-vvv"]);
        assert_eq!(args.verbose, 3);
    }

    #[test]
    fn test_run_args() {
        let args = Args::parse_from([
            "goodcheck",
            "run",
            "--shaper",
            "winws.exe",
            "--strategies",
            "list.txt",
            "--passes",
            "3",
            "-c",
            "custom.toml",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("custom.toml")));
        let Command::Run(run) = args.command else {
            panic!("expected run command");
        };
        assert_eq!(run.shaper, PathBuf::from("winws.exe"));
        assert_eq!(run.strategies, PathBuf::from("list.txt"));
        assert_eq!(run.passes, Some(3));
        assert!(!run.skip_preflight);
    }

    #[test]
    fn test_passes_out_of_range_rejected() {
        let result = Args::try_parse_from([
            "goodcheck",
            "run",
            "--shaper",
            "winws.exe",
            "--strategies",
            "list.txt",
            "--passes",
            "10",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_format() {
        let args = Args::parse_from(["goodcheck", "--log-format", "json", "config", "paths"]);
        assert_eq!(args.log_format, Some(LogFormat::Json));
    }
}
