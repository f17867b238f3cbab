//! Logging initialization

use anyhow::{Context, Result};
use goodcheck_core::config::LoggingConfig;
use std::path::PathBuf;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::args::{Args, LogFormat};

/// Initialize logging from CLI arguments, falling back to the config file.
///
/// Logs go to stderr so that report output on stdout stays clean. The
/// returned guard flushes the log file and must live until exit.
pub fn init(args: &Args, config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let level = if args.quiet {
        Level::ERROR
    } else {
        match args.verbose {
            0 => config.level.parse().unwrap_or(Level::INFO),
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let format = args.log_format.unwrap_or(if config.json_format {
        LogFormat::Json
    } else {
        LogFormat::Text
    });

    let log_file = args
        .log_file
        .clone()
        .or_else(|| config.file.as_ref().filter(|f| !f.is_empty()).map(PathBuf::from));

    let (file_writer, guard) = match log_file {
        Some(path) => {
            let file = std::fs::File::create(&path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    match format {
        LogFormat::Text => {
            let file_layer = file_writer.map(|w| fmt::layer().with_ansi(false).with_writer(w));
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(args.verbose >= 2)
                        .with_thread_ids(args.verbose >= 3)
                        .with_file(args.verbose >= 3)
                        .with_line_number(args.verbose >= 3),
                )
                .with(file_layer)
                .init();
        }
        LogFormat::Json => {
            let file_layer = file_writer.map(|w| fmt::layer().json().with_writer(w));
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .with(file_layer)
                .init();
        }
        LogFormat::Compact => {
            let file_layer = file_writer.map(|w| fmt::layer().compact().with_ansi(false).with_writer(w));
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .with(file_layer)
                .init();
        }
    }

    Ok(guard)
}
