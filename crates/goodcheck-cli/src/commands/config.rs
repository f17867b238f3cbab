//! Config command - configuration management

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use goodcheck_core::Config;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name looked up in the working and user config directories
pub const CONFIG_FILE_NAME: &str = "goodcheck.toml";

/// Config command arguments
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Generate a configuration file with default values
    Generate {
        /// Output file path
        #[arg(short, long, default_value = CONFIG_FILE_NAME)]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Config file to validate (default: detect)
        file: Option<PathBuf>,
    },

    /// Show config file locations
    Paths,
}

/// Execute config command
pub fn execute(args: ConfigArgs, config: &Config) -> Result<()> {
    match args.action {
        ConfigAction::Show => show_config(config),
        ConfigAction::Generate { output, force } => generate_config(&output, force),
        ConfigAction::Validate { file } => validate_config(file, config),
        ConfigAction::Paths => show_paths(),
    }
}

/// Load the explicit config file, else the first one found, else defaults
pub fn resolve(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match find_config_file() {
            Some(path) => path,
            None => {
                debug!("No config file found, using defaults");
                return Ok(Config::default());
            }
        },
    };

    Config::load(&path).with_context(|| format!("Failed to load config from {}", path.display()))
}

fn show_config(config: &Config) -> Result<()> {
    let toml_str = config.to_toml().context("Failed to serialize config")?;
    println!("{toml_str}");
    Ok(())
}

fn generate_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }

    let toml_str = Config::default()
        .to_toml()
        .context("Failed to serialize config")?;

    let content = format!(
        "# GoodCheck Configuration\n\
         # Command-line flags override these values\n\n\
         {toml_str}"
    );

    std::fs::write(output, content)
        .with_context(|| format!("Failed to write config to {}", output.display()))?;

    info!(path = %output.display(), "Generated config file");
    println!("Configuration file generated: {}", output.display());
    Ok(())
}

fn validate_config(file: Option<PathBuf>, detected: &Config) -> Result<()> {
    let config = match file {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => detected.clone(),
    };

    config.validate().context("Configuration validation failed")?;

    println!("{} Configuration is valid", "✓".green());
    println!("  Probe: {} (timeout {}s, {} workers)",
        config.probe.executable, config.probe.timeout_secs, config.probe.max_workers);
    println!("  Passes: {}", config.evaluation.passes);
    println!("  Pre-flight: {}",
        if config.preflight.enabled { config.preflight.url.as_str() } else { "disabled" });

    Ok(())
}

fn show_paths() -> Result<()> {
    println!("Configuration file search paths:");
    println!();
    for (i, path) in search_paths().iter().enumerate() {
        let marker = if path.exists() { " (found)" } else { "" };
        println!("  {}. {}{marker}", i + 1, path.display());
    }
    Ok(())
}

fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dirs) = directories::ProjectDirs::from("", "", "goodcheck") {
        paths.push(dirs.config_dir().join(CONFIG_FILE_NAME));
    }
    paths
}

fn find_config_file() -> Option<PathBuf> {
    search_paths().into_iter().find(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_paths_start_with_working_dir() {
        let paths = search_paths();
        assert_eq!(paths[0], PathBuf::from("goodcheck.toml"));
    }

    #[test]
    fn test_resolve_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[evaluation]\npasses = 4\n").unwrap();

        let config = resolve(Some(&path)).unwrap();
        assert_eq!(config.evaluation.passes, 4);
        assert_eq!(config.probe.executable, "curl");
    }

    #[test]
    fn test_resolve_missing_explicit_file() {
        let err = resolve(Some(Path::new("/no/such/goodcheck.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("/no/such/goodcheck.toml"));
    }

    #[test]
    fn test_generate_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("goodcheck.toml");
        generate_config(&path, false).unwrap();
        assert!(generate_config(&path, false).is_err());
        generate_config(&path, true).unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.validate().is_ok());
    }
}
