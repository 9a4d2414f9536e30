//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show`, and `config init` for locating,
//! inspecting, and creating the configuration file.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use fastdev::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective configuration (file values over defaults)
    Show,

    /// Write a default configuration file if none exists
    Init,
}

/// Run a config subcommand against `config` (default: ~/.fastdev/config.ini).
pub fn run(command: ConfigCommands, config: Option<PathBuf>) -> Result<(), CliError> {
    let path = config.unwrap_or_else(config_file_path);
    match command {
        ConfigCommands::Path => run_path(&path),
        ConfigCommands::Show => run_show(&path),
        ConfigCommands::Init => run_init(&path),
    }
}

/// Show the configuration file path.
fn run_path(path: &Path) -> Result<(), CliError> {
    println!("{}", path.display());
    Ok(())
}

/// Print the effective configuration.
fn run_show(path: &Path) -> Result<(), CliError> {
    let config = ConfigFile::load_from(path)?;

    if path.exists() {
        println!("; Loaded from {}", path.display());
    } else {
        println!("; {} does not exist, showing defaults", path.display());
    }
    print!("{}", config.to_config_string());

    Ok(())
}

/// Create the configuration file with defaults.
fn run_init(path: &Path) -> Result<(), CliError> {
    if ConfigFile::ensure_exists_at(path)? {
        println!("Created {}", path.display());
    } else {
        println!("{} already exists, leaving it unchanged", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_then_show() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");

        run(ConfigCommands::Init, Some(path.clone())).unwrap();
        assert!(path.exists());

        run(ConfigCommands::Show, Some(path)).unwrap();
    }

    #[test]
    fn test_show_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        std::fs::write(&path, "[compiler]\nbackend = gulp\n").unwrap();

        let err = run(ConfigCommands::Show, Some(path)).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
