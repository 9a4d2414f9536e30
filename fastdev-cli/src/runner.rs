//! CLI runner for common setup and operations.
//!
//! Encapsulates configuration loading and logging initialization so command
//! handlers start from a ready environment.

use std::path::Path;

use fastdev::config::ConfigFile;
use fastdev::logging::{init_logging, LoggingGuard, LoggingOptions};
use tracing::info;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Config file to load instead of ~/.fastdev/config.ini
    /// * `debug_mode` - When true, defaults to debug-level logging if RUST_LOG is unset
    pub fn new(config_path: Option<&Path>, debug_mode: bool) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };

        // The dev server runs in the foreground, so logs are mirrored to the terminal
        let options = LoggingOptions::new(&config.logging.file)
            .with_stdout(true)
            .with_debug(debug_mode);
        let logging_guard =
            init_logging(&options).map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Mutable access for command-line overrides.
    pub fn config_mut(&mut self) -> &mut ConfigFile {
        &mut self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("fastdev v{}", fastdev::VERSION);
        info!("fastdev CLI: {} command", command);
    }
}
