//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use fastdev::build_server::BuildServerError;
use fastdev::config::ConfigFileError;
use fastdev::server::ServerError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Dev server error
    Serve(ServerError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Serve(ServerError::Bind { .. }) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. Port in use: pick another one with --port");
                eprintln!("  2. Privileged port: ports below 1024 may need elevated permissions");
            }
            CliError::Serve(ServerError::BuildServer(BuildServerError::Launch { .. })) => {
                eprintln!();
                eprintln!("The build server command could not be started. Make sure:");
                eprintln!("  1. The program (e.g. deno) is installed and on your PATH");
                eprintln!("  2. [build_server] command in config.ini points at the right script");
                eprintln!("  3. Or use the local backend: fastdev serve --backend local");
            }
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Run 'fastdev config show' to see the effective configuration.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Serve(e) => write!(f, "Dev server error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Runtime(e) => Some(e),
            CliError::Serve(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ServerError> for CliError {
    fn from(e: ServerError) -> Self {
        CliError::Serve(e)
    }
}
