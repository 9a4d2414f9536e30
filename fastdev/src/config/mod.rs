//! Configuration for the dev server.
//!
//! Settings are read from an INI file (`~/.fastdev/config.ini` by default).
//! Missing keys fall back to the values in [`defaults`], and command-line
//! flags are applied on top by the CLI.
//!
//! # Example
//!
//! ```
//! use fastdev::config::{CompileBackend, ConfigFile};
//!
//! let config = ConfigFile::default();
//! assert_eq!(config.server.port, 8000);
//! assert_eq!(config.compiler.backend, CompileBackend::Local);
//! ```

pub mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub(crate) use parser::check_callback_path;
pub use settings::{
    BuildServerSettings, CompileBackend, CompilerSettings, ConfigFile, LoggingSettings,
    ServerSettings,
};
