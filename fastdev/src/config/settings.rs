//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// HTTP server settings
    pub server: ServerSettings,
    /// Local compiler settings
    pub compiler: CompilerSettings,
    /// External build server settings
    pub build_server: BuildServerSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Host to bind; `localhost` binds every interface
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Directory to serve (None = current directory)
    pub root: Option<PathBuf>,
}

/// Which backend compiles script requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompileBackend {
    /// Run compilers locally through the compilation cache
    #[default]
    Local,
    /// Forward requests to an external build server
    BuildServer,
}

impl CompileBackend {
    /// Name as written in config.ini.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::BuildServer => "build_server",
        }
    }
}

impl fmt::Display for CompileBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompileBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "local" => Ok(Self::Local),
            "build_server" => Ok(Self::BuildServer),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

/// Local compiler configuration.
#[derive(Debug, Clone)]
pub struct CompilerSettings {
    /// Backend used for script requests
    pub backend: CompileBackend,
    /// esbuild program (name on PATH or full path)
    pub esbuild: String,
    /// sass program (name on PATH or full path)
    pub sass: String,
    /// Minify compiled output
    pub minify: bool,
    /// Bundle imports into the compiled script
    pub bundle: bool,
    /// Log how long each compile took
    pub report_timing: bool,
}

/// External build server configuration.
#[derive(Debug, Clone)]
pub struct BuildServerSettings {
    /// Command that starts the build server
    pub command: String,
    /// Port the build server listens on
    pub port: u16,
    /// Path the build server calls once ready
    pub callback_path: String,
    /// Bundler plugins requested for every compile
    pub plugins: Vec<String>,
    /// Ask the build server to minify
    pub minify: bool,
    /// Extensions routed to the build server
    pub extensions: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
