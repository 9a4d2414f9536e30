//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use super::settings::*;

// =============================================================================
// Server defaults
// =============================================================================

/// Default bind host. Normalised to every interface when binding.
pub const DEFAULT_HOST: &str = "localhost";

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8000;

// =============================================================================
// Compiler defaults
// =============================================================================

/// Default esbuild program.
pub const DEFAULT_ESBUILD: &str = "esbuild";

/// Default sass program.
pub const DEFAULT_SASS: &str = "sass";

// =============================================================================
// Build server defaults
// =============================================================================

/// Default build server launch command.
pub const DEFAULT_BUILD_SERVER_COMMAND: &str =
    "deno run -A ./src/fastdev/builders/deno_lts_esbuild.ts";

/// Default build server port.
pub const DEFAULT_BUILD_SERVER_PORT: u16 = 3000;

/// Default readiness callback path.
pub const DEFAULT_CALLBACK_PATH: &str = "/build_server_loaded";

/// Default bundler plugins.
pub const DEFAULT_BUILD_SERVER_PLUGINS: &[&str] = &["deno"];

/// Default extensions routed to the build server.
pub const DEFAULT_BUILD_SERVER_EXTENSIONS: &[&str] = &["ts", "tsx"];

// =============================================================================
// Built-in routes
// =============================================================================

/// Marks every cache entry dirty.
pub const CACHE_DIRTY_PATH: &str = "/cache_dirty";

/// Lists cached inputs.
pub const CACHE_LIST_PATH: &str = "/cache_list";

/// Deletes cached outputs.
pub const CACHE_DELETE_PATH: &str = "/cache_delete";

/// Paths the readiness callback may not reuse.
pub const RESERVED_PATHS: &[&str] = &[CACHE_DIRTY_PATH, CACHE_LIST_PATH, CACHE_DELETE_PATH];

// =============================================================================
// Logging defaults
// =============================================================================

/// Default log file name inside the config directory.
pub const DEFAULT_LOG_FILE_NAME: &str = "fastdev.log";

// =============================================================================
// Default impls
// =============================================================================

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            root: None,
        }
    }
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            backend: CompileBackend::Local,
            esbuild: DEFAULT_ESBUILD.to_string(),
            sass: DEFAULT_SASS.to_string(),
            minify: true,
            bundle: true,
            report_timing: true,
        }
    }
}

impl Default for BuildServerSettings {
    fn default() -> Self {
        Self {
            command: DEFAULT_BUILD_SERVER_COMMAND.to_string(),
            port: DEFAULT_BUILD_SERVER_PORT,
            callback_path: DEFAULT_CALLBACK_PATH.to_string(),
            plugins: to_strings(DEFAULT_BUILD_SERVER_PLUGINS),
            minify: false,
            extensions: to_strings(DEFAULT_BUILD_SERVER_EXTENSIONS),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: super::file::config_directory().join(DEFAULT_LOG_FILE_NAME),
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            compiler: CompilerSettings::default(),
            build_server: BuildServerSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
