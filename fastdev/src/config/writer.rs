//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let root = config
        .server
        .root
        .as_ref()
        .map(|p| path_to_string(p))
        .unwrap_or_default();

    format!(
        r#"[server]
; Host to bind. "localhost" binds every interface (0.0.0.0)
host = {}
; Port to bind (default: 8000)
port = {}
; Directory to serve. If empty, the current directory is served
root = {}

[compiler]
; Backend used to compile scripts:
;   local        - run esbuild/sass locally and cache the outputs
;   build_server - forward requests to an external build server
backend = {}
; esbuild program, on PATH or as a full path
esbuild = {}
; sass program, on PATH or as a full path
sass = {}
; Minify compiled output (default: true)
minify = {}
; Bundle imports into the compiled script (default: true)
bundle = {}
; Log how long each compile took (default: true)
report_timing = {}

[build_server]
; Command that starts the build server. "--port" and "--callback" are appended
command = {}
; Port the build server listens on (default: 3000)
port = {}
; Path the build server requests once it is ready
callback_path = {}
; Comma-separated bundler plugins requested for every compile
plugins = {}
; Ask the build server to minify (default: false)
minify = {}
; Comma-separated extensions routed to the build server
extensions = {}

[logging]
; Log file, cleared at the start of each session
file = {}
"#,
        config.server.host,
        config.server.port,
        root,
        config.compiler.backend,
        config.compiler.esbuild,
        config.compiler.sass,
        config.compiler.minify,
        config.compiler.bundle,
        config.compiler.report_timing,
        config.build_server.command,
        config.build_server.port,
        config.build_server.callback_path,
        config.build_server.plugins.join(", "),
        config.build_server.minify,
        config.build_server.extensions.join(", "),
        path_to_string(&config.logging.file),
    )
}

/// Convert path to string, collapsing home dir to ~.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
