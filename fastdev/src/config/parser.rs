//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;

use super::defaults::RESERVED_PATHS;
use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [server] section
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = section.get("host") {
            let v = v.trim();
            if !v.is_empty() {
                config.server.host = v.to_string();
            }
        }
        if let Some(v) = section.get("port") {
            config.server.port = parse_port("server", "port", v)?;
        }
        if let Some(v) = section.get("root") {
            let v = v.trim();
            config.server.root = if v.is_empty() {
                None
            } else {
                Some(expand_tilde(v))
            };
        }
    }

    // [compiler] section
    if let Some(section) = ini.section(Some("compiler")) {
        if let Some(v) = section.get("backend") {
            config.compiler.backend = v.parse().map_err(|_| ConfigFileError::InvalidValue {
                section: "compiler".to_string(),
                key: "backend".to_string(),
                value: v.to_string(),
                reason: "must be 'local' or 'build_server'".to_string(),
            })?;
        }
        if let Some(v) = section.get("esbuild") {
            let v = v.trim();
            if !v.is_empty() {
                config.compiler.esbuild = v.to_string();
            }
        }
        if let Some(v) = section.get("sass") {
            let v = v.trim();
            if !v.is_empty() {
                config.compiler.sass = v.to_string();
            }
        }
        if let Some(v) = section.get("minify") {
            config.compiler.minify = parse_bool(v);
        }
        if let Some(v) = section.get("bundle") {
            config.compiler.bundle = parse_bool(v);
        }
        if let Some(v) = section.get("report_timing") {
            config.compiler.report_timing = parse_bool(v);
        }
    }

    // [build_server] section
    if let Some(section) = ini.section(Some("build_server")) {
        if let Some(v) = section.get("command") {
            let v = v.trim();
            if v.is_empty() {
                return Err(ConfigFileError::InvalidValue {
                    section: "build_server".to_string(),
                    key: "command".to_string(),
                    value: v.to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
            config.build_server.command = v.to_string();
        }
        if let Some(v) = section.get("port") {
            config.build_server.port = parse_port("build_server", "port", v)?;
        }
        if let Some(v) = section.get("callback_path") {
            let v = v.trim();
            check_callback_path(v).map_err(|reason| ConfigFileError::InvalidValue {
                section: "build_server".to_string(),
                key: "callback_path".to_string(),
                value: v.to_string(),
                reason,
            })?;
            config.build_server.callback_path = v.to_string();
        }
        if let Some(v) = section.get("plugins") {
            config.build_server.plugins = parse_list(v);
        }
        if let Some(v) = section.get("minify") {
            config.build_server.minify = parse_bool(v);
        }
        if let Some(v) = section.get("extensions") {
            config.build_server.extensions = parse_list(v)
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect();
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn parse_port(section: &str, key: &str, value: &str) -> Result<u16, ConfigFileError> {
    value
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be a port number between 1 and 65535".to_string(),
        })
}

/// Check that `path` can be routed as the build server readiness callback.
///
/// Returns the reason when it cannot.
pub(crate) fn check_callback_path(path: &str) -> Result<(), String> {
    if !path.starts_with('/') {
        return Err("must start with '/'".to_string());
    }
    if path.contains([':', '*']) {
        return Err("must not contain ':' or '*'".to_string());
    }
    if RESERVED_PATHS.contains(&path) {
        return Err(format!(
            "is already served by the dev server (reserved: {})",
            RESERVED_PATHS.join(", ")
        ));
    }
    Ok(())
}

/// Parse a boolean value from a config string.
/// Accepts: true/false, yes/no, 1/0, on/off (case-insensitive)
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Split a comma-separated list, dropping empty items.
pub(super) fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
