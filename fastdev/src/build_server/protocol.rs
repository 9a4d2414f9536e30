//! Wire types for talking to the build server.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Body of a `POST /compile` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileRequest {
    /// Absolute path of the file to compile
    pub path: PathBuf,
    /// Bundler configuration
    pub config: BundleConfig,
    /// Names of bundler plugins to enable
    pub plugins: Vec<String>,
    /// Per-plugin configuration, keyed by plugin name
    pub plugins_config: Map<String, Value>,
}

impl CompileRequest {
    /// Build a request for `path` with the given options.
    pub fn new(path: &Path, options: &CompileOptions) -> Self {
        Self {
            path: path.to_path_buf(),
            config: BundleConfig {
                minify: options.minify,
            },
            plugins: options.plugins.clone(),
            plugins_config: Map::new(),
        }
    }
}

/// Bundler configuration sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleConfig {
    pub minify: bool,
}

/// Options applied to every compile request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub minify: bool,
    pub plugins: Vec<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            minify: false,
            plugins: vec!["deno".to_string()],
        }
    }
}

/// Raw response from the build server.
#[derive(Debug, Clone)]
pub struct BuildResponse {
    /// HTTP status returned by the build server
    pub status: u16,
    /// Compiled script bytes (or the server's error body)
    pub body: Bytes,
}

impl BuildResponse {
    /// Returns true for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
