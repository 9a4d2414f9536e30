//! HTTP surface of the dev server.
//!
//! [`DevServer`] wires the configuration into an [`AppState`], launches the
//! build server when that backend is selected, and serves the [`router`]
//! with axum.
//!
//! | Path | Behaviour |
//! |------|-----------|
//! | `<callback_path>` | Build server readiness callback (build server backend only) |
//! | `/cache_dirty` | Mark every cache entry dirty |
//! | `/cache_list` | JSON list of cached inputs |
//! | `/cache_delete` | Delete cached outputs, JSON list of deleted files |
//! | anything else | Compile, static file, or directory |

mod error;
mod files;
mod routes;

pub use error::{ServeError, ServerError, COMPILE_FAILED_MESSAGE};
pub use files::{content_type, resolve_path, serve_dir, serve_file};
pub use routes::{router, AppState};

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::build_server::{BuildServer, BuildServerConfig};
use crate::compile::{CompilationCache, StrategyRegistry};
use crate::config::{check_callback_path, CompileBackend, ConfigFile};

/// Host name that is widened to every interface when binding.
const LOCALHOST: &str = "localhost";

/// Address actually bound for a configured host.
///
/// `localhost` binds `0.0.0.0` so the server is reachable from other
/// devices on the network; anything else is used as given.
pub fn bind_host(host: &str) -> &str {
    if host.eq_ignore_ascii_case(LOCALHOST) {
        "0.0.0.0"
    } else {
        host
    }
}

/// The development server.
#[derive(Debug)]
pub struct DevServer {
    host: String,
    port: u16,
    state: AppState,
}

impl DevServer {
    /// Build the server from configuration.
    ///
    /// Resolves the served root, builds the compile strategy table and, for
    /// the build server backend, launches the build process. Must be called
    /// from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be resolved, the
    /// callback path collides with a built-in route, or the build server
    /// cannot be launched. The callback path is checked before launching.
    pub fn new(config: &ConfigFile) -> Result<Self, ServerError> {
        let root = resolve_root(config.server.root.clone())?;

        let strategies = StrategyRegistry::from_settings(&config.compiler);
        let local_extensions = strategies.extensions().join(", ");
        let cache = CompilationCache::new(&root).with_report_timing(config.compiler.report_timing);
        let mut state = AppState::new(&root, Arc::new(cache), strategies);

        if config.compiler.backend == CompileBackend::BuildServer {
            let settings = &config.build_server;
            check_callback_path(&settings.callback_path).map_err(|reason| {
                ServerError::CallbackPath {
                    path: settings.callback_path.clone(),
                    reason,
                }
            })?;
            let callback_url = format!(
                "http://{}:{}{}",
                LOCALHOST, config.server.port, settings.callback_path
            );
            let server = BuildServer::launch(
                BuildServerConfig::from_settings(settings, callback_url),
                &root,
            )?;
            state = state.with_build_server(
                Arc::new(server),
                &settings.callback_path,
                settings.extensions.clone(),
            );
        }

        info!(
            root = %root.display(),
            backend = %config.compiler.backend,
            local_extensions = %local_extensions,
            "Dev server configured"
        );

        Ok(Self {
            host: config.server.host.clone(),
            port: config.server.port,
            state,
        })
    }

    /// Shared handler state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Bind the configured address and serve until the process exits.
    pub async fn run(self) -> Result<(), ServerError> {
        let host = bind_host(&self.host).to_string();
        let listener = TcpListener::bind((host.as_str(), self.port))
            .await
            .map_err(|source| ServerError::Bind {
                addr: format!("{}:{}", host, self.port),
                source,
            })?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        info!(
            addr = %addr,
            url = %format!("http://{}:{}/", self.host, addr.port()),
            "Serving"
        );

        axum::serve(listener, router(self.state)).await?;
        Ok(())
    }
}

fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf, ServerError> {
    let root = match root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    std::fs::canonicalize(&root).map_err(|source| ServerError::Root { path: root, source })
}
