//! Request routing and handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use super::error::ServeError;
use super::files::{resolve_path, serve_dir, serve_file};
use crate::build_server::BuildServer;
use crate::compile::{CompilationCache, StrategyRegistry};
use crate::config::check_callback_path;
use crate::config::defaults::{CACHE_DELETE_PATH, CACHE_DIRTY_PATH, CACHE_LIST_PATH};

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    root: PathBuf,
    cache: Arc<CompilationCache>,
    strategies: Arc<StrategyRegistry>,
    build_server: Option<BuildServerRoute>,
}

/// How requests reach the build server.
#[derive(Debug, Clone)]
struct BuildServerRoute {
    server: Arc<BuildServer>,
    callback_path: String,
    extensions: Vec<String>,
}

impl BuildServerRoute {
    fn handles(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                self.extensions
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

impl AppState {
    /// State serving `root`, compiling through `cache` with `strategies`.
    pub fn new(
        root: impl Into<PathBuf>,
        cache: Arc<CompilationCache>,
        strategies: StrategyRegistry,
    ) -> Self {
        Self {
            root: root.into(),
            cache,
            strategies: Arc::new(strategies),
            build_server: None,
        }
    }

    /// Route files with `extensions` to `server`, and accept its readiness
    /// callback at `callback_path`.
    pub fn with_build_server(
        mut self,
        server: Arc<BuildServer>,
        callback_path: impl Into<String>,
        extensions: Vec<String>,
    ) -> Self {
        self.build_server = Some(BuildServerRoute {
            server,
            callback_path: callback_path.into(),
            extensions,
        });
        self
    }

    /// Directory being served.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The compilation cache.
    pub fn cache(&self) -> &Arc<CompilationCache> {
        &self.cache
    }

    /// The build server, when that backend is active.
    pub fn build_server(&self) -> Option<&Arc<BuildServer>> {
        self.build_server.as_ref().map(|route| &route.server)
    }
}

/// Build the application router.
///
/// The readiness callback is only routed when a build server is configured;
/// every other path falls through to [`serve_path`]. A callback path that
/// collides with a built-in route is left unrouted; configuration loading
/// rejects such paths before this point.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route(CACHE_DIRTY_PATH, get(cache_dirty))
        .route(CACHE_LIST_PATH, get(cache_list))
        .route(CACHE_DELETE_PATH, get(cache_delete));

    if let Some(route) = &state.build_server {
        match check_callback_path(&route.callback_path) {
            Ok(()) => {
                router = router.route(
                    &route.callback_path,
                    get(build_server_loaded).post(build_server_loaded),
                );
            }
            Err(reason) => {
                warn!(
                    path = %route.callback_path,
                    reason = %reason,
                    "Not routing build server readiness callback"
                );
            }
        }
    }

    router
        .fallback(serve_path)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn build_server_loaded(State(state): State<AppState>) -> StatusCode {
    if let Some(server) = state.build_server() {
        server.notify_ready();
    }
    StatusCode::OK
}

async fn cache_dirty(State(state): State<AppState>) -> StatusCode {
    state.cache.set_all_dirty();
    info!(entries = state.cache.len(), "Marked all cache entries dirty");
    StatusCode::OK
}

async fn cache_list(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(display_paths(state.cache.list_all_inputs()))
}

async fn cache_delete(State(state): State<AppState>) -> Json<Vec<String>> {
    let deleted = state.cache.delete_all_outputs();
    info!(deleted = deleted.len(), "Deleted cached outputs");
    Json(display_paths(deleted))
}

/// Serve any path not claimed by another route.
///
/// Only GET and HEAD are served. Order: build server (for its extensions),
/// local compile (for any extension with a strategy), static file, directory.
async fn serve_path(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Result<Response, ServeError> {
    if method != Method::GET && method != Method::HEAD {
        return Err(ServeError::MethodNotAllowed(method));
    }

    let url_path = uri.path();
    let path = resolve_path(&state.root, url_path)
        .ok_or_else(|| ServeError::NotFound(PathBuf::from(url_path)))?;

    if let Some(route) = &state.build_server {
        if route.handles(&path) {
            return compile_remote(&route.server, &path).await;
        }
    }

    if let Some(strategy) = state.strategies.for_path(&path) {
        let output = state.cache.compile(&path, strategy).await?;
        return serve_file(&output).await;
    }

    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|_| ServeError::NotFound(path.clone()))?;
    if metadata.is_file() {
        serve_file(&path).await
    } else if metadata.is_dir() {
        serve_dir(&state.root, &path).await
    } else {
        Err(ServeError::UnroutableRequest(
            url_path.trim_start_matches('/').to_string(),
        ))
    }
}

/// Compile `path` on the build server and relay its answer as a script.
async fn compile_remote(server: &BuildServer, path: &Path) -> Result<Response, ServeError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(ServeError::NotFound(path.to_path_buf()));
    }

    let reply = server.compile(path).await?;
    if reply.is_success() {
        debug!(path = %path.display(), status = reply.status, "Relaying build server response");
    } else {
        warn!(path = %path.display(), status = reply.status, "Build server reported an error");
    }

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = (status, Body::from(reply.body)).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/javascript"),
    );
    Ok(response)
}

fn display_paths(paths: Vec<PathBuf>) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_server::BuildServerConfig;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_build_server_route_matches_extensions() {
        let dir = tempfile::TempDir::new().unwrap();
        let server = BuildServer::launch(
            BuildServerConfig::new("true", 3999, "http://localhost:1/cb"),
            dir.path(),
        )
        .unwrap();
        let route = BuildServerRoute {
            server: Arc::new(server),
            callback_path: "/cb".to_string(),
            extensions: vec!["ts".to_string(), "tsx".to_string()],
        };

        assert!(route.handles(Path::new("/srv/app.ts")));
        assert!(route.handles(Path::new("/srv/App.TSX")));
        assert!(!route.handles(Path::new("/srv/app.jsx")));
        assert!(!route.handles(Path::new("/srv/README")));
    }

    #[test]
    fn test_state_without_build_server() {
        let dir = tempfile::TempDir::new().unwrap();
        let state = AppState::new(
            dir.path(),
            Arc::new(CompilationCache::new(dir.path())),
            StrategyRegistry::new(),
        );

        assert_eq!(state.root(), dir.path());
        assert!(state.build_server().is_none());
        assert!(state.cache().is_empty());
    }
}
