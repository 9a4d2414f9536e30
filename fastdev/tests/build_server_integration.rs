//! Integration tests for the build server rendezvous.
//!
//! A stub build server (axum on an ephemeral port) stands in for the real
//! Deno process, and the launched "build process" is a shell command that
//! records each launch in a file.

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use fastdev::build_server::{BuildServer, BuildServerConfig, BuildServerError, CompileOptions};
use fastdev::compile::quote;
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;

// =============================================================================
// Test Helpers
// =============================================================================

/// Requests seen by the stub build server.
#[derive(Clone, Default)]
struct StubState {
    requests: Arc<AtomicUsize>,
    last_body: Arc<std::sync::Mutex<Option<Value>>>,
}

/// Echoes the requested path back as the "compiled" script.
///
/// Paths ending in `missing.ts` get a 404 to exercise status relaying.
async fn stub_compile(State(state): State<StubState>, Json(body): Json<Value>) -> (StatusCode, String) {
    state.requests.fetch_add(1, Ordering::SeqCst);
    let path = body["path"].as_str().unwrap_or_default().to_string();
    *state.last_body.lock().unwrap() = Some(body);

    if path.ends_with("missing.ts") {
        (StatusCode::NOT_FOUND, "no such module".to_string())
    } else {
        (StatusCode::OK, format!("compiled:{}", path))
    }
}

/// Start the stub build server and return its base URL.
async fn start_stub(state: StubState) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new()
        .route("/compile", post(stub_compile))
        .with_state(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Launch a build "process" that appends one line to `launch_log` per launch.
fn launch(dir: &TempDir, base_url: &str, launch_log: &Path) -> BuildServer {
    let command = format!("echo launched >> {}", quote(launch_log));
    let config = BuildServerConfig::new(command, 3000, "http://localhost:8000/build_server_loaded")
        .with_base_url(base_url);
    BuildServer::launch(config, dir.path()).unwrap()
}

async fn launch_count(launch_log: &Path) -> usize {
    // The launched shell runs asynchronously; give it a moment to write
    for _ in 0..50 {
        if let Ok(contents) = tokio::fs::read_to_string(launch_log).await {
            if !contents.is_empty() {
                return contents.lines().count();
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    0
}

// =============================================================================
// Integration Tests
// =============================================================================

#[tokio::test]
async fn test_requests_wait_for_readiness_then_all_proceed() {
    let dir = TempDir::new().unwrap();
    let stub = StubState::default();
    let base_url = start_stub(stub.clone()).await;
    let launch_log = dir.path().join("launches.log");
    let server = Arc::new(launch(&dir, &base_url, &launch_log));

    let mut pending = Vec::new();
    for name in ["a.ts", "b.ts", "c.ts"] {
        let server = Arc::clone(&server);
        let path = PathBuf::from("/srv/site").join(name);
        pending.push(tokio::spawn(async move { server.compile(&path).await }));
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(pending.iter().all(|p| !p.is_finished()), "requests must wait for readiness");
    assert_eq!(stub.requests.load(Ordering::SeqCst), 0);

    assert!(server.notify_ready());

    for (handle, name) in pending.into_iter().zip(["a.ts", "b.ts", "c.ts"]) {
        let reply = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("request released after readiness")
            .unwrap()
            .unwrap();
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, format!("compiled:/srv/site/{}", name).into_bytes());
    }
    assert_eq!(stub.requests.load(Ordering::SeqCst), 3);

    // A second readiness callback changes nothing and nothing is relaunched
    assert!(!server.notify_ready());
    assert_eq!(launch_count(&launch_log).await, 1);
}

#[tokio::test]
async fn test_request_after_readiness_is_not_delayed() {
    let dir = TempDir::new().unwrap();
    let base_url = start_stub(StubState::default()).await;
    let server = launch(&dir, &base_url, &dir.path().join("launches.log"));
    server.notify_ready();

    let reply = tokio::time::timeout(
        Duration::from_secs(5),
        server.compile(Path::new("/srv/site/app.tsx")),
    )
    .await
    .expect("ready server answers")
    .unwrap();

    assert!(reply.is_success());
}

#[tokio::test]
async fn test_request_body_shape() {
    let dir = TempDir::new().unwrap();
    let stub = StubState::default();
    let base_url = start_stub(stub.clone()).await;
    let config = BuildServerConfig::new("true", 3000, "http://localhost:8000/cb")
        .with_base_url(&base_url)
        .with_options(CompileOptions {
            minify: true,
            plugins: vec!["deno".to_string(), "svelte".to_string()],
        });
    let server = BuildServer::launch(config, dir.path()).unwrap();
    server.notify_ready();

    server.compile(Path::new("/srv/site/app.ts")).await.unwrap();

    let body = stub.last_body.lock().unwrap().clone().unwrap();
    assert_eq!(body["path"], "/srv/site/app.ts");
    assert_eq!(body["config"]["minify"], true);
    assert_eq!(body["plugins"], serde_json::json!(["deno", "svelte"]));
    assert_eq!(body["plugins_config"], serde_json::json!({}));
}

#[tokio::test]
async fn test_error_status_is_relayed() {
    let dir = TempDir::new().unwrap();
    let base_url = start_stub(StubState::default()).await;
    let server = launch(&dir, &base_url, &dir.path().join("launches.log"));
    server.notify_ready();

    let reply = server.compile(Path::new("/srv/site/missing.ts")).await.unwrap();

    assert_eq!(reply.status, 404);
    assert!(!reply.is_success());
    assert_eq!(reply.body, "no such module".as_bytes());
}

#[tokio::test]
async fn test_unreachable_build_server_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let server = launch(&dir, &format!("http://{}", addr), &dir.path().join("launches.log"));
    server.notify_ready();

    let result = server.compile(Path::new("/srv/site/app.ts")).await;
    assert!(matches!(result, Err(BuildServerError::Unavailable(_))));
}

#[tokio::test]
async fn test_launch_failure_in_missing_directory() {
    let dir = TempDir::new().unwrap();
    let config = BuildServerConfig::new("true", 3000, "http://localhost:8000/cb");

    let result = BuildServer::launch(config, &dir.path().join("does-not-exist"));

    assert!(matches!(result, Err(BuildServerError::Launch { .. })));
}
