//! Error types for the HTTP surface.

use std::io;
use std::path::PathBuf;

use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::build_server::BuildServerError;
use crate::compile::CompileError;

/// Message returned to clients when a compile cannot be completed.
pub const COMPILE_FAILED_MESSAGE: &str = "failed to transpile and bundle the requested file.";

/// Errors a request handler can answer with.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Nothing to serve at the requested location
    #[error("the following file was not found:\n\t{}", .0.display())]
    NotFound(PathBuf),

    /// The compiler or build server could not produce output
    #[error("{0}")]
    CompileUnavailable(String),

    /// The path exists but is neither a file nor a directory
    #[error("the following request was uncaught:\n\t{0}")]
    UnroutableRequest(String),

    /// Files and compiled output are only served to GET and HEAD
    #[error("method {0} is not allowed")]
    MethodNotAllowed(Method),
}

impl ServeError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::CompileUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::UnroutableRequest(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

/// JSON error body: `{"error": "..."}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::NotFound(_) => (
                status,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                self.to_string(),
            )
                .into_response(),
            Self::MethodNotAllowed(_) => (
                status,
                [(header::ALLOW, "GET, HEAD")],
                Json(ErrorBody {
                    error: self.to_string(),
                }),
            )
                .into_response(),
            Self::CompileUnavailable(_) | Self::UnroutableRequest(_) => (
                status,
                Json(ErrorBody {
                    error: self.to_string(),
                }),
            )
                .into_response(),
        }
    }
}

impl From<CompileError> for ServeError {
    fn from(err: CompileError) -> Self {
        match err {
            CompileError::SourceMissing { path, .. } => Self::NotFound(path),
            CompileError::Spawn { .. } => {
                warn!(error = %err, "Compile failed");
                Self::CompileUnavailable(COMPILE_FAILED_MESSAGE.to_string())
            }
        }
    }
}

impl From<BuildServerError> for ServeError {
    fn from(err: BuildServerError) -> Self {
        warn!(error = %err, "Build server compile failed");
        Self::CompileUnavailable(COMPILE_FAILED_MESSAGE.to_string())
    }
}

/// Errors starting or running the dev server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The served root directory is unusable
    #[error("cannot serve {}: {source}", path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The readiness callback path cannot be routed
    #[error("invalid build server callback path `{path}`: {reason}")]
    CallbackPath { path: String, reason: String },

    /// Serving stopped with an I/O error
    #[error("server error: {0}")]
    Io(#[from] io::Error),

    /// The build server could not be launched
    #[error(transparent)]
    BuildServer(#[from] BuildServerError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_is_plain_text() {
        let response = ServeError::NotFound(PathBuf::from("/srv/missing.txt")).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            body_string(response).await,
            "the following file was not found:\n\t/srv/missing.txt"
        );
    }

    #[tokio::test]
    async fn test_unavailable_is_json() {
        let err: ServeError = BuildServerError::Unavailable("connection refused".into()).into();
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"], COMPILE_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_unroutable_names_path() {
        let response = ServeError::UnroutableRequest("dev/fifo".into()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"], "the following request was uncaught:\n\tdev/fifo");
    }

    #[tokio::test]
    async fn test_method_not_allowed_lists_allowed_methods() {
        let response = ServeError::MethodNotAllowed(Method::DELETE).into_response();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, HEAD");
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"], "method DELETE is not allowed");
    }

    #[test]
    fn test_missing_source_maps_to_not_found() {
        let err = CompileError::SourceMissing {
            path: PathBuf::from("/srv/app.ts"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };

        match ServeError::from(err) {
            ServeError::NotFound(path) => assert_eq!(path, PathBuf::from("/srv/app.ts")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
