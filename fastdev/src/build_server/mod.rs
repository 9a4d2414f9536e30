//! Rendezvous with an out-of-process build server.
//!
//! The build server is a long-lived external process (typically a Deno
//! script wrapping esbuild) that compiles files on request over HTTP. It
//! starts asynchronously: once it is listening it calls back to the dev
//! server, which resolves a [`ReadySignal`]. Compile requests wait on that
//! signal before they are forwarded.
//!
//! ```text
//!   request ──► BuildServer::compile ──► ReadySignal::wait ──┐
//!                                                            │ (suspended)
//!   build process ──► GET <callback> ──► notify_ready ───────┤
//!                                                            ▼
//!                                       POST <base>/compile ──► relay
//! ```
//!
//! Neither the readiness wait nor the HTTP call has a timeout or retry. A
//! build process that never calls back leaves dependent requests suspended.

mod protocol;
mod signal;

pub use protocol::{BuildResponse, BundleConfig, CompileOptions, CompileRequest};
pub use signal::ReadySignal;

use std::io;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::compile::{quote, shell};
use crate::config::BuildServerSettings;

/// Build server errors.
#[derive(Debug, Error)]
pub enum BuildServerError {
    /// The build process could not be spawned
    #[error("failed to launch build server `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The build server did not answer a compile request
    #[error("build server unavailable: {0}")]
    Unavailable(String),
}

/// How to launch and reach the build server.
#[derive(Debug, Clone)]
pub struct BuildServerConfig {
    /// Command that starts the build process (without port/callback flags)
    pub command: String,
    /// Port the build process is told to listen on
    pub port: u16,
    /// URL the build process calls once ready
    pub callback_url: String,
    /// Base URL compile requests are sent to
    pub base_url: String,
    /// Options sent with every compile request
    pub options: CompileOptions,
}

impl BuildServerConfig {
    /// Create a config; the base URL defaults to `http://localhost:{port}`.
    pub fn new(command: impl Into<String>, port: u16, callback_url: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            port,
            callback_url: callback_url.into(),
            base_url: format!("http://localhost:{}", port),
            options: CompileOptions::default(),
        }
    }

    /// Build from the `[build_server]` settings and the dev server's callback URL.
    pub fn from_settings(settings: &BuildServerSettings, callback_url: impl Into<String>) -> Self {
        Self::new(&settings.command, settings.port, callback_url).with_options(CompileOptions {
            minify: settings.minify,
            plugins: settings.plugins.clone(),
        })
    }

    /// Override where compile requests are sent.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the options sent with every compile request.
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Full command line, including the port and callback flags.
    pub fn launch_command(&self) -> String {
        format!(
            "{} --port={} --callback={}",
            self.command,
            self.port,
            quote(&self.callback_url)
        )
    }
}

/// Handle to a launched build server.
///
/// Holds the readiness signal and the process id. The child itself is
/// handed to a background task that reaps it and logs its exit; it is not
/// killed on drop and lives alongside the host process.
pub struct BuildServer {
    config: BuildServerConfig,
    ready: Arc<ReadySignal>,
    client: reqwest::Client,
    pid: Option<u32>,
}

impl BuildServer {
    /// Spawn the build process in `working_dir`.
    ///
    /// Returns as soon as the process is spawned; readiness arrives later
    /// through [`notify_ready`](Self::notify_ready).
    pub fn launch(config: BuildServerConfig, working_dir: &Path) -> Result<Self, BuildServerError> {
        let command = config.launch_command();
        let (program, flag) = shell();

        let child = Command::new(program)
            .arg(flag)
            .arg(&command)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .kill_on_drop(false)
            .spawn()
            .map_err(|source| BuildServerError::Launch {
                command: command.clone(),
                source,
            })?;

        let pid = child.id();
        info!(
            command = %command,
            pid = ?pid,
            base_url = %config.base_url,
            "Launched build server, waiting for readiness callback"
        );

        let ready = Arc::new(ReadySignal::new());
        watch_exit(child, Arc::clone(&ready));

        Ok(Self {
            config,
            ready,
            client: reqwest::Client::new(),
            pid,
        })
    }

    /// Launch configuration.
    pub fn config(&self) -> &BuildServerConfig {
        &self.config
    }

    /// The readiness signal gating compile requests.
    pub fn ready(&self) -> &ReadySignal {
        &self.ready
    }

    /// OS process id of the build process, as reported at launch.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Record that the build server is ready.
    ///
    /// Returns true the first time; repeated notifications are ignored.
    pub fn notify_ready(&self) -> bool {
        let first = self.ready.resolve();
        if first {
            info!(
                base_url = %self.config.base_url,
                pid = ?self.pid(),
                "Build server is ready"
            );
        } else {
            debug!("Ignoring repeated build server readiness notification");
        }
        first
    }

    /// Compile `input` on the build server.
    ///
    /// Waits for readiness first. The response status and body are returned
    /// as-is; only a transport failure is an error.
    pub async fn compile(&self, input: &Path) -> Result<BuildResponse, BuildServerError> {
        self.ready.wait().await;

        let url = format!("{}/compile", self.config.base_url.trim_end_matches('/'));
        let request = CompileRequest::new(input, &self.config.options);
        debug!(url = %url, path = %input.display(), "Forwarding compile request");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(
                    url = %url,
                    error = %e,
                    is_connect = e.is_connect(),
                    "Build server request failed"
                );
                BuildServerError::Unavailable(format!("request to {} failed: {}", url, e))
            })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            warn!(url = %url, error = %e, "Failed to read build server response");
            BuildServerError::Unavailable(format!("failed to read response from {}: {}", url, e))
        })?;

        debug!(path = %input.display(), status, bytes = body.len(), "Build server responded");
        Ok(BuildResponse { status, body })
    }
}

/// Reap `child` in the background and log when it exits.
///
/// An exit before the readiness callback means dependent requests will stay
/// suspended, so that case is logged as a warning. Without a runtime the
/// child is released unwatched.
fn watch_exit(mut child: Child, ready: Arc<ReadySignal>) {
    let Ok(handle) = Handle::try_current() else {
        debug!(pid = ?child.id(), "No runtime to watch build server process");
        return;
    };

    handle.spawn(async move {
        let pid = child.id();
        match child.wait().await {
            Ok(status) if ready.is_resolved() => {
                debug!(pid = ?pid, status = %status, "Build server process exited");
            }
            Ok(status) => {
                warn!(
                    pid = ?pid,
                    status = %status,
                    "Build server process exited before its readiness callback"
                );
            }
            Err(e) => {
                warn!(pid = ?pid, error = %e, "Failed to wait on build server process");
            }
        }
    });
}

impl std::fmt::Debug for BuildServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildServer")
            .field("base_url", &self.config.base_url)
            .field("ready", &self.ready.is_resolved())
            .field("pid", &self.pid)
            .finish()
    }
}
