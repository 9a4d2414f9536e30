//! fastdev - Local development server with on-demand compilation
//!
//! Serves a project directory over HTTP and compiles source files (TypeScript,
//! Sass) the first time they are requested, reusing the output until the
//! source changes. Scripts can alternatively be compiled by an external,
//! long-lived build server that announces its readiness with a callback.
//!
//! # High-Level API
//!
//! ```ignore
//! use fastdev::config::ConfigFile;
//! use fastdev::server::DevServer;
//!
//! let config = ConfigFile::load()?;
//! DevServer::new(&config)?.run().await?;
//! ```
//!
//! The building blocks are usable on their own:
//!
//! - [`watcher`] - modification tracking for a single file
//! - [`compile`] - compile strategies, the process executor and the cache
//! - [`build_server`] - launching and talking to an external build server
//! - [`server`] - the axum HTTP surface

pub mod build_server;
pub mod compile;
pub mod config;
pub mod logging;
pub mod server;
pub mod watcher;

/// Version of the fastdev library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
