//! On-demand compilation of source files.
//!
//! - [`CompileStrategy`] describes how to build one kind of source file
//! - [`CompileExecutor`] runs the resulting command as a child process
//! - [`CompilationCache`] decides when a compiled output can be reused
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use fastdev::compile::{CompilationCache, EsbuildStrategy};
//!
//! let cache = CompilationCache::new(std::env::current_dir()?);
//! let output = cache.compile("src/app.ts", Arc::new(EsbuildStrategy::default())).await?;
//! // output == "src/app.js"
//! ```

mod cache;
mod executor;
mod strategy;
mod types;

pub use cache::{CacheEntry, CompilationCache};
pub use executor::{CompileExecutor, ShellExecutor};
pub use strategy::{CompileStrategy, EsbuildStrategy, SassStrategy, StrategyRegistry};
pub use types::{quote, CompileCommand, CompileError, CompileJob};

pub(crate) use executor::shell;
