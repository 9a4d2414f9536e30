//! Compile strategies and the extension dispatch table.
//!
//! A [`CompileStrategy`] maps an input file to the command that builds it.
//! Strategies are selected by file extension through a [`StrategyRegistry`]
//! rather than by type hierarchy.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::types::{quote, CompileCommand};
use crate::config::CompilerSettings;

/// Maps an input file to a build command and its expected output.
///
/// Implementations must be cheap and side-effect free: they only describe
/// the command, the executor runs it.
pub trait CompileStrategy: Send + Sync + fmt::Debug {
    /// Short name used in logs (e.g. "esbuild").
    fn name(&self) -> &str;

    /// Describe how to compile `input`.
    fn compile(&self, input: &Path) -> CompileCommand;
}

/// Bundles TypeScript/JSX sources into a sibling `.js` file with esbuild.
#[derive(Debug, Clone)]
pub struct EsbuildStrategy {
    program: String,
    minify: bool,
    bundle: bool,
}

impl EsbuildStrategy {
    /// Create a strategy invoking `program` (usually `esbuild`).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            minify: true,
            bundle: true,
        }
    }

    /// Enable or disable `--minify`.
    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    /// Enable or disable `--bundle`.
    pub fn with_bundle(mut self, bundle: bool) -> Self {
        self.bundle = bundle;
        self
    }
}

impl Default for EsbuildStrategy {
    fn default() -> Self {
        Self::new("esbuild")
    }
}

impl CompileStrategy for EsbuildStrategy {
    fn name(&self) -> &str {
        "esbuild"
    }

    fn compile(&self, input: &Path) -> CompileCommand {
        let output = input.with_extension("js");
        let mut command = format!("{} {}", self.program, quote(input));
        if self.minify {
            command.push_str(" --minify");
        }
        if self.bundle {
            command.push_str(" --bundle");
        }
        command.push_str(&format!(" --outfile={}", quote(&output)));
        CompileCommand::new(command, output)
    }
}

/// Compiles SCSS/Sass style sheets into a sibling `.css` file.
#[derive(Debug, Clone)]
pub struct SassStrategy {
    program: String,
    minify: bool,
}

impl SassStrategy {
    /// Create a strategy invoking `program` (usually `sass`).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            minify: true,
        }
    }

    /// Emit compressed CSS when enabled.
    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }
}

impl Default for SassStrategy {
    fn default() -> Self {
        Self::new("sass")
    }
}

impl CompileStrategy for SassStrategy {
    fn name(&self) -> &str {
        "sass"
    }

    fn compile(&self, input: &Path) -> CompileCommand {
        let output = input.with_extension("css");
        let style = if self.minify { "compressed" } else { "expanded" };
        let command = format!(
            "{} {} {} --style={} --no-source-map",
            self.program,
            quote(input),
            quote(&output),
            style
        );
        CompileCommand::new(command, output)
    }
}

/// Extension → strategy dispatch table.
///
/// Extensions are stored lowercase without the leading dot.
#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    by_extension: HashMap<String, Arc<dyn CompileStrategy>>,
}

impl StrategyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the default table from compiler settings.
    ///
    /// Scripts (`ts`, `tsx`, `jsx`) go through esbuild, style sheets
    /// (`scss`, `sass`) through sass.
    pub fn from_settings(settings: &CompilerSettings) -> Self {
        let esbuild: Arc<dyn CompileStrategy> = Arc::new(
            EsbuildStrategy::new(&settings.esbuild)
                .with_minify(settings.minify)
                .with_bundle(settings.bundle),
        );
        let sass: Arc<dyn CompileStrategy> =
            Arc::new(SassStrategy::new(&settings.sass).with_minify(settings.minify));

        let mut registry = Self::new();
        for ext in ["ts", "tsx", "jsx"] {
            registry.register(ext, Arc::clone(&esbuild));
        }
        for ext in ["scss", "sass"] {
            registry.register(ext, Arc::clone(&sass));
        }
        registry
    }

    /// Register `strategy` for files ending in `.{extension}`.
    ///
    /// Replaces any strategy previously registered for the extension.
    pub fn register(&mut self, extension: &str, strategy: Arc<dyn CompileStrategy>) {
        self.by_extension
            .insert(normalize_extension(extension), strategy);
    }

    /// Look up the strategy for a file, by its extension.
    pub fn for_path(&self, path: &Path) -> Option<Arc<dyn CompileStrategy>> {
        let ext = path.extension()?.to_str()?;
        self.by_extension
            .get(&normalize_extension(ext))
            .map(Arc::clone)
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.by_extension.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}
