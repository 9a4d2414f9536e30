//! The compilation cache.
//!
//! Keeps one [`CacheEntry`] per canonical input path for the lifetime of
//! the process and decides, per request, whether the compiled output can be
//! reused or the compiler has to run again.
//!
//! # Recompilation rule
//!
//! An entry is recompiled when any of these hold, checked in order:
//!
//! 1. it has never been compiled
//! 2. its output file is missing on disk
//! 3. its source file changed since last observed
//!
//! # Concurrency
//!
//! Lookup-or-insert is a single `DashMap` entry operation, so two requests
//! can never create two entries for one path. Compilation itself is not
//! locked per entry: two concurrent requests for the same stale input may
//! both run the compiler, and whichever finishes last sets the output path.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info, warn};

use super::executor::{CompileExecutor, ShellExecutor};
use super::strategy::CompileStrategy;
use super::types::{CompileCommand, CompileError};
use crate::watcher::WatchedFile;

/// Cached compilation state for one input file.
#[derive(Debug)]
pub struct CacheEntry {
    input: PathBuf,
    strategy: Arc<dyn CompileStrategy>,
    state: Mutex<EntryState>,
}

#[derive(Debug)]
struct EntryState {
    watcher: WatchedFile,
    output: Option<PathBuf>,
}

impl CacheEntry {
    fn new(watcher: WatchedFile, strategy: Arc<dyn CompileStrategy>) -> Self {
        Self {
            input: watcher.path().to_path_buf(),
            strategy,
            state: Mutex::new(EntryState {
                watcher,
                output: None,
            }),
        }
    }

    /// Canonical input path (the entry's identity).
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Strategy used to compile this entry.
    pub fn strategy(&self) -> &Arc<dyn CompileStrategy> {
        &self.strategy
    }

    /// Output path of the most recent compile, if any.
    pub fn output(&self) -> Option<PathBuf> {
        self.lock().output.clone()
    }

    fn lock(&self) -> MutexGuard<'_, EntryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the reusable output path, or `None` if a recompile is needed.
    fn reusable_output(&self) -> Result<Option<PathBuf>, CompileError> {
        let mut state = self.lock();
        let output = match &state.output {
            Some(output) if output.is_file() => output.clone(),
            _ => return Ok(None),
        };
        let changed = state
            .watcher
            .has_changed()
            .map_err(|e| CompileError::source_missing(&self.input, e))?;
        Ok((!changed).then_some(output))
    }
}

/// Process-wide registry of compiled inputs.
///
/// Generic over the executor so tests can substitute a fake; production
/// code uses [`ShellExecutor`].
pub struct CompilationCache<E = ShellExecutor> {
    entries: DashMap<PathBuf, Arc<CacheEntry>>,
    executor: E,
    working_dir: PathBuf,
    report_timing: bool,
}

impl CompilationCache<ShellExecutor> {
    /// Create a cache that runs compilers through the shell in `working_dir`.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self::with_executor(working_dir, ShellExecutor::new())
    }
}

impl<E: CompileExecutor> CompilationCache<E> {
    /// Create a cache with a custom executor.
    pub fn with_executor(working_dir: impl Into<PathBuf>, executor: E) -> Self {
        Self {
            entries: DashMap::new(),
            executor,
            working_dir: working_dir.into(),
            report_timing: true,
        }
    }

    /// Log how long each compile took at info level (default: on).
    pub fn with_report_timing(mut self, report_timing: bool) -> Self {
        self.report_timing = report_timing;
        self
    }

    /// Returns the entry for `input`, registering a new one if needed.
    ///
    /// Paths are canonicalized first, so every spelling of the same file
    /// yields the same `Arc`. When the entry already exists `strategy` is
    /// ignored.
    ///
    /// # Errors
    ///
    /// [`CompileError::SourceMissing`] if `input` does not exist.
    pub fn get_or_create(
        &self,
        input: impl AsRef<Path>,
        strategy: Arc<dyn CompileStrategy>,
    ) -> Result<Arc<CacheEntry>, CompileError> {
        let input = input.as_ref();
        let canonical =
            std::fs::canonicalize(input).map_err(|e| CompileError::source_missing(input, e))?;

        match self.entries.entry(canonical) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let watcher = WatchedFile::new(entry.key())
                    .map_err(|e| CompileError::source_missing(input, e))?;
                debug!(
                    input = %watcher.path().display(),
                    strategy = strategy.name(),
                    "Registered cache entry"
                );
                let created = Arc::new(CacheEntry::new(watcher, strategy));
                entry.insert(Arc::clone(&created));
                Ok(created)
            }
        }
    }

    /// Bring `entry` up to date and return its output path.
    ///
    /// Runs the compiler only when the entry has no output yet, the output
    /// file is gone, or the source changed. Compiler stderr is logged as a
    /// warning but does not affect the result; the expected output path is
    /// returned whether or not the compiler actually wrote it.
    pub async fn process(&self, entry: &CacheEntry) -> Result<PathBuf, CompileError> {
        if let Some(output) = entry.reusable_output()? {
            debug!(input = %entry.input.display(), "Cache hit");
            return Ok(output);
        }

        let CompileCommand { command, output } = entry.strategy.compile(&entry.input);
        let job = self.executor.execute(&command, &self.working_dir).await?;

        if job.has_diagnostics() {
            warn!(
                input = %entry.input.display(),
                exit_code = ?job.exit_code,
                "Compiler reported errors:\n{}",
                job.stderr_text()
            );
        }
        if self.report_timing {
            info!(
                output = %output.display(),
                strategy = entry.strategy.name(),
                elapsed_ms = job.elapsed.as_millis() as u64,
                "Compiled {} in {:.3} sec",
                output.display(),
                job.elapsed.as_secs_f64()
            );
        }

        entry.lock().output = Some(output.clone());
        Ok(output)
    }

    /// Register `input` if needed and process it.
    pub async fn compile(
        &self,
        input: impl AsRef<Path>,
        strategy: Arc<dyn CompileStrategy>,
    ) -> Result<PathBuf, CompileError> {
        let entry = self.get_or_create(input, strategy)?;
        self.process(&entry).await
    }

    /// Mark every entry dirty so its next `process` recompiles.
    pub fn set_all_dirty(&self) {
        for entry in self.entries.iter() {
            entry.value().lock().watcher.mark_dirty();
        }
        debug!(entries = self.entries.len(), "Marked all cache entries dirty");
    }

    /// Canonical input paths of all registered entries, sorted.
    pub fn list_all_inputs(&self) -> Vec<PathBuf> {
        let mut inputs: Vec<PathBuf> = self.entries.iter().map(|e| e.key().clone()).collect();
        inputs.sort();
        inputs
    }

    /// Delete every output file that exists on disk, then clear the registry.
    ///
    /// Entries without an output file are dropped too. Returns the paths
    /// that were actually deleted; a file that fails to delete is logged
    /// and left out.
    pub fn delete_all_outputs(&self) -> Vec<PathBuf> {
        let mut deleted = Vec::new();
        for entry in self.entries.iter() {
            let Some(output) = entry.value().output() else {
                continue;
            };
            if !output.is_file() {
                continue;
            }
            match std::fs::remove_file(&output) {
                Ok(()) => {
                    info!(output = %output.display(), "Deleted compiled output");
                    deleted.push(output);
                }
                Err(e) => {
                    warn!(output = %output.display(), error = %e, "Failed to delete compiled output");
                }
            }
        }
        self.entries.clear();
        deleted.sort();
        deleted
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E> std::fmt::Debug for CompilationCache<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilationCache")
            .field("entries", &self.entries.len())
            .field("working_dir", &self.working_dir)
            .finish()
    }
}
