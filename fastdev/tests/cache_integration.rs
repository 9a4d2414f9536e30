//! Integration tests for the compilation cache.
//!
//! These tests drive the cache through real child processes:
//! - First request compiles, second request reuses the output
//! - Source edits and dirty marks trigger recompiles
//! - Bulk delete removes only outputs that exist and clears the registry

#![cfg(unix)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use fastdev::compile::{quote, CompilationCache, CompileCommand, CompileStrategy};
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// Strategy that "compiles" by copying the source next to itself as `.js`.
///
/// Counts how many commands it produced, which equals the number of
/// compiler runs.
#[derive(Debug, Default)]
struct CopyStrategy {
    commands: AtomicUsize,
}

impl CopyStrategy {
    fn runs(&self) -> usize {
        self.commands.load(Ordering::SeqCst)
    }
}

impl CompileStrategy for CopyStrategy {
    fn name(&self) -> &str {
        "copy"
    }

    fn compile(&self, input: &Path) -> CompileCommand {
        self.commands.fetch_add(1, Ordering::SeqCst);
        let output = input.with_extension("js");
        CompileCommand::new(format!("cp {} {}", quote(input), quote(&output)), output)
    }
}

/// Strategy whose compiler never writes the output.
#[derive(Debug)]
struct NoOutputStrategy;

impl CompileStrategy for NoOutputStrategy {
    fn name(&self) -> &str {
        "no-output"
    }

    fn compile(&self, input: &Path) -> CompileCommand {
        CompileCommand::new("echo 'syntax error' >&2", input.with_extension("js"))
    }
}

fn write_source(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn set_mtime(path: &Path, secs: u64) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
}

// =============================================================================
// Integration Tests
// =============================================================================

#[tokio::test]
async fn test_first_request_compiles_second_reuses() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "app.ts", "export const a = 1;");
    let strategy = Arc::new(CopyStrategy::default());
    let cache = CompilationCache::new(dir.path());

    let first = cache.compile(&source, strategy.clone()).await.unwrap();
    let second = cache.compile(&source, strategy.clone()).await.unwrap();

    assert_eq!(first, fs::canonicalize(dir.path()).unwrap().join("app.js"));
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&first).unwrap(), "export const a = 1;");
    assert_eq!(strategy.runs(), 1, "second request should not recompile");
}

#[tokio::test]
async fn test_source_edit_triggers_recompile() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "app.ts", "v1");
    set_mtime(&source, 1_000);
    let strategy = Arc::new(CopyStrategy::default());
    let cache = CompilationCache::new(dir.path());

    let output = cache.compile(&source, strategy.clone()).await.unwrap();
    assert_eq!(fs::read_to_string(&output).unwrap(), "v1");

    fs::write(&source, "v2").unwrap();
    set_mtime(&source, 2_000);

    let output = cache.compile(&source, strategy.clone()).await.unwrap();
    assert_eq!(fs::read_to_string(&output).unwrap(), "v2");
    assert_eq!(strategy.runs(), 2);
}

#[tokio::test]
async fn test_deleted_output_triggers_recompile() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "app.ts", "v1");
    let strategy = Arc::new(CopyStrategy::default());
    let cache = CompilationCache::new(dir.path());

    let output = cache.compile(&source, strategy.clone()).await.unwrap();
    fs::remove_file(&output).unwrap();

    let output = cache.compile(&source, strategy.clone()).await.unwrap();
    assert!(output.exists());
    assert_eq!(strategy.runs(), 2);
}

#[tokio::test]
async fn test_set_all_dirty_recompiles_every_entry_once() {
    let dir = TempDir::new().unwrap();
    let a = write_source(dir.path(), "a.ts", "a");
    let b = write_source(dir.path(), "b.ts", "b");
    let strategy = Arc::new(CopyStrategy::default());
    let cache = CompilationCache::new(dir.path());

    cache.compile(&a, strategy.clone()).await.unwrap();
    cache.compile(&b, strategy.clone()).await.unwrap();
    assert_eq!(strategy.runs(), 2);

    cache.set_all_dirty();
    cache.compile(&a, strategy.clone()).await.unwrap();
    cache.compile(&b, strategy.clone()).await.unwrap();
    assert_eq!(strategy.runs(), 4);

    cache.compile(&a, strategy.clone()).await.unwrap();
    assert_eq!(strategy.runs(), 4, "dirty mark is consumed by one recompile");
}

#[tokio::test]
async fn test_path_spellings_share_one_entry() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "app.ts", "x");
    let strategy = Arc::new(CopyStrategy::default());
    let cache = CompilationCache::new(dir.path());

    let plain = cache.get_or_create(&source, strategy.clone()).unwrap();
    let dotted = cache
        .get_or_create(dir.path().join(".").join("app.ts"), strategy.clone())
        .unwrap();

    assert!(Arc::ptr_eq(&plain, &dotted));
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_symlinked_directory_shares_entry_and_output() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();
    let source = write_source(&src, "app.ts", "x");
    let alias = dir.path().join("alias");
    std::os::unix::fs::symlink(&src, &alias).unwrap();
    let strategy = Arc::new(CopyStrategy::default());
    let cache = CompilationCache::new(dir.path());

    let direct = cache.get_or_create(&source, strategy.clone()).unwrap();
    let linked = cache.get_or_create(alias.join("app.ts"), strategy.clone()).unwrap();
    assert!(Arc::ptr_eq(&direct, &linked));

    let first = cache.compile(&source, strategy.clone()).await.unwrap();
    let second = cache.compile(alias.join("app.ts"), strategy.clone()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(strategy.runs(), 1, "symlinked spelling should reuse the output");
}

#[tokio::test]
async fn test_compiler_errors_still_return_expected_output() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "broken.ts", "export const = ;");
    let cache = CompilationCache::new(dir.path());

    let output = cache.compile(&source, Arc::new(NoOutputStrategy)).await.unwrap();

    assert_eq!(output.file_name().unwrap(), "broken.js");
    assert!(!output.exists());
}

#[tokio::test]
async fn test_delete_all_outputs_only_existing() {
    let dir = TempDir::new().unwrap();
    let strategy = Arc::new(CopyStrategy::default());
    let cache = CompilationCache::new(dir.path());

    let mut outputs = Vec::new();
    for name in ["a.ts", "b.ts", "c.ts"] {
        let source = write_source(dir.path(), name, name);
        outputs.push(cache.compile(&source, strategy.clone()).await.unwrap());
    }
    fs::remove_file(&outputs[1]).unwrap();

    let deleted = cache.delete_all_outputs();

    assert_eq!(deleted, vec![outputs[0].clone(), outputs[2].clone()]);
    assert!(!outputs[0].exists());
    assert!(!outputs[2].exists());
    assert!(cache.list_all_inputs().is_empty());
    assert!(cache.is_empty());

    // Sources are untouched
    assert!(dir.path().join("a.ts").exists());
}

#[tokio::test]
async fn test_missing_source_is_not_registered() {
    let dir = TempDir::new().unwrap();
    let cache = CompilationCache::new(dir.path());

    let result = cache
        .compile(dir.path().join("ghost.ts"), Arc::new(CopyStrategy::default()))
        .await;

    assert!(result.is_err());
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_entry_output_recorded_after_compile() {
    let dir = TempDir::new().unwrap();
    let source = write_source(dir.path(), "app.ts", "x");
    let cache = CompilationCache::new(dir.path());
    let entry = cache
        .get_or_create(&source, Arc::new(CopyStrategy::default()))
        .unwrap();

    assert!(entry.output().is_none());
    let output = cache.process(&entry).await.unwrap();
    assert_eq!(entry.output(), Some(output));
}
