//! Core types shared by the compile strategies, executor and cache.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// A shell command that builds one input file, plus where it writes.
///
/// The command is opaque to the cache: it is handed to the executor as-is
/// and is expected to produce `output` as a side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileCommand {
    /// Shell-executable command line
    pub command: String,
    /// Path the command is expected to write
    pub output: PathBuf,
}

impl CompileCommand {
    /// Create a new compile command.
    pub fn new(command: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
        }
    }
}

/// Record of one finished compiler invocation.
///
/// Ephemeral: used for logging and then dropped.
#[derive(Debug, Clone)]
pub struct CompileJob {
    /// The command that was run
    pub command: String,
    /// Directory the command ran in
    pub working_dir: PathBuf,
    /// Captured standard output
    pub stdout: Vec<u8>,
    /// Captured standard error
    pub stderr: Vec<u8>,
    /// Process exit code, if the process exited normally
    ///
    /// Recorded for diagnostics only. The cache never acts on it.
    pub exit_code: Option<i32>,
    /// Wall-clock time from spawn to exit
    pub elapsed: Duration,
}

impl CompileJob {
    /// Returns true if the compiler wrote anything to standard error.
    pub fn has_diagnostics(&self) -> bool {
        !self.stderr.is_empty()
    }

    /// Standard error decoded lossily as UTF-8.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Compilation errors.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The requested source file does not exist or cannot be read
    #[error("source file not found: {}", path.display())]
    SourceMissing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The compiler process could not be started
    #[error("failed to start compiler `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
}

impl CompileError {
    pub(crate) fn source_missing(path: &Path, source: io::Error) -> Self {
        Self::SourceMissing {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Wrap a path in double quotes for use in a shell command line.
pub fn quote(path: impl AsRef<Path>) -> String {
    format!("\"{}\"", path.as_ref().display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_command_new() {
        let cmd = CompileCommand::new("esbuild app.ts", "app.js");
        assert_eq!(cmd.command, "esbuild app.ts");
        assert_eq!(cmd.output, PathBuf::from("app.js"));
    }

    #[test]
    fn test_job_diagnostics() {
        let mut job = CompileJob {
            command: "true".to_string(),
            working_dir: PathBuf::from("."),
            stdout: b"ok".to_vec(),
            stderr: Vec::new(),
            exit_code: Some(0),
            elapsed: Duration::from_millis(5),
        };
        assert!(!job.has_diagnostics());

        job.stderr = b"error: unexpected token".to_vec();
        assert!(job.has_diagnostics());
        assert_eq!(job.stderr_text(), "error: unexpected token");
    }

    #[test]
    fn test_source_missing_display() {
        let err = CompileError::source_missing(
            Path::new("/srv/app.ts"),
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("/srv/app.ts"));
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("/a b/c.ts"), "\"/a b/c.ts\"");
    }
}
