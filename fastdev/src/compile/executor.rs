//! Child-process execution for compile commands.

use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;
use tracing::{debug, trace};

use super::types::{CompileError, CompileJob};

/// Runs compile commands.
///
/// Abstracted so the cache can be driven by a fake in tests.
pub trait CompileExecutor: Send + Sync {
    /// Run `command` in `working_dir` and wait for it to exit.
    ///
    /// Both output streams are captured in full. The exit status is not
    /// interpreted: a command that exits non-zero still yields `Ok`.
    fn execute(
        &self,
        command: &str,
        working_dir: &Path,
    ) -> impl Future<Output = Result<CompileJob, CompileError>> + Send;
}

/// Executes commands through the platform shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellExecutor;

impl ShellExecutor {
    /// Create a new shell executor.
    pub fn new() -> Self {
        Self
    }
}

/// Returns the shell program and its "run this string" flag.
pub(crate) fn shell() -> (&'static str, &'static str) {
    if cfg!(windows) {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}

impl CompileExecutor for ShellExecutor {
    async fn execute(&self, command: &str, working_dir: &Path) -> Result<CompileJob, CompileError> {
        let (program, flag) = shell();
        trace!(command = command, cwd = %working_dir.display(), "Spawning compiler");

        let start = Instant::now();
        let output = Command::new(program)
            .arg(flag)
            .arg(command)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| CompileError::Spawn {
                command: command.to_string(),
                source,
            })?;
        let elapsed = start.elapsed();

        debug!(
            command = command,
            exit_code = ?output.status.code(),
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Compiler exited"
        );

        Ok(CompileJob {
            command: command.to_string(),
            working_dir: working_dir.to_path_buf(),
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
            elapsed,
        })
    }
}
