// Shell command runner: the sync core's only process-execution seam.
//
// Commands arrive as complete shell strings (composed by `git::ops`) and run
// once through the platform shell. Failures come back as values.

use std::future::Future;
use std::path::Path;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunnerError {
    #[error("failed to run `{command}`: {message}")]
    Spawn { command: String, message: String },
    #[error("`{command}` failed with code {code:?}: {}", detail(.stdout, .stderr))]
    Exit { command: String, code: Option<i32>, stdout: String, stderr: String },
}

impl RunnerError {
    /// Combined stdout and stderr of a failed command (empty for spawn errors).
    pub fn output(&self) -> String {
        match self {
            RunnerError::Spawn { .. } => String::new(),
            RunnerError::Exit { stdout, stderr, .. } => format!("{stdout}{stderr}"),
        }
    }

    pub fn command(&self) -> &str {
        match self {
            RunnerError::Spawn { command, .. } | RunnerError::Exit { command, .. } => command,
        }
    }
}

fn detail<'a>(stdout: &'a str, stderr: &'a str) -> &'a str {
    if stderr.trim().is_empty() {
        stdout.trim()
    } else {
        stderr.trim()
    }
}

/// Executes a shell command string in a working directory.
///
/// Implementations make a single attempt and never panic on command failure.
pub trait CommandRunner: Send + Sync + 'static {
    fn run(
        &self,
        command: &str,
        cwd: &Path,
    ) -> impl Future<Output = Result<String, RunnerError>> + Send;
}

/// Runs commands through `sh -c` (or `cmd /C` on Windows).
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellCommandRunner;

impl ShellCommandRunner {
    /// cmd.exe parses its own command line, so the string is passed through
    /// unquoted; `arg` would escape the inner `"` as `\"`.
    #[cfg(windows)]
    fn shell_command(command: &str) -> Command {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").raw_arg(command);
        cmd
    }

    #[cfg(not(windows))]
    fn shell_command(command: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }
}

impl CommandRunner for ShellCommandRunner {
    async fn run(&self, command: &str, cwd: &Path) -> Result<String, RunnerError> {
        debug!(command, cwd = %cwd.display(), "running shell command");

        let output = Self::shell_command(command)
            .current_dir(cwd)
            .output()
            .await
            .map_err(|error| RunnerError::Spawn {
                command: command.to_string(),
                message: error.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            return Ok(stdout);
        }

        Err(RunnerError::Exit {
            command: command.to_string(),
            code: output.status.code(),
            stdout,
            stderr,
        })
    }
}
