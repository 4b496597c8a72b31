//! Shell command execution with streamed output and cooperative cancellation.
//!
//! The pipeline's git and package-manager steps all go through here. Stdout
//! and stderr are streamed line by line to caller-supplied sinks while the
//! command runs; stderr is additionally captured so a failing command can
//! report what it printed.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use lhimpact_core::{ImpactError, Result};

/// Runs shell commands for the pipeline.
///
/// A seam so pipeline tests can record commands instead of executing them.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command`, resolving on exit code 0.
    async fn run(&self, command: &str) -> Result<()>;
}

/// [`CommandRunner`] that executes through the shell in a fixed directory.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    cwd: PathBuf,
    cancel: CancellationToken,
}

impl ShellRunner {
    /// Create a runner rooted at `cwd`.
    pub fn new(cwd: impl Into<PathBuf>, cancel: CancellationToken) -> Self {
        Self {
            cwd: cwd.into(),
            cancel,
        }
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str) -> Result<()> {
        run_command(command, &self.cwd, &self.cancel).await
    }
}

/// Run `command` in `cwd`, logging its output at debug level.
///
/// # Errors
///
/// Returns [`ImpactError::Process`] with the captured stderr if the command
/// exits non-zero, or [`ImpactError::Cancelled`] if `cancel` fires first.
pub async fn run_command(command: &str, cwd: &Path, cancel: &CancellationToken) -> Result<()> {
    run_command_with_sinks(
        command,
        cwd,
        cancel,
        |line| tracing::debug!(target: "lhimpact::exec", "{line}"),
        |line| tracing::debug!(target: "lhimpact::exec", "{line}"),
    )
    .await
}

/// Run `command` in `cwd`, streaming each output line to the given sinks.
///
/// `on_stdout` and `on_stderr` receive lines as they arrive. Stderr is also
/// captured internally so a non-zero exit can report it.
///
/// # Errors
///
/// Returns [`ImpactError::Process`] if the command cannot be spawned or exits
/// non-zero, or [`ImpactError::Cancelled`] if `cancel` fires first; a
/// cancelled child is killed rather than left running.
pub async fn run_command_with_sinks(
    command: &str,
    cwd: &Path,
    cancel: &CancellationToken,
    mut on_stdout: impl FnMut(&str) + Send,
    mut on_stderr: impl FnMut(&str) + Send,
) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(ImpactError::Cancelled);
    }
    tracing::debug!(command, cwd = %cwd.display(), "running command");

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ImpactError::Process(format!("failed to spawn `{command}`: {e}")))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let finished = {
        let run = async {
            let drain_stdout = async {
                if let Some(stdout) = stdout {
                    let mut lines = BufReader::new(stdout).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        on_stdout(&line);
                    }
                }
            };
            let drain_stderr = async {
                let mut captured = String::new();
                if let Some(stderr) = stderr {
                    let mut lines = BufReader::new(stderr).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        on_stderr(&line);
                        captured.push_str(&line);
                        captured.push('\n');
                    }
                }
                captured
            };
            let ((), captured) = tokio::join!(drain_stdout, drain_stderr);
            let status = child.wait().await?;
            Ok::<_, ImpactError>((status, captured))
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = run => Some(result),
        }
    };

    match finished {
        None => {
            let _ = child.kill().await;
            Err(ImpactError::Cancelled)
        }
        Some(result) => {
            let (status, captured) = result?;
            if status.success() {
                Ok(())
            } else {
                Err(ImpactError::Process(format!(
                    "`{command}` exited with {status}: {stderr}",
                    stderr = captured.trim(),
                )))
            }
        }
    }
}
