//! Lighthouse report acquisition.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use lhimpact_core::{LighthouseReport, Result};

use crate::exec::run_command_with_sinks;

/// Produces one Lighthouse report for the current project state.
///
/// Invoked exactly twice per run: once on the base branch, once after the
/// head branch is merged.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    /// Generate a report for the project as currently checked out.
    async fn generate(&self) -> Result<LighthouseReport>;
}

/// [`ReportGenerator`] that shells out to a user-configured command.
///
/// When `report_path` is set the command is expected to write its JSON there;
/// otherwise the command's stdout is parsed as the report.
pub struct CommandReportGenerator {
    command: String,
    cwd: PathBuf,
    report_path: Option<PathBuf>,
    cancel: CancellationToken,
}

impl CommandReportGenerator {
    /// Create a generator running `command` in `cwd`.
    pub fn new(
        command: impl Into<String>,
        cwd: impl Into<PathBuf>,
        report_path: Option<PathBuf>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            command: command.into(),
            cwd: cwd.into(),
            report_path,
            cancel,
        }
    }
}

#[async_trait]
impl ReportGenerator for CommandReportGenerator {
    async fn generate(&self) -> Result<LighthouseReport> {
        tracing::debug!(command = %self.command, "generating lighthouse report");
        let mut stdout = String::new();
        run_command_with_sinks(
            &self.command,
            &self.cwd,
            &self.cancel,
            |line| {
                stdout.push_str(line);
                stdout.push('\n');
            },
            |line| tracing::debug!(target: "lhimpact::exec", "{line}"),
        )
        .await?;

        match &self.report_path {
            Some(path) => {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    self.cwd.join(path)
                };
                LighthouseReport::from_file(&path)
            }
            None => LighthouseReport::from_json(&stdout),
        }
    }
}
