//! End-to-end orchestration: measure both branch states, compare, publish.
//!
//! The pipeline owns the sequencing only; report comparison and rendering
//! live in `lhimpact-report`, and every external collaborator sits behind a
//! trait so the whole flow is testable without a network or a git checkout.
//!
//! Side effects are at-least-once: a cancellation or failure after one gist
//! was created does not roll it back, the next run converges by updating.

use std::future::Future;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use lhimpact_core::{Gist, ImpactError, IssueComment, LighthouseReport, Result};
use lhimpact_report::compare::compare_reports;
use lhimpact_report::correlate;
use lhimpact_report::render::{generate_comment_body, CommentContext};

use crate::exec::CommandRunner;
use crate::generator::ReportGenerator;
use crate::gists::{gist_url, ArtifactStore, GistFiles};
use crate::pulls::{CommentStore, PullRefs, PullRequestLocator, PullRequestSource};

/// Fixed sequencing options for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Pull request the impact is reported on.
    pub locator: PullRequestLocator,
    /// Dependency installation command, run after each checkout.
    pub install_command: String,
    /// Create the gists as secret instead of public.
    pub secret_gists: bool,
}

/// Result of a completed pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RunOutcome {
    /// Both gists and the comment were created or updated.
    Published(PublishedImpact),
    /// A previous comment matched the marker but its embedded gist ids were
    /// missing or malformed; nothing was published.
    CommentCorrupted,
    /// The run was cancelled before completing.
    Cancelled,
}

/// The artifacts a successful run created or updated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedImpact {
    /// Gist holding the base report.
    pub base_gist: Gist,
    /// Gist holding the merged (head) report.
    pub head_gist: Gist,
    /// The published comment.
    pub comment: IssueComment,
}

/// Orchestrates one full measure-compare-publish run.
pub struct ImpactPipeline<P, R, G, A, C> {
    pull: P,
    runner: R,
    generator: G,
    artifacts: A,
    comments: C,
    options: PipelineOptions,
}

impl<P, R, G, A, C> ImpactPipeline<P, R, G, A, C>
where
    P: PullRequestSource,
    R: CommandRunner,
    G: ReportGenerator,
    A: ArtifactStore,
    C: CommentStore,
{
    /// Assemble a pipeline from its collaborators.
    pub fn new(
        pull: P,
        runner: R,
        generator: G,
        artifacts: A,
        comments: C,
        options: PipelineOptions,
    ) -> Self {
        Self {
            pull,
            runner,
            generator,
            artifacts,
            comments,
            options,
        }
    }

    /// Run the pipeline to completion.
    ///
    /// Cancellation is cooperative: `cancel` is checked before each process
    /// execution and network call, and a run cancelled mid-flight resolves
    /// to [`RunOutcome::Cancelled`] instead of an error.
    ///
    /// # Errors
    ///
    /// Any process or GitHub failure fails the whole run; there is no retry
    /// logic beyond what the collaborators themselves provide.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunOutcome> {
        match self.execute(cancel).await {
            Err(ImpactError::Cancelled) => {
                tracing::warn!("run cancelled before completion");
                Ok(RunOutcome::Cancelled)
            }
            other => other,
        }
    }

    async fn execute(&self, cancel: &CancellationToken) -> Result<RunOutcome> {
        let refs = guarded(cancel, self.pull.refs()).await?;
        tracing::debug!(base = %refs.base_ref, head = %refs.head_ref, "resolved pull request refs");

        self.checkout_base(&refs).await?;
        let base_report = self.generator.generate().await?;

        self.merge_head(&refs).await?;
        let head_report = self.generator.generate().await?;

        tracing::debug!(
            pull_request = %self.options.locator.url(),
            "searching for a previous impact comment"
        );
        let existing = guarded(
            cancel,
            self.comments.find_matching(&correlate::body_is_impact_comment),
        )
        .await?;

        let base_files = GistFiles::single(
            self.gist_file_name("base"),
            serde_json::to_string(&base_report)?,
        );
        let head_files = GistFiles::single(
            self.gist_file_name("merged"),
            serde_json::to_string(&head_report)?,
        );

        match existing {
            Some(comment) => {
                self.update_existing(
                    cancel,
                    comment,
                    &refs,
                    &base_report,
                    &head_report,
                    &base_files,
                    &head_files,
                )
                .await
            }
            None => {
                self.publish_new(cancel, &refs, &base_report, &head_report, &base_files, &head_files)
                    .await
            }
        }
    }

    async fn checkout_base(&self, refs: &PullRefs) -> Result<()> {
        self.runner
            .run(&format!(
                "git fetch --no-tags --prune --depth=1 origin {}",
                refs.base_ref
            ))
            .await?;
        self.runner
            .run(&format!("git checkout origin/{}", refs.base_ref))
            .await?;
        self.runner.run(&self.options.install_command).await
    }

    async fn merge_head(&self, refs: &PullRefs) -> Result<()> {
        self.runner
            .run(&format!("git fetch --no-tags --prune origin {}", refs.head_ref))
            .await?;
        self.runner.run("git merge FETCH_HEAD").await?;
        self.runner.run(&self.options.install_command).await
    }

    #[allow(clippy::too_many_arguments)]
    async fn update_existing(
        &self,
        cancel: &CancellationToken,
        comment: IssueComment,
        refs: &PullRefs,
        base_report: &LighthouseReport,
        head_report: &LighthouseReport,
        base_files: &GistFiles,
        head_files: &GistFiles,
    ) -> Result<RunOutcome> {
        tracing::debug!(comment = %comment.html_url, "previous impact comment found");

        let Some(ids) = correlate::extract_gist_ids(&comment.body) else {
            tracing::error!(
                comment = %comment.html_url,
                "comment matches the impact marker but carries no valid gist ids; \
                 was it edited by hand?"
            );
            return Ok(RunOutcome::CommentCorrupted);
        };
        tracing::debug!(
            base = %gist_url(&ids.base),
            head = %gist_url(&ids.head),
            "gists referenced by previous comment"
        );

        let (base_existing, head_existing) = guarded(cancel, async {
            tokio::try_join!(self.artifacts.get(&ids.base), self.artifacts.get(&ids.head))
        })
        .await?;

        let base_gist = self
            .update_or_recreate(cancel, "base", base_existing, base_files)
            .await?;
        let head_gist = self
            .update_or_recreate(cancel, "head", head_existing, head_files)
            .await?;

        let body = render_body(base_report, head_report, &base_gist, &head_gist, refs);
        let updated = guarded(cancel, self.comments.update(comment.id, &body)).await?;
        tracing::info!(comment = %updated.html_url, "comment updated");

        Ok(RunOutcome::Published(PublishedImpact {
            base_gist,
            head_gist,
            comment: updated,
        }))
    }

    async fn update_or_recreate(
        &self,
        cancel: &CancellationToken,
        which: &str,
        existing: Option<Gist>,
        files: &GistFiles,
    ) -> Result<Gist> {
        match existing {
            Some(gist) => {
                tracing::debug!(which, id = %gist.id, "gist found, updating it");
                guarded(cancel, self.artifacts.update(&gist.id, files)).await
            }
            None => {
                tracing::debug!(which, "gist not found, creating it");
                guarded(
                    cancel,
                    self.artifacts.create(files, None, self.options.secret_gists),
                )
                .await
            }
        }
    }

    async fn publish_new(
        &self,
        cancel: &CancellationToken,
        refs: &PullRefs,
        base_report: &LighthouseReport,
        head_report: &LighthouseReport,
        base_files: &GistFiles,
        head_files: &GistFiles,
    ) -> Result<RunOutcome> {
        tracing::debug!("no previous impact comment, creating gists");
        let secret = self.options.secret_gists;
        let (base_gist, head_gist) = guarded(cancel, async {
            tokio::try_join!(
                self.artifacts.create(base_files, None, secret),
                self.artifacts.create(head_files, None, secret),
            )
        })
        .await?;
        tracing::debug!(
            base = %base_gist.html_url,
            head = %head_gist.html_url,
            "gists created"
        );

        let body = render_body(base_report, head_report, &base_gist, &head_gist, refs);
        let comment = guarded(cancel, self.comments.create(&body)).await?;
        tracing::info!(comment = %comment.html_url, "comment created");

        Ok(RunOutcome::Published(PublishedImpact {
            base_gist,
            head_gist,
            comment,
        }))
    }

    fn gist_file_name(&self, suffix: &str) -> String {
        format!(
            "{}-{}-pr-{}-{suffix}-lighthouse-report.json",
            self.options.locator.owner, self.options.locator.repo, self.options.locator.number
        )
    }
}

fn render_body(
    base_report: &LighthouseReport,
    head_report: &LighthouseReport,
    base_gist: &Gist,
    head_gist: &Gist,
    refs: &PullRefs,
) -> String {
    let comparison = compare_reports(base_report, head_report);
    let ctx = CommentContext {
        base_label: &refs.base_ref,
        head_label: &refs.head_ref,
        base_gist: Some(base_gist),
        head_gist: Some(head_gist),
        header_messages: Vec::new(),
    };
    generate_comment_body(&comparison, &ctx)
}

/// Await `operation`, abandoning it if `cancel` fires first.
///
/// An abandoned network call is dropped, not retried; its side effect may or
/// may not have happened.
async fn guarded<T>(
    cancel: &CancellationToken,
    operation: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ImpactError::Cancelled),
        result = operation => result,
    }
}
