//! Pull-request metadata and comment publication via the GitHub API.

use async_trait::async_trait;
use serde::Deserialize;

use lhimpact_core::{ImpactError, IssueComment, Result};

/// A pull request addressed as `owner/repo#number`.
#[derive(Debug, Clone)]
pub struct PullRequestLocator {
    /// Repository owner login.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Pull request number.
    pub number: u64,
}

impl PullRequestLocator {
    /// Browser URL of the pull request.
    pub fn url(&self) -> String {
        format!(
            "https://github.com/{}/{}/pull/{}",
            self.owner, self.repo, self.number
        )
    }
}

/// Parse a PR reference string (`owner/repo#number`) into its components.
///
/// # Errors
///
/// Returns [`ImpactError::Config`] if the format is invalid.
///
/// # Examples
///
/// ```
/// use lhimpact_github::pulls::parse_pr_reference;
///
/// let locator = parse_pr_reference("octocat/hello-world#42").unwrap();
/// assert_eq!(locator.owner, "octocat");
/// assert_eq!(locator.repo, "hello-world");
/// assert_eq!(locator.number, 42);
/// ```
pub fn parse_pr_reference(pr_ref: &str) -> Result<PullRequestLocator> {
    let Some((owner_repo, number_str)) = pr_ref.split_once('#') else {
        return Err(ImpactError::Config(format!(
            "invalid PR reference '{pr_ref}', expected owner/repo#number"
        )));
    };
    let Some((owner, repo)) = owner_repo.split_once('/') else {
        return Err(ImpactError::Config(format!(
            "invalid PR reference '{pr_ref}', expected owner/repo#number"
        )));
    };
    let number: u64 = number_str
        .parse()
        .map_err(|_| ImpactError::Config(format!("invalid PR number: {number_str}")))?;
    Ok(PullRequestLocator {
        owner: owner.to_string(),
        repo: repo.to_string(),
        number,
    })
}

/// Base and head branch names of a pull request.
#[derive(Debug, Clone)]
pub struct PullRefs {
    /// Branch the pull request merges into.
    pub base_ref: String,
    /// Branch the pull request merges from.
    pub head_ref: String,
}

/// Source of pull-request metadata.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// Resolve the pull request's base and head branch names.
    async fn refs(&self) -> Result<PullRefs>;
}

/// Store for the impact comment on one pull request.
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// First comment whose body satisfies `predicate`, if any.
    async fn find_matching(
        &self,
        predicate: &(dyn for<'a> Fn(&'a str) -> bool + Sync),
    ) -> Result<Option<IssueComment>>;
    /// Publish a new comment.
    async fn create(&self, body: &str) -> Result<IssueComment>;
    /// Replace the body of an existing comment.
    async fn update(&self, id: u64, body: &str) -> Result<IssueComment>;
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    base: BranchRef,
    head: BranchRef,
}

#[derive(Debug, Deserialize)]
struct BranchRef {
    #[serde(rename = "ref")]
    ref_name: String,
}

#[derive(Debug, serde::Serialize)]
struct CommentRequest<'a> {
    body: &'a str,
}

#[derive(Debug, serde::Serialize)]
struct ListCommentsQuery {
    per_page: u8,
}

/// GitHub client scoped to one pull request.
///
/// Fetches PR metadata and manages the impact comment through octocrab's
/// generic REST verbs.
pub struct GitHubPrClient {
    octocrab: octocrab::Octocrab,
    locator: PullRequestLocator,
}

impl GitHubPrClient {
    /// Create a client from a token and a pull-request locator.
    ///
    /// # Errors
    ///
    /// Returns [`ImpactError::GitHub`] if the underlying client cannot be
    /// built.
    pub fn new(token: &str, locator: PullRequestLocator) -> Result<Self> {
        let octocrab = octocrab::Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| ImpactError::GitHub(format!("failed to create GitHub client: {e}")))?;
        Ok(Self { octocrab, locator })
    }

    /// The pull request this client is scoped to.
    pub fn locator(&self) -> &PullRequestLocator {
        &self.locator
    }

    fn comments_route(&self) -> String {
        format!(
            "/repos/{}/{}/issues/{}/comments",
            self.locator.owner, self.locator.repo, self.locator.number
        )
    }
}

#[async_trait]
impl PullRequestSource for GitHubPrClient {
    async fn refs(&self) -> Result<PullRefs> {
        let route = format!(
            "/repos/{}/{}/pulls/{}",
            self.locator.owner, self.locator.repo, self.locator.number
        );
        let response: PullResponse = self
            .octocrab
            .get(route, None::<&()>)
            .await
            .map_err(|e| ImpactError::GitHub(format!("failed to fetch pull request: {e}")))?;
        Ok(PullRefs {
            base_ref: response.base.ref_name,
            head_ref: response.head.ref_name,
        })
    }
}

#[async_trait]
impl CommentStore for GitHubPrClient {
    async fn find_matching(
        &self,
        predicate: &(dyn for<'a> Fn(&'a str) -> bool + Sync),
    ) -> Result<Option<IssueComment>> {
        let comments: Vec<IssueComment> = self
            .octocrab
            .get(self.comments_route(), Some(&ListCommentsQuery { per_page: 100 }))
            .await
            .map_err(|e| {
                ImpactError::GitHub(format!("failed to list pull request comments: {e}"))
            })?;
        Ok(comments.into_iter().find(|c| predicate(&c.body)))
    }

    async fn create(&self, body: &str) -> Result<IssueComment> {
        self.octocrab
            .post(self.comments_route(), Some(&CommentRequest { body }))
            .await
            .map_err(|e| ImpactError::GitHub(format!("failed to create comment: {e}")))
    }

    async fn update(&self, id: u64, body: &str) -> Result<IssueComment> {
        let route = format!(
            "/repos/{}/{}/issues/comments/{id}",
            self.locator.owner, self.locator.repo
        );
        self.octocrab
            .patch(route, Some(&CommentRequest { body }))
            .await
            .map_err(|e| ImpactError::GitHub(format!("failed to update comment {id}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_pr_reference() {
        let locator = parse_pr_reference("rust-lang/rust#12345").unwrap();
        assert_eq!(locator.owner, "rust-lang");
        assert_eq!(locator.repo, "rust");
        assert_eq!(locator.number, 12345);
    }

    #[test]
    fn parse_pr_reference_missing_hash() {
        assert!(parse_pr_reference("owner/repo").is_err());
    }

    #[test]
    fn parse_pr_reference_missing_slash() {
        assert!(parse_pr_reference("repo#123").is_err());
    }

    #[test]
    fn parse_pr_reference_invalid_number() {
        assert!(parse_pr_reference("owner/repo#abc").is_err());
    }

    #[test]
    fn locator_url_is_the_pull_request_page() {
        let locator = parse_pr_reference("octocat/hello#7").unwrap();
        assert_eq!(locator.url(), "https://github.com/octocat/hello/pull/7");
    }
}
