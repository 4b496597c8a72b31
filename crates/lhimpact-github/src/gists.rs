//! Gist persistence for raw Lighthouse reports.
//!
//! Each run stores the two full report JSON files as gists so the comment can
//! link them through the Lighthouse viewer. Gists are addressed by the opaque
//! ids embedded in a previously published comment.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;

use lhimpact_core::{Gist, ImpactError, Result};

const GITHUB_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "lhimpact";

/// Ordered filename -> content mapping in the gist wire shape.
///
/// # Examples
///
/// ```
/// use lhimpact_github::gists::GistFiles;
///
/// let files = GistFiles::single("report.json", "{}");
/// let wire = serde_json::to_string(&files).unwrap();
/// assert_eq!(wire, r#"{"report.json":{"content":"{}"}}"#);
/// ```
#[derive(Debug, Clone, Default, Serialize)]
pub struct GistFiles(IndexMap<String, GistFile>);

/// One file inside a gist.
#[derive(Debug, Clone, Serialize)]
pub struct GistFile {
    /// Full file content.
    pub content: String,
}

impl GistFiles {
    /// A gist payload holding exactly one file.
    pub fn single(name: impl Into<String>, content: impl Into<String>) -> Self {
        let mut files = IndexMap::new();
        files.insert(
            name.into(),
            GistFile {
                content: content.into(),
            },
        );
        Self(files)
    }
}

/// Store for the per-branch report artifacts.
///
/// The GitHub-backed implementation is [`GistStore`]; pipeline tests use an
/// in-memory fake.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Create a new artifact from `files`.
    async fn create(&self, files: &GistFiles, description: Option<&str>, secret: bool)
        -> Result<Gist>;
    /// Replace the files of an existing artifact.
    async fn update(&self, id: &str, files: &GistFiles) -> Result<Gist>;
    /// Fetch an artifact, `None` when it no longer exists.
    async fn get(&self, id: &str) -> Result<Option<Gist>>;
}

/// [`ArtifactStore`] backed by the GitHub gists REST API.
pub struct GistStore {
    http: reqwest::Client,
    token: String,
}

#[derive(Serialize)]
struct CreateGistRequest<'a> {
    files: &'a GistFiles,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    public: bool,
}

#[derive(Serialize)]
struct UpdateGistRequest<'a> {
    files: &'a GistFiles,
}

impl GistStore {
    /// Create a store publishing with `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
        }
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", USER_AGENT)
    }

    async fn parse_gist(response: reqwest::Response, action: &str) -> Result<Gist> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImpactError::GitHub(format!(
                "failed to {action} gist: {status}: {body}"
            )));
        }
        response
            .json::<Gist>()
            .await
            .map_err(|e| ImpactError::GitHub(format!("failed to read gist response: {e}")))
    }
}

#[async_trait]
impl ArtifactStore for GistStore {
    async fn create(
        &self,
        files: &GistFiles,
        description: Option<&str>,
        secret: bool,
    ) -> Result<Gist> {
        let url = format!("{GITHUB_API_URL}/gists");
        let response = self
            .request(reqwest::Method::POST, &url)
            .json(&CreateGistRequest {
                files,
                description,
                public: !secret,
            })
            .send()
            .await
            .map_err(|e| ImpactError::GitHub(format!("failed to create gist: {e}")))?;
        Self::parse_gist(response, "create").await
    }

    async fn update(&self, id: &str, files: &GistFiles) -> Result<Gist> {
        let url = format!("{GITHUB_API_URL}/gists/{id}");
        let response = self
            .request(reqwest::Method::PATCH, &url)
            .json(&UpdateGistRequest { files })
            .send()
            .await
            .map_err(|e| ImpactError::GitHub(format!("failed to update gist {id}: {e}")))?;
        Self::parse_gist(response, "update").await
    }

    async fn get(&self, id: &str) -> Result<Option<Gist>> {
        let url = format!("{GITHUB_API_URL}/gists/{id}");
        let response = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(|e| ImpactError::GitHub(format!("failed to fetch gist {id}: {e}")))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::parse_gist(response, "fetch").await.map(Some)
    }
}

/// Browser URL of a gist addressed only by id.
pub fn gist_url(id: &str) -> String {
    format!("https://gist.github.com/{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_file_serializes_to_wire_shape() {
        let files = GistFiles::single("a-report.json", "{\"x\":1}");
        let wire = serde_json::to_value(&files).unwrap();
        assert_eq!(wire["a-report.json"]["content"], "{\"x\":1}");
    }

    #[test]
    fn create_request_omits_absent_description() {
        let files = GistFiles::single("r.json", "{}");
        let wire = serde_json::to_value(CreateGistRequest {
            files: &files,
            description: None,
            public: true,
        })
        .unwrap();
        assert!(wire.get("description").is_none());
        assert_eq!(wire["public"], true);
    }

    #[test]
    fn gist_url_embeds_the_id() {
        assert_eq!(gist_url("abc123"), "https://gist.github.com/abc123");
    }
}
