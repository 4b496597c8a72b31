use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ImpactError;

/// A parsed Lighthouse report for one branch state.
///
/// Only the fields the comparison logic needs are modeled; everything else is
/// kept in `extra` so a report round-trips through serde intact and the gist
/// uploaded for the Lighthouse viewer stays complete.
///
/// Categories use an [`IndexMap`] so the report's own category order is
/// explicit and survives parsing, instead of depending on hash-map iteration.
///
/// # Examples
///
/// ```
/// use lhimpact_core::LighthouseReport;
///
/// let report = LighthouseReport::from_json(r#"{
///     "lighthouseVersion": "6.0.0",
///     "categories": { "performance": { "score": 0.97, "auditRefs": [] } },
///     "audits": {}
/// }"#).unwrap();
/// assert_eq!(report.lighthouse_version, "6.0.0");
/// assert_eq!(report.categories["performance"].score, Some(0.97));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LighthouseReport {
    /// Version of the Lighthouse tool that produced the report.
    pub lighthouse_version: String,
    /// Category name -> category result, in report order.
    #[serde(default)]
    pub categories: IndexMap<String, Category>,
    /// Audit id -> audit result, in report order.
    #[serde(default)]
    pub audits: IndexMap<String, Audit>,
    /// Unmodeled report fields, preserved for round-tripping.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl LighthouseReport {
    /// Parse a report from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ImpactError::Report`] if the content is not a valid report.
    pub fn from_json(content: &str) -> Result<Self, ImpactError> {
        serde_json::from_str(content)
            .map_err(|e| ImpactError::Report(format!("failed to parse lighthouse report: {e}")))
    }

    /// Read and parse a report from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ImpactError::FileNotFound`] if `path` does not exist, or
    /// [`ImpactError::Report`] if the content cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self, ImpactError> {
        if !path.exists() {
            return Err(ImpactError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

/// One scored category of a report (performance, accessibility, ...).
///
/// # Examples
///
/// ```
/// use lhimpact_core::Category;
///
/// let category: Category = serde_json::from_str(
///     r#"{ "score": 0.5, "auditRefs": [{ "id": "speed-index", "weight": 10 }] }"#,
/// ).unwrap();
/// assert_eq!(category.audit_refs[0].id, "speed-index");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Aggregate score in `0..=1`, or `null` when not computable.
    pub score: Option<f64>,
    /// Ordered references to the audits belonging to this category.
    #[serde(default)]
    pub audit_refs: Vec<AuditRef>,
    /// Unmodeled category fields, preserved for round-tripping.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A category's reference to an audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRef {
    /// Id of the referenced audit.
    pub id: String,
    /// Weight of the audit within the category score.
    pub weight: Option<f64>,
    /// Unmodeled reference fields, preserved for round-tripping.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A single audit result.
///
/// The meaning of `score` depends on [`Audit::score_display_mode`]: pass/fail
/// for binary audits, a `0..=1` fraction for numeric ones, absent or
/// irrelevant otherwise.
///
/// # Examples
///
/// ```
/// use lhimpact_core::{Audit, ScoreDisplayMode};
///
/// let audit: Audit = serde_json::from_str(r#"{
///     "id": "first-contentful-paint",
///     "scoreDisplayMode": "numeric",
///     "score": 0.98,
///     "numericValue": 1024.5,
///     "displayValue": "1.0 s"
/// }"#).unwrap();
/// assert_eq!(audit.score_display_mode, ScoreDisplayMode::Numeric);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    /// Audit id, matching the key in [`LighthouseReport::audits`].
    #[serde(default)]
    pub id: String,
    /// How the audit's result should be interpreted.
    #[serde(default)]
    pub score_display_mode: ScoreDisplayMode,
    /// Scored result, when the mode defines one.
    pub score: Option<f64>,
    /// Raw measured value (milliseconds, bytes, ...).
    pub numeric_value: Option<f64>,
    /// Human-readable rendering of the measured value.
    pub display_value: Option<String>,
    /// Unmodeled audit fields, preserved for round-tripping.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Classification of how an audit result should be interpreted.
///
/// Modes Lighthouse may introduce later deserialize to [`Unknown`] and render
/// as placeholders rather than failing the whole comparison.
///
/// [`Unknown`]: ScoreDisplayMode::Unknown
///
/// # Examples
///
/// ```
/// use lhimpact_core::ScoreDisplayMode;
///
/// let mode: ScoreDisplayMode = serde_json::from_str("\"binary\"").unwrap();
/// assert_eq!(mode, ScoreDisplayMode::Binary);
///
/// let future: ScoreDisplayMode = serde_json::from_str("\"holographic\"").unwrap();
/// assert_eq!(future, ScoreDisplayMode::Unknown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreDisplayMode {
    /// Manual check, never compared or displayed.
    Manual,
    /// Informational measurement without a pass/fail judgement.
    Informative,
    /// Pass/fail check.
    Binary,
    /// Scored measurement in `0..=1`.
    Numeric,
    /// Any mode this version does not understand.
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ScoreDisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreDisplayMode::Manual => write!(f, "manual"),
            ScoreDisplayMode::Informative => write!(f, "informative"),
            ScoreDisplayMode::Binary => write!(f, "binary"),
            ScoreDisplayMode::Numeric => write!(f, "numeric"),
            ScoreDisplayMode::Unknown => write!(f, "unknown"),
        }
    }
}

/// A hosted gist holding one raw report, identified by an opaque id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gist {
    /// Opaque gist id.
    pub id: String,
    /// Browser URL of the gist.
    pub html_url: String,
}

/// A pull-request comment as returned by the GitHub issues API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueComment {
    /// Numeric comment id.
    pub id: u64,
    /// Browser URL of the comment.
    pub html_url: String,
    /// Raw comment body.
    #[serde(default)]
    pub body: String,
}
