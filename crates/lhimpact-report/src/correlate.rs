//! Correlation of an existing comment with its published gists.
//!
//! A published comment embeds the two gist ids as HTML comments so a later
//! run can update the same artifacts instead of creating new ones.

use std::sync::LazyLock;

use regex::Regex;

use crate::render::GENERATED_BY_MARKER;

static BASE_GIST_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("<!-- base-gist-id=([a-zA-Z0-9_]+) -->").expect("base gist id pattern is valid")
});
static HEAD_GIST_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("<!-- head-gist-id=([a-zA-Z0-9_]+) -->").expect("head gist id pattern is valid")
});

/// The pair of gist ids recovered from a previously published comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GistIds {
    /// Gist holding the base report.
    pub base: String,
    /// Gist holding the head (merged) report.
    pub head: String,
}

/// Whether `body` was produced by this tool.
///
/// This is the predicate used to find a previously published comment among a
/// pull request's comments.
///
/// # Examples
///
/// ```
/// use lhimpact_report::correlate::body_is_impact_comment;
/// use lhimpact_report::render::GENERATED_BY_MARKER;
///
/// assert!(body_is_impact_comment(&format!("{GENERATED_BY_MARKER}\nhello")));
/// assert!(!body_is_impact_comment("just a review comment"));
/// ```
pub fn body_is_impact_comment(body: &str) -> bool {
    body.contains(GENERATED_BY_MARKER)
}

/// Extract both embedded gist ids from a comment body.
///
/// Returns `None` unless both markers are present and well-formed: a comment
/// that matched the generated-by marker but lost its ids was corrupted or
/// hand-edited, and the caller must treat that as a recoverable anomaly.
///
/// # Examples
///
/// ```
/// use lhimpact_report::correlate::extract_gist_ids;
///
/// let body = "<!-- base-gist-id=abc -->\n<!-- head-gist-id=def -->";
/// let ids = extract_gist_ids(body).unwrap();
/// assert_eq!(ids.base, "abc");
/// assert_eq!(ids.head, "def");
///
/// assert!(extract_gist_ids("<!-- base-gist-id=abc -->").is_none());
/// ```
pub fn extract_gist_ids(body: &str) -> Option<GistIds> {
    let base = BASE_GIST_ID.captures(body)?.get(1)?.as_str().to_string();
    let head = HEAD_GIST_ID.captures(body)?.get(1)?.as_str().to_string();
    Some(GistIds { base, head })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_both_ids() {
        let body = "intro\n<!-- base-gist-id=a1_B2 -->\n<!-- head-gist-id=c3d4 -->\noutro";
        let ids = extract_gist_ids(body).unwrap();
        assert_eq!(ids.base, "a1_B2");
        assert_eq!(ids.head, "c3d4");
    }

    #[test]
    fn missing_head_marker_yields_none() {
        assert!(extract_gist_ids("<!-- base-gist-id=a1 -->").is_none());
    }

    #[test]
    fn missing_base_marker_yields_none() {
        assert!(extract_gist_ids("<!-- head-gist-id=a1 -->").is_none());
    }

    #[test]
    fn malformed_id_is_rejected() {
        let body = "<!-- base-gist-id=a/b -->\n<!-- head-gist-id=ok -->";
        assert!(extract_gist_ids(body).is_none());
    }

    #[test]
    fn marker_predicate_matches_generated_comments() {
        assert!(body_is_impact_comment(GENERATED_BY_MARKER));
        assert!(!body_is_impact_comment("<!-- Generated by something else -->"));
    }
}
