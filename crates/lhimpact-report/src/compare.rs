//! Report comparison: aligns two Lighthouse reports into a structured diff.
//!
//! The comparison walks the base report's categories in report order and
//! classifies every non-manual audit. Rendering is handled separately in
//! [`crate::render`]; this module computes only the structured result.

use lhimpact_core::{Audit, Category, LighthouseReport, ScoreDisplayMode};
use serde::Serialize;

use crate::format::round_two;

/// Glyph shown for a passing binary audit.
pub const PASS_GLYPH: &str = "✔";
/// Glyph shown for a failing binary audit.
pub const FAIL_GLYPH: &str = "☓";
/// Cell placeholder for values that cannot be compared.
pub const PLACEHOLDER: &str = "---";

/// Structured difference between two reports.
///
/// When the tool versions differ, `categories` is empty and
/// `version_mismatch` explains why; score comparison across Lighthouse
/// versions would not be meaningful.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportComparison {
    /// Set when the two reports were produced by different Lighthouse
    /// versions, in which case no categories are compared.
    pub version_mismatch: Option<VersionMismatch>,
    /// Per-category comparisons, in the base report's category order.
    pub categories: Vec<CategoryComparison>,
}

/// The two diverging tool versions behind a skipped comparison.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMismatch {
    /// Version that produced the base report.
    pub base_version: String,
    /// Version that produced the head report.
    pub head_version: String,
}

/// Comparison of one category across the two reports.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryComparison {
    /// Category name (`performance`, `seo`, ...).
    pub name: String,
    /// Base score, rounded to two decimals. A `null` score counts as `0`.
    pub base_score: f64,
    /// Head score, rounded to two decimals. A `null` score counts as `0`.
    pub head_score: f64,
    /// `head_score - base_score`, rounded to two decimals.
    pub delta: f64,
    /// Per-audit impact rows, in the category's audit-ref order.
    pub audits: Vec<AuditComparison>,
}

/// Comparison of one audit across the two reports.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditComparison {
    /// Audit id.
    pub id: String,
    /// Impact classification.
    pub impact: AuditImpact,
    /// Display value for the base branch.
    pub base: String,
    /// Display value for the head branch.
    pub head: String,
}

/// Impact classification of a single audit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AuditImpact {
    /// Both sides are equal.
    None,
    /// An informative value changed; no magnitude is computed.
    Differs,
    /// A binary audit flipped. Direction is not tracked.
    Changed,
    /// A numeric audit's score moved by this amount.
    Delta(f64),
    /// The display mode is not understood; nothing was compared.
    Unknown,
}

/// Compare two reports category by category.
///
/// Categories or audits present in the base report but absent from the head
/// report are skipped with a warning rather than failing the run.
///
/// # Examples
///
/// ```
/// use lhimpact_core::LighthouseReport;
/// use lhimpact_report::compare::compare_reports;
///
/// let report = LighthouseReport::from_json(r#"{
///     "lighthouseVersion": "6.0.0",
///     "categories": { "performance": { "score": 0.97, "auditRefs": [] } },
///     "audits": {}
/// }"#).unwrap();
/// let comparison = compare_reports(&report, &report);
/// assert!(comparison.version_mismatch.is_none());
/// assert_eq!(comparison.categories[0].delta, 0.0);
/// ```
pub fn compare_reports(base: &LighthouseReport, head: &LighthouseReport) -> ReportComparison {
    if base.lighthouse_version != head.lighthouse_version {
        return ReportComparison {
            version_mismatch: Some(VersionMismatch {
                base_version: base.lighthouse_version.clone(),
                head_version: head.lighthouse_version.clone(),
            }),
            categories: Vec::new(),
        };
    }

    let mut categories = Vec::new();
    for (name, base_category) in &base.categories {
        let Some(head_category) = head.categories.get(name) else {
            tracing::warn!(category = %name, "category missing from head report, skipping");
            continue;
        };
        categories.push(compare_category(name, base_category, head_category, base, head));
    }

    ReportComparison {
        version_mismatch: None,
        categories,
    }
}

fn compare_category(
    name: &str,
    base_category: &Category,
    head_category: &Category,
    base: &LighthouseReport,
    head: &LighthouseReport,
) -> CategoryComparison {
    let base_score = round_two(base_category.score.unwrap_or(0.0));
    let head_score = round_two(head_category.score.unwrap_or(0.0));

    let mut audits = Vec::new();
    for audit_ref in &base_category.audit_refs {
        let (Some(base_audit), Some(head_audit)) =
            (base.audits.get(&audit_ref.id), head.audits.get(&audit_ref.id))
        else {
            tracing::warn!(audit = %audit_ref.id, "audit missing from a report, skipping");
            continue;
        };
        if let Some(row) = compare_audit(&audit_ref.id, base_audit, head_audit) {
            audits.push(row);
        }
    }

    CategoryComparison {
        name: name.to_string(),
        base_score,
        head_score,
        delta: round_two(head_score - base_score),
        audits,
    }
}

fn compare_audit(id: &str, base: &Audit, head: &Audit) -> Option<AuditComparison> {
    match base.score_display_mode {
        // manual checks cannot be compared and there is no use displaying them
        ScoreDisplayMode::Manual => None,
        ScoreDisplayMode::Informative => compare_informative(id, base, head),
        ScoreDisplayMode::Binary => Some(compare_binary(id, base, head)),
        ScoreDisplayMode::Numeric => Some(compare_numeric(id, base, head)),
        ScoreDisplayMode::Unknown => Some(AuditComparison {
            id: id.to_string(),
            impact: AuditImpact::Unknown,
            base: PLACEHOLDER.to_string(),
            head: PLACEHOLDER.to_string(),
        }),
    }
}

fn compare_informative(id: &str, base: &Audit, head: &Audit) -> Option<AuditComparison> {
    if let Some(base_numeric) = base.numeric_value {
        let impact = if base.numeric_value == head.numeric_value {
            AuditImpact::None
        } else {
            AuditImpact::Differs
        };
        return Some(AuditComparison {
            id: id.to_string(),
            impact,
            base: informative_cell(base.display_value.as_deref(), Some(base_numeric)),
            head: informative_cell(head.display_value.as_deref(), head.numeric_value),
        });
    }
    if let Some(base_display) = &base.display_value {
        let impact = if head.display_value.as_deref() == Some(base_display.as_str()) {
            AuditImpact::None
        } else {
            AuditImpact::Differs
        };
        return Some(AuditComparison {
            id: id.to_string(),
            impact,
            base: base_display.clone(),
            head: head.display_value.clone().unwrap_or_default(),
        });
    }
    // neither a numeric nor a display value: nothing to show
    None
}

fn compare_binary(id: &str, base: &Audit, head: &Audit) -> AuditComparison {
    if base.score == head.score {
        let glyph = if is_truthy(base.score) { PASS_GLYPH } else { FAIL_GLYPH };
        return AuditComparison {
            id: id.to_string(),
            impact: AuditImpact::None,
            base: glyph.to_string(),
            head: glyph.to_string(),
        };
    }
    AuditComparison {
        id: id.to_string(),
        impact: AuditImpact::Changed,
        base: FAIL_GLYPH.to_string(),
        head: PASS_GLYPH.to_string(),
    }
}

fn compare_numeric(id: &str, base: &Audit, head: &Audit) -> AuditComparison {
    let impact = if base.score == head.score {
        AuditImpact::None
    } else {
        AuditImpact::Delta(head.score.unwrap_or(0.0) - base.score.unwrap_or(0.0))
    };
    AuditComparison {
        id: id.to_string(),
        impact,
        base: score_cell(base.score),
        head: score_cell(head.score),
    }
}

fn informative_cell(display: Option<&str>, numeric: Option<f64>) -> String {
    match (display, numeric) {
        (Some(display), _) => display.to_string(),
        (None, Some(numeric)) => format!("{numeric}"),
        (None, None) => String::new(),
    }
}

fn score_cell(score: Option<f64>) -> String {
    match score {
        Some(value) => format!("{value}"),
        None => "null".to_string(),
    }
}

fn is_truthy(score: Option<f64>) -> bool {
    score.is_some_and(|s| s != 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lhimpact_core::LighthouseReport;

    fn report(version: &str, audits_json: &str, refs_json: &str, score: f64) -> LighthouseReport {
        LighthouseReport::from_json(&format!(
            r#"{{
                "lighthouseVersion": "{version}",
                "categories": {{
                    "performance": {{ "score": {score}, "auditRefs": {refs_json} }}
                }},
                "audits": {audits_json}
            }}"#
        ))
        .unwrap()
    }

    #[test]
    fn version_mismatch_skips_categories() {
        let base = report("6.0", "{}", "[]", 0.9);
        let head = report("6.1", "{}", "[]", 0.9);
        let comparison = compare_reports(&base, &head);
        let mismatch = comparison.version_mismatch.unwrap();
        assert_eq!(mismatch.base_version, "6.0");
        assert_eq!(mismatch.head_version, "6.1");
        assert!(comparison.categories.is_empty());
    }

    #[test]
    fn identical_reports_have_zero_delta_and_no_impact() {
        let audits = r#"{ "uses-http2": { "scoreDisplayMode": "binary", "score": 1 } }"#;
        let refs = r#"[{ "id": "uses-http2" }]"#;
        let base = report("6.0", audits, refs, 0.97);
        let comparison = compare_reports(&base, &base);
        let category = &comparison.categories[0];
        assert_eq!(category.delta, 0.0);
        assert_eq!(category.audits[0].impact, AuditImpact::None);
    }

    #[test]
    fn rounded_equal_scores_give_zero_delta() {
        let base = report("6.0", "{}", "[]", 0.9012);
        let head = report("6.0", "{}", "[]", 0.9043);
        let comparison = compare_reports(&base, &head);
        assert_eq!(comparison.categories[0].delta, 0.0);
    }

    #[test]
    fn two_decimal_delta_carries_no_float_dust() {
        let base = report("6.0", "{}", "[]", 0.9);
        let head = report("6.0", "{}", "[]", 0.97);
        let comparison = compare_reports(&base, &head);
        assert_eq!(comparison.categories[0].delta, 0.07);
    }

    #[test]
    fn null_category_score_counts_as_zero() {
        let base = LighthouseReport::from_json(
            r#"{
                "lighthouseVersion": "6.0",
                "categories": { "seo": { "score": null, "auditRefs": [] } },
                "audits": {}
            }"#,
        )
        .unwrap();
        let comparison = compare_reports(&base, &base);
        assert_eq!(comparison.categories[0].base_score, 0.0);
    }

    #[test]
    fn manual_audits_are_excluded() {
        let audits = r#"{ "structured-data": { "scoreDisplayMode": "manual", "score": null } }"#;
        let refs = r#"[{ "id": "structured-data" }]"#;
        let base = report("6.0", audits, refs, 0.5);
        let comparison = compare_reports(&base, &base);
        assert!(comparison.categories[0].audits.is_empty());
    }

    #[test]
    fn binary_pass_on_both_sides_shows_pass_glyphs() {
        let audits = r#"{ "uses-http2": { "scoreDisplayMode": "binary", "score": 1 } }"#;
        let refs = r#"[{ "id": "uses-http2" }]"#;
        let base = report("6.0", audits, refs, 0.5);
        let comparison = compare_reports(&base, &base);
        let row = &comparison.categories[0].audits[0];
        assert_eq!(row.impact, AuditImpact::None);
        assert_eq!(row.base, PASS_GLYPH);
        assert_eq!(row.head, PASS_GLYPH);
    }

    #[test]
    fn binary_flip_shows_fail_then_pass() {
        let base_audits = r#"{ "uses-http2": { "scoreDisplayMode": "binary", "score": 0 } }"#;
        let head_audits = r#"{ "uses-http2": { "scoreDisplayMode": "binary", "score": 1 } }"#;
        let refs = r#"[{ "id": "uses-http2" }]"#;
        let base = report("6.0", base_audits, refs, 0.5);
        let head = report("6.0", head_audits, refs, 0.5);
        let comparison = compare_reports(&base, &head);
        let row = &comparison.categories[0].audits[0];
        assert_eq!(row.impact, AuditImpact::Changed);
        assert_eq!(row.base, FAIL_GLYPH);
        assert_eq!(row.head, PASS_GLYPH);
    }

    #[test]
    fn numeric_change_carries_the_score_delta() {
        let base_audits = r#"{ "speed-index": { "scoreDisplayMode": "numeric", "score": 0.8 } }"#;
        let head_audits = r#"{ "speed-index": { "scoreDisplayMode": "numeric", "score": 0.9 } }"#;
        let refs = r#"[{ "id": "speed-index" }]"#;
        let base = report("6.0", base_audits, refs, 0.5);
        let head = report("6.0", head_audits, refs, 0.5);
        let comparison = compare_reports(&base, &head);
        let row = &comparison.categories[0].audits[0];
        match row.impact {
            AuditImpact::Delta(delta) => assert!((delta - 0.1).abs() < 1e-9),
            ref other => panic!("expected delta impact, got {other:?}"),
        }
        assert_eq!(row.base, "0.8");
        assert_eq!(row.head, "0.9");
    }

    #[test]
    fn informative_prefers_display_value_over_numeric() {
        let base_audits = r#"{
            "total-byte-weight": {
                "scoreDisplayMode": "informative",
                "numericValue": 1024.0,
                "displayValue": "1 KiB"
            }
        }"#;
        let head_audits = r#"{
            "total-byte-weight": {
                "scoreDisplayMode": "informative",
                "numericValue": 2048.0,
                "displayValue": "2 KiB"
            }
        }"#;
        let refs = r#"[{ "id": "total-byte-weight" }]"#;
        let base = report("6.0", base_audits, refs, 0.5);
        let head = report("6.0", head_audits, refs, 0.5);
        let comparison = compare_reports(&base, &head);
        let row = &comparison.categories[0].audits[0];
        assert_eq!(row.impact, AuditImpact::Differs);
        assert_eq!(row.base, "1 KiB");
        assert_eq!(row.head, "2 KiB");
    }

    #[test]
    fn informative_without_values_is_skipped() {
        let audits = r#"{ "diagnostics": { "scoreDisplayMode": "informative" } }"#;
        let refs = r#"[{ "id": "diagnostics" }]"#;
        let base = report("6.0", audits, refs, 0.5);
        let comparison = compare_reports(&base, &base);
        assert!(comparison.categories[0].audits.is_empty());
    }

    #[test]
    fn informative_display_values_compare_by_equality() {
        let base_audits =
            r#"{ "lcp-element": { "scoreDisplayMode": "informative", "displayValue": "div" } }"#;
        let head_audits =
            r#"{ "lcp-element": { "scoreDisplayMode": "informative", "displayValue": "img" } }"#;
        let refs = r#"[{ "id": "lcp-element" }]"#;
        let base = report("6.0", base_audits, refs, 0.5);
        let head = report("6.0", head_audits, refs, 0.5);
        let comparison = compare_reports(&base, &head);
        let row = &comparison.categories[0].audits[0];
        assert_eq!(row.impact, AuditImpact::Differs);
    }

    #[test]
    fn unknown_mode_renders_placeholders() {
        let audits = r#"{ "weird": { "scoreDisplayMode": "holographic", "score": 1 } }"#;
        let refs = r#"[{ "id": "weird" }]"#;
        let base = report("6.0", audits, refs, 0.5);
        let comparison = compare_reports(&base, &base);
        let row = &comparison.categories[0].audits[0];
        assert_eq!(row.impact, AuditImpact::Unknown);
        assert_eq!(row.base, PLACEHOLDER);
        assert_eq!(row.head, PLACEHOLDER);
    }

    #[test]
    fn category_missing_from_head_is_skipped() {
        let base = report("6.0", "{}", "[]", 0.9);
        let head = LighthouseReport::from_json(
            r#"{ "lighthouseVersion": "6.0", "categories": {}, "audits": {} }"#,
        )
        .unwrap();
        let comparison = compare_reports(&base, &head);
        assert!(comparison.version_mismatch.is_none());
        assert!(comparison.categories.is_empty());
    }
}
