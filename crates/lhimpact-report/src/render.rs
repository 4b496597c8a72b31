//! Comment-body rendering.
//!
//! Turns a [`ReportComparison`] plus presentation context into the HTML-ish
//! document GitHub renders inside a pull-request comment. The output is
//! deterministic for identical inputs so re-publishing the same impact keeps
//! the comment byte-identical.

use std::fmt::Write;

use lhimpact_core::Gist;

use crate::compare::{AuditImpact, CategoryComparison, ReportComparison};
use crate::format::format_numeric_diff;

/// Marker identifying a comment as produced by this tool.
///
/// Also the needle used to find a previously published comment, so renderer
/// and correlator can never disagree on it.
pub const GENERATED_BY_MARKER: &str = "<!-- Generated by lhimpact -->";

const LIGHTHOUSE_VIEWER_URL: &str = "https://googlechrome.github.io/lighthouse/viewer/";
const PROJECT_URL: &str = "https://github.com/lhimpact/lhimpact";

/// Presentation context for one rendered document.
#[derive(Debug)]
pub struct CommentContext<'a> {
    /// Label of the base branch (shown in table headers).
    pub base_label: &'a str,
    /// Label of the head branch (shown in table headers).
    pub head_label: &'a str,
    /// Gist holding the base report, when already published.
    pub base_gist: Option<&'a Gist>,
    /// Gist holding the head report, when already published.
    pub head_gist: Option<&'a Gist>,
    /// Extra warning lines for the document header.
    pub header_messages: Vec<String>,
}

/// Render the full comment document.
///
/// The frame (marker, embedded gist ids, title, footer) is always emitted;
/// the category sections are dropped when the comparison was skipped for a
/// version mismatch, which instead adds a warning to the header block.
///
/// # Examples
///
/// ```
/// use lhimpact_core::LighthouseReport;
/// use lhimpact_report::compare::compare_reports;
/// use lhimpact_report::render::{generate_comment_body, CommentContext, GENERATED_BY_MARKER};
///
/// let report = LighthouseReport::from_json(r#"{
///     "lighthouseVersion": "6.0.0",
///     "categories": { "performance": { "score": 0.97, "auditRefs": [] } },
///     "audits": {}
/// }"#).unwrap();
/// let comparison = compare_reports(&report, &report);
/// let ctx = CommentContext {
///     base_label: "main",
///     head_label: "feature",
///     base_gist: None,
///     head_gist: None,
///     header_messages: Vec::new(),
/// };
/// let body = generate_comment_body(&comparison, &ctx);
/// assert!(body.starts_with(GENERATED_BY_MARKER));
/// ```
pub fn generate_comment_body(comparison: &ReportComparison, ctx: &CommentContext<'_>) -> String {
    let mut header_messages = ctx.header_messages.clone();
    if let Some(mismatch) = &comparison.version_mismatch {
        header_messages.push(format!(
            "**Warning:** impact analysis skipped because the Lighthouse version differs \
             between `{}` ({}) and `{}` ({}).",
            ctx.base_label, mismatch.base_version, ctx.head_label, mismatch.head_version,
        ));
    }

    let mut out = String::new();
    out.push_str(GENERATED_BY_MARKER);
    out.push('\n');
    if let Some(gist) = ctx.base_gist {
        let _ = writeln!(out, "<!-- base-gist-id={} -->", gist.id);
    }
    if let Some(gist) = ctx.head_gist {
        let _ = writeln!(out, "<!-- head-gist-id={} -->", gist.id);
    }
    out.push_str("<h3>Lighthouse merge impact</h3>\n");

    if !header_messages.is_empty() {
        out.push_str("\n---\n\n");
        out.push_str(&header_messages.join("\n\n"));
        out.push_str("\n\n---\n");
    }

    if comparison.version_mismatch.is_none() {
        for category in &comparison.categories {
            out.push('\n');
            out.push_str(&render_category(category, ctx));
            out.push('\n');
        }
    }

    out.push('\n');
    out.push_str(&render_footer(ctx));
    out
}

fn render_category(category: &CategoryComparison, ctx: &CommentContext<'_>) -> String {
    format!(
        "<details>\n  <summary>{} ({})</summary>\n  {}\n  {}\n</details>",
        category.name,
        format_numeric_diff(category.delta),
        render_category_score(category, ctx),
        render_category_audits(category, ctx),
    )
}

fn render_category_score(category: &CategoryComparison, ctx: &CommentContext<'_>) -> String {
    let header_cells = [
        "Impact".to_string(),
        ctx.base_label.to_string(),
        ctx.head_label.to_string(),
    ];
    let body_cells = [
        format_numeric_diff(category.delta),
        format!("{}", category.base_score),
        format!("{}", category.head_score),
    ];
    let mut out = String::new();
    let _ = write!(out, "<h3>Global impact on {}</h3>\n  ", category.name);
    out.push_str(&render_table(&header_cells, &[body_cells.to_vec()]));
    out
}

fn render_category_audits(category: &CategoryComparison, ctx: &CommentContext<'_>) -> String {
    let header_cells = [
        "Audit".to_string(),
        "Impact".to_string(),
        ctx.base_label.to_string(),
        ctx.head_label.to_string(),
    ];
    let rows: Vec<Vec<String>> = category
        .audits
        .iter()
        .map(|audit| {
            vec![
                audit.id.clone(),
                impact_cell(&audit.impact),
                audit.base.clone(),
                audit.head.clone(),
            ]
        })
        .collect();
    let mut out = String::new();
    let _ = write!(out, "<h3>Detailed impact on {}</h3>\n  ", category.name);
    out.push_str(&render_table(&header_cells, &rows));
    out
}

fn impact_cell(impact: &AuditImpact) -> String {
    match impact {
        AuditImpact::None => "none".to_string(),
        AuditImpact::Differs | AuditImpact::Unknown => "---".to_string(),
        AuditImpact::Changed => crate::compare::PASS_GLYPH.to_string(),
        AuditImpact::Delta(delta) => format_numeric_diff(*delta),
    }
}

fn render_table(header_cells: &[String], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    out.push_str("<table>\n    <thead>\n      <tr>\n");
    for cell in header_cells {
        let _ = writeln!(out, "        <th nowrap>{cell}</th>");
    }
    out.push_str("      </tr>\n    </thead>\n    <tbody>\n");
    for row in rows {
        out.push_str("      <tr>\n");
        for cell in row {
            let _ = writeln!(out, "        <td nowrap>{cell}</td>");
        }
        out.push_str("      </tr>\n");
    }
    out.push_str("    </tbody>\n  </table>");
    out
}

fn render_footer(ctx: &CommentContext<'_>) -> String {
    let mut out = String::new();
    if let (Some(base_gist), Some(head_gist)) = (ctx.base_gist, ctx.head_gist) {
        let _ = write!(
            out,
            "<sub>\n  Impact analyzed comparing \
             <a href=\"{viewer}?gist={base_id}\">{base_label} report</a> and \
             <a href=\"{viewer}?gist={head_id}\">report after merge</a>\n</sub>\n<br />\n",
            viewer = LIGHTHOUSE_VIEWER_URL,
            base_id = base_gist.id,
            base_label = ctx.base_label,
            head_id = head_gist.id,
        );
    }
    let _ = write!(
        out,
        "<sub>\n  Generated by <a href=\"{PROJECT_URL}\">lighthouse merge impact</a>\n</sub>",
    );
    out
}
