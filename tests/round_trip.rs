use lhimpact_core::{Gist, LighthouseReport};
use lhimpact_report::compare::compare_reports;
use lhimpact_report::correlate::extract_gist_ids;
use lhimpact_report::render::{generate_comment_body, CommentContext};

fn report(version: &str) -> LighthouseReport {
    LighthouseReport::from_json(&format!(
        r#"{{
            "lighthouseVersion": "{version}",
            "categories": {{
                "performance": {{
                    "score": 0.93,
                    "auditRefs": [
                        {{ "id": "uses-http2" }},
                        {{ "id": "speed-index" }},
                        {{ "id": "structured-data" }}
                    ]
                }},
                "accessibility": {{ "score": 1, "auditRefs": [] }}
            }},
            "audits": {{
                "uses-http2": {{ "scoreDisplayMode": "binary", "score": 1 }},
                "speed-index": {{ "scoreDisplayMode": "numeric", "score": 0.88 }},
                "structured-data": {{ "scoreDisplayMode": "manual", "score": null }}
            }}
        }}"#
    ))
    .unwrap()
}

fn gist(id: &str) -> Gist {
    Gist {
        id: id.to_string(),
        html_url: format!("https://gist.github.com/{id}"),
    }
}

#[test]
fn rendered_document_round_trips_through_the_correlator() {
    let base_report = report("6.0");
    let comparison = compare_reports(&base_report, &base_report);
    let base = gist("baseGist_1");
    let head = gist("headGist_2");
    let ctx = CommentContext {
        base_label: "master",
        head_label: "feature",
        base_gist: Some(&base),
        head_gist: Some(&head),
        header_messages: Vec::new(),
    };
    let body = generate_comment_body(&comparison, &ctx);

    let ids = extract_gist_ids(&body).expect("ids should be recoverable");
    assert_eq!(ids.base, "baseGist_1");
    assert_eq!(ids.head, "headGist_2");
}

#[test]
fn version_mismatch_renders_warning_without_category_sections() {
    let base_report = report("6.0");
    let head_report = report("6.1");
    let comparison = compare_reports(&base_report, &head_report);
    let ctx = CommentContext {
        base_label: "master",
        head_label: "feature",
        base_gist: None,
        head_gist: None,
        header_messages: Vec::new(),
    };
    let body = generate_comment_body(&comparison, &ctx);

    assert!(body.contains("**Warning:**"));
    assert!(body.contains("(6.0)"));
    assert!(body.contains("(6.1)"));
    assert!(!body.contains("<details>"));
    assert!(!body.contains("Global impact"));
}

#[test]
fn identical_reports_render_zero_deltas_and_no_impacts() {
    let base_report = report("6.0");
    let comparison = compare_reports(&base_report, &base_report);
    let ctx = CommentContext {
        base_label: "master",
        head_label: "feature",
        base_gist: None,
        head_gist: None,
        header_messages: Vec::new(),
    };
    let body = generate_comment_body(&comparison, &ctx);

    assert!(body.contains("<summary>performance (0)</summary>"));
    assert!(body.contains("<summary>accessibility (0)</summary>"));
    assert!(body.contains("<td nowrap>none</td>"));
    // manual audits never reach the detailed table
    assert!(!body.contains("structured-data"));
}
