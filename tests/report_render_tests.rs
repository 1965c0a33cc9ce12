use finsight::render::report::render_report;
use finsight::types::{FactCheck, ResultPayload, Verification};

fn sample_payload() -> ResultPayload {
    ResultPayload {
        short_summary: "Apple delivered strong results. Buy.".to_string(),
        markdown_report: "# Apple Inc.\n\n**Revenue** grew again.\n\n- Services up\n- Margins steady"
            .to_string(),
        follow_up_questions: vec!["How durable is services growth?".to_string()],
        verification: Verification {
            verified: true,
            issues: String::new(),
            fact_checks: vec![FactCheck {
                claim: "Revenue grew year over year".to_string(),
                evidence: "Q3 filing".to_string(),
                verified: true,
                source_url: Some("https://example.com/filing".to_string()),
            }],
        },
    }
}

#[test]
fn test_report_renders_company_badge_and_sections() {
    let html = render_report(&sample_payload());
    assert!(html.contains(r#"<section class="report">"#));
    assert!(html.contains("Apple"));
    assert!(html.contains(r#"badge badge-buy"#));
    assert!(html.contains("<h1>Apple Inc.</h1>"));
    assert!(html.contains("<strong>Revenue</strong>"));
    assert!(html.contains("<li>Services up</li>"));
    assert!(html.contains("Verification Passed"));
    assert!(html.contains(r#"href="https://example.com/filing""#));
    assert!(html.contains("How durable is services growth?"));
}

#[test]
fn test_rendering_is_pure_and_repeatable() {
    let payload = sample_payload();
    assert_eq!(render_report(&payload), render_report(&payload));
}

#[test]
fn test_failed_verification_lists_issues() {
    let mut payload = sample_payload();
    payload.short_summary = "Avoid this one. Negative outlook.".to_string();
    payload.verification = Verification {
        verified: false,
        issues: "Two claims could not be sourced".to_string(),
        fact_checks: vec![FactCheck {
            claim: "Margins doubled".to_string(),
            evidence: String::new(),
            verified: false,
            source_url: None,
        }],
    };

    let html = render_report(&payload);
    assert!(html.contains("badge badge-sell"));
    assert!(html.contains("Issues Found"));
    assert!(html.contains("Two claims could not be sourced"));
    assert!(html.contains("fact-failed"));
}

#[test]
fn test_payload_text_is_html_escaped() {
    let mut payload = sample_payload();
    payload.short_summary = "Risky <script>alert(1)</script> & more. Buy.".to_string();
    let html = render_report(&payload);
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
    assert!(html.contains("&amp; more"));
}

#[test]
fn test_exported_report_round_trips_through_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("report.html");

    let html = render_report(&sample_payload());
    std::fs::write(&path, &html).expect("write report");

    let read_back = std::fs::read_to_string(&path).expect("read report");
    assert_eq!(read_back, html);
}
