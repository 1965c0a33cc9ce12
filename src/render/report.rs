//! Pure mapping from a finished result payload to an HTML fragment. No I/O
//! and no shared state: rendering the same payload twice yields identical
//! output.

use super::markdown::{escape_html, to_html};
use super::{company_name, recommendation};
use crate::types::{ResultPayload, Verification};
use std::fmt::Write;

pub fn render_report(payload: &ResultPayload) -> String {
    let badge = recommendation(&payload.short_summary);
    let company =
        company_name(&payload.short_summary).unwrap_or_else(|| "Unknown".to_string());

    let mut out = String::new();
    out.push_str("<section class=\"report\">\n");
    let _ = writeln!(
        out,
        "<header class=\"report-header\"><span class=\"company\">{}</span><span class=\"badge {}\">{}</span></header>",
        escape_html(&company),
        badge.badge_class(),
        badge.label()
    );
    let _ = writeln!(
        out,
        "<p class=\"summary\">{}</p>",
        escape_html(&payload.short_summary)
    );
    out.push_str("<div class=\"report-body\">\n");
    out.push_str(&to_html(&payload.markdown_report));
    out.push_str("</div>\n");
    out.push_str(&render_verification(&payload.verification));
    out.push_str(&render_follow_ups(&payload.follow_up_questions));
    out.push_str("</section>\n");
    out
}

fn render_verification(verification: &Verification) -> String {
    let (panel_class, title) = if verification.verified {
        ("verification verification-passed", "Verification Passed")
    } else {
        ("verification verification-failed", "Issues Found")
    };

    let mut out = String::new();
    let _ = writeln!(out, "<div class=\"{panel_class}\">");
    let _ = writeln!(out, "<h3>{title}</h3>");
    if !verification.issues.is_empty() {
        let _ = writeln!(
            out,
            "<p class=\"issues\">{}</p>",
            escape_html(&verification.issues)
        );
    }
    if !verification.fact_checks.is_empty() {
        out.push_str("<ul class=\"fact-checks\">\n");
        for check in &verification.fact_checks {
            let (item_class, mark) = if check.verified {
                ("fact-check fact-verified", "&#10003;")
            } else {
                ("fact-check fact-failed", "&#10007;")
            };
            let _ = write!(
                out,
                "<li class=\"{item_class}\">{mark} {}<span class=\"evidence\">{}</span>",
                escape_html(&check.claim),
                escape_html(&check.evidence)
            );
            if let Some(url) = &check.source_url {
                let _ = write!(
                    out,
                    " <a class=\"source\" href=\"{}\">source</a>",
                    escape_html(url)
                );
            }
            out.push_str("</li>\n");
        }
        out.push_str("</ul>\n");
    }
    out.push_str("</div>\n");
    out
}

fn render_follow_ups(questions: &[String]) -> String {
    if questions.is_empty() {
        return String::new();
    }
    let mut out = String::from("<ul class=\"follow-ups\">\n");
    for question in questions {
        let _ = writeln!(out, "<li>{}</li>", escape_html(question));
    }
    out.push_str("</ul>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FactCheck;

    fn payload() -> ResultPayload {
        ResultPayload {
            short_summary: "We recommend a strong buy for Amazon".to_string(),
            markdown_report: "# Outlook\n\nRevenue is **growing**.".to_string(),
            follow_up_questions: vec!["What about AWS margins?".to_string()],
            verification: Verification {
                verified: true,
                issues: String::new(),
                fact_checks: vec![FactCheck {
                    claim: "Revenue grew 10%".to_string(),
                    evidence: "10-K filing".to_string(),
                    verified: true,
                    source_url: Some("https://example.com/10k".to_string()),
                }],
            },
        }
    }

    #[test]
    fn test_badge_and_company_in_header() {
        let html = render_report(&payload());
        assert!(html.contains("badge badge-buy"));
        assert!(html.contains(">Buy<"));
        assert!(html.contains("<span class=\"company\">Amazon</span>"));
    }

    #[test]
    fn test_verification_panel_reflects_verified_flag() {
        let html = render_report(&payload());
        assert!(html.contains("verification-passed"));
        assert!(html.contains("Verification Passed"));

        let mut failing = payload();
        failing.verification.verified = false;
        failing.verification.issues = "Unsupported claim about margins".to_string();
        let html = render_report(&failing);
        assert!(html.contains("verification-failed"));
        assert!(html.contains("Issues Found"));
        assert!(html.contains("Unsupported claim about margins"));
    }

    #[test]
    fn test_fact_check_mark_keyed_off_its_own_flag() {
        let mut mixed = payload();
        mixed.verification.fact_checks.push(FactCheck {
            claim: "Margins doubled".to_string(),
            evidence: "no source found".to_string(),
            verified: false,
            source_url: None,
        });
        let html = render_report(&mixed);
        assert!(html.contains("fact-verified"));
        assert!(html.contains("&#10003;"));
        assert!(html.contains("fact-failed"));
        assert!(html.contains("&#10007;"));
        assert!(html.contains("href=\"https://example.com/10k\""));
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let p = payload();
        assert_eq!(render_report(&p), render_report(&p));
    }

    #[test]
    fn test_summary_is_escaped() {
        let mut p = payload();
        p.short_summary = "strong <b>buy</b>".to_string();
        let html = render_report(&p);
        assert!(html.contains("strong &lt;b&gt;buy&lt;/b&gt;"));
    }
}
