use serde::Deserialize;

/// Final report payload carried by the `complete` event. Immutable once
/// received; the renderer reads it and nothing mutates it.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultPayload {
    pub short_summary: String,
    pub markdown_report: String,
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
    pub verification: Verification,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Verification {
    pub verified: bool,
    #[serde(default)]
    pub issues: String,
    #[serde(default)]
    pub fact_checks: Vec<FactCheck>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FactCheck {
    pub claim: String,
    pub evidence: String,
    pub verified: bool,
    #[serde(default)]
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartData {
    pub symbol: String,
    pub labels: Vec<String>,
    pub prices: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryItem {
    pub id: i64,
    pub query: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryDetail {
    pub short_summary: String,
    pub full_report: String,
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
    pub verification: Verification,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_payload_accepts_backend_shape_without_fact_checks() {
        // The backend only sends verified + issues; fact_checks is optional.
        let payload: ResultPayload = serde_json::from_str(
            r##"{
                "short_summary": "A strong buy.",
                "markdown_report": "# Report",
                "follow_up_questions": ["What about margins?"],
                "verification": {"verified": true, "issues": ""}
            }"##,
        )
        .expect("payload should deserialize");

        assert!(payload.verification.verified);
        assert!(payload.verification.fact_checks.is_empty());
    }

    #[test]
    fn test_fact_check_source_url_is_optional() {
        let check: FactCheck = serde_json::from_str(
            r#"{"claim": "Revenue grew 10%", "evidence": "10-K filing", "verified": true}"#,
        )
        .expect("fact check should deserialize");
        assert_eq!(check.source_url, None);
    }
}
