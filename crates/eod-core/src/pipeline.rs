//! Full analysis of one report: extraction, local checks and the optional AI
//! audit.
//!
//! A failed or skipped audit never discards the local results.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::audit::{estimate_cost, run_audit, AuditRequestBuilder, ReasoningClient};
use crate::error::AuditError;
use crate::models::config::EodConfig;
use crate::models::finding::{AuditResult, Finding, Severity};
use crate::report::{EodReportParser, ExtractionResult, ReportParser};
use crate::validation::ConsistencyValidator;
use crate::Result;

/// What happened to the AI audit step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditOutcome {
    Completed {
        model: String,
        result: AuditResult,
        /// Estimated USD cost, when usage was reported.
        #[serde(skip_serializing_if = "Option::is_none")]
        cost_usd: Option<f64>,
    },
    Skipped {
        reason: String,
    },
    Failed {
        error: String,
    },
}

impl AuditOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        AuditOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn result(&self) -> Option<&AuditResult> {
        match self {
            AuditOutcome::Completed { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn cost_usd(&self) -> Option<f64> {
        match self {
            AuditOutcome::Completed { cost_usd, .. } => *cost_usd,
            _ => None,
        }
    }
}

/// Everything known about one analyzed report.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub extraction: ExtractionResult,
    pub local_findings: Vec<Finding>,
    pub audit: AuditOutcome,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisReport {
    /// Local findings followed by audit issues.
    pub fn all_findings(&self) -> impl Iterator<Item = &Finding> {
        let audit_issues = self.audit.result().map(|r| r.issues.as_slice()).unwrap_or(&[]);
        self.local_findings.iter().chain(audit_issues.iter())
    }

    pub fn highest_severity(&self) -> Option<Severity> {
        self.all_findings().map(|f| f.severity).max()
    }
}

/// Runs the analysis stages configured by an [`EodConfig`].
pub struct ReportAnalyzer {
    parser: EodReportParser,
    validator: Option<ConsistencyValidator>,
    request_builder: AuditRequestBuilder,
    model: String,
}

impl ReportAnalyzer {
    pub fn new() -> Self {
        Self::from_config(&EodConfig::default())
    }

    pub fn from_config(config: &EodConfig) -> Self {
        let validator = config
            .validation
            .enabled
            .then(|| ConsistencyValidator::new().with_tolerance(config.validation.tolerance));

        Self {
            parser: EodReportParser::from_config(&config.extraction),
            validator,
            request_builder: AuditRequestBuilder::from_config(&config.audit),
            model: config.audit.model.model_id().to_string(),
        }
    }

    /// Extraction and local checks only.
    pub fn analyze_local(&self, text: &str) -> Result<AnalysisReport> {
        let extraction = self.parser.parse(text)?;

        let local_findings = match &self.validator {
            Some(validator) => validator.validate(&extraction.report.metrics, &extraction.report.departments),
            None => Vec::new(),
        };

        info!(
            "Local analysis: {} findings, {} warnings",
            local_findings.len(),
            extraction.warnings.len()
        );

        Ok(AnalysisReport {
            extraction,
            local_findings,
            audit: AuditOutcome::skipped("AI audit not requested"),
            analyzed_at: Utc::now(),
        })
    }

    /// Local analysis followed by one audit round-trip through `client`.
    pub async fn analyze<C>(&self, text: &str, client: &C) -> Result<AnalysisReport>
    where
        C: ReasoningClient + ?Sized,
    {
        let mut report = self.analyze_local(text)?;

        let request = self.request_builder.build(
            text,
            &report.extraction.report.metrics,
            &report.extraction.report.departments,
        );

        report.audit = match run_audit(client, &request).await {
            Ok(result) => {
                let cost_usd = result.usage.map(|usage| estimate_cost(&self.model, &usage));
                AuditOutcome::Completed {
                    model: self.model.clone(),
                    result,
                    cost_usd,
                }
            }
            Err(e @ AuditError::NoCredential(_)) => AuditOutcome::skipped(e.to_string()),
            Err(e) => {
                warn!("AI audit failed: {}", e);
                AuditOutcome::Failed { error: e.to_string() }
            }
        };

        Ok(report)
    }
}

impl Default for ReportAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Analyze `text` without the AI audit.
pub fn analyze_local(text: &str, config: &EodConfig) -> Result<AnalysisReport> {
    ReportAnalyzer::from_config(config).analyze_local(text)
}

/// Analyze `text` including the AI audit through `client`.
pub async fn analyze<C>(text: &str, config: &EodConfig, client: &C) -> Result<AnalysisReport>
where
    C: ReasoningClient + ?Sized,
{
    ReportAnalyzer::from_config(config).analyze(text, client).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditRequest, RawAuditResponse};
    use crate::error::{EodError, ExtractionError};
    use crate::models::config::AuditModel;
    use crate::models::finding::Usage;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    const SCENARIO: &str = "Merchandise Sales 200.00\nTax A 10.00\nTax Total 16.00\nTotal 216.00\nCash: 216.00\nGROCERY 10 150.00\nDELI 5 50.00";

    enum Reply {
        Content(&'static str),
        Upstream,
        NoKey,
    }

    struct MockClient {
        reply: Reply,
        seen: Mutex<Option<AuditRequest>>,
    }

    impl MockClient {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                seen: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ReasoningClient for MockClient {
        async fn complete(&self, request: &AuditRequest) -> std::result::Result<RawAuditResponse, AuditError> {
            *self.seen.lock().unwrap() = Some(request.clone());
            match self.reply {
                Reply::Content(body) => Ok(RawAuditResponse::new(body).with_usage(Usage::new(1_000_000, 1_000_000))),
                Reply::Upstream => Err(AuditError::Upstream("connection reset".to_string())),
                Reply::NoKey => Err(AuditError::NoCredential("OPENAI_API_KEY".to_string())),
            }
        }
    }

    #[test]
    fn test_local_analysis_of_clean_report() {
        let report = analyze_local(SCENARIO, &EodConfig::default()).unwrap();
        assert!(report.local_findings.is_empty());
        assert_eq!(report.extraction.report.departments.len(), 2);
        assert!(matches!(report.audit, AuditOutcome::Skipped { .. }));
        assert_eq!(report.highest_severity(), None);
    }

    #[test]
    fn test_validation_can_be_disabled() {
        let mut config = EodConfig::default();
        let text = "Merchandise Sales 100.00\nTotal 90.00";
        assert!(!analyze_local(text, &config).unwrap().local_findings.is_empty());

        config.validation.enabled = false;
        assert!(analyze_local(text, &config).unwrap().local_findings.is_empty());
    }

    #[test]
    fn test_oversized_amounts_do_not_panic() {
        let big = "79228162514264337593543950335";
        let text = format!("Merchandise Sales {big}\nTax Total {big}\nTotal 1.00\nCash: {big}\nVisa: {big}");
        let report = analyze_local(&text, &EodConfig::default()).unwrap();

        assert_eq!(
            report.extraction.malformed_fields,
            vec!["subtotal", "tax_total", "payments.Cash", "payments.Visa"]
        );
        assert_eq!(report.highest_severity(), Some(Severity::Critical));
    }

    #[test]
    fn test_empty_text_fails() {
        let err = analyze_local("", &EodConfig::default()).unwrap_err();
        assert!(matches!(err, EodError::Extraction(ExtractionError::NoData)));
    }

    #[tokio::test]
    async fn test_completed_audit() {
        let client = MockClient::new(Reply::Content(
            r#"{"summary": "Grocery leads.", "issues": [{"severity": "CRITICAL", "message": "spike", "where": "hourly"}]}"#,
        ));
        let report = analyze(SCENARIO, &EodConfig::default(), &client).await.unwrap();

        let result = report.audit.result().unwrap();
        assert_eq!(result.summary, "Grocery leads.");
        assert_eq!(report.highest_severity(), Some(Severity::Critical));
        assert!((report.audit.cost_usd().unwrap() - 2.25).abs() < 1e-9);

        let seen = client.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.model, "gpt-5-mini");
        assert_eq!(seen.payload.departments[0].name, "GROCERY");
        assert_eq!(seen.payload.raw_text_excerpt, SCENARIO);
    }

    #[tokio::test]
    async fn test_deep_model_from_config() {
        let mut config = EodConfig::default();
        config.audit.model = AuditModel::Deep;
        let client = MockClient::new(Reply::Content(r#"{"summary": "ok"}"#));
        let report = analyze(SCENARIO, &config, &client).await.unwrap();

        assert!(matches!(&report.audit, AuditOutcome::Completed { model, .. } if model == "gpt-5"));
        assert!((report.audit.cost_usd().unwrap() - 11.25).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_upstream_failure_keeps_local_results() {
        let client = MockClient::new(Reply::Upstream);
        let report = analyze("Merchandise Sales 100.00\nTotal 90.00", &EodConfig::default(), &client)
            .await
            .unwrap();

        assert!(matches!(report.audit, AuditOutcome::Failed { .. }));
        assert!(!report.local_findings.is_empty());
        assert_eq!(report.highest_severity(), Some(Severity::Critical));
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_failure() {
        let client = MockClient::new(Reply::Content("no json here"));
        let report = analyze(SCENARIO, &EodConfig::default(), &client).await.unwrap();
        assert!(matches!(report.audit, AuditOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_missing_credential_is_skip() {
        let client = MockClient::new(Reply::NoKey);
        let report = analyze(SCENARIO, &EodConfig::default(), &client).await.unwrap();
        match report.audit {
            AuditOutcome::Skipped { reason } => assert!(reason.contains("OPENAI_API_KEY")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(AuditOutcome::skipped("no key")).unwrap();
        assert_eq!(json, serde_json::json!({"status": "skipped", "reason": "no key"}));
    }
}
