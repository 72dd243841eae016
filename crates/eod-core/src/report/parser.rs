//! End-of-day report parser combining the extraction rules.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ExtractionError;
use crate::models::config::{ExtractionConfig, PaymentCapture, RowGrammar};
use crate::models::report::{EodReport, FinancialMetrics, ReportTotals};

use super::rules::{
    departments::extract_department_table, hourly::extract_hourly_rows,
    amounts::extract_scalar_outcomes, payments::PaymentExtractor, ScalarField,
};
use super::Result;

/// Result of report extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Extracted report data.
    pub report: EodReport,
    /// Extraction warnings, including fields defaulted after a malformed match.
    pub warnings: Vec<String>,
    /// Names of fields whose matched token could not be decoded.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub malformed_fields: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Trait for report parsing.
pub trait ReportParser {
    /// Parse a report from its linear text.
    fn parse(&self, text: &str) -> Result<ExtractionResult>;
}

/// Rule-based EOD report parser.
///
/// Every rule runs independently; a malformed field is defaulted to zero and
/// reported as a warning instead of aborting the parse.
pub struct EodReportParser {
    payment_capture: PaymentCapture,
    row_grammar: RowGrammar,
    extract_hourly: bool,
}

impl EodReportParser {
    /// Create a new parser with default settings.
    pub fn new() -> Self {
        Self {
            payment_capture: PaymentCapture::default(),
            row_grammar: RowGrammar::default(),
            extract_hourly: true,
        }
    }

    /// Create a parser from the extraction section of the config.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new()
            .with_payment_capture(config.payment_capture)
            .with_row_grammar(config.row_grammar)
            .with_hourly(config.extract_hourly)
    }

    /// Set the payment capture policy.
    pub fn with_payment_capture(mut self, capture: PaymentCapture) -> Self {
        self.payment_capture = capture;
        self
    }

    /// Set the department-row grammar.
    pub fn with_row_grammar(mut self, grammar: RowGrammar) -> Self {
        self.row_grammar = grammar;
        self
    }

    /// Enable or disable hourly table extraction.
    pub fn with_hourly(mut self, enabled: bool) -> Self {
        self.extract_hourly = enabled;
        self
    }

    fn extract_totals(&self, text: &str, errors: &mut Vec<ExtractionError>, warnings: &mut Vec<String>) -> ReportTotals {
        let mut totals = ReportTotals::default();

        for (field, outcome) in extract_scalar_outcomes(text) {
            match outcome {
                Ok(Some(found)) => {
                    debug!(
                        "{} = {} from {:?} at {:?}",
                        field.name(),
                        found.value,
                        found.source,
                        found.position
                    );
                    field.set(&mut totals, found.value);
                }
                Ok(None) => {
                    if matches!(field, ScalarField::Subtotal | ScalarField::GrandTotal) {
                        warnings.push(format!("Could not extract {}", field.name()));
                    }
                }
                Err(e) => errors.push(e),
            }
        }

        totals
    }
}

impl Default for EodReportParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportParser for EodReportParser {
    fn parse(&self, text: &str) -> Result<ExtractionResult> {
        let start = Instant::now();

        if text.trim().is_empty() {
            return Err(ExtractionError::NoData);
        }

        info!("Parsing report from {} characters of text", text.chars().count());

        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        let totals = self.extract_totals(text, &mut errors, &mut warnings);

        let (payments, payment_errors) = PaymentExtractor::new()
            .with_capture(self.payment_capture)
            .collect(text);
        errors.extend(payment_errors);

        let table = extract_department_table(text, self.row_grammar);
        if table.rows.is_empty() {
            warnings.push("Could not extract department rows".to_string());
        }
        for row in table.ambiguous_rows() {
            let offset = row.position.map(|(start, _)| start).unwrap_or_default();
            warnings.push(format!(
                "Department row at byte {} had extra columns discarded: {:?}",
                offset, row.source
            ));
        }
        errors.extend(table.rejected.iter().cloned());
        let row_diagnostics = table.diagnostics;

        let hourly = if self.extract_hourly {
            extract_hourly_rows(text)
        } else {
            Vec::new()
        };

        let mut malformed_fields = Vec::with_capacity(errors.len());
        for error in &errors {
            warn!("{}", error);
            warnings.push(format!("{} (defaulted)", error));
            if let ExtractionError::MalformedField { field, .. } = error {
                malformed_fields.push(field.clone());
            }
        }

        let report = EodReport {
            metrics: FinancialMetrics::new(totals, payments),
            departments: table.into_rows(),
            hourly,
            row_diagnostics,
        };

        debug!(
            "Extracted {} department rows, {} hourly rows, row confidence {:.2}",
            report.departments.len(),
            report.hourly.len(),
            report.row_diagnostics.confidence
        );

        Ok(ExtractionResult {
            report,
            warnings,
            malformed_fields,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::{DepartmentRow, PaymentMethod};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    const SCENARIO: &str = "Merchandise Sales 200.00\nTax A 10.00\nTax Total 16.00\nTotal 216.00\nCash: 216.00\nGROCERY 10 150.00\nDELI 5 50.00";

    #[test]
    fn test_parse_scenario() {
        let result = EodReportParser::new().parse(SCENARIO).unwrap();
        let metrics = &result.report.metrics;

        assert_eq!(metrics.totals.subtotal, Decimal::new(20000, 2));
        assert_eq!(metrics.totals.tax_a, Decimal::new(1000, 2));
        assert_eq!(metrics.totals.tax_total, Decimal::new(1600, 2));
        assert_eq!(metrics.totals.grand_total, Decimal::new(21600, 2));
        assert_eq!(metrics.payments.get(PaymentMethod::Cash), Decimal::new(21600, 2));
        assert_eq!(metrics.payments.total(), Decimal::new(21600, 2));
        assert_eq!(
            result.report.departments,
            vec![
                DepartmentRow::new("GROCERY", 10, Decimal::new(15000, 2)),
                DepartmentRow::new("DELI", 5, Decimal::new(5000, 2)),
            ]
        );
        assert!(result.malformed_fields.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_malformed_field_does_not_abort() {
        let text = "Merchandise Sales 2.0.0\nTax Total 16.00\nTotal 216.00\nVisa: 1..5\nAmEx: 3.00";
        let result = EodReportParser::new().parse(text).unwrap();
        let metrics = &result.report.metrics;

        assert_eq!(metrics.totals.subtotal, Decimal::ZERO);
        assert_eq!(metrics.totals.tax_total, Decimal::new(1600, 2));
        assert_eq!(metrics.payments.get(PaymentMethod::AmEx), Decimal::new(300, 2));
        assert_eq!(result.malformed_fields, vec!["subtotal", "payments.Visa"]);
    }

    #[test]
    fn test_amounts_followed_by_punctuation() {
        let result = EodReportParser::new()
            .parse("Cash: 50.00, Visa: 75.25\nTotal 125.25.")
            .unwrap();
        let metrics = &result.report.metrics;

        assert_eq!(metrics.payments.get(PaymentMethod::Cash), Decimal::new(5000, 2));
        assert_eq!(metrics.payments.get(PaymentMethod::Visa), Decimal::new(7525, 2));
        assert_eq!(metrics.totals.grand_total, Decimal::new(12525, 2));
        assert!(result.malformed_fields.is_empty());
    }

    #[test]
    fn test_oversized_amounts_are_defaulted() {
        let big = "79228162514264337593543950335";
        let text = format!("Merchandise Sales {big}\nTax Total {big}\nTotal 1.00");
        let result = EodReportParser::new().parse(&text).unwrap();

        assert_eq!(result.report.metrics.totals.subtotal, Decimal::ZERO);
        assert_eq!(result.report.metrics.totals.tax_total, Decimal::ZERO);
        assert_eq!(result.malformed_fields, vec!["subtotal", "tax_total"]);
    }

    #[test]
    fn test_ambiguous_row_warning_names_source() {
        let text = "Total 70.00\nBEER 7 70.00 30.00\n";
        let result = EodReportParser::new().parse(text).unwrap();

        assert!(result
            .warnings
            .contains(&"Department row at byte 12 had extra columns discarded: \"BEER 7 70.00 30.00\"".to_string()));
    }

    #[test]
    fn test_empty_text_is_no_data() {
        let err = EodReportParser::new().parse("  \n ").unwrap_err();
        assert_eq!(err, ExtractionError::NoData);
    }

    #[test]
    fn test_hourly_toggle() {
        let text = "Total 5.00\n9am - 10am 5.00\n";
        let with = EodReportParser::new().parse(text).unwrap();
        let without = EodReportParser::new().with_hourly(false).parse(text).unwrap();
        assert_eq!(with.report.hourly.len(), 1);
        assert!(without.report.hourly.is_empty());
    }

    #[test]
    fn test_missing_labels_warn() {
        let result = EodReportParser::new().parse("GROCERY 10 150.00").unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("grand_total")));
        assert!(result.warnings.iter().any(|w| w.contains("subtotal")));
    }
}
