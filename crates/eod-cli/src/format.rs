//! Output formatting for analysis reports.

use console::style;
use eod_core::models::finding::{Finding, Severity};
use eod_core::pipeline::{AnalysisReport, AuditOutcome};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text dashboard
    Text,
    /// CSV of department rows
    Csv,
}

pub fn format_report(report: &AnalysisReport, source: &str, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Text => Ok(format_text(report, source)),
        OutputFormat::Csv => format_csv(report),
    }
}

pub const SUMMARY_HEADER: [&str; 15] = [
    "source",
    "subtotal",
    "tax_a",
    "tax_b",
    "tax_c",
    "tax_total",
    "grand_total",
    "payments_total",
    "departments",
    "local_findings",
    "highest_severity",
    "audit_status",
    "audit_issues",
    "cost_usd",
    "warnings",
];

/// One CSV summary row, aligned with [`SUMMARY_HEADER`].
pub fn summary_record(report: &AnalysisReport, source: &str) -> Vec<String> {
    let totals = &report.extraction.report.metrics.totals;
    let payments = &report.extraction.report.metrics.payments;

    let (audit_status, audit_issues) = match &report.audit {
        AuditOutcome::Completed { result, .. } => ("completed", result.issues.len().to_string()),
        AuditOutcome::Skipped { .. } => ("skipped", String::new()),
        AuditOutcome::Failed { .. } => ("failed", String::new()),
    };

    vec![
        source.to_string(),
        totals.subtotal.to_string(),
        totals.tax_a.to_string(),
        totals.tax_b.to_string(),
        totals.tax_c.to_string(),
        totals.tax_total.to_string(),
        totals.grand_total.to_string(),
        payments.total().to_string(),
        report.extraction.report.departments.len().to_string(),
        report.local_findings.len().to_string(),
        report
            .highest_severity()
            .map(|s| s.to_string())
            .unwrap_or_default(),
        audit_status.to_string(),
        audit_issues,
        report
            .audit
            .cost_usd()
            .map(|c| format!("{:.6}", c))
            .unwrap_or_default(),
        report.extraction.warnings.len().to_string(),
    ]
}

/// Department rows in text order.
fn format_csv(report: &AnalysisReport) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["department", "quantity", "sales"])?;
    for row in &report.extraction.report.departments {
        wtr.write_record([row.name.clone(), row.quantity.to_string(), row.sales.to_string()])?;
    }
    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn severity_label(severity: Severity) -> String {
    match severity {
        Severity::Critical => style(severity.as_str()).red().bold().to_string(),
        Severity::Warning => style(severity.as_str()).yellow().to_string(),
        Severity::Info => style(severity.as_str()).blue().to_string(),
    }
}

fn push_finding(output: &mut String, finding: &Finding) {
    output.push_str(&format!("  [{}] {}", severity_label(finding.severity), finding.message));
    if let Some(location) = &finding.location {
        output.push_str(&format!(" ({})", location));
    }
    output.push('\n');
}

fn format_text(report: &AnalysisReport, source: &str) -> String {
    let data = &report.extraction.report;
    let totals = &data.metrics.totals;
    let mut output = String::new();

    output.push_str(&format!("{}\n", style(format!("End-of-day report: {}", source)).bold()));
    output.push_str(&format!(
        "Analyzed: {}\n",
        report.analyzed_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    ));
    output.push('\n');

    output.push_str("Totals:\n");
    output.push_str(&format!("  Merchandise sales: {:>12}\n", totals.subtotal));
    output.push_str(&format!("  Tax A:             {:>12}\n", totals.tax_a));
    output.push_str(&format!("  Tax B:             {:>12}\n", totals.tax_b));
    output.push_str(&format!("  Tax C:             {:>12}\n", totals.tax_c));
    output.push_str(&format!("  Tax total:         {:>12}\n", totals.tax_total));
    output.push_str(&format!("  Grand total:       {:>12}\n", totals.grand_total));
    output.push('\n');

    output.push_str("Payments:\n");
    for (method, amount) in data.metrics.payments.iter() {
        output.push_str(&format!("  {:<10} {:>12}\n", method.label(), amount));
    }
    output.push_str(&format!("  {:<10} {:>12}\n", "Total", data.metrics.payments.total()));
    output.push('\n');

    let departments = data.departments_by_sales();
    output.push_str(&format!("Departments ({}):\n", departments.len()));
    for row in departments.iter().take(10) {
        output.push_str(&format!("  {:<24} {:>6} {:>12}\n", row.name, row.quantity, row.sales));
    }
    if departments.len() > 10 {
        output.push_str(&format!("  ... {} more\n", departments.len() - 10));
    }

    if !data.hourly.is_empty() {
        output.push('\n');
        output.push_str("Hourly sales:\n");
        for row in &data.hourly {
            output.push_str(&format!("  {:<16} {:>12}\n", row.hour_range, row.sales));
        }
    }

    if !report.extraction.warnings.is_empty() {
        output.push('\n');
        output.push_str("Extraction warnings:\n");
        for warning in &report.extraction.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    output.push('\n');
    if report.local_findings.is_empty() {
        output.push_str(&format!("Local checks: {}\n", style("all passed").green()));
    } else {
        output.push_str("Local checks:\n");
        for finding in &report.local_findings {
            push_finding(&mut output, finding);
        }
    }

    output.push('\n');
    match &report.audit {
        AuditOutcome::Completed { model, result, cost_usd } => {
            output.push_str(&format!("AI audit ({}):\n", model));
            if !result.summary.is_empty() {
                output.push_str(&format!("  {}\n", result.summary));
            }
            for finding in &result.issues {
                push_finding(&mut output, finding);
            }
            if let Some(usage) = result.usage {
                output.push_str(&format!(
                    "  Tokens: {} in / {} out\n",
                    usage.input_tokens, usage.output_tokens
                ));
            }
            if let Some(cost) = cost_usd {
                output.push_str(&format!("  Estimated cost: ${:.4}\n", cost));
            }
        }
        AuditOutcome::Skipped { reason } => {
            output.push_str(&format!("AI audit: skipped ({})\n", reason));
        }
        AuditOutcome::Failed { error } => {
            output.push_str(&format!("AI audit: {} ({})\n", style("failed").red(), error));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use eod_core::models::config::EodConfig;
    use eod_core::pipeline::analyze_local;

    const SCENARIO: &str = "Merchandise Sales 200.00\nTax A 10.00\nTax Total 16.00\nTotal 216.00\nCash: 216.00\nGROCERY 10 150.00\nDELI 5 50.00";

    #[test]
    fn test_summary_record_matches_header() {
        let report = analyze_local(SCENARIO, &EodConfig::default()).unwrap();
        let record = summary_record(&report, "eod.txt");

        assert_eq!(record.len(), SUMMARY_HEADER.len());
        assert_eq!(record[0], "eod.txt");
        assert_eq!(record[1], "200.00");
        assert_eq!(record[6], "216.00");
        assert_eq!(record[8], "2");
        assert_eq!(record[11], "skipped");
    }

    #[test]
    fn test_csv_department_rows() {
        let report = analyze_local(SCENARIO, &EodConfig::default()).unwrap();
        let csv = format_report(&report, "eod.txt", OutputFormat::Csv).unwrap();
        assert_eq!(csv, "department,quantity,sales\nGROCERY,10,150.00\nDELI,5,50.00\n");
    }

    #[test]
    fn test_text_dashboard() {
        let report = analyze_local(SCENARIO, &EodConfig::default()).unwrap();
        let text = format_report(&report, "eod.txt", OutputFormat::Text).unwrap();

        assert!(text.contains("GROCERY"));
        assert!(text.contains("216.00"));
        assert!(text.contains("AI audit: skipped"));
    }

    #[test]
    fn test_json_output() {
        let report = analyze_local(SCENARIO, &EodConfig::default()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&format_report(&report, "eod.txt", OutputFormat::Json).unwrap()).unwrap();

        assert_eq!(json["audit"]["status"], "skipped");
        assert_eq!(json["extraction"]["report"]["departments"][0]["name"], "GROCERY");
    }
}
