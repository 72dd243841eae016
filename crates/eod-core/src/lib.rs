//! Core library for end-of-day (EOD) retail sales report analysis.
//!
//! This crate provides:
//! - Report text loading (plain text exports and PDFs with a text layer)
//! - Rule-based extraction of totals, taxes, payments, department and hourly rows
//! - Local arithmetic consistency checks (reconciliation, drawer, zero tax, negatives)
//! - AI audit request shaping, response interpretation and cost estimation
//!
//! The AI audit is optional. Callers supply a [`ReasoningClient`]; the library
//! never reads credentials or opens network connections on its own.

pub mod audit;
pub mod error;
pub mod models;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod validation;

pub use audit::{
    build_request, estimate_cost, parse_response, run_audit, AuditRequest, AuditRequestBuilder, RawAuditResponse,
    ReasoningClient, RequestLimits,
};
pub use error::{AuditError, EodError, ExtractionError, ParseError, PdfError, Result};
pub use models::config::{AuditModel, EodConfig, PaymentCapture, RowGrammar};
pub use models::finding::{AuditResult, Finding, Severity, Usage};
pub use models::report::{
    DepartmentRow, EodReport, FinancialMetrics, HourlyRow, PaymentMethod, Payments, ReportTotals, RowDiagnostics,
};
pub use pipeline::{analyze, analyze_local, AnalysisReport, AuditOutcome, ReportAnalyzer};
pub use report::{EodReportParser, ExtractionResult, ReportParser};
pub use validation::{validate, ConsistencyValidator};
