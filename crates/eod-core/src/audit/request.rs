//! Audit request shaping.
//!
//! The request carries a bounded view of the report: at most
//! `max_dept_rows` department rows (highest sales first) and at most
//! `max_text_chars` characters of raw text. Anything beyond those limits is
//! intentionally not sent; the limits exist to cap cost and latency of the
//! round-trip, and callers that need the full text audited must raise them.

use serde::{Serialize, Serializer};
use serde::ser::SerializeSeq;
use serde_json::{json, Value};

use crate::models::config::AuditConfig;
use crate::models::finding::amount_value;
use crate::models::report::{DepartmentRow, FinancialMetrics};

/// Role prompt for the reasoning collaborator.
pub const SYSTEM_PROMPT: &str = "You are a meticulous retail auditor. \
Given an end-of-day report, you MUST return strict JSON with findings.";

/// Fixed audit instructions.
pub const INSTRUCTIONS: [&str; 5] = [
    "Summarize key insights (top departments, peak hours if present).",
    "Validate math: subtotal + taxes ≈ grand_total; payment sums ≈ grand_total.",
    "Flag anomalies: negative numbers, zero tax when subtotal>0, drawer mismatches, weird spikes, missing hours.",
    "Severity levels: INFO, WARNING, CRITICAL.",
    "Respond with one JSON object: {\"summary\": string, \"issues\": [{\"severity\": string, \"message\": string, \"where\": string, \"numbers\": object}]}.",
];

/// Size limits for the request payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    pub max_dept_rows: usize,
    pub max_text_chars: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_dept_rows: 20,
            max_text_chars: 6000,
        }
    }
}

/// User payload sent alongside the system prompt.
#[derive(Debug, Clone, Serialize)]
pub struct AuditPayload {
    pub instructions: Vec<String>,

    /// Extracted totals and payments as JSON numbers.
    pub parsed_numbers: Value,

    /// Top department rows by descending sales.
    #[serde(rename = "departments_top", serialize_with = "serialize_departments")]
    pub departments: Vec<DepartmentRow>,

    /// Leading slice of the raw report text.
    pub raw_text_excerpt: String,
}

/// A complete request for the reasoning collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRequest {
    /// Provider model identifier.
    pub model: String,

    pub system: String,

    pub payload: AuditPayload,

    /// Decoding temperature hint.
    pub temperature: f32,

    /// The response must be a single JSON object.
    pub json_response: bool,
}

impl AuditRequest {
    /// Payload as the user message body.
    pub fn user_content(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.payload)
    }
}

/// Builder for [`AuditRequest`].
pub struct AuditRequestBuilder {
    model: String,
    limits: RequestLimits,
    temperature: f32,
}

impl AuditRequestBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            limits: RequestLimits::default(),
            temperature: 0.1,
        }
    }

    /// Builder from the audit section of the config.
    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(config.model.model_id())
            .with_limits(RequestLimits {
                max_dept_rows: config.max_dept_rows,
                max_text_chars: config.max_text_chars,
            })
            .with_temperature(config.temperature)
    }

    pub fn with_limits(mut self, limits: RequestLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn build(&self, text: &str, metrics: &FinancialMetrics, departments: &[DepartmentRow]) -> AuditRequest {
        AuditRequest {
            model: self.model.clone(),
            system: SYSTEM_PROMPT.to_string(),
            payload: AuditPayload {
                instructions: INSTRUCTIONS.iter().map(|s| s.to_string()).collect(),
                parsed_numbers: parsed_numbers(metrics),
                departments: top_departments(departments, self.limits.max_dept_rows),
                raw_text_excerpt: truncate_chars(text, self.limits.max_text_chars).to_string(),
            },
            temperature: self.temperature,
            json_response: true,
        }
    }
}

/// Build a request for `model` with the given limits.
pub fn build_request(
    text: &str,
    metrics: &FinancialMetrics,
    departments: &[DepartmentRow],
    model: &str,
    limits: RequestLimits,
) -> AuditRequest {
    AuditRequestBuilder::new(model)
        .with_limits(limits)
        .build(text, metrics, departments)
}

fn parsed_numbers(metrics: &FinancialMetrics) -> Value {
    let totals = &metrics.totals;
    let payments: serde_json::Map<String, Value> = metrics
        .payments
        .iter()
        .map(|(method, amount)| (method.label().to_string(), amount_value(amount)))
        .collect();

    json!({
        "subtotal": amount_value(totals.subtotal),
        "tax_a": amount_value(totals.tax_a),
        "tax_b": amount_value(totals.tax_b),
        "tax_c": amount_value(totals.tax_c),
        "tax_total": amount_value(totals.tax_total),
        "grand_total": amount_value(totals.grand_total),
        "payments": payments,
    })
}

/// Highest-sales rows first; ties keep text order.
fn top_departments(departments: &[DepartmentRow], limit: usize) -> Vec<DepartmentRow> {
    let mut rows = departments.to_vec();
    rows.sort_by(|a, b| b.sales.cmp(&a.sales));
    rows.truncate(limit);
    rows
}

/// First `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

fn serialize_departments<S: Serializer>(rows: &[DepartmentRow], serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(rows.len()))?;
    for row in rows {
        seq.serialize_element(&json!({
            "department": row.name,
            "qty": row.quantity,
            "sales": amount_value(row.sales),
        }))?;
    }
    seq.end()
}
