//! Audit findings and results.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON number for an amount, `null` if it cannot be represented.
pub fn amount_value(amount: Decimal) -> Value {
    amount
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Finding severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Critical,
}

impl Severity {
    /// Normalize a free-text severity. Anything unrecognized is `Info`.
    pub fn normalize(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" | "CRIT" => Severity::Critical,
            "WARNING" | "WARN" => Severity::Warning,
            _ => Severity::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single audit finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,

    pub message: String,

    /// Where in the report the finding applies (section, row, field).
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Supporting values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numbers: Option<BTreeMap<String, Value>>,
}

impl Finding {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            location: None,
            numbers: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_number(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.numbers
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Token usage reported by the reasoning collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Interpreted response of one audit round-trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    pub summary: String,

    pub issues: Vec<Finding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl AuditResult {
    /// Most severe issue, if any.
    pub fn highest_severity(&self) -> Option<Severity> {
        self.issues.iter().map(|f| f.severity).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_normalize() {
        assert_eq!(Severity::normalize("critical"), Severity::Critical);
        assert_eq!(Severity::normalize(" Warning "), Severity::Warning);
        assert_eq!(Severity::normalize("WARN"), Severity::Warning);
        assert_eq!(Severity::normalize("INFO"), Severity::Info);
        assert_eq!(Severity::normalize("urgent!!"), Severity::Info);
        assert_eq!(Severity::normalize(""), Severity::Info);
    }

    #[test]
    fn test_finding_serializes_where() {
        let finding = Finding::new(Severity::Warning, "drawer short").at("payments");
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["where"], "payments");
        assert_eq!(json["severity"], "WARNING");
        assert!(json.get("numbers").is_none());
    }

    #[test]
    fn test_highest_severity() {
        let result = AuditResult {
            summary: String::new(),
            issues: vec![
                Finding::new(Severity::Info, "a"),
                Finding::new(Severity::Critical, "b"),
                Finding::new(Severity::Warning, "c"),
            ],
            usage: None,
        };
        assert_eq!(result.highest_severity(), Some(Severity::Critical));
        assert_eq!(AuditResult::default().highest_severity(), None);
    }
}
