//! Defensive interpretation of the reasoning collaborator's reply.
//!
//! Only a payload that is not a JSON object at all is an error. Inside an
//! object every field is optional: unknown severities become `INFO`, missing
//! messages become empty strings, and non-object issues are skipped.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ParseError;
use crate::models::finding::{AuditResult, Finding, Severity, Usage};

const INPUT_TOKEN_KEYS: [&str; 3] = ["input_tokens", "inputTokens", "prompt_tokens"];
const OUTPUT_TOKEN_KEYS: [&str; 3] = ["output_tokens", "outputTokens", "completion_tokens"];

/// Interpret raw response text.
///
/// Tolerates markdown fences and prose around the object.
pub fn parse_response(raw: &str) -> Result<AuditResult, ParseError> {
    let cleaned = strip_code_fences(raw);
    let json = extract_json_object(cleaned)
        .ok_or_else(|| ParseError::InvalidPayload("no JSON object found in response".to_string()))?;

    let value: Value = serde_json::from_str(json)
        .map_err(|e| ParseError::InvalidPayload(format!("malformed JSON: {}", e)))?;

    parse_value(&value)
}

/// Interpret an already-decoded response value.
pub fn parse_value(value: &Value) -> Result<AuditResult, ParseError> {
    let object = value
        .as_object()
        .ok_or_else(|| ParseError::InvalidPayload(format!("expected a JSON object, got {}", kind(value))))?;

    let summary = object
        .get("summary")
        .map(text_of)
        .unwrap_or_default();

    let issues: Vec<Finding> = match object.get("issues") {
        Some(Value::Array(items)) => items.iter().filter_map(parse_issue).collect(),
        Some(other) => {
            debug!("Ignoring non-array issues field ({})", kind(other));
            Vec::new()
        }
        None => Vec::new(),
    };

    let usage = object
        .get("usage")
        .and_then(Value::as_object)
        .and_then(parse_usage);

    Ok(AuditResult {
        summary,
        issues,
        usage,
    })
}

fn parse_issue(item: &Value) -> Option<Finding> {
    let Some(issue) = item.as_object() else {
        debug!("Skipping non-object issue ({})", kind(item));
        return None;
    };

    let severity = issue
        .get("severity")
        .and_then(Value::as_str)
        .map(Severity::normalize)
        .unwrap_or_default();

    let message = issue.get("message").map(text_of).unwrap_or_default();

    let location = issue
        .get("where")
        .filter(|v| !v.is_null())
        .map(text_of)
        .filter(|s| !s.is_empty());

    let numbers = issue
        .get("numbers")
        .and_then(Value::as_object)
        .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect());

    Some(Finding {
        severity,
        message,
        location,
        numbers,
    })
}

/// Usage block in any of the common spellings.
pub fn parse_usage(usage: &Map<String, Value>) -> Option<Usage> {
    let input = first_count(usage, &INPUT_TOKEN_KEYS);
    let output = first_count(usage, &OUTPUT_TOKEN_KEYS);

    if input.is_none() && output.is_none() {
        return None;
    }
    Some(Usage::new(input.unwrap_or(0), output.unwrap_or(0)))
}

fn first_count(map: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|key| map.get(*key).and_then(Value::as_u64))
}

/// Strings stay as-is, anything else is rendered as JSON.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag line.
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Slice from the first `{` to the last `}`.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
