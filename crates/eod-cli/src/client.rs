//! Chat completions client used as the audit's reasoning collaborator.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use eod_core::audit::{AuditRequest, RawAuditResponse, ReasoningClient};
use eod_core::audit::response::parse_usage;
use eod_core::error::AuditError;
use eod_core::models::config::AuditConfig;

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    /// Build a client, reading the API key from the configured environment variable.
    pub fn from_env(config: &AuditConfig) -> Result<Self, AuditError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AuditError::NoCredential(config.api_key_env.clone()))?;

        Self::new(api_key, config)
    }

    pub fn new(api_key: impl Into<String>, config: &AuditConfig) -> Result<Self, AuditError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| AuditError::Upstream(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Chat completions request body for an audit request.
pub fn chat_body(request: &AuditRequest) -> Result<Value, AuditError> {
    let user = request
        .user_content()
        .map_err(|e| AuditError::Upstream(format!("failed to encode payload: {}", e)))?;

    let mut body = json!({
        "model": request.model,
        "messages": [
            {"role": "system", "content": request.system},
            {"role": "user", "content": user},
        ],
        "temperature": request.temperature,
    });
    if request.json_response {
        body["response_format"] = json!({"type": "json_object"});
    }
    Ok(body)
}

#[async_trait]
impl ReasoningClient for OpenAiClient {
    async fn complete(&self, request: &AuditRequest) -> Result<RawAuditResponse, AuditError> {
        let body = chat_body(request)?;

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AuditError::Upstream(format!("request failed: {}", e)))?;

        let status = resp.status();
        let data: Value = resp
            .json()
            .await
            .map_err(|e| AuditError::Upstream(format!("unreadable response ({}): {}", status, e)))?;

        if let Some(error) = data.get("error") {
            let message = error["message"].as_str().unwrap_or("unknown error");
            return Err(AuditError::Upstream(format!("{}: {}", status, message)));
        }
        if !status.is_success() {
            return Err(AuditError::Upstream(format!("unexpected status {}", status)));
        }

        let content = data["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| AuditError::Upstream("no content in response".to_string()))?;
        debug!("Received {} characters of audit content", content.len());

        let mut raw = RawAuditResponse::new(content);
        raw.usage = data.get("usage").and_then(Value::as_object).and_then(parse_usage);
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eod_core::audit::{build_request, RequestLimits};
    use eod_core::models::report::FinancialMetrics;

    #[test]
    fn test_chat_body_shape() {
        let request = build_request("Total 1.00", &FinancialMetrics::default(), &[], "gpt-5", RequestLimits::default());
        let body = chat_body(&request).unwrap();

        assert_eq!(body["model"], "gpt-5");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["response_format"]["type"], "json_object");

        let user: Value = serde_json::from_str(body["messages"][1]["content"].as_str().unwrap()).unwrap();
        assert_eq!(user["raw_text_excerpt"], "Total 1.00");
    }

    #[test]
    fn test_missing_key_is_no_credential() {
        let config = AuditConfig {
            api_key_env: "EOD_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        let err = OpenAiClient::from_env(&config).err().unwrap();
        assert!(matches!(err, AuditError::NoCredential(var) if var == "EOD_TEST_KEY_THAT_IS_NEVER_SET"));
    }
}
