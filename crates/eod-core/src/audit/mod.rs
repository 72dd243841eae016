//! AI audit round-trip: request shaping, the collaborator seam, response
//! interpretation and cost estimation.
//!
//! The library never reads credentials or talks to the network itself. A
//! [`ReasoningClient`] built by the caller (holding whatever key it needs) is
//! passed in explicitly.

pub mod pricing;
pub mod request;
pub mod response;

pub use pricing::{estimate_cost, rate_for, ModelRate};
pub use request::{build_request, AuditPayload, AuditRequest, AuditRequestBuilder, RequestLimits};
pub use response::{parse_response, parse_value};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::AuditError;
use crate::models::finding::{AuditResult, Usage};

/// Raw reply from the reasoning collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAuditResponse {
    /// Message content, expected to hold one JSON object.
    pub content: String,
    /// Token usage as reported by the transport, if any.
    pub usage: Option<Usage>,
}

impl RawAuditResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// External reasoning service that answers an audit request.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    /// Perform one round-trip.
    async fn complete(&self, request: &AuditRequest) -> Result<RawAuditResponse, AuditError>;
}

/// Send `request` through `client` and interpret the reply.
///
/// Usage reported by the transport takes precedence over usage embedded in
/// the content.
pub async fn run_audit<C>(client: &C, request: &AuditRequest) -> Result<AuditResult, AuditError>
where
    C: ReasoningClient + ?Sized,
{
    info!("Running AI audit with model {}", request.model);

    let raw = client.complete(request).await?;
    debug!("Audit response: {} characters", raw.content.len());

    let mut result = parse_response(&raw.content)?;
    if raw.usage.is_some() {
        result.usage = raw.usage;
    }

    Ok(result)
}
