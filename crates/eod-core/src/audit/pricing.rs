//! Per-model token pricing.

use crate::models::config::AuditModel;
use crate::models::finding::Usage;

/// USD rates per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelRate {
    pub model_id: &'static str,
    pub input_per_million: f64,
    pub output_per_million: f64,
}

/// Known model rates.
pub const MODEL_RATES: [ModelRate; 2] = [
    ModelRate {
        model_id: "gpt-5",
        input_per_million: 1.25,
        output_per_million: 10.0,
    },
    ModelRate {
        model_id: "gpt-5-mini",
        input_per_million: 0.25,
        output_per_million: 2.0,
    },
];

/// Rate for a model id or tier alias (`fast`, `deep`).
pub fn rate_for(model: &str) -> Option<&'static ModelRate> {
    let model_id = AuditModel::from_id(model)
        .map(|tier| tier.model_id())
        .unwrap_or(model);
    MODEL_RATES.iter().find(|rate| rate.model_id == model_id)
}

/// Estimated USD cost of one round-trip. Unknown models cost nothing.
pub fn estimate_cost(model: &str, usage: &Usage) -> f64 {
    match rate_for(model) {
        Some(rate) => {
            usage.input_tokens as f64 / 1_000_000.0 * rate.input_per_million
                + usage.output_tokens as f64 / 1_000_000.0 * rate.output_per_million
        }
        None => 0.0,
    }
}
