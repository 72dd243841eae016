//! Configuration structures for the report pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main configuration for the eod pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EodConfig {
    /// Report extraction configuration.
    pub extraction: ExtractionConfig,

    /// Local consistency checks.
    pub validation: ValidationConfig,

    /// AI audit configuration.
    pub audit: AuditConfig,
}

/// Which occurrence wins when a payment method is printed more than once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentCapture {
    /// First occurrence in document order.
    First,
    /// Last occurrence in document order (the final drawer totals page).
    #[default]
    Last,
}

/// Department-row grammar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowGrammar {
    /// Name, quantity, sales, up to two extra trailing columns discarded.
    #[default]
    Lenient,
    /// Name, quantity, sales with exactly two decimals, nothing after.
    Strict,
}

/// Report extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Payment capture policy.
    pub payment_capture: PaymentCapture,

    /// Department-row grammar.
    pub row_grammar: RowGrammar,

    /// Also extract the sales-by-hour table.
    pub extract_hourly: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            payment_capture: PaymentCapture::Last,
            row_grammar: RowGrammar::Lenient,
            extract_hourly: true,
        }
    }
}

/// Local consistency check configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Run the local checks.
    pub enabled: bool,

    /// Reconciliation tolerance.
    pub tolerance: Decimal,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tolerance: Decimal::new(1, 2),
        }
    }
}

/// Model tier offered for the audit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditModel {
    /// Quick and cheap.
    #[default]
    Fast,
    /// Thorough and expensive.
    Deep,
}

impl AuditModel {
    /// Provider model identifier.
    pub fn model_id(&self) -> &'static str {
        match self {
            AuditModel::Fast => "gpt-5-mini",
            AuditModel::Deep => "gpt-5",
        }
    }

    /// Resolve an alias (`fast`, `deep`) or a provider id.
    pub fn from_id(s: &str) -> Option<Self> {
        match s.trim() {
            "fast" | "gpt-5-mini" => Some(AuditModel::Fast),
            "deep" | "gpt-5" => Some(AuditModel::Deep),
            _ => None,
        }
    }
}

/// AI audit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Model tier.
    pub model: AuditModel,

    /// Run the audit right after extraction.
    pub auto_run: bool,

    /// Department rows sent with the request.
    pub max_dept_rows: usize,

    /// Characters of raw report text sent with the request.
    pub max_text_chars: usize,

    /// Decoding temperature hint.
    pub temperature: f32,

    /// Environment variable holding the API key. The key itself is never stored.
    pub api_key_env: String,

    /// Chat completions API base URL.
    pub base_url: String,

    /// Request timeout in seconds (unset = wait indefinitely).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            model: AuditModel::Fast,
            auto_run: false,
            max_dept_rows: 20,
            max_text_chars: 6000,
            temperature: 0.1,
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_secs: None,
        }
    }
}

impl EodConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
