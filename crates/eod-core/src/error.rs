//! Error types for the eod-core library.

use thiserror::Error;

/// Main error type for the eod library.
#[derive(Error, Debug)]
pub enum EodError {
    /// Report field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Audit round-trip error.
    #[error("audit error: {0}")]
    Audit(#[from] AuditError),

    /// PDF text loading error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Input file type that cannot be read.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),
}

/// Errors related to report field extraction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// A labeled field matched but its numeric token could not be parsed.
    #[error("malformed value for {field}: {value:?}")]
    MalformedField { field: String, value: String },

    /// The report text is empty.
    #[error("no report text to extract from")]
    NoData,
}

impl ExtractionError {
    pub fn malformed(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::MalformedField {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Errors raised while interpreting the reasoning collaborator's response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The payload is not a structured object at all.
    #[error("invalid audit payload: {0}")]
    InvalidPayload(String),
}

/// Errors on the AI audit path.
#[derive(Error, Debug)]
pub enum AuditError {
    /// No API credential is available; the audit step is skipped.
    #[error("no API credential available (set {0})")]
    NoCredential(String),

    /// The external call itself failed.
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// The response could not be interpreted.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Errors related to PDF text loading.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF produced no text.
    #[error("PDF contains no extractable text")]
    Empty,
}

/// Result type for the eod library.
pub type Result<T> = std::result::Result<T, EodError>;
