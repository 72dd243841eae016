//! End-of-day report extraction module.

mod parser;
pub mod rules;

pub use parser::{EodReportParser, ExtractionResult, ReportParser};

use crate::error::ExtractionError;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;
