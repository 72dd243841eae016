//! Rule-based field extractors for end-of-day reports.
//!
//! Each rule is an independent pattern + decoder pair. A rule either finds
//! nothing, finds a value, or finds a labeled token it cannot decode; one
//! rule's failure never affects another.

pub mod amounts;
pub mod departments;
pub mod hourly;
pub mod patterns;
pub mod payments;

pub use amounts::{
    extract_scalar_fields, extract_scalar_outcomes, parse_amount, LabeledAmountExtractor,
    ScalarField,
};
pub use departments::{
    extract_department_rows, extract_department_table, DepartmentExtractor, DepartmentTable,
};
pub use hourly::{extract_hourly_rows, HourlyExtractor};
pub use payments::{extract_payments, PaymentExtractor};

use crate::error::ExtractionError;

/// Outcome of a single-value rule: absent, present, or malformed.
pub type FieldResult<T> = Result<Option<T>, ExtractionError>;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract every occurrence in document order. Undecodable occurrences
    /// are reported in place as errors.
    fn extract_all(&self, text: &str) -> Vec<Result<Self::Output, ExtractionError>>;

    /// Extract the first occurrence in document order.
    fn extract(&self, text: &str) -> FieldResult<Self::Output> {
        self.extract_all(text).into_iter().next().transpose()
    }
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Byte span in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}
