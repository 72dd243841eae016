//! Labeled amount extraction for report totals.

use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::ExtractionError;
use crate::models::report::ReportTotals;

use super::patterns::{GRAND_TOTAL, MERCHANDISE_SALES, TAX_A, TAX_B, TAX_C, TAX_TOTAL};
use super::{ExtractionMatch, FieldExtractor, FieldResult};

/// Scalar fields of [`ReportTotals`], in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarField {
    Subtotal,
    TaxA,
    TaxB,
    TaxC,
    TaxTotal,
    GrandTotal,
}

impl ScalarField {
    pub const ALL: [ScalarField; 6] = [
        ScalarField::Subtotal,
        ScalarField::TaxA,
        ScalarField::TaxB,
        ScalarField::TaxC,
        ScalarField::TaxTotal,
        ScalarField::GrandTotal,
    ];

    /// Field name as serialized.
    pub fn name(&self) -> &'static str {
        match self {
            ScalarField::Subtotal => "subtotal",
            ScalarField::TaxA => "tax_a",
            ScalarField::TaxB => "tax_b",
            ScalarField::TaxC => "tax_c",
            ScalarField::TaxTotal => "tax_total",
            ScalarField::GrandTotal => "grand_total",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            ScalarField::Subtotal => &*MERCHANDISE_SALES,
            ScalarField::TaxA => &*TAX_A,
            ScalarField::TaxB => &*TAX_B,
            ScalarField::TaxC => &*TAX_C,
            ScalarField::TaxTotal => &*TAX_TOTAL,
            ScalarField::GrandTotal => &*GRAND_TOTAL,
        }
    }

    /// The label must not be the tail of a longer label on the same line.
    fn standalone(&self) -> bool {
        matches!(self, ScalarField::GrandTotal)
    }

    pub fn get(&self, totals: &ReportTotals) -> Decimal {
        match self {
            ScalarField::Subtotal => totals.subtotal,
            ScalarField::TaxA => totals.tax_a,
            ScalarField::TaxB => totals.tax_b,
            ScalarField::TaxC => totals.tax_c,
            ScalarField::TaxTotal => totals.tax_total,
            ScalarField::GrandTotal => totals.grand_total,
        }
    }

    pub fn set(&self, totals: &mut ReportTotals, amount: Decimal) {
        let slot = match self {
            ScalarField::Subtotal => &mut totals.subtotal,
            ScalarField::TaxA => &mut totals.tax_a,
            ScalarField::TaxB => &mut totals.tax_b,
            ScalarField::TaxC => &mut totals.tax_c,
            ScalarField::TaxTotal => &mut totals.tax_total,
            ScalarField::GrandTotal => &mut totals.grand_total,
        };
        *slot = amount;
    }
}

/// Extractor for one labeled amount.
pub struct LabeledAmountExtractor {
    field: ScalarField,
}

impl LabeledAmountExtractor {
    pub fn new(field: ScalarField) -> Self {
        Self { field }
    }
}

impl FieldExtractor for LabeledAmountExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract_all(&self, text: &str) -> Vec<Result<Self::Output, ExtractionError>> {
        let mut results = Vec::new();

        for caps in self.field.pattern().captures_iter(text) {
            let Some(full_match) = caps.get(0) else {
                continue;
            };
            if self.field.standalone() && preceded_by_label(text, full_match.start()) {
                continue;
            }

            let token = &caps[1];
            let result = parse_amount(token)
                .map(|amount| {
                    ExtractionMatch::new(amount, 0.95, full_match.as_str())
                        .with_position(full_match.start(), full_match.end())
                })
                .ok_or_else(|| ExtractionError::malformed(self.field.name(), token));
            results.push(result);
        }

        results
    }
}

/// True when the token right before `pos` on the same line is a label word
/// (`Tax`, `Grand`, `Sub-`). A preceding number is another field's value.
fn preceded_by_label(text: &str, pos: usize) -> bool {
    text[..pos]
        .trim_end_matches([' ', '\t'])
        .rsplit(char::is_whitespace)
        .next()
        .is_some_and(|token| token.chars().any(char::is_alphabetic))
}

/// Run every scalar rule. One entry per field, in report order.
pub fn extract_scalar_outcomes(
    text: &str,
) -> Vec<(ScalarField, FieldResult<ExtractionMatch<Decimal>>)> {
    ScalarField::ALL
        .into_iter()
        .map(|field| (field, LabeledAmountExtractor::new(field).extract(text)))
        .collect()
}

/// Extract the labeled totals, first match per field, zero when absent.
///
/// Fails with [`ExtractionError::MalformedField`] naming the first field whose
/// matched token is not a number.
pub fn extract_scalar_fields(text: &str) -> Result<ReportTotals, ExtractionError> {
    let mut totals = ReportTotals::default();

    for (field, outcome) in extract_scalar_outcomes(text) {
        if let Some(found) = outcome? {
            field.set(&mut totals, found.value);
        }
    }

    Ok(totals)
}

lazy_static! {
    static ref AMOUNT_TOKEN: Regex = Regex::new(
        r"^(?:\d{1,3}(?:,\d{3})+|\d+)?(?:\.\d*)?$"
    ).unwrap();
}

/// Largest amount accepted from report text. Keeps every sum the validator
/// computes well inside `Decimal` range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Parse a report amount token (`1234.56`, `1,234.56`, `.50`, `12`).
///
/// Returns `None` for anything else, e.g. `1.2.3`, `.`, `12,34`, or an amount
/// above [`MAX_AMOUNT`].
pub fn parse_amount(token: &str) -> Option<Decimal> {
    let token = token.trim();
    if !token.chars().any(|c| c.is_ascii_digit()) || !AMOUNT_TOKEN.is_match(token) {
        return None;
    }

    let mut normalized = token.replace(',', "");
    if normalized.starts_with('.') {
        normalized.insert(0, '0');
    }
    if normalized.ends_with('.') {
        normalized.pop();
    }

    Decimal::from_str(&normalized)
        .ok()
        .filter(|amount| *amount <= MAX_AMOUNT)
}
