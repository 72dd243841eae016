//! Sales-by-department table extraction.
//!
//! The report has no column delimiters, so a department row is recognized by
//! shape alone: an upper-case name, an integer quantity, a sales amount and
//! optionally one or two trailing numeric columns (percent of sales, net
//! sales) which are discarded. Any other line with the same shape is accepted
//! too. That false-positive risk is reported through [`RowDiagnostics`]
//! rather than hidden; [`RowGrammar::Strict`] trades recall for precision.

use regex::Captures;
use tracing::debug;

use crate::error::ExtractionError;
use crate::models::config::RowGrammar;
use crate::models::report::{DepartmentRow, RowDiagnostics};

use super::amounts::parse_amount;
use super::patterns::{DEPARTMENT_ROW, DEPARTMENT_ROW_STRICT};
use super::{ExtractionMatch, FieldExtractor};

const EXACT_ROW_CONFIDENCE: f32 = 0.9;
const TRAILING_COLUMNS_CONFIDENCE: f32 = 0.6;

/// Department row extractor.
pub struct DepartmentExtractor {
    grammar: RowGrammar,
}

impl DepartmentExtractor {
    pub fn new() -> Self {
        Self {
            grammar: RowGrammar::default(),
        }
    }

    pub fn with_grammar(mut self, grammar: RowGrammar) -> Self {
        self.grammar = grammar;
        self
    }

    fn decode(&self, caps: &Captures<'_>) -> Option<Result<ExtractionMatch<DepartmentRow>, ExtractionError>> {
        let full_match = caps.get(0)?;
        let name = caps[1].trim();

        // Purely numeric "names" are column fragments, not departments.
        if !name.chars().any(|c| c.is_ascii_uppercase()) {
            return None;
        }

        let quantity = match caps[2].parse::<i64>() {
            Ok(q) => q,
            Err(_) => {
                return Some(Err(ExtractionError::malformed(
                    format!("departments[{}].quantity", name),
                    &caps[2],
                )));
            }
        };

        let Some(sales) = parse_amount(&caps[3]) else {
            return Some(Err(ExtractionError::malformed(
                format!("departments[{}].sales", name),
                &caps[3],
            )));
        };

        let has_trailing = caps.get(4).is_some_and(|m| !m.as_str().trim().is_empty());
        let confidence = if has_trailing {
            TRAILING_COLUMNS_CONFIDENCE
        } else {
            EXACT_ROW_CONFIDENCE
        };

        let source = full_match.as_str().trim_end_matches('\r');
        Some(Ok(ExtractionMatch::new(
            DepartmentRow::new(name, quantity, sales),
            confidence,
            source,
        )
        .with_position(full_match.start(), full_match.end())))
    }
}

impl Default for DepartmentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DepartmentExtractor {
    type Output = ExtractionMatch<DepartmentRow>;

    fn extract_all(&self, text: &str) -> Vec<Result<Self::Output, ExtractionError>> {
        let pattern = match self.grammar {
            RowGrammar::Lenient => &*DEPARTMENT_ROW,
            RowGrammar::Strict => &*DEPARTMENT_ROW_STRICT,
        };

        pattern
            .captures_iter(text)
            .filter_map(|caps| self.decode(&caps))
            .collect()
    }
}

/// Department rows together with run diagnostics.
#[derive(Debug, Clone, Default)]
pub struct DepartmentTable {
    /// Accepted rows in text order.
    pub rows: Vec<ExtractionMatch<DepartmentRow>>,
    /// Shape-matching lines whose numbers could not be decoded.
    pub rejected: Vec<ExtractionError>,
    pub diagnostics: RowDiagnostics,
}

impl DepartmentTable {
    /// Rows that had trailing columns discarded.
    pub fn ambiguous_rows(&self) -> impl Iterator<Item = &ExtractionMatch<DepartmentRow>> {
        self.rows.iter().filter(|r| r.confidence < EXACT_ROW_CONFIDENCE)
    }

    pub fn into_rows(self) -> Vec<DepartmentRow> {
        self.rows.into_iter().map(|m| m.value).collect()
    }
}

/// Extract the department table with diagnostics.
pub fn extract_department_table(text: &str, grammar: RowGrammar) -> DepartmentTable {
    let mut table = DepartmentTable::default();

    for result in DepartmentExtractor::new().with_grammar(grammar).extract_all(text) {
        match result {
            Ok(row) => table.rows.push(row),
            Err(e) => {
                debug!("Rejected department row: {}", e);
                table.rejected.push(e);
            }
        }
    }

    let matched = table.rows.len();
    let ambiguous = table.ambiguous_rows().count();
    let confidence = if matched == 0 {
        0.0
    } else {
        table.rows.iter().map(|r| r.confidence).sum::<f32>() / matched as f32
    };

    table.diagnostics = RowDiagnostics {
        candidate_lines: text
            .lines()
            .filter(|l| l.chars().any(|c| c.is_ascii_digit()))
            .count(),
        matched_rows: matched,
        ambiguous_rows: ambiguous,
        confidence,
    };

    table
}

/// Extract department rows in text order. Empty when nothing matches.
pub fn extract_department_rows(text: &str) -> Vec<DepartmentRow> {
    extract_department_table(text, RowGrammar::Lenient).into_rows()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    #[test]
    fn test_two_column_rows() {
        let rows = extract_department_rows("GROCERY 10 150.00\nDELI 5 50.00");
        assert_eq!(
            rows,
            vec![
                DepartmentRow::new("GROCERY", 10, Decimal::new(15000, 2)),
                DepartmentRow::new("DELI", 5, Decimal::new(5000, 2)),
            ]
        );
    }

    #[test]
    fn test_trailing_columns_discarded() {
        let table = extract_department_table(
            "HEALTH & BEAUTY 3 45.50 12.5% 45.50\nBEER 7 70.00 30.00\n",
            RowGrammar::Lenient,
        );
        let rows: Vec<_> = table.rows.iter().map(|m| m.value.clone()).collect();
        assert_eq!(
            rows,
            vec![
                DepartmentRow::new("HEALTH & BEAUTY", 3, Decimal::new(4550, 2)),
                DepartmentRow::new("BEER", 7, Decimal::new(7000, 2)),
            ]
        );
        assert_eq!(table.diagnostics.ambiguous_rows, 2);
        let spans: Vec<_> = table.ambiguous_rows().map(|m| m.position).collect();
        assert_eq!(spans, vec![Some((0, 35)), Some((36, 54))]);
        assert!(table.diagnostics.confidence < EXACT_ROW_CONFIDENCE);
    }

    #[test]
    fn test_names_with_punctuation_and_digits() {
        let rows = extract_department_rows("  MEN'S WEAR 2 19.99\n2-LITER SODA 4 8.00\nST. PAUL 1 1.00");
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["MEN'S WEAR", "2-LITER SODA", "ST. PAUL"]);
    }

    #[test]
    fn test_report_labels_are_not_rows() {
        let text = "Merchandise Sales 200.00\nTax A 10.00\nTotal 216.00\nCash: 216.00\n";
        assert!(extract_department_rows(text).is_empty());
    }

    #[test]
    fn test_numeric_only_lines_rejected() {
        assert!(extract_department_rows("12 3 4.00\n").is_empty());
    }

    #[test]
    fn test_shape_matches_unrelated_lines() {
        // Known false positive: any upper-case label with two numbers is a row.
        let rows = extract_department_rows("TRANSACTIONS 42 1310.25\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "TRANSACTIONS");
    }

    #[test]
    fn test_malformed_sales_rejected_not_fatal() {
        let table = extract_department_table("DELI 5 5.0.0\nBAKERY 2 4.00\n", RowGrammar::Lenient);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rejected.len(), 1);
        assert_eq!(
            table.rejected[0],
            ExtractionError::malformed("departments[DELI].sales", "5.0.0")
        );
    }

    #[test]
    fn test_strict_grammar() {
        let text = "GROCERY 10 150.00\nBEER 7 70.00 30.00\nDELI 5 50\nPRODUCE 3 1,204.10\n";
        let table = extract_department_table(text, RowGrammar::Strict);
        let names: Vec<_> = table.rows.iter().map(|m| m.value.name.as_str()).collect();
        assert_eq!(names, vec!["GROCERY", "PRODUCE"]);
        assert_eq!(table.rows[1].value.sales, Decimal::new(120410, 2));
        assert_eq!(table.diagnostics.ambiguous_rows, 0);
    }

    #[test]
    fn test_diagnostics_for_empty_text() {
        let table = extract_department_table("", RowGrammar::Lenient);
        assert!(table.rows.is_empty());
        assert_eq!(table.diagnostics, RowDiagnostics::default());
    }

    #[test]
    fn test_crlf_lines() {
        let rows = extract_department_rows("GROCERY 10 150.00\r\nDELI 5 50.00\r\n");
        assert_eq!(rows.len(), 2);
    }
}
