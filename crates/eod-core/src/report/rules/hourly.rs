//! Sales-by-hour extraction.

use crate::error::ExtractionError;
use crate::models::report::HourlyRow;

use super::amounts::parse_amount;
use super::patterns::HOUR_ROW;
use super::{ExtractionMatch, FieldExtractor};

/// Hourly sales extractor for `9am - 10am  123.45` style rows.
#[derive(Default)]
pub struct HourlyExtractor;

impl HourlyExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl FieldExtractor for HourlyExtractor {
    type Output = ExtractionMatch<HourlyRow>;

    fn extract_all(&self, text: &str) -> Vec<Result<Self::Output, ExtractionError>> {
        let mut results = Vec::new();

        for caps in HOUR_ROW.captures_iter(text) {
            let Some(full_match) = caps.get(0) else {
                continue;
            };
            let hour_range = caps[1].to_string();
            let token = &caps[2];

            let result = match parse_amount(token) {
                Some(sales) => Ok(ExtractionMatch::new(
                    HourlyRow { hour_range, sales },
                    0.9,
                    full_match.as_str(),
                )
                .with_position(full_match.start(), full_match.end())),
                None => Err(ExtractionError::malformed(
                    format!("hourly[{}].sales", hour_range),
                    token,
                )),
            };
            results.push(result);
        }

        results
    }
}

/// Extract hourly rows in text order, skipping undecodable ones.
pub fn extract_hourly_rows(text: &str) -> Vec<HourlyRow> {
    HourlyExtractor::new()
        .extract_all(text)
        .into_iter()
        .filter_map(|r| r.ok())
        .map(|m| m.value)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    #[test]
    fn test_hourly_rows() {
        let text = "Sales by Hour\n9am - 10am 120.50\n10am - 11am   80.00\n11pm - 12am 0.00\n";
        let rows = extract_hourly_rows(text);
        assert_eq!(
            rows,
            vec![
                HourlyRow {
                    hour_range: "9am - 10am".to_string(),
                    sales: Decimal::new(12050, 2),
                },
                HourlyRow {
                    hour_range: "10am - 11am".to_string(),
                    sales: Decimal::new(8000, 2),
                },
                HourlyRow {
                    hour_range: "11pm - 12am".to_string(),
                    sales: Decimal::ZERO,
                },
            ]
        );
    }

    #[test]
    fn test_no_hourly_rows() {
        assert!(extract_hourly_rows("9 - 10 120.00\n9AM - 10AM 5.00").is_empty());
    }

    #[test]
    fn test_malformed_hourly_sales() {
        let results = HourlyExtractor::new().extract_all("1pm - 2pm 1.2.3");
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
