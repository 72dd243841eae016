//! Payment method extraction from drawer totals.

use rust_decimal::Decimal;

use crate::error::ExtractionError;
use crate::models::config::PaymentCapture;
use crate::models::report::{PaymentMethod, Payments};

use super::amounts::parse_amount;
use super::patterns::PAYMENT;
use super::{ExtractionMatch, FieldExtractor};

/// Payment extractor. Yields every `<Method>: <amount>` occurrence.
pub struct PaymentExtractor {
    capture: PaymentCapture,
}

impl PaymentExtractor {
    pub fn new() -> Self {
        Self {
            capture: PaymentCapture::default(),
        }
    }

    pub fn with_capture(mut self, capture: PaymentCapture) -> Self {
        self.capture = capture;
        self
    }

    /// Fold occurrences into the full method mapping. Malformed occurrences
    /// are skipped and returned alongside.
    pub fn collect(&self, text: &str) -> (Payments, Vec<ExtractionError>) {
        let mut payments = Payments::new();
        let mut seen = Vec::with_capacity(PaymentMethod::ALL.len());
        let mut errors = Vec::new();

        for occurrence in self.extract_all(text) {
            match occurrence {
                Ok(found) => {
                    let (method, amount) = found.value;
                    let first_time = !seen.contains(&method);
                    if first_time || self.capture == PaymentCapture::Last {
                        payments.set(method, amount);
                    }
                    if first_time {
                        seen.push(method);
                    }
                }
                Err(e) => errors.push(e),
            }
        }

        (payments, errors)
    }
}

impl Default for PaymentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for PaymentExtractor {
    type Output = ExtractionMatch<(PaymentMethod, Decimal)>;

    fn extract_all(&self, text: &str) -> Vec<Result<Self::Output, ExtractionError>> {
        let mut results = Vec::new();

        for caps in PAYMENT.captures_iter(text) {
            let (Some(full_match), Some(method)) =
                (caps.get(0), PaymentMethod::from_label(&caps[1]))
            else {
                continue;
            };

            let token = &caps[2];
            let result = parse_amount(token)
                .map(|amount| {
                    ExtractionMatch::new((method, amount), 0.9, full_match.as_str())
                        .with_position(full_match.start(), full_match.end())
                })
                .ok_or_else(|| ExtractionError::malformed(format!("payments.{}", method), token));
            results.push(result);
        }

        results
    }
}

/// Extract the payment mapping. Unseen methods stay at zero.
///
/// Fails on the first malformed amount.
pub fn extract_payments(text: &str, capture: PaymentCapture) -> Result<Payments, ExtractionError> {
    let (payments, errors) = PaymentExtractor::new().with_capture(capture).collect(text);
    match errors.into_iter().next() {
        Some(e) => Err(e),
        None => Ok(payments),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inline_payments() {
        let payments = extract_payments("Cash: 50.00 Visa: 75.25", PaymentCapture::Last).unwrap();
        assert_eq!(payments.get(PaymentMethod::Cash), Decimal::new(5000, 2));
        assert_eq!(payments.get(PaymentMethod::Visa), Decimal::new(7525, 2));
        for method in [
            PaymentMethod::AmEx,
            PaymentMethod::Master,
            PaymentMethod::Other,
            PaymentMethod::Discover,
        ] {
            assert_eq!(payments.get(method), Decimal::ZERO);
        }
    }

    #[test]
    fn test_capture_policy() {
        let text = "Drawer 1\nCash: 10.00\nVisa: 5.00\nDrawer Totals\nCash: 30.00\n";

        let last = extract_payments(text, PaymentCapture::Last).unwrap();
        assert_eq!(last.get(PaymentMethod::Cash), Decimal::new(3000, 2));
        assert_eq!(last.get(PaymentMethod::Visa), Decimal::new(500, 2));

        let first = extract_payments(text, PaymentCapture::First).unwrap();
        assert_eq!(first.get(PaymentMethod::Cash), Decimal::new(1000, 2));
        assert_eq!(first.get(PaymentMethod::Visa), Decimal::new(500, 2));
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        let payments = extract_payments("cash: 10.00 VISA: 2.00", PaymentCapture::Last).unwrap();
        assert_eq!(payments.total(), Decimal::ZERO);
    }

    #[test]
    fn test_malformed_payment() {
        let err = extract_payments("Master: 1.2.3", PaymentCapture::Last).unwrap_err();
        assert_eq!(err, ExtractionError::malformed("payments.Master", "1.2.3"));

        let (payments, errors) = PaymentExtractor::new().collect("Master: 1.2.3\nAmEx: 4.00");
        assert_eq!(errors.len(), 1);
        assert_eq!(payments.get(PaymentMethod::AmEx), Decimal::new(400, 2));
    }
}
