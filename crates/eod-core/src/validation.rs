//! Local consistency checks over extracted metrics.
//!
//! Pure and deterministic: the same metrics always produce the same findings.
//! Runs without the reasoning collaborator, so a report always gets at least
//! these checks.

use rust_decimal::Decimal;

use crate::models::finding::{amount_value, Finding, Severity};
use crate::models::report::{DepartmentRow, FinancialMetrics};
use crate::report::rules::ScalarField;

/// Default reconciliation tolerance (one cent).
pub const DEFAULT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Arithmetic consistency validator.
#[derive(Debug, Clone, Copy)]
pub struct ConsistencyValidator {
    tolerance: Decimal,
}

impl ConsistencyValidator {
    pub fn new() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance.abs();
        self
    }

    /// Run every check, in a fixed order.
    pub fn validate(&self, metrics: &FinancialMetrics, departments: &[DepartmentRow]) -> Vec<Finding> {
        let mut findings = Vec::new();

        self.check_reconciliation(metrics, &mut findings);
        self.check_drawer(metrics, &mut findings);
        check_zero_tax(metrics, &mut findings);
        check_negative_totals(metrics, &mut findings);
        check_negative_departments(departments, &mut findings);

        findings
    }

    fn check_reconciliation(&self, metrics: &FinancialMetrics, findings: &mut Vec<Finding>) {
        let totals = &metrics.totals;
        let Some(difference) = totals
            .subtotal
            .checked_add(totals.tax_total)
            .and_then(|expected| expected.checked_sub(totals.grand_total))
        else {
            findings.push(out_of_range("totals", "subtotal + tax cannot be reconciled"));
            return;
        };

        if difference.abs() > self.tolerance {
            findings.push(
                Finding::new(
                    Severity::Critical,
                    "grand total does not reconcile with subtotal + tax",
                )
                .at("totals")
                .with_number("subtotal", amount_value(totals.subtotal))
                .with_number("tax_total", amount_value(totals.tax_total))
                .with_number("grand_total", amount_value(totals.grand_total))
                .with_number("difference", amount_value(difference)),
            );
        }
    }

    fn check_drawer(&self, metrics: &FinancialMetrics, findings: &mut Vec<Finding>) {
        let Some((payments_total, difference)) = metrics.payments.checked_total().and_then(|total| {
            total
                .checked_sub(metrics.totals.grand_total)
                .map(|difference| (total, difference))
        }) else {
            findings.push(out_of_range("payments", "payment total cannot be compared"));
            return;
        };

        if difference.abs() > self.tolerance {
            findings.push(
                Finding::new(
                    Severity::Warning,
                    "payment total does not match grand total (drawer mismatch)",
                )
                .at("payments")
                .with_number("payments_total", amount_value(payments_total))
                .with_number("grand_total", amount_value(metrics.totals.grand_total))
                .with_number("difference", amount_value(difference)),
            );
        }
    }
}

impl Default for ConsistencyValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn out_of_range(location: &str, what: &str) -> Finding {
    Finding::new(
        Severity::Critical,
        format!("amount out of range: {}", what),
    )
    .at(location)
}

fn check_zero_tax(metrics: &FinancialMetrics, findings: &mut Vec<Finding>) {
    let totals = &metrics.totals;
    if totals.subtotal > Decimal::ZERO && totals.tax_total.is_zero() {
        findings.push(
            Finding::new(Severity::Warning, "zero tax on non-zero sales")
                .at("tax_total")
                .with_number("subtotal", amount_value(totals.subtotal)),
        );
    }
}

fn check_negative_totals(metrics: &FinancialMetrics, findings: &mut Vec<Finding>) {
    for field in ScalarField::ALL {
        let value = field.get(&metrics.totals);
        if value.is_sign_negative() && !value.is_zero() {
            findings.push(
                Finding::new(Severity::Critical, "negative value where none expected")
                    .at(field.name())
                    .with_number(field.name(), amount_value(value)),
            );
        }
    }
}

fn check_negative_departments(departments: &[DepartmentRow], findings: &mut Vec<Finding>) {
    for (index, row) in departments.iter().enumerate() {
        let negative_sales = row.sales.is_sign_negative() && !row.sales.is_zero();
        if negative_sales || row.quantity < 0 {
            findings.push(
                Finding::new(Severity::Critical, "negative value where none expected")
                    .at(format!("departments[{}] {}", index, row.name))
                    .with_number("quantity", row.quantity)
                    .with_number("sales", amount_value(row.sales)),
            );
        }
    }
}

/// Validate with the default tolerance.
pub fn validate(metrics: &FinancialMetrics, departments: &[DepartmentRow]) -> Vec<Finding> {
    ConsistencyValidator::new().validate(metrics, departments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::{PaymentMethod, Payments, ReportTotals};
    use pretty_assertions::assert_eq;

    fn metrics(subtotal: i64, tax_total: i64, grand_total: i64, cash: i64) -> FinancialMetrics {
        let mut payments = Payments::new();
        payments.set(PaymentMethod::Cash, Decimal::new(cash, 2));
        FinancialMetrics::new(
            ReportTotals {
                subtotal: Decimal::new(subtotal, 2),
                tax_total: Decimal::new(tax_total, 2),
                grand_total: Decimal::new(grand_total, 2),
                ..Default::default()
            },
            payments,
        )
    }

    fn messages(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.message.as_str()).collect()
    }

    #[test]
    fn test_default_tolerance_is_one_cent() {
        assert_eq!(DEFAULT_TOLERANCE, Decimal::new(1, 2));
    }

    #[test]
    fn test_clean_report_has_no_findings() {
        let rows = vec![
            DepartmentRow::new("GROCERY", 10, Decimal::new(15000, 2)),
            DepartmentRow::new("DELI", 5, Decimal::new(5000, 2)),
        ];
        assert!(validate(&metrics(20000, 1600, 21600, 21600), &rows).is_empty());
    }

    #[test]
    fn test_zero_tax_warning() {
        let findings = validate(&metrics(10000, 0, 10000, 10000), &[]);
        assert_eq!(messages(&findings), vec!["zero tax on non-zero sales"]);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_reconciled_totals_have_no_critical() {
        let findings = validate(&metrics(10000, 800, 10800, 0), &[]);
        assert!(findings.iter().all(|f| f.severity != Severity::Critical));
        assert_eq!(
            messages(&findings),
            vec!["payment total does not match grand total (drawer mismatch)"]
        );
    }

    #[test]
    fn test_reconciliation_critical() {
        let findings = validate(&metrics(10000, 800, 11000, 11000), &[]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
        let numbers = findings[0].numbers.as_ref().unwrap();
        assert_eq!(numbers["difference"], serde_json::json!(-2.0));
    }

    #[test]
    fn test_within_tolerance() {
        let findings = validate(&metrics(10000, 800, 10801, 10800), &[]);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_negative_department_row() {
        let rows = vec![
            DepartmentRow::new("GROCERY", 10, Decimal::new(15000, 2)),
            DepartmentRow::new("RETURNS", 1, Decimal::new(-500, 2)),
        ];
        let findings = validate(&metrics(20000, 1600, 21600, 21600), &rows);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].location.as_deref(), Some("departments[1] RETURNS"));
    }

    #[test]
    fn test_negative_quantity() {
        let rows = vec![DepartmentRow::new("DELI", -2, Decimal::new(500, 2))];
        let findings = validate(&metrics(0, 0, 0, 0), &rows);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
    }

    #[test]
    fn test_negative_scalar() {
        let findings = validate(&metrics(100, -1, 99, 99), &[]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.as_deref(), Some("tax_total"));
    }

    #[test]
    fn test_overflowing_totals_are_critical() {
        let mut payments = Payments::new();
        payments.set(PaymentMethod::Cash, Decimal::MAX);
        payments.set(PaymentMethod::Visa, Decimal::MAX);
        let m = FinancialMetrics::new(
            ReportTotals {
                subtotal: Decimal::MAX,
                tax_total: Decimal::MAX,
                grand_total: Decimal::ONE,
                ..Default::default()
            },
            payments,
        );

        let findings = validate(&m, &[]);
        assert_eq!(
            messages(&findings),
            vec![
                "amount out of range: subtotal + tax cannot be reconciled",
                "amount out of range: payment total cannot be compared",
            ]
        );
        assert!(findings.iter().all(|f| f.severity == Severity::Critical));
        assert_eq!(m.payments.total(), Decimal::MAX);
    }

    #[test]
    fn test_deterministic() {
        let m = metrics(10000, 0, 9000, 100);
        assert_eq!(validate(&m, &[]), validate(&m, &[]));
    }
}
