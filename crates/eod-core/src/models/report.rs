//! End-of-day report data models.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment methods printed on the drawer totals section of an EOD report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    AmEx,
    Visa,
    Master,
    Other,
    Discover,
}

impl PaymentMethod {
    /// Every method, in report order.
    pub const ALL: [PaymentMethod; 6] = [
        PaymentMethod::Cash,
        PaymentMethod::AmEx,
        PaymentMethod::Visa,
        PaymentMethod::Master,
        PaymentMethod::Other,
        PaymentMethod::Discover,
    ];

    /// Label exactly as it appears in report text.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::AmEx => "AmEx",
            PaymentMethod::Visa => "Visa",
            PaymentMethod::Master => "Master",
            PaymentMethod::Other => "Other",
            PaymentMethod::Discover => "Discover",
        }
    }

    /// Parse a label as it appears in report text (case-sensitive).
    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.label() == s)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Amount per payment method. Every method is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<PaymentMethod, Decimal>")]
pub struct Payments(BTreeMap<PaymentMethod, Decimal>);

impl Payments {
    /// All methods at zero.
    pub fn new() -> Self {
        Self(PaymentMethod::ALL.into_iter().map(|m| (m, Decimal::ZERO)).collect())
    }

    pub fn get(&self, method: PaymentMethod) -> Decimal {
        self.0.get(&method).copied().unwrap_or_default()
    }

    pub fn set(&mut self, method: PaymentMethod, amount: Decimal) {
        self.0.insert(method, amount);
    }

    /// Sum over all methods, saturating at the `Decimal` bounds.
    pub fn total(&self) -> Decimal {
        self.0
            .values()
            .fold(Decimal::ZERO, |acc, amount| acc.saturating_add(*amount))
    }

    /// Sum over all methods, `None` on overflow.
    pub fn checked_total(&self) -> Option<Decimal> {
        self.0
            .values()
            .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(*amount))
    }

    pub fn iter(&self) -> impl Iterator<Item = (PaymentMethod, Decimal)> + '_ {
        self.0.iter().map(|(m, a)| (*m, *a))
    }
}

impl Default for Payments {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BTreeMap<PaymentMethod, Decimal>> for Payments {
    fn from(map: BTreeMap<PaymentMethod, Decimal>) -> Self {
        let mut payments = Payments::new();
        for (method, amount) in map {
            payments.set(method, amount);
        }
        payments
    }
}

/// Labeled scalar totals of a report. Absent labels stay at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTotals {
    /// Merchandise sales before tax.
    pub subtotal: Decimal,
    pub tax_a: Decimal,
    pub tax_b: Decimal,
    pub tax_c: Decimal,
    pub tax_total: Decimal,
    /// Standalone "Total" line.
    pub grand_total: Decimal,
}

/// Canonical extracted record for one report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    #[serde(flatten)]
    pub totals: ReportTotals,

    pub payments: Payments,
}

impl FinancialMetrics {
    pub fn new(totals: ReportTotals, payments: Payments) -> Self {
        Self { totals, payments }
    }
}

/// One department line of the sales-by-department table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentRow {
    /// Department name as printed.
    pub name: String,

    /// Items sold.
    pub quantity: i64,

    /// Sales amount.
    pub sales: Decimal,
}

impl DepartmentRow {
    pub fn new(name: impl Into<String>, quantity: i64, sales: Decimal) -> Self {
        Self {
            name: name.into(),
            quantity,
            sales,
        }
    }
}

/// One line of the sales-by-hour table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyRow {
    /// Range like `9am - 10am`.
    pub hour_range: String,

    pub sales: Decimal,
}

/// Summary of a department-row extraction run.
///
/// The department grammar is a heuristic over free text and can match
/// unrelated numeric lines; these numbers let callers judge how much to
/// trust the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RowDiagnostics {
    /// Non-empty lines that contain at least one digit.
    pub candidate_lines: usize,

    /// Lines accepted as department rows.
    pub matched_rows: usize,

    /// Accepted rows whose extra trailing columns were discarded.
    pub ambiguous_rows: usize,

    /// Mean row confidence (0.0 when nothing matched).
    pub confidence: f32,
}

/// Everything extracted from one report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EodReport {
    pub metrics: FinancialMetrics,

    /// Department rows in text order.
    pub departments: Vec<DepartmentRow>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hourly: Vec<HourlyRow>,

    pub row_diagnostics: RowDiagnostics,
}

impl EodReport {
    /// Department rows ordered by descending sales. Ties keep text order.
    pub fn departments_by_sales(&self) -> Vec<DepartmentRow> {
        let mut rows = self.departments.clone();
        rows.sort_by(|a, b| b.sales.cmp(&a.sales));
        rows
    }
}
