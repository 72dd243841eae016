//! Common regex patterns for end-of-day report extraction.
//!
//! Numeric groups capture a loose `[\d.,]*\d` token. It must end in a digit,
//! so punctuation after a number (`50.00,`, `125.25.`) is left out. Decoding
//! and rejection of garbage like `1.2.3` happens in
//! [`super::amounts::parse_amount`].

use lazy_static::lazy_static;
use regex::Regex;

/// Amount token capture group.
const AMOUNT: &str = r"([\d.,]*\d)";

fn labeled(label: &str) -> Regex {
    Regex::new(&format!(r"{}\s+{}", label, AMOUNT)).unwrap()
}

lazy_static! {
    // Labeled totals
    pub static ref MERCHANDISE_SALES: Regex = labeled("Merchandise Sales");

    pub static ref TAX_A: Regex = labeled("Tax A");

    pub static ref TAX_B: Regex = labeled("Tax B");

    pub static ref TAX_C: Regex = labeled("Tax C");

    pub static ref TAX_TOTAL: Regex = labeled("Tax Total");

    // Also matches the tail of "Tax Total", "Grand Total", ...; callers must
    // reject matches preceded by a label word on the same line.
    pub static ref GRAND_TOTAL: Regex = labeled(r"\bTotal");

    // Drawer totals
    pub static ref PAYMENT: Regex = Regex::new(
        &format!(r"\b(Cash|AmEx|Visa|Master|Other|Discover):\s*{}", AMOUNT)
    ).unwrap();

    // Department table: NAME QTY SALES [EXTRA [EXTRA]]
    pub static ref DEPARTMENT_ROW: Regex = Regex::new(
        &format!(
            r"(?m)^[ \t]*([A-Z0-9][A-Z0-9 &'.\-]*?)[ \t]+(\d+)[ \t]+{}((?:[ \t]+[\d.,]*\d%?){{0,2}})[ \t]*\r?$",
            AMOUNT
        )
    ).unwrap();

    // Department table, strict: NAME QTY SALES with two decimals
    pub static ref DEPARTMENT_ROW_STRICT: Regex = Regex::new(
        r"(?m)^[ \t]*([A-Z][A-Z0-9 &'.\-]*?)[ \t]+(\d+)[ \t]+(\d{1,3}(?:,\d{3})+\.\d{2}|\d+\.\d{2})[ \t]*\r?$"
    ).unwrap();

    // Sales by hour
    pub static ref HOUR_ROW: Regex = Regex::new(
        &format!(r"(\d{{1,2}}[ap]m - \d{{1,2}}[ap]m)\s+{}", AMOUNT)
    ).unwrap();
}
