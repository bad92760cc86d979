//! Human-formatted rendering of booking data.
//!
//! Pure string formatting shared by the suspend payload, the final summary
//! and the terminal UI.

use serde::{Deserialize, Serialize};

use crate::booking::{BookingData, BookingField, StayDate};

pub const NOT_SPECIFIED: &str = "Not specified";
pub const NO_PREFERENCES: &str = "None";

/// Currency formatting for budgets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOptions {
    pub currency: String,
    pub thousands_separator: String,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            currency: "Rp".to_string(),
            thousands_separator: ".".to_string(),
        }
    }
}

impl DisplayOptions {
    /// `2000000` → `Rp 2.000.000`.
    pub fn format_budget(&self, amount: u64) -> String {
        let grouped = group_thousands(amount, &self.thousands_separator);
        if self.currency.is_empty() {
            grouped
        } else {
            format!("{} {}", self.currency, grouped)
        }
    }
}

pub fn group_thousands(n: u64, separator: &str) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * separator.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}

/// `2025-06-20` → `20 June 2025`. Malformed literals are returned as-is.
pub fn format_date(date: &StayDate) -> String {
    match date.parse() {
        Some(d) => d.format("%-d %B %Y").to_string(),
        None => date.as_str().to_string(),
    }
}

/// Display strings for every booking field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataView {
    pub location: String,
    pub checkin: String,
    pub checkout: String,
    pub nights: String,
    pub guests: String,
    pub budget: String,
    pub preferences: String,
}

impl DataView {
    pub fn new(data: &BookingData, options: &DisplayOptions) -> Self {
        let shown = |field: BookingField, value: Option<String>| match value {
            Some(v) if data.has(field) => v,
            _ => NOT_SPECIFIED.to_string(),
        };

        Self {
            location: shown(BookingField::Location, data.location.clone()),
            checkin: shown(BookingField::Checkin, data.checkin.as_ref().map(format_date)),
            checkout: shown(BookingField::Checkout, data.checkout.as_ref().map(format_date)),
            nights: shown(BookingField::Nights, data.nights.map(|n| n.to_string())),
            guests: shown(BookingField::Guests, data.guests.map(|n| n.to_string())),
            budget: shown(
                BookingField::Budget,
                data.budget.map(|b| options.format_budget(b)),
            ),
            preferences: if data.preferences.is_empty() {
                NO_PREFERENCES.to_string()
            } else {
                data.preferences.join(", ")
            },
        }
    }

    /// `(label, value)` pairs in display order.
    pub fn rows(&self) -> [(&'static str, &str); 7] {
        [
            ("Location", self.location.as_str()),
            ("Check-in", self.checkin.as_str()),
            ("Check-out", self.checkout.as_str()),
            ("Nights", self.nights.as_str()),
            ("Guests", self.guests.as_str()),
            ("Budget", self.budget.as_str()),
            ("Preferences", self.preferences.as_str()),
        ]
    }
}

/// Audit message appended when a session is finalized.
pub fn final_summary(
    data: &BookingData,
    iterations: u32,
    model: &str,
    options: &DisplayOptions,
) -> String {
    let view = DataView::new(data, options);
    let mut out = String::from("Final booking data:\n");
    for (label, value) in view.rows() {
        out.push_str(&format!("  {}: {}\n", label, value));
    }
    out.push_str(&format!("Extraction iterations: {}\n", iterations));
    out.push_str(&format!("Extraction model: {}\n", model));
    out.push_str("Status: ready for hotel search");
    out
}
