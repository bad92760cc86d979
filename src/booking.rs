//! Structured booking record threaded through every workflow step.
//!
//! Two shapes live here:
//! - [`BookingData`]: the accumulated record stored in the workflow state.
//!   Every field is optional; absence means "not yet known".
//! - [`CandidateData`]: one extraction pass worth of data, where each field is a
//!   tri-state [`Field`] so "key missing", "explicit null" and "value" stay
//!   distinguishable until the merge.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar date format used on the wire and in storage.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A date literal as supplied by the collaborator.
///
/// The literal is kept verbatim even when it does not parse, so a malformed
/// value is shown back to the human instead of being dropped or coerced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StayDate(String);

impl StayDate {
    pub fn new(literal: impl Into<String>) -> Self {
        Self(literal.into().trim().to_string())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format(DATE_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse as `YYYY-MM-DD`. `None` for malformed literals.
    pub fn parse(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.0, DATE_FORMAT).ok()
    }

    pub fn is_valid(&self) -> bool {
        self.parse().is_some()
    }
}

impl fmt::Display for StayDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accumulated booking data for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkin: Option<StayDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout: Option<StayDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nights: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guests: Option<u32>,
    /// Whole currency units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<u64>,
    /// Ordered, duplicate-free.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferences: Vec<String>,
}

impl BookingData {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check whether a field counts as filled for completeness purposes.
    ///
    /// Zero nights or zero guests is treated as not filled, as is a blank location.
    pub fn has(&self, field: BookingField) -> bool {
        match field {
            BookingField::Location => self
                .location
                .as_deref()
                .is_some_and(|l| !l.trim().is_empty()),
            BookingField::Checkin => self.checkin.as_ref().is_some_and(|d| !d.as_str().is_empty()),
            BookingField::Checkout => self
                .checkout
                .as_ref()
                .is_some_and(|d| !d.as_str().is_empty()),
            BookingField::Nights => self.nights.is_some_and(|n| n > 0),
            BookingField::Guests => self.guests.is_some_and(|g| g > 0),
            BookingField::Budget => self.budget.is_some_and(|b| b > 0),
            BookingField::Preferences => !self.preferences.is_empty(),
        }
    }

    /// Both dates parse and check-out does not follow check-in.
    pub fn has_invalid_date_range(&self) -> bool {
        let checkin = self.checkin.as_ref().and_then(StayDate::parse);
        let checkout = self.checkout.as_ref().and_then(StayDate::parse);
        matches!((checkin, checkout), (Some(i), Some(o)) if o <= i)
    }
}

/// Named fields of the booking record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingField {
    Location,
    Checkin,
    Checkout,
    Nights,
    Guests,
    Budget,
    Preferences,
}

impl BookingField {
    pub const ALL: [BookingField; 7] = [
        BookingField::Location,
        BookingField::Checkin,
        BookingField::Checkout,
        BookingField::Nights,
        BookingField::Guests,
        BookingField::Budget,
        BookingField::Preferences,
    ];

    /// Canonical key in collaborator output and stored JSON.
    pub fn key(self) -> &'static str {
        match self {
            BookingField::Location => "location",
            BookingField::Checkin => "checkin",
            BookingField::Checkout => "checkout",
            BookingField::Nights => "nights",
            BookingField::Guests => "guests",
            BookingField::Budget => "budget",
            BookingField::Preferences => "preferences",
        }
    }

    /// Alternate keys accepted from the collaborator.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            BookingField::Location => &["lokasi", "destination"],
            BookingField::Checkin => &["tanggal_checkin", "checkin_date", "check_in"],
            BookingField::Checkout => &["tanggal_checkout", "checkout_date", "check_out"],
            BookingField::Nights => &["jumlah_malam", "night_count"],
            BookingField::Guests => &["jumlah_tamu", "guest_count"],
            BookingField::Budget => &[],
            BookingField::Preferences => &["preferensi"],
        }
    }

    /// Human label used in prompts and audit messages.
    pub fn label(self) -> &'static str {
        match self {
            BookingField::Location => "location",
            BookingField::Checkin => "check-in date",
            BookingField::Checkout => "check-out date",
            BookingField::Nights => "nights",
            BookingField::Guests => "guest count",
            BookingField::Budget => "budget",
            BookingField::Preferences => "preferences",
        }
    }
}

impl fmt::Display for BookingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tri-state value of one candidate field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Field<T> {
    /// The key did not appear at all.
    #[default]
    Absent,
    /// The key appeared with an explicit null.
    Null,
    Value(T),
}

impl<T> Field<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Field::Value(_))
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Field::Value(v),
            None => Field::Null,
        }
    }
}

/// Data produced by a single extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateData {
    pub location: Field<String>,
    pub checkin: Field<StayDate>,
    pub checkout: Field<StayDate>,
    pub nights: Field<u32>,
    pub guests: Field<u32>,
    pub budget: Field<u64>,
    pub preferences: Field<Vec<String>>,
}

impl CandidateData {
    /// Fields carrying an actual value.
    pub fn supplied_fields(&self) -> Vec<BookingField> {
        BookingField::ALL
            .into_iter()
            .filter(|f| match f {
                BookingField::Location => self.location.is_value(),
                BookingField::Checkin => self.checkin.is_value(),
                BookingField::Checkout => self.checkout.is_value(),
                BookingField::Nights => self.nights.is_value(),
                BookingField::Guests => self.guests.is_value(),
                BookingField::Budget => self.budget.is_value(),
                BookingField::Preferences => self.preferences.is_value(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stay_date_parses_iso_dates() {
        let date = StayDate::new("2025-06-20");
        assert_eq!(date.parse(), NaiveDate::from_ymd_opt(2025, 6, 20));
        assert!(date.is_valid());
    }

    #[test]
    fn test_stay_date_keeps_malformed_literal() {
        let date = StayDate::new("20 Juni");
        assert!(date.parse().is_none());
        assert_eq!(date.as_str(), "20 Juni");
    }

    #[test]
    fn test_booking_data_serializes_compactly() {
        let data = BookingData {
            location: Some("Ubud".into()),
            guests: Some(2),
            ..Default::default()
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json, serde_json::json!({"location": "Ubud", "guests": 2}));
    }

    #[test]
    fn test_booking_data_roundtrip_keeps_dates_verbatim() {
        let data = BookingData {
            checkin: Some(StayDate::new("not-a-date")),
            ..Default::default()
        };
        let json = serde_json::to_string(&data).unwrap();
        let back: BookingData = serde_json::from_str(&json).unwrap();
        assert_eq!(back.checkin.unwrap().as_str(), "not-a-date");
    }

    #[test]
    fn test_has_treats_zero_and_blank_as_missing() {
        let data = BookingData {
            location: Some("  ".into()),
            nights: Some(0),
            guests: Some(0),
            ..Default::default()
        };
        assert!(!data.has(BookingField::Location));
        assert!(!data.has(BookingField::Nights));
        assert!(!data.has(BookingField::Guests));
    }

    #[test]
    fn test_invalid_date_range_detection() {
        let mut data = BookingData {
            checkin: Some(StayDate::new("2025-06-20")),
            checkout: Some(StayDate::new("2025-06-15")),
            ..Default::default()
        };
        assert!(data.has_invalid_date_range());

        data.checkout = Some(StayDate::new("2025-06-20"));
        assert!(data.has_invalid_date_range());

        data.checkout = Some(StayDate::new("2025-06-21"));
        assert!(!data.has_invalid_date_range());

        // Unparseable dates are flagged separately as malformed.
        data.checkout = Some(StayDate::new("besok"));
        assert!(!data.has_invalid_date_range());
    }

    #[test]
    fn test_field_from_option() {
        assert_eq!(Field::from(Some(3u32)), Field::Value(3));
        assert_eq!(Field::<u32>::from(None), Field::Null);
        assert_eq!(Field::<u32>::default(), Field::Absent);
    }

    #[test]
    fn test_supplied_fields_ignores_null_and_absent() {
        let candidate = CandidateData {
            location: Field::Value("Ubud".into()),
            nights: Field::Null,
            ..Default::default()
        };
        assert_eq!(candidate.supplied_fields(), vec![BookingField::Location]);
    }
}
