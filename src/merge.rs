//! Non-destructive merge of freshly extracted data into the accumulated record.
//!
//! Rules:
//! - A scalar is overwritten only when the candidate carries a value for it.
//!   Null and absent candidate fields leave the existing value alone.
//! - Preferences merge as an ordered union (existing first, then unseen new ones).
//! - Date reconciliation runs after the scalar merge: with both dates known,
//!   `nights` follows `checkout - checkin`; with check-in and nights but no
//!   check-out, the check-out is derived.
//!
//! Merging never fails. Problems surface as [`MergeWarning`]s.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::booking::{BookingData, BookingField, CandidateData, Field, StayDate};

/// Non-fatal problem detected while merging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MergeWarning {
    /// Check-out is not after check-in; nights left untouched for correction.
    InvalidDateRange { checkin: String, checkout: String },
    /// A date literal did not parse as `YYYY-MM-DD`; kept verbatim.
    MalformedDate { field: BookingField, value: String },
    /// Deriving a check-out from check-in + nights overflowed the calendar.
    DateOutOfRange { checkin: String, nights: u32 },
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeWarning::InvalidDateRange { checkin, checkout } => write!(
                f,
                "check-out date {} is not after check-in date {}; please correct the dates",
                checkout, checkin
            ),
            MergeWarning::MalformedDate { field, value } => write!(
                f,
                "{} '{}' is not a valid YYYY-MM-DD date; please correct it",
                field.label(),
                value
            ),
            MergeWarning::DateOutOfRange { checkin, nights } => write!(
                f,
                "cannot derive a check-out date from {} plus {} nights",
                checkin, nights
            ),
        }
    }
}

/// Result of a merge: the combined record plus any warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub data: BookingData,
    pub warnings: Vec<MergeWarning>,
}

/// Merge `candidate` into `existing`, returning the combined record.
pub fn merge(existing: &BookingData, candidate: &CandidateData) -> MergeOutcome {
    let mut data = existing.clone();

    overwrite(&mut data.location, &candidate.location);
    overwrite(&mut data.checkin, &candidate.checkin);
    overwrite(&mut data.checkout, &candidate.checkout);
    overwrite(&mut data.nights, &candidate.nights);
    overwrite(&mut data.guests, &candidate.guests);
    overwrite(&mut data.budget, &candidate.budget);

    if let Field::Value(prefs) = &candidate.preferences {
        union_preferences(&mut data.preferences, prefs);
    }

    let warnings = reconcile_dates(&mut data);
    MergeOutcome { data, warnings }
}

fn overwrite<T: Clone>(slot: &mut Option<T>, candidate: &Field<T>) {
    if let Field::Value(v) = candidate {
        *slot = Some(v.clone());
    }
}

/// Append unseen, non-blank preferences while keeping first-seen order.
pub fn union_preferences(existing: &mut Vec<String>, incoming: &[String]) {
    for pref in incoming {
        let pref = pref.trim();
        if pref.is_empty() || existing.iter().any(|p| p == pref) {
            continue;
        }
        existing.push(pref.to_string());
    }
}

fn reconcile_dates(data: &mut BookingData) -> Vec<MergeWarning> {
    let mut warnings = Vec::new();

    let checkin = data.checkin.as_ref().map(|d| (d.clone(), d.parse()));
    let checkout = data.checkout.as_ref().map(|d| (d.clone(), d.parse()));

    for (field, date) in [
        (BookingField::Checkin, &checkin),
        (BookingField::Checkout, &checkout),
    ] {
        if let Some((literal, None)) = date {
            warnings.push(MergeWarning::MalformedDate {
                field,
                value: literal.to_string(),
            });
        }
    }

    match (checkin, checkout) {
        (Some((in_lit, Some(in_date))), Some((out_lit, Some(out_date)))) => {
            let nights = (out_date - in_date).num_days();
            if nights <= 0 {
                warnings.push(MergeWarning::InvalidDateRange {
                    checkin: in_lit.to_string(),
                    checkout: out_lit.to_string(),
                });
            } else {
                data.nights = u32::try_from(nights).ok().or(data.nights);
            }
        }
        (Some((in_lit, Some(in_date))), None) => {
            if let Some(nights) = data.nights.filter(|n| *n > 0) {
                match in_date.checked_add_signed(Duration::days(i64::from(nights))) {
                    Some(out_date) => data.checkout = Some(StayDate::from_date(out_date)),
                    None => warnings.push(MergeWarning::DateOutOfRange {
                        checkin: in_lit.to_string(),
                        nights,
                    }),
                }
            }
        }
        _ => {}
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> CandidateData {
        CandidateData::default()
    }

    fn full_record() -> BookingData {
        BookingData {
            location: Some("Nusa Dua".into()),
            checkin: Some(StayDate::new("2025-07-01")),
            checkout: Some(StayDate::new("2025-07-04")),
            nights: Some(3),
            guests: Some(2),
            budget: Some(2_000_000),
            preferences: vec!["pool".into()],
        }
    }

    #[test]
    fn test_absent_and_null_fields_never_clear_existing() {
        let existing = full_record();
        let c = CandidateData {
            location: Field::Null,
            guests: Field::Null,
            budget: Field::Absent,
            preferences: Field::Null,
            ..candidate()
        };
        let out = merge(&existing, &c);
        assert_eq!(out.data, existing);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_values_overwrite_existing() {
        let existing = full_record();
        let c = CandidateData {
            location: Field::Value("Ubud".into()),
            budget: Field::Value(5_500_000),
            ..candidate()
        };
        let out = merge(&existing, &c);
        assert_eq!(out.data.location.as_deref(), Some("Ubud"));
        assert_eq!(out.data.budget, Some(5_500_000));
        assert_eq!(out.data.guests, Some(2));
    }

    #[test]
    fn test_preferences_ordered_union() {
        let existing = BookingData {
            preferences: vec!["a".into(), "b".into()],
            ..Default::default()
        };
        let c = CandidateData {
            preferences: Field::Value(vec!["b".into(), "c".into()]),
            ..candidate()
        };
        let out = merge(&existing, &c);
        assert_eq!(out.data.preferences, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_preferences_dedupe_within_candidate_and_skip_blank() {
        let mut prefs = Vec::new();
        union_preferences(
            &mut prefs,
            &["spa".into(), " spa ".into(), "".into(), "view".into()],
        );
        assert_eq!(prefs, vec!["spa", "view"]);
    }

    #[test]
    fn test_checkout_derived_from_checkin_and_nights() {
        let c = CandidateData {
            checkin: Field::Value(StayDate::new("2025-06-20")),
            nights: Field::Value(5),
            ..candidate()
        };
        let out = merge(&BookingData::default(), &c);
        assert_eq!(out.data.checkout, Some(StayDate::new("2025-06-25")));
        assert_eq!(out.data.nights, Some(5));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_nights_computed_from_both_dates() {
        let c = CandidateData {
            checkin: Field::Value(StayDate::new("2025-06-20")),
            checkout: Field::Value(StayDate::new("2025-06-25")),
            nights: Field::Value(2),
            ..candidate()
        };
        let out = merge(&BookingData::default(), &c);
        assert_eq!(out.data.nights, Some(5));
    }

    #[test]
    fn test_invalid_range_leaves_nights_and_warns() {
        let existing = BookingData {
            nights: Some(3),
            ..Default::default()
        };
        let c = CandidateData {
            checkin: Field::Value(StayDate::new("2025-06-25")),
            checkout: Field::Value(StayDate::new("2025-06-20")),
            ..candidate()
        };
        let out = merge(&existing, &c);
        assert_eq!(out.data.nights, Some(3));
        assert_eq!(out.data.checkin, Some(StayDate::new("2025-06-25")));
        assert_eq!(out.data.checkout, Some(StayDate::new("2025-06-20")));
        assert!(matches!(
            out.warnings.as_slice(),
            [MergeWarning::InvalidDateRange { .. }]
        ));
    }

    #[test]
    fn test_same_day_range_is_invalid() {
        let c = CandidateData {
            checkin: Field::Value(StayDate::new("2025-06-20")),
            checkout: Field::Value(StayDate::new("2025-06-20")),
            ..candidate()
        };
        let out = merge(&BookingData::default(), &c);
        assert_eq!(out.data.nights, None);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_malformed_date_kept_with_warning() {
        let c = CandidateData {
            checkin: Field::Value(StayDate::new("June 20th")),
            nights: Field::Value(2),
            ..candidate()
        };
        let out = merge(&BookingData::default(), &c);
        assert_eq!(out.data.checkin, Some(StayDate::new("June 20th")));
        assert_eq!(out.data.checkout, None);
        assert_eq!(
            out.warnings,
            vec![MergeWarning::MalformedDate {
                field: BookingField::Checkin,
                value: "June 20th".into()
            }]
        );
    }

    #[test]
    fn test_existing_checkout_not_rederived() {
        let existing = BookingData {
            checkin: Some(StayDate::new("2025-06-20")),
            checkout: Some(StayDate::new("2025-06-22")),
            nights: Some(2),
            ..Default::default()
        };
        let c = CandidateData {
            checkout: Field::Value(StayDate::new("2025-06-24")),
            ..candidate()
        };
        let out = merge(&existing, &c);
        assert_eq!(out.data.nights, Some(4));
    }

    #[test]
    fn test_new_checkin_with_existing_nights_derives_checkout() {
        let existing = BookingData {
            nights: Some(3),
            ..Default::default()
        };
        let c = CandidateData {
            checkin: Field::Value(StayDate::new("2025-08-20")),
            ..candidate()
        };
        let out = merge(&existing, &c);
        assert_eq!(out.data.checkout, Some(StayDate::new("2025-08-23")));
    }

    #[test]
    fn test_warning_messages_name_the_problem() {
        let w = MergeWarning::InvalidDateRange {
            checkin: "2025-06-25".into(),
            checkout: "2025-06-20".into(),
        };
        assert!(w.to_string().contains("not after"));
        let w = MergeWarning::MalformedDate {
            field: BookingField::Checkout,
            value: "xx".into(),
        };
        assert!(w.to_string().contains("check-out date"));
    }
}
