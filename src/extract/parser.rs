//! Defensive decoding of collaborator output into [`CandidateData`].
//!
//! The collaborator is an LLM, so the decoder tolerates:
//! - markdown code fences and prose around the JSON object
//! - the original Indonesian key names (`lokasi`, `jumlah_tamu`, ...)
//! - integers sent as strings (`"5"`, `"Rp 3.000.000"`)
//! - a single preference sent as a bare string
//!
//! A field of the wrong shape is dropped (treated as absent) and reported as a
//! note; only an unreadable document is an error.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use crate::booking::{BookingField, CandidateData, Field, StayDate};
use crate::errors::ExtractionError;
use crate::util::{extract_json_object, strip_code_fences};

static GROUPED_INTEGER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i:rp\.?|idr|usd|\$|€)?\s*(\d{1,3}(?:[.,\s]\d{3})+|\d+)$").unwrap()
});

/// Placeholder strings some models emit instead of JSON null.
const NULL_STRINGS: &[&str] = &["null", "none", "n/a", "unknown", "-"];

/// Decoded collaborator output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCandidate {
    pub candidate: CandidateData,
    /// Fields that were present but unusable.
    pub notes: Vec<String>,
}

/// Decode a raw collaborator response.
pub fn parse_response(raw: &str) -> Result<ParsedCandidate, ExtractionError> {
    let body = strip_code_fences(raw);
    if body.is_empty() {
        return Err(ExtractionError::MalformedExtractionOutput(
            "empty response".to_string(),
        ));
    }

    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(first_err) => {
            let object = extract_json_object(body).ok_or_else(|| {
                ExtractionError::MalformedExtractionOutput(format!(
                    "no JSON object found ({})",
                    first_err
                ))
            })?;
            serde_json::from_str(&object).map_err(|e| {
                ExtractionError::MalformedExtractionOutput(format!("invalid JSON: {}", e))
            })?
        }
    };

    let Value::Object(map) = value else {
        return Err(ExtractionError::MalformedExtractionOutput(
            "expected a JSON object".to_string(),
        ));
    };

    Ok(decode_object(&map))
}

fn decode_object(map: &Map<String, Value>) -> ParsedCandidate {
    let mut notes = Vec::new();
    let candidate = CandidateData {
        location: decode(map, BookingField::Location, &mut notes, as_text),
        checkin: decode(map, BookingField::Checkin, &mut notes, |v| {
            as_text(v).map(StayDate::new)
        }),
        checkout: decode(map, BookingField::Checkout, &mut notes, |v| {
            as_text(v).map(StayDate::new)
        }),
        nights: decode(map, BookingField::Nights, &mut notes, |v| {
            as_integer(v).and_then(|n| u32::try_from(n).ok())
        }),
        guests: decode(map, BookingField::Guests, &mut notes, |v| {
            as_integer(v).and_then(|n| u32::try_from(n).ok())
        }),
        budget: decode(map, BookingField::Budget, &mut notes, as_integer),
        preferences: decode(map, BookingField::Preferences, &mut notes, as_string_list),
    };
    ParsedCandidate { candidate, notes }
}

/// First non-null value under the key or one of its aliases, else the first null hit.
fn lookup<'a>(map: &'a Map<String, Value>, field: BookingField) -> Option<&'a Value> {
    let mut hits = std::iter::once(field.key())
        .chain(field.aliases().iter().copied())
        .filter_map(|k| map.get(k));
    let first = hits.next()?;
    if !is_null_like(first) {
        return Some(first);
    }
    hits.find(|v| !is_null_like(v)).or(Some(first))
}

fn decode<T>(
    map: &Map<String, Value>,
    field: BookingField,
    notes: &mut Vec<String>,
    convert: impl Fn(&Value) -> Option<T>,
) -> Field<T> {
    match lookup(map, field) {
        None => Field::Absent,
        Some(v) if is_null_like(v) => Field::Null,
        Some(v) => match convert(v) {
            Some(converted) => Field::Value(converted),
            None => {
                notes.push(format!("Ignored unusable {} value: {}", field.label(), v));
                Field::Absent
            }
        },
    }
}

fn is_null_like(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => {
            let s = s.trim();
            s.is_empty() || NULL_STRINGS.iter().any(|n| s.eq_ignore_ascii_case(n))
        }
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn as_text(value: &Value) -> Option<String> {
    value.as_str().map(|s| s.trim().to_string())
}

fn as_integer(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => {
            let caps = GROUPED_INTEGER_REGEX.captures(s.trim())?;
            let digits: String = caps.get(1)?.as_str().chars().filter(char::is_ascii_digit).collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

fn as_string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(vec![s.trim().to_string()]),
        Value::Array(items) => {
            let list: Vec<String> = items
                .iter()
                .filter_map(|item| item.as_str().map(|s| s.trim().to_string()))
                .filter(|s| !s.is_empty())
                .collect();
            (!list.is_empty()).then_some(list)
        }
        _ => None,
    }
}
