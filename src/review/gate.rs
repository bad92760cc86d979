//! Review gate: classifies the human reply and picks the next transition.
//!
//! | Decision    | Route                                                        |
//! |-------------|--------------------------------------------------------------|
//! | `Affirm`    | `Finalize` when every required field is filled and the dates form a valid range, otherwise `Extract` with a prompt naming the unresolved fields |
//! | `Finish`    | `Finalize`, skipping the completeness check                  |
//! | `Otherwise` | `Extract` with the raw reply as the next input               |
//! | blank reply | `Await`: stay suspended without spending an iteration        |

use serde::{Deserialize, Serialize};

use crate::booking::{BookingData, BookingField};

/// Fields that gate automatic finalization.
pub const REQUIRED_FIELDS: [BookingField; 4] = [
    BookingField::Location,
    BookingField::Checkin,
    BookingField::Nights,
    BookingField::Guests,
];

/// Case-insensitive word lists used to classify replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Replies acknowledging the data as accurate.
    pub affirm: Vec<String>,
    /// Replies asking to stop gathering data.
    pub finish: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            affirm: default_affirm(),
            finish: default_finish(),
        }
    }
}

pub fn default_affirm() -> Vec<String> {
    ["agree", "ok", "okay", "correct", "yes", "setuju", "benar"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub fn default_finish() -> Vec<String> {
    ["done", "proceed", "finish", "selesai", "lanjut"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Vocabulary {
    pub fn new(affirm: Vec<String>, finish: Vec<String>) -> Self {
        Self { affirm, finish }
    }

    /// Classify a human reply.
    ///
    /// Surrounding whitespace and trailing `.`/`!` are ignored; everything else
    /// must match a vocabulary word exactly (ignoring case).
    pub fn classify(&self, reply: &str) -> Decision {
        let normalized = normalize(reply);
        if contains_word(&self.affirm, &normalized) {
            Decision::Affirm
        } else if contains_word(&self.finish, &normalized) {
            Decision::Finish
        } else {
            Decision::Otherwise(reply.trim().to_string())
        }
    }
}

fn normalize(reply: &str) -> String {
    reply
        .trim()
        .trim_end_matches(['.', '!'])
        .trim()
        .to_lowercase()
}

fn contains_word(words: &[String], normalized: &str) -> bool {
    !normalized.is_empty() && words.iter().any(|w| w.trim().to_lowercase() == normalized)
}

/// Classified human decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Affirm,
    Finish,
    /// Corrective or additional free text.
    Otherwise(String),
}

/// Response categories offered in the suspend payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseCategory {
    Affirm,
    Finish,
    Correction,
}

/// Next transition chosen by the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Run another extraction pass on `user_input`.
    Extract {
        user_input: String,
        audit: String,
        missing: Vec<BookingField>,
    },
    Finalize { audit: String },
    /// Stay at the review point; nothing usable was supplied.
    Await { audit: String },
}

impl Route {
    pub fn is_finalize(&self) -> bool {
        matches!(self, Route::Finalize { .. })
    }
}

/// Required fields not yet filled, in declaration order.
pub fn missing_required(data: &BookingData) -> Vec<BookingField> {
    REQUIRED_FIELDS
        .into_iter()
        .filter(|f| !data.has(*f))
        .collect()
}

/// Fields blocking finalization on an affirm.
///
/// Missing required fields plus both dates when check-out does not follow
/// check-in. Returned in declaration order.
pub fn unresolved_required(data: &BookingData) -> Vec<BookingField> {
    let bad_range = data.has_invalid_date_range();
    BookingField::ALL
        .into_iter()
        .filter(|f| {
            let missing = REQUIRED_FIELDS.contains(f) && !data.has(*f);
            let flagged =
                bad_range && matches!(f, BookingField::Checkin | BookingField::Checkout);
            missing || flagged
        })
        .collect()
}

/// The review gate.
#[derive(Debug, Clone, Default)]
pub struct ReviewGate {
    vocabulary: Vocabulary,
}

impl ReviewGate {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn classify(&self, reply: &str) -> Decision {
        self.vocabulary.classify(reply)
    }

    /// Decide where control goes after the human replied `reply` to `data`.
    pub fn route(&self, data: &BookingData, reply: &str) -> Route {
        match self.classify(reply) {
            Decision::Affirm => {
                let missing = unresolved_required(data);
                if missing.is_empty() {
                    Route::Finalize {
                        audit: "Data confirmed by reviewer".to_string(),
                    }
                } else {
                    let names = join_labels(&missing);
                    let mut user_input = format!(
                        "Still missing: {}. Please provide the information not yet mentioned.",
                        names
                    );
                    if data.has_invalid_date_range() {
                        user_input.push_str(" The check-out date must be after the check-in date.");
                    }
                    Route::Extract {
                        user_input,
                        audit: format!("Data incomplete, missing: {}", names),
                        missing,
                    }
                }
            }
            Decision::Finish => Route::Finalize {
                audit: "Reviewer finished data gathering".to_string(),
            },
            Decision::Otherwise(text) if text.is_empty() => Route::Await {
                audit: "Empty reply; still awaiting review".to_string(),
            },
            Decision::Otherwise(text) => Route::Extract {
                audit: format!("Processing additional input: {}", text),
                user_input: text,
                missing: Vec::new(),
            },
        }
    }
}

fn join_labels(fields: &[BookingField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}
