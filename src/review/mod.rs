//! Human review for the intake workflow.
//!
//! The gate classifies the reviewer's reply against two fixed vocabularies
//! (affirm / finish) and decides whether the session loops back to extraction
//! or moves on to finalization.
//!
//! ## Example
//!
//! ```
//! use stayloop::booking::BookingData;
//! use stayloop::review::{ReviewGate, Route};
//!
//! let gate = ReviewGate::default();
//!
//! // Nothing collected yet: "agree" asks for the missing fields
//! let route = gate.route(&BookingData::default(), "agree");
//! assert!(matches!(route, Route::Extract { .. }));
//!
//! // "done" always finalizes
//! assert!(gate.route(&BookingData::default(), "done").is_finalize());
//! ```

pub mod gate;

pub use gate::{
    Decision, REQUIRED_FIELDS, ResponseCategory, ReviewGate, Route, Vocabulary, missing_required,
    unresolved_required,
};
