//! Extraction step: turns free text into candidate booking data.
//!
//! The natural-language work is delegated to an [`Extractor`] (an LLM behind
//! an HTTP API in production, a scripted double in tests). This module owns
//! everything around that call:
//!
//! - [`prompt`]: the request contract sent to the collaborator
//! - [`parser`]: defensive decoding of whatever comes back
//! - [`step`]: applying the result to the workflow state via the merger
//!
//! Collaborator failures never escape the step; they become an error marker
//! on the state so the reviewer can see them and retry.

pub mod gemini;
pub mod parser;
pub mod prompt;
pub mod scripted;
pub mod step;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::booking::BookingData;
use crate::errors::ExtractionError;

pub use gemini::GeminiExtractor;
pub use parser::{ParsedCandidate, parse_response};
pub use prompt::build_prompt;
pub use scripted::ScriptedExtractor;
pub use step::run_extraction;

/// Everything the collaborator needs for one extraction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    /// Free text to analyse.
    pub text: String,
    /// Data collected so far, so the collaborator merges instead of replacing.
    pub existing: BookingData,
    /// Reference date for resolving relative dates.
    pub today: NaiveDate,
}

impl ExtractionRequest {
    pub fn prompt(&self) -> String {
        build_prompt(&self.text, &self.existing, self.today)
    }
}

/// External extraction collaborator.
///
/// Returns the raw model response; decoding happens in [`parser`].
/// Real implementation: `GeminiExtractor`. Test double: `ScriptedExtractor`.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, request: &ExtractionRequest) -> Result<String, ExtractionError>;

    /// Short name recorded in the final summary.
    fn name(&self) -> String;
}
