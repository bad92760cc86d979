use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{ExtractionRequest, Extractor};
use crate::errors::ExtractionError;

#[derive(Debug, Clone)]
enum ScriptStep {
    Respond(String),
    Unavailable(String),
}

/// Extractor that replays a fixed script of responses.
///
/// Used for tests and offline demos. Every request is recorded so callers can
/// assert on what the workflow sent. Once the script runs out, further calls
/// fail as `CollaboratorUnavailable`.
#[derive(Debug, Default)]
pub struct ScriptedExtractor {
    script: Mutex<VecDeque<ScriptStep>>,
    requests: Mutex<Vec<ExtractionRequest>>,
}

impl ScriptedExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw response.
    pub fn respond(self, raw: impl Into<String>) -> Self {
        self.push(ScriptStep::Respond(raw.into()))
    }

    /// Queue an unavailability failure.
    pub fn fail_unavailable(self, reason: impl Into<String>) -> Self {
        self.push(ScriptStep::Unavailable(reason.into()))
    }

    fn push(self, step: ScriptStep) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(step);
        self
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ExtractionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> Result<String, ExtractionError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let step = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match step {
            Some(ScriptStep::Respond(raw)) => Ok(raw),
            Some(ScriptStep::Unavailable(reason)) => {
                Err(ExtractionError::CollaboratorUnavailable(reason))
            }
            None => Err(ExtractionError::CollaboratorUnavailable(
                "scripted responses exhausted".to_string(),
            )),
        }
    }

    fn name(&self) -> String {
        "scripted".to_string()
    }
}
