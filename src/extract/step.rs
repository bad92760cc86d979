use chrono::NaiveDate;

use super::{ExtractionRequest, Extractor, parse_response};
use crate::errors::ExtractionError;
use crate::merge::merge;
use crate::workflow::{Status, WorkflowState};

/// Run one extraction pass against `state`.
///
/// Always increments `iteration_count`. On success the candidate is merged
/// into `extracted_data` and the status becomes `Extracted`; on failure the
/// existing data is left intact, `last_error` is set and the status becomes
/// `Error`. Never returns an error.
pub async fn run_extraction(
    extractor: &dyn Extractor,
    state: &mut WorkflowState,
    today: NaiveDate,
) {
    state.iteration_count += 1;
    let iteration = state.iteration_count;

    let request = ExtractionRequest {
        text: state.user_input.clone(),
        existing: state.extracted_data.clone(),
        today,
    };

    tracing::debug!(iteration, extractor = %extractor.name(), "Calling extraction collaborator");

    let outcome = match extractor.extract(&request).await {
        Ok(raw) => parse_response(&raw),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(parsed) => {
            let merged = merge(&state.extracted_data, &parsed.candidate);
            state.extracted_data = merged.data;
            state.warnings = parsed
                .notes
                .into_iter()
                .chain(merged.warnings.iter().map(|w| w.to_string()))
                .collect();
            state.last_error = None;
            state.status = Status::Extracted;
            state.push_message(format!("Data extracted (iteration {})", iteration));
            for warning in &state.warnings {
                state.messages.push(format!("Warning: {}", warning));
            }
            tracing::info!(
                iteration,
                warnings = state.warnings.len(),
                "Extraction merged"
            );
        }
        Err(e) => {
            let kind = match &e {
                ExtractionError::CollaboratorUnavailable(_) => "collaborator_unavailable",
                ExtractionError::MalformedExtractionOutput(_) => "malformed_output",
            };
            tracing::warn!(iteration, kind, error = %e, "Extraction failed");
            state.last_error = Some(e.to_string());
            state.warnings.clear();
            state.status = Status::Error;
            state.push_message(format!("Extraction failed (iteration {}): {}", iteration, e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::StayDate;
    use crate::extract::ScriptedExtractor;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
    }

    #[tokio::test]
    async fn test_successful_extraction_merges_and_counts() {
        let extractor = ScriptedExtractor::new().respond(
            r#"{"location": "Ubud", "checkin": "2025-06-20", "checkout": "2025-06-25", "guests": 2}"#,
        );
        let mut state = WorkflowState::new("hotel in Ubud, 20-25 June 2025, 2 guests");

        run_extraction(&extractor, &mut state, today()).await;

        assert_eq!(state.iteration_count, 1);
        assert_eq!(state.status, Status::Extracted);
        assert_eq!(state.extracted_data.nights, Some(5));
        assert_eq!(state.extracted_data.checkout, Some(StayDate::new("2025-06-25")));
        assert!(state.last_error.is_none());
        assert_eq!(state.messages, vec!["Data extracted (iteration 1)"]);
    }

    #[tokio::test]
    async fn test_request_carries_text_and_existing_data() {
        let extractor = ScriptedExtractor::new().respond(r#"{"guests": 3}"#);
        let mut state = WorkflowState::new("3 guests");
        state.extracted_data.location = Some("Ubud".into());

        run_extraction(&extractor, &mut state, today()).await;

        let requests = extractor.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].text, "3 guests");
        assert_eq!(requests[0].existing.location.as_deref(), Some("Ubud"));
        assert_eq!(state.extracted_data.location.as_deref(), Some("Ubud"));
        assert_eq!(state.extracted_data.guests, Some(3));
    }

    #[tokio::test]
    async fn test_collaborator_failure_sets_error_marker_and_keeps_data() {
        let extractor = ScriptedExtractor::new().fail_unavailable("no API key");
        let mut state = WorkflowState::new("x");
        state.extracted_data.location = Some("Ubud".into());
        state.iteration_count = 2;

        run_extraction(&extractor, &mut state, today()).await;

        assert_eq!(state.iteration_count, 3);
        assert_eq!(state.status, Status::Error);
        assert!(state.last_error.as_deref().unwrap().contains("no API key"));
        assert_eq!(state.extracted_data.location.as_deref(), Some("Ubud"));
        assert!(state.messages[0].starts_with("Extraction failed (iteration 3)"));
    }

    #[tokio::test]
    async fn test_malformed_output_is_captured() {
        let extractor = ScriptedExtractor::new().respond("Sorry, I can't help with that.");
        let mut state = WorkflowState::new("x");

        run_extraction(&extractor, &mut state, today()).await;

        assert_eq!(state.status, Status::Error);
        assert!(state.last_error.as_deref().unwrap().contains("Malformed"));
    }

    #[tokio::test]
    async fn test_warnings_are_recorded_and_audited() {
        let extractor = ScriptedExtractor::new()
            .respond(r#"{"checkin": "2025-06-25", "checkout": "2025-06-20", "guests": "many"}"#);
        let mut state = WorkflowState::new("x");

        run_extraction(&extractor, &mut state, today()).await;

        assert_eq!(state.status, Status::Extracted);
        assert_eq!(state.warnings.len(), 2);
        assert!(state.extracted_data.nights.is_none());
        assert!(state.messages.iter().any(|m| m.contains("not after")));
    }

    #[tokio::test]
    async fn test_success_clears_previous_error() {
        let extractor = ScriptedExtractor::new().respond(r#"{"guests": 2}"#);
        let mut state = WorkflowState::new("2 guests");
        state.last_error = Some("earlier failure".into());
        state.status = Status::Error;

        run_extraction(&extractor, &mut state, today()).await;

        assert!(state.last_error.is_none());
        assert_eq!(state.status, Status::Extracted);
    }
}
