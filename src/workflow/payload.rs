use serde::{Deserialize, Serialize};

use super::WorkflowState;
use crate::booking::BookingData;
use crate::display::{DataView, DisplayOptions};
use crate::review::{ResponseCategory, Vocabulary};

/// One accepted kind of reply, with example words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseOption {
    pub category: ResponseCategory,
    /// Words that select this category. Empty for free-text corrections.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    pub description: String,
}

/// What the caller receives when a session suspends for human review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspendPayload {
    /// Continuation key for `resume`.
    pub session_id: String,
    pub iteration: u32,
    pub message: String,
    pub instruction: String,
    pub display: DataView,
    pub extracted_data: BookingData,
    pub options: Vec<ResponseOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl SuspendPayload {
    pub fn new(
        session_id: &str,
        state: &WorkflowState,
        vocabulary: &Vocabulary,
        display: &DisplayOptions,
    ) -> Self {
        let affirm_word = vocabulary.affirm.first().map(String::as_str).unwrap_or("agree");
        let finish_word = vocabulary.finish.first().map(String::as_str).unwrap_or("done");

        Self {
            session_id: session_id.to_string(),
            iteration: state.iteration_count,
            message: format!("Review extracted data (iteration {})", state.iteration_count),
            instruction: format!(
                "Review the extracted data. Reply '{}' if it is correct, '{}' to finish now, \
                 or type a correction or additional details.",
                affirm_word, finish_word
            ),
            display: DataView::new(&state.extracted_data, display),
            extracted_data: state.extracted_data.clone(),
            options: vec![
                ResponseOption {
                    category: ResponseCategory::Affirm,
                    keywords: vocabulary.affirm.clone(),
                    description: "The data is correct".to_string(),
                },
                ResponseOption {
                    category: ResponseCategory::Finish,
                    keywords: vocabulary.finish.clone(),
                    description: "Stop gathering data and finalize".to_string(),
                },
                ResponseOption {
                    category: ResponseCategory::Correction,
                    keywords: Vec::new(),
                    description: "Any other text is treated as a correction or addition"
                        .to_string(),
                },
            ],
            warnings: state.warnings.clone(),
            last_error: state.last_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_reflects_state() {
        let mut state = WorkflowState::new("x");
        state.iteration_count = 2;
        state.extracted_data.location = Some("Ubud".into());
        state.last_error = Some("Extraction service unavailable: down".into());

        let payload = SuspendPayload::new(
            "s1",
            &state,
            &Vocabulary::default(),
            &DisplayOptions::default(),
        );

        assert_eq!(payload.session_id, "s1");
        assert_eq!(payload.iteration, 2);
        assert_eq!(payload.message, "Review extracted data (iteration 2)");
        assert!(payload.instruction.contains("'agree'"));
        assert!(payload.instruction.contains("'done'"));
        assert_eq!(payload.display.location, "Ubud");
        assert_eq!(payload.extracted_data.location.as_deref(), Some("Ubud"));
        assert!(payload.last_error.is_some());
    }

    #[test]
    fn test_options_cover_all_categories() {
        let payload = SuspendPayload::new(
            "s1",
            &WorkflowState::new("x"),
            &Vocabulary::default(),
            &DisplayOptions::default(),
        );
        let categories: Vec<_> = payload.options.iter().map(|o| o.category).collect();
        assert_eq!(
            categories,
            vec![
                ResponseCategory::Affirm,
                ResponseCategory::Finish,
                ResponseCategory::Correction
            ]
        );
        assert!(payload.options[0].keywords.contains(&"setuju".to_string()));
    }

    #[test]
    fn test_payload_json_omits_empty_extras() {
        let payload = SuspendPayload::new(
            "s1",
            &WorkflowState::new("x"),
            &Vocabulary::default(),
            &DisplayOptions::default(),
        );
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("warnings").is_none());
        assert!(json.get("last_error").is_none());
        assert_eq!(json["options"][2]["category"], "correction");
    }
}
