use console::style;
use std::fmt::Write;

use crate::checkpoint::Checkpoint;
use crate::ui::icons::{CHECK, CLIPBOARD, CROSS, HOTEL, WARN};
use crate::workflow::{Outcome, Status, SuspendPayload, WorkflowState};

const LABEL_WIDTH: usize = 12;

/// Review screen for a suspended session.
pub fn render_payload(payload: &SuspendPayload) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}{}", CLIPBOARD, style(&payload.message).bold());
    let _ = writeln!(
        out,
        "{}",
        style(format!("Session: {}", payload.session_id)).dim()
    );
    out.push('\n');

    for (label, value) in payload.display.rows() {
        let _ = writeln!(
            out,
            "  {} {}",
            style(format!("{:<width$}", label, width = LABEL_WIDTH)).cyan(),
            value
        );
    }

    if let Some(error) = &payload.last_error {
        let _ = writeln!(out, "\n{}{}", CROSS, style(error).red());
    }
    if !payload.warnings.is_empty() {
        out.push('\n');
        for warning in &payload.warnings {
            let _ = writeln!(out, "{}{}", WARN, style(warning).yellow());
        }
    }

    let _ = writeln!(out, "\n{}", payload.instruction);
    out
}

/// Terminal screen for a finished session.
pub fn render_finished(session_id: &str, state: &WorkflowState) -> String {
    let mut out = String::new();
    match state.status {
        Status::Completed => {
            let _ = writeln!(
                out,
                "{}{}",
                CHECK,
                style(format!(
                    "Session {} completed after {} iteration(s)",
                    session_id, state.iteration_count
                ))
                .green()
                .bold()
            );
        }
        status => {
            let _ = writeln!(
                out,
                "{}{}",
                CROSS,
                style(format!("Session {} ended with status {}", session_id, status))
                    .red()
                    .bold()
            );
        }
    }

    if let Some(last) = state.messages.last() {
        out.push('\n');
        let _ = writeln!(out, "{}{}", HOTEL, last.trim());
    }
    out
}

pub fn render_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Suspended(payload) => render_payload(payload),
        Outcome::Finished { session_id, state } => render_finished(session_id, state),
    }
}

/// One line per session, newest first.
pub fn render_sessions(checkpoints: &[Checkpoint]) -> String {
    if checkpoints.is_empty() {
        return format!("{}\n", style("No sessions found.").dim());
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        style(format!(
            "{:<38} {:<16} {:>5}  {}",
            "SESSION", "STATUS", "ITER", "UPDATED"
        ))
        .bold()
    );
    for cp in checkpoints {
        let _ = writeln!(
            out,
            "{:<38} {:<16} {:>5}  {}",
            cp.session_id,
            cp.state.status.to_string(),
            cp.state.iteration_count,
            cp.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DisplayOptions;
    use crate::review::Vocabulary;
    use crate::workflow::Node;

    fn payload(state: &WorkflowState) -> SuspendPayload {
        SuspendPayload::new("s1", state, &Vocabulary::default(), &DisplayOptions::default())
    }

    #[test]
    fn test_payload_render_shows_fields_and_instruction() {
        let mut state = WorkflowState::new("x");
        state.iteration_count = 1;
        state.extracted_data.location = Some("Ubud".into());
        state.extracted_data.budget = Some(2_000_000);

        let text = render_payload(&payload(&state));

        assert!(text.contains("Review extracted data (iteration 1)"));
        assert!(text.contains("Ubud"));
        assert!(text.contains("Rp 2.000.000"));
        assert!(text.contains("Not specified"));
        assert!(text.contains("'agree'"));
    }

    #[test]
    fn test_payload_render_shows_error_and_warnings() {
        let mut state = WorkflowState::new("x");
        state.last_error = Some("Extraction service unavailable: no key".into());
        state.warnings = vec!["check-out date is not after check-in date".into()];

        let text = render_payload(&payload(&state));

        assert!(text.contains("no key"));
        assert!(text.contains("not after"));
    }

    #[test]
    fn test_finished_render() {
        let mut state = WorkflowState::new("x");
        state.status = Status::Completed;
        state.iteration_count = 2;
        state.push_message("Final booking data:\n  Location: Ubud");

        let text = render_finished("s1", &state);
        assert!(text.contains("completed after 2 iteration(s)"));
        assert!(text.contains("Location: Ubud"));

        state.status = Status::Error;
        assert!(render_finished("s1", &state).contains("ended with status error"));
    }

    #[test]
    fn test_sessions_render() {
        assert!(render_sessions(&[]).contains("No sessions"));

        let cp = Checkpoint::new("abc", Node::AwaitingHumanReview, WorkflowState::new("x"));
        let text = render_sessions(&[cp]);
        assert!(text.contains("SESSION"));
        assert!(text.contains("abc"));
        assert!(text.contains("start"));
    }
}
