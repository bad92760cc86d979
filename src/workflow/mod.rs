//! Workflow executor.
//!
//! ```text
//! Start ─▶ Extracting ─▶ AwaitingHumanReview ─┬─▶ Extracting (loop)
//!                                             └─▶ Finalizing ─▶ Completed
//! ```
//!
//! `AwaitingHumanReview` is the only point where control returns to the
//! caller. The engine persists a [`Checkpoint`](crate::checkpoint::Checkpoint)
//! there and hands back a [`SuspendPayload`]; `resume` re-enters at exactly
//! that node with the human's reply. Extraction failures do not stop the
//! loop: they are recorded on the state and shown at the next review.

mod executor;
mod lease;
mod payload;
mod state;

pub use executor::{Clock, Outcome, WorkflowEngine};
pub use payload::{ResponseOption, SuspendPayload};
pub use state::{Node, Status, WorkflowState};
