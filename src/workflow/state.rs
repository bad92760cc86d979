//! Session state and executor position.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::booking::BookingData;

/// Coarse status recorded in the workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Start,
    Extracted,
    AwaitingReview,
    Completed,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Start => "start",
            Status::Extracted => "extracted",
            Status::AwaitingReview => "awaiting_review",
            Status::Completed => "completed",
            Status::Error => "error",
        };
        f.write_str(s)
    }
}

/// The record threaded through every workflow step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Latest free text to process.
    pub user_input: String,
    #[serde(default)]
    pub extracted_data: BookingData,
    /// One per extraction attempt, successful or not.
    #[serde(default)]
    pub iteration_count: u32,
    #[serde(default)]
    pub status: Status,
    /// Append-only audit trail.
    #[serde(default)]
    pub messages: Vec<String>,
    /// Error marker from the latest extraction attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Warnings from the latest merge, awaiting human correction.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl WorkflowState {
    pub fn new(user_input: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            extracted_data: BookingData::default(),
            iteration_count: 0,
            status: Status::Start,
            messages: Vec::new(),
            last_error: None,
            warnings: Vec::new(),
        }
    }

    pub fn push_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }
}

/// Executor position. Only `AwaitingHumanReview` and `Completed` are ever persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Start,
    Extracting,
    AwaitingHumanReview,
    Finalizing,
    Completed,
}

impl Node {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Node::Start => "start",
            Node::Extracting => "extracting",
            Node::AwaitingHumanReview => "awaiting_human_review",
            Node::Finalizing => "finalizing",
            Node::Completed => "completed",
        };
        f.write_str(s)
    }
}
