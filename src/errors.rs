//! Typed error hierarchy for the intake workflow.
//!
//! Three top-level enums cover the three failure surfaces:
//! - `ExtractionError`: collaborator failures, captured into session state
//! - `StoreError`: checkpoint persistence failures
//! - `WorkflowError`: call-level failures returned to the caller of start/resume

use std::path::PathBuf;
use thiserror::Error;

/// Failures of a single extraction pass. Never abort a session.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Extraction service unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Malformed extraction output: {0}")]
    MalformedExtractionOutput(String),
}

/// Errors from a checkpoint store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid session id '{0}': use 1-128 characters from [A-Za-z0-9_-]")]
    InvalidSessionId(String),

    #[error("Checkpoint I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize checkpoint for session {session_id}: {source}")]
    Serialization {
        session_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Checkpoint store lock poisoned")]
    LockPoisoned,

    #[error("Checkpoint store task panicked: {0}")]
    TaskPanicked(String),

    /// The stored revision did not match the one the writer started from.
    #[error(
        "Checkpoint for session {session_id} was changed by another writer (expected revision {}, found {})",
        revision_label(*expected),
        revision_label(*found)
    )]
    RevisionConflict {
        session_id: String,
        expected: Option<u64>,
        found: Option<u64>,
    },
}

fn revision_label(revision: Option<u64>) -> String {
    revision.map_or_else(|| "none".to_string(), |r| r.to_string())
}

/// Call-level failures of the workflow engine.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Session {session_id} not found")]
    SessionNotFound { session_id: String },

    #[error("Session {session_id} is already being resumed by another caller")]
    ConcurrentResumeConflict { session_id: String },

    #[error("Session {session_id} already exists")]
    SessionAlreadyExists { session_id: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_error_session_not_found_carries_id() {
        let err = WorkflowError::SessionNotFound {
            session_id: "abc".into(),
        };
        match &err {
            WorkflowError::SessionNotFound { session_id } => assert_eq!(session_id, "abc"),
            _ => panic!("Expected SessionNotFound"),
        }
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn workflow_error_converts_from_store_error() {
        let err: WorkflowError = StoreError::LockPoisoned.into();
        assert!(matches!(err, WorkflowError::Store(StoreError::LockPoisoned)));
    }

    #[test]
    fn store_error_io_carries_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StoreError::Io {
            path: PathBuf::from("/tmp/s.json"),
            source: io_err,
        };
        assert!(err.to_string().contains("/tmp/s.json"));
    }

    #[test]
    fn store_error_revision_conflict_names_revisions() {
        let err = StoreError::RevisionConflict {
            session_id: "s1".into(),
            expected: None,
            found: Some(2),
        };
        let msg = err.to_string();
        assert!(msg.contains("s1"));
        assert!(msg.contains("expected revision none, found 2"));
    }

    #[test]
    fn extraction_error_variants_are_distinct() {
        let a = ExtractionError::CollaboratorUnavailable("no key".into());
        let b = ExtractionError::MalformedExtractionOutput("bad json".into());
        assert!(matches!(a, ExtractionError::CollaboratorUnavailable(_)));
        assert!(matches!(b, ExtractionError::MalformedExtractionOutput(_)));
        assert!(a.to_string().contains("unavailable"));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&ExtractionError::CollaboratorUnavailable("x".into()));
        assert_std_error(&StoreError::LockPoisoned);
        assert_std_error(&WorkflowError::ConcurrentResumeConflict {
            session_id: "s".into(),
        });
    }
}
