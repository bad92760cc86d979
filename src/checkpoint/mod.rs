//! Durable per-session checkpoints.
//!
//! A checkpoint pairs the workflow state with the node the executor will
//! continue from. The engine writes one before every suspension and on
//! completion; resuming reads it back.
//!
//! Backends:
//!
//! | Backend | Type | Notes |
//! |---------|------|-------|
//! | `memory` | [`MemoryStore`] | Process-local, lost on exit |
//! | `file` | [`FileStore`] | One JSON file per session, atomic replace |

pub mod file;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::errors::StoreError;
use crate::workflow::{Node, WorkflowState};

pub use file::FileStore;
pub use memory::MemoryStore;

static SESSION_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,128}$").unwrap());

/// Snapshot of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub session_id: String,
    /// Node to continue from.
    pub node: Node,
    pub state: WorkflowState,
    /// Incremented on every save of this session.
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(session_id: impl Into<String>, node: Node, state: WorkflowState) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            node,
            state,
            revision: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Successor checkpoint for the same session.
    pub fn advance(&self, node: Node, state: WorkflowState) -> Self {
        Self {
            session_id: self.session_id.clone(),
            node,
            state,
            revision: self.revision + 1,
            created_at: self.created_at,
            updated_at: Utc::now(),
        }
    }
}

/// Keyed checkpoint persistence.
///
/// `save` is a compare-and-swap on the revision: it replaces the stored
/// checkpoint only when the stored revision equals `expected_revision`
/// (`None` meaning no checkpoint may exist yet), and fails with
/// `StoreError::RevisionConflict` otherwise. Checkpoints are never deleted.
/// Real implementation: `FileStore`. Test double: `MemoryStore`.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Option<Checkpoint>, StoreError>;

    async fn save(
        &self,
        checkpoint: &Checkpoint,
        expected_revision: Option<u64>,
    ) -> Result<(), StoreError>;

    /// All checkpoints, most recently updated first.
    async fn list(&self) -> Result<Vec<Checkpoint>, StoreError>;
}

/// Reject ids that are empty, too long, or unsafe as file names.
pub fn validate_session_id(session_id: &str) -> Result<(), StoreError> {
    if SESSION_ID_REGEX.is_match(session_id) {
        Ok(())
    } else {
        Err(StoreError::InvalidSessionId(session_id.to_string()))
    }
}

/// Fresh random session id.
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Fail unless the stored revision is the one the writer started from.
pub(crate) fn check_revision(
    session_id: &str,
    expected: Option<u64>,
    found: Option<u64>,
) -> Result<(), StoreError> {
    if expected == found {
        Ok(())
    } else {
        Err(StoreError::RevisionConflict {
            session_id: session_id.to_string(),
            expected,
            found,
        })
    }
}

pub(crate) fn sort_newest_first(checkpoints: &mut [Checkpoint]) {
    checkpoints.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
}
