use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{
    Checkpoint, CheckpointStore, check_revision, sort_newest_first, validate_session_id,
};
use crate::errors::StoreError;

/// In-process store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, Checkpoint>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Checkpoint>>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

#[async_trait]
impl CheckpointStore for MemoryStore {
    async fn load(&self, session_id: &str) -> Result<Option<Checkpoint>, StoreError> {
        validate_session_id(session_id)?;
        Ok(self.lock()?.get(session_id).cloned())
    }

    async fn save(
        &self,
        checkpoint: &Checkpoint,
        expected_revision: Option<u64>,
    ) -> Result<(), StoreError> {
        validate_session_id(&checkpoint.session_id)?;
        let mut sessions = self.lock()?;
        let found = sessions.get(&checkpoint.session_id).map(|c| c.revision);
        check_revision(&checkpoint.session_id, expected_revision, found)?;
        sessions.insert(checkpoint.session_id.clone(), checkpoint.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Checkpoint>, StoreError> {
        let mut all: Vec<Checkpoint> = self.lock()?.values().cloned().collect();
        sort_newest_first(&mut all);
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{Node, WorkflowState};

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let store = MemoryStore::new();
        assert!(store.load("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_replaces_previous() {
        let store = MemoryStore::new();
        let first = Checkpoint::new("s1", Node::AwaitingHumanReview, WorkflowState::new("a"));
        store.save(&first, None).await.unwrap();
        let second = first.advance(Node::Completed, WorkflowState::new("b"));
        store.save(&second, Some(1)).await.unwrap();

        let loaded = store.load("s1").await.unwrap().unwrap();
        assert_eq!(loaded, second);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = MemoryStore::new();
        store
            .save(
                &Checkpoint::new("a", Node::AwaitingHumanReview, WorkflowState::new("a")),
                None,
            )
            .await
            .unwrap();
        store
            .save(
                &Checkpoint::new("b", Node::AwaitingHumanReview, WorkflowState::new("b")),
                None,
            )
            .await
            .unwrap();

        assert_eq!(store.load("a").await.unwrap().unwrap().state.user_input, "a");
        assert_eq!(store.load("b").await.unwrap().unwrap().state.user_input, "b");
    }

    #[tokio::test]
    async fn test_stale_revision_rejected() {
        let store = MemoryStore::new();
        let first = Checkpoint::new("s1", Node::AwaitingHumanReview, WorkflowState::new("a"));
        store.save(&first, None).await.unwrap();
        store
            .save(&first.advance(Node::AwaitingHumanReview, WorkflowState::new("b")), Some(1))
            .await
            .unwrap();

        // A second writer that also started from revision 1.
        let stale = first.advance(Node::Completed, WorkflowState::new("c"));
        assert!(matches!(
            store.save(&stale, Some(1)).await,
            Err(StoreError::RevisionConflict {
                expected: Some(1),
                found: Some(2),
                ..
            })
        ));
        assert!(matches!(
            store.save(&first, None).await,
            Err(StoreError::RevisionConflict { expected: None, .. })
        ));
        assert_eq!(store.load("s1").await.unwrap().unwrap().state.user_input, "b");
    }

    #[tokio::test]
    async fn test_invalid_id_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.load("../x").await,
            Err(StoreError::InvalidSessionId(_))
        ));
    }
}
