use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Set of session ids currently being advanced by this engine.
///
/// A lease is held for the duration of one start/resume call and released on
/// drop, including on error or panic.
#[derive(Debug, Clone, Default)]
pub(crate) struct SessionLeases {
    active: Arc<Mutex<HashSet<String>>>,
}

impl SessionLeases {
    /// Take the lease for `session_id`, or `None` if another call holds it.
    pub(crate) fn try_acquire(&self, session_id: &str) -> Option<SessionLease> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !active.insert(session_id.to_string()) {
            return None;
        }
        Some(SessionLease {
            active: Arc::clone(&self.active),
            session_id: session_id.to_string(),
        })
    }

    #[cfg(test)]
    fn held(&self) -> usize {
        self.active.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[derive(Debug)]
pub(crate) struct SessionLease {
    active: Arc<Mutex<HashSet<String>>>,
    session_id: String,
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.session_id);
    }
}
