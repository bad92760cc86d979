use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::lease::SessionLeases;
use super::{Node, Status, SuspendPayload, WorkflowState};
use crate::checkpoint::{Checkpoint, CheckpointStore, new_session_id, validate_session_id};
use crate::display::{DisplayOptions, final_summary};
use crate::errors::{StoreError, WorkflowError};
use crate::extract::{Extractor, run_extraction};
use crate::review::{ReviewGate, Route};

/// Source of "today" for resolving relative dates.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Result of a start or resume call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Waiting for the human; pass the reply to `resume`.
    Suspended(SuspendPayload),
    /// Terminal. `state.status` is `completed` or `error`.
    Finished {
        session_id: String,
        state: WorkflowState,
    },
}

impl Outcome {
    pub fn session_id(&self) -> &str {
        match self {
            Outcome::Suspended(payload) => &payload.session_id,
            Outcome::Finished { session_id, .. } => session_id,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Outcome::Finished { .. })
    }

    pub fn payload(&self) -> Option<&SuspendPayload> {
        match self {
            Outcome::Suspended(payload) => Some(payload),
            Outcome::Finished { .. } => None,
        }
    }

    pub fn final_state(&self) -> Option<&WorkflowState> {
        match self {
            Outcome::Finished { state, .. } => Some(state),
            Outcome::Suspended(_) => None,
        }
    }
}

/// Drives sessions through extract → review → finalize.
///
/// The engine holds no per-session state between calls: everything needed
/// to continue lives in the checkpoint store. Calls on distinct sessions may
/// run concurrently; a second call on a session that is mid-call is rejected
/// with `ConcurrentResumeConflict`. Within one engine a lease rejects it up
/// front; across engines or processes sharing a store, the revision check on
/// save rejects whichever call finishes second.
#[derive(Clone)]
pub struct WorkflowEngine {
    store: Arc<dyn CheckpointStore>,
    extractor: Arc<dyn Extractor>,
    gate: ReviewGate,
    display: DisplayOptions,
    max_iterations: Option<u32>,
    clock: Clock,
    leases: SessionLeases,
}

impl WorkflowEngine {
    pub fn new(store: Arc<dyn CheckpointStore>, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            store,
            extractor,
            gate: ReviewGate::default(),
            display: DisplayOptions::default(),
            max_iterations: None,
            clock: Arc::new(|| Local::now().date_naive()),
            leases: SessionLeases::default(),
        }
    }

    pub fn with_gate(mut self, gate: ReviewGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_display(mut self, display: DisplayOptions) -> Self {
        self.display = display;
        self
    }

    /// Stop looping back to extraction once this many passes have run.
    pub fn with_max_iterations(mut self, max_iterations: Option<u32>) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Create a session and run it to the first review point.
    ///
    /// `session_id` is generated when `None`. Reusing an existing id fails with
    /// `SessionAlreadyExists`.
    pub async fn start(
        &self,
        session_id: Option<String>,
        user_input: impl Into<String>,
    ) -> Result<Outcome, WorkflowError> {
        let session_id = session_id.unwrap_or_else(new_session_id);
        validate_session_id(&session_id)?;
        let _lease = self.lease(&session_id)?;

        if self.store.load(&session_id).await?.is_some() {
            return Err(WorkflowError::SessionAlreadyExists { session_id });
        }

        tracing::info!(session_id = %session_id, "Starting session");
        let state = WorkflowState::new(user_input);
        self.run(&session_id, None, Node::Start, state).await
    }

    /// Continue a suspended session with the human's reply.
    ///
    /// Resuming a completed session returns its stored terminal state and
    /// does nothing else.
    pub async fn resume(&self, session_id: &str, reply: &str) -> Result<Outcome, WorkflowError> {
        validate_session_id(session_id)?;
        let _lease = self.lease(session_id)?;
        let checkpoint = self.load(session_id).await?;

        if checkpoint.node.is_terminal() {
            tracing::debug!(session_id, "Resume on completed session; returning stored state");
            return Ok(Outcome::Finished {
                session_id: checkpoint.session_id,
                state: checkpoint.state,
            });
        }

        tracing::info!(session_id, iteration = checkpoint.state.iteration_count, "Resuming session");
        let mut state = checkpoint.state.clone();
        let route = self.gate.route(&state.extracted_data, reply);
        tracing::debug!(session_id, finalize = route.is_finalize(), "Review routed");

        let next = match route {
            Route::Finalize { audit } => {
                state.push_message(audit);
                Node::Finalizing
            }
            Route::Await { audit } => {
                state.push_message(audit);
                Node::AwaitingHumanReview
            }
            Route::Extract {
                user_input, audit, ..
            } => {
                state.push_message(audit);
                if self.iteration_cap_reached(&state) {
                    self.end_at_cap(&mut state);
                    return self.finish(session_id, Some(&checkpoint), state).await;
                }
                state.user_input = user_input;
                Node::Extracting
            }
        };

        self.run(session_id, Some(&checkpoint), next, state).await
    }

    /// Current outcome of a session without advancing it.
    pub async fn current(&self, session_id: &str) -> Result<Outcome, WorkflowError> {
        let checkpoint = self.get(session_id).await?;
        Ok(self.outcome_of(checkpoint))
    }

    /// Latest checkpoint for a session.
    pub async fn get(&self, session_id: &str) -> Result<Checkpoint, WorkflowError> {
        validate_session_id(session_id)?;
        self.load(session_id).await
    }

    /// All known sessions, most recently updated first.
    pub async fn sessions(&self) -> Result<Vec<Checkpoint>, WorkflowError> {
        Ok(self.store.list().await?)
    }

    pub fn extractor_name(&self) -> String {
        self.extractor.name()
    }

    fn lease(&self, session_id: &str) -> Result<super::lease::SessionLease, WorkflowError> {
        self.leases.try_acquire(session_id).ok_or_else(|| {
            tracing::warn!(session_id, "Rejected concurrent call on session");
            WorkflowError::ConcurrentResumeConflict {
                session_id: session_id.to_string(),
            }
        })
    }

    async fn load(&self, session_id: &str) -> Result<Checkpoint, WorkflowError> {
        self.store
            .load(session_id)
            .await?
            .ok_or_else(|| WorkflowError::SessionNotFound {
                session_id: session_id.to_string(),
            })
    }

    /// Execute nodes from `node` until the next suspension or the end.
    async fn run(
        &self,
        session_id: &str,
        previous: Option<&Checkpoint>,
        mut node: Node,
        mut state: WorkflowState,
    ) -> Result<Outcome, WorkflowError> {
        loop {
            node = match node {
                Node::Start => Node::Extracting,
                Node::Extracting => {
                    run_extraction(self.extractor.as_ref(), &mut state, (self.clock)()).await;
                    Node::AwaitingHumanReview
                }
                Node::AwaitingHumanReview => return self.suspend(session_id, previous, state).await,
                Node::Finalizing => {
                    self.finalize(&mut state);
                    return self.finish(session_id, previous, state).await;
                }
                Node::Completed => return self.finish(session_id, previous, state).await,
            };
        }
    }

    async fn suspend(
        &self,
        session_id: &str,
        previous: Option<&Checkpoint>,
        mut state: WorkflowState,
    ) -> Result<Outcome, WorkflowError> {
        if state.status != Status::Error {
            state.status = Status::AwaitingReview;
        }
        let checkpoint = self
            .persist(session_id, previous, Node::AwaitingHumanReview, state)
            .await?;
        tracing::info!(
            session_id,
            iteration = checkpoint.state.iteration_count,
            status = %checkpoint.state.status,
            "Suspended for review"
        );
        Ok(self.outcome_of(checkpoint))
    }

    async fn finish(
        &self,
        session_id: &str,
        previous: Option<&Checkpoint>,
        state: WorkflowState,
    ) -> Result<Outcome, WorkflowError> {
        let checkpoint = self
            .persist(session_id, previous, Node::Completed, state)
            .await?;
        tracing::info!(
            session_id,
            status = %checkpoint.state.status,
            iterations = checkpoint.state.iteration_count,
            "Session finished"
        );
        Ok(self.outcome_of(checkpoint))
    }

    fn finalize(&self, state: &mut WorkflowState) {
        let summary = final_summary(
            &state.extracted_data,
            state.iteration_count,
            &self.extractor.name(),
            &self.display,
        );
        state.push_message(summary);
        state.status = Status::Completed;
    }

    fn iteration_cap_reached(&self, state: &WorkflowState) -> bool {
        self.max_iterations
            .is_some_and(|max| state.iteration_count >= max)
    }

    fn end_at_cap(&self, state: &mut WorkflowState) {
        let max = self.max_iterations.unwrap_or(state.iteration_count);
        tracing::warn!(max, "Iteration limit reached");
        state.push_message(format!(
            "Iteration limit of {} reached; session ended without confirmed data",
            max
        ));
        state.status = Status::Error;
    }

    async fn persist(
        &self,
        session_id: &str,
        previous: Option<&Checkpoint>,
        node: Node,
        state: WorkflowState,
    ) -> Result<Checkpoint, WorkflowError> {
        let checkpoint = match previous {
            Some(prev) => prev.advance(node, state),
            None => Checkpoint::new(session_id, node, state),
        };
        let expected = previous.map(|prev| prev.revision);
        match self.store.save(&checkpoint, expected).await {
            Ok(()) => Ok(checkpoint),
            Err(StoreError::RevisionConflict { found, .. }) => {
                tracing::warn!(session_id, ?expected, ?found, "Checkpoint changed underneath call");
                let session_id = session_id.to_string();
                Err(match expected {
                    None => WorkflowError::SessionAlreadyExists { session_id },
                    Some(_) => WorkflowError::ConcurrentResumeConflict { session_id },
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn outcome_of(&self, checkpoint: Checkpoint) -> Outcome {
        if checkpoint.node.is_terminal() {
            Outcome::Finished {
                session_id: checkpoint.session_id,
                state: checkpoint.state,
            }
        } else {
            Outcome::Suspended(SuspendPayload::new(
                &checkpoint.session_id,
                &checkpoint.state,
                self.gate.vocabulary(),
                &self.display,
            ))
        }
    }
}
