//! The host workflow engine seam.
//!
//! The coordination engine never owns process state: it consumes the host
//! engine through [`ProcessEngine`], a minimal async surface for suspending
//! and resuming wait-state tasks, enumerating pending tasks (with host-side
//! authorization applied), reading/writing process variables, and resolving
//! collaboration participants. Implementations adapt a concrete workflow
//! engine; tests use an in-memory mock.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::{HandshakeKind, Participant};

/// Opaque handle to one suspended execution inside the host engine.
///
/// Resuming through a handle is not idempotent on the host side: a second
/// resume for the same handle fails with
/// [`EngineError::ResumeRejected`](crate::error::EngineError::ResumeRejected).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecutionHandle(pub String);

impl ExecutionHandle {
    /// Wraps a host-provided execution id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw host-side id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a wait-task is waiting for.
///
/// A closed set: each kind carries its own data, resolved once when the
/// model is loaded. There is no runtime type-string lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitTaskKind {
    /// Waits for the owning participant to enter a destination place.
    Movement {
        /// The place the participant must enter.
        destination_place_id: String,
    },
    /// Waits for a complementary handshake registration by a counterpart.
    Handshake {
        /// Binding or unbinding.
        kind: HandshakeKind,
        /// The declared counterpart participant.
        counterpart: String,
        /// Optional place both parties must share, enforced by the
        /// proximity reconciler.
        required_place: Option<String>,
    },
}

/// One currently suspended wait-task, as enumerated by the host.
///
/// Ephemeral: derived on demand from engine state and re-enumerated on
/// every location update, never stored by this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitTask {
    /// Handle used to resume this task's execution.
    pub execution: ExecutionHandle,
    /// Process instance the task belongs to.
    pub process_instance_id: String,
    /// Identifier of the task within its process model.
    pub task_id: String,
    /// What the task is waiting for.
    pub kind: WaitTaskKind,
}

/// Filter for [`ProcessEngine::query_active_wait_tasks`].
///
/// Authorization is applied host-side: the query only returns tasks the
/// given user may act on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaitTaskFilter {
    /// The acting user; the host scopes results to their permissions.
    pub user_id: String,
    /// Restrict to one process instance.
    pub process_instance_id: Option<String>,
    /// Restrict to processes sharing a business key.
    pub business_key: Option<String>,
}

impl WaitTaskFilter {
    /// Filter for everything a user may act on.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// Restricts the filter to one business key.
    pub fn with_business_key(mut self, business_key: impl Into<String>) -> Self {
        self.business_key = Some(business_key.into());
        self
    }

    /// Restricts the filter to one process instance.
    pub fn with_process_instance(mut self, process_instance_id: impl Into<String>) -> Self {
        self.process_instance_id = Some(process_instance_id.into());
        self
    }
}

/// Minimum surface consumed from the host workflow engine.
#[async_trait]
pub trait ProcessEngine: Send + Sync {
    /// Marks a wait-task as entered. The host owns the actual suspension;
    /// this is a notification hook, not a state change in this crate.
    async fn suspend_task(&self, activity_id: &str) -> Result<()>;

    /// Resumes one suspended execution. Fails if the execution already
    /// left its wait state or does not exist.
    async fn resume_task(&self, handle: &ExecutionHandle) -> Result<()>;

    /// Enumerates currently suspended wait-tasks matching the filter,
    /// with host-side authorization applied.
    async fn query_active_wait_tasks(&self, filter: &WaitTaskFilter) -> Result<Vec<WaitTask>>;

    /// Reads a workflow-scoped variable.
    async fn get_variable(&self, handle: &ExecutionHandle, name: &str) -> Result<Option<Value>>;

    /// Writes a workflow-scoped variable.
    async fn set_variable(&self, handle: &ExecutionHandle, name: &str, value: Value) -> Result<()>;

    /// Resolves the participants of a collaboration model.
    async fn resolve_participants(&self, process_definition_id: &str) -> Result<Vec<Participant>>;
}
