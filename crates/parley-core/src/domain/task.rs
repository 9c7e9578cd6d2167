//! Task: stateful conversation context with a lifecycle.
//!
//! Design:
//! - `history` / `artifacts` are append-only.
//! - `update_status` accepts any state -> any state;
//!   `transition` is the guarded variant that follows the lifecycle diagram.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::sync::Arc;

use super::envelope::format_timestamp;
use super::errors::TaskError;
use super::ids::{SessionId, TaskId};
use super::standard::{Message, MessageRole, Part};
use super::state::TaskState;
use super::wire::Object;
use crate::ports::{Clock, SystemClock};

/// Opaque output record attached to a task.
pub type Artifact = Value;

/// Current state + optional status message + when it was entered.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskStatus {
    pub state: TaskState,
    pub message: Option<Message>,
    pub timestamp: DateTime<Utc>,
}

impl TaskStatus {
    pub fn to_dict(&self) -> Value {
        json!({
            "state": self.state.as_str(),
            "message": self.message.as_ref().map(Message::to_dict),
            "timestamp": format_timestamp(&self.timestamp),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub session_id: SessionId,
    pub status: TaskStatus,
    history: Vec<Message>,
    artifacts: Vec<Artifact>,
    pub metadata: Object,
    clock: Arc<dyn Clock>,
}

impl Task {
    /// New task in `submitted`, timestamps from the system clock.
    pub fn new(id: TaskId, session_id: SessionId, metadata: Object) -> Self {
        Self::with_clock(id, session_id, metadata, Arc::new(SystemClock))
    }

    pub fn with_clock(
        id: TaskId,
        session_id: SessionId,
        metadata: Object,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let status = TaskStatus {
            state: TaskState::Submitted,
            message: None,
            timestamp: clock.now(),
        };
        Self {
            id,
            session_id,
            status,
            history: Vec::new(),
            artifacts: Vec::new(),
            metadata,
            clock,
        }
    }

    pub fn state(&self) -> TaskState {
        self.status.state
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// Unconditional transition with a fresh status record.
    pub fn update_status(&mut self, state: TaskState, message: Option<Message>) {
        let old = self.status.state;
        self.status = TaskStatus {
            state,
            message,
            timestamp: self.clock.now(),
        };
        tracing::debug!(task_id = %self.id, from = %old, to = %state, "task state changed");
    }

    /// Guarded transition: rejects moves the lifecycle diagram does not allow.
    pub fn transition(&mut self, state: TaskState, message: Option<Message>) -> Result<(), TaskError> {
        let from = self.status.state;
        if !from.can_transition_to(state) {
            return Err(TaskError::IllegalTransition { from, to: state });
        }
        self.update_status(state, message);
        Ok(())
    }

    pub fn add_message(&mut self, message: Message) {
        self.history.push(message);
        tracing::debug!(task_id = %self.id, total = self.history.len(), "message added to history");
    }

    pub fn add_artifact(&mut self, artifact: Artifact) {
        self.artifacts.push(artifact);
        tracing::debug!(task_id = %self.id, total = self.artifacts.len(), "artifact added");
    }

    /// The most recent `max` messages (all when `None`), as an owned copy.
    pub fn get_context(&self, max: Option<usize>) -> Vec<Message> {
        tail(&self.history, max).to_vec()
    }

    pub fn to_dict(&self) -> Value {
        json!({
            "id": self.id,
            "session_id": self.session_id,
            "status": self.status.to_dict(),
            "history": self.history.iter().map(Message::to_dict).collect::<Vec<_>>(),
            "artifacts": self.artifacts,
            "metadata": self.metadata,
        })
    }

    pub fn summary(&self) -> String {
        format!(
            "Task {}\n  Session: {}\n  State: {}\n  Messages: {}\n  Artifacts: {}",
            self.id.short(),
            self.session_id.short(),
            self.status.state,
            self.history.len(),
            self.artifacts.len()
        )
    }
}

pub(crate) fn tail<T>(items: &[T], max: Option<usize>) -> &[T] {
    match max {
        Some(n) => &items[items.len().saturating_sub(n)..],
        None => items,
    }
}

/// Build a message that carries task/session context in its metadata.
///
/// Parts: an optional `[Context: N previous messages in this conversation]`
/// marker (only when the task already has history) followed by `text`.
pub fn message_with_context(
    role: MessageRole,
    text: impl Into<String>,
    task: &Task,
    include_context: bool,
    max_context_messages: usize,
) -> Message {
    let mut parts = Vec::with_capacity(2);
    if include_context && !task.history.is_empty() {
        let window = tail(&task.history, Some(max_context_messages)).len();
        parts.push(Part::text(format!(
            "[Context: {window} previous messages in this conversation]"
        )));
    }
    parts.push(Part::text(text));

    Message::new(role, parts)
        .with_metadata("task_id", task.id.as_str())
        .with_metadata("session_id", task.session_id.as_str())
        .with_metadata("message_number", task.history.len() + 1)
        .with_metadata("has_context", include_context)
}
