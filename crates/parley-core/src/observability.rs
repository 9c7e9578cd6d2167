//! Read-only introspection: bus / task statistics and conversation dumps.
//!
//! Everything here degrades to zero counts or an empty dump on empty input.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::envelope::format_timestamp;
use crate::domain::{AgentRole, Envelope, MessageId, Task, TaskState};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusStatistics {
    pub total_messages: usize,
    pub registered_agents: usize,
    pub agents: Vec<AgentRole>,
    /// Counts per `message_type` (legacy) or `role` (standard), zero-filled.
    pub by_kind: BTreeMap<String, usize>,
}

impl BusStatistics {
    pub fn collect<E: Envelope>(history: &[E], agents: Vec<AgentRole>) -> Self {
        let mut by_kind: BTreeMap<String, usize> =
            E::KINDS.iter().map(|k| (k.to_string(), 0)).collect();
        for envelope in history {
            *by_kind.entry(envelope.kind().to_string()).or_default() += 1;
        }
        Self {
            total_messages: history.len(),
            registered_agents: agents.len(),
            agents,
            by_kind,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskStatistics {
    pub total_tasks: usize,
    pub total_sessions: usize,
    pub by_state: BTreeMap<String, usize>,
}

impl TaskStatistics {
    pub fn collect<'a>(tasks: impl IntoIterator<Item = &'a Task>, total_sessions: usize) -> Self {
        let mut by_state: BTreeMap<String, usize> = TaskState::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        let mut total_tasks = 0;
        for task in tasks {
            total_tasks += 1;
            *by_state.entry(task.state().as_str().to_string()).or_default() += 1;
        }
        Self {
            total_tasks,
            total_sessions,
            by_state,
        }
    }
}

const RULE_WIDTH: usize = 80;

/// Printable thread dump (one block per envelope, in thread order).
pub fn format_conversation<E: Envelope>(message_id: &MessageId, conversation: &[E]) -> String {
    if conversation.is_empty() {
        return format!("No conversation found for message ID: {message_id}");
    }

    let rule = "=".repeat(RULE_WIDTH);
    let mut out = vec![rule.clone(), "CONVERSATION THREAD".to_string(), rule.clone()];
    for (i, envelope) in conversation.iter().enumerate() {
        out.push(String::new());
        out.push(format!(
            "[{}] {} → {}",
            i + 1,
            envelope.sender(),
            envelope.receiver()
        ));
        out.push(format!("    {}: {}", E::KIND_LABEL, envelope.kind()));
        out.push(format!("    Time: {}", format_timestamp(&envelope.timestamp())));
        for line in envelope.detail_lines() {
            for physical in line.lines() {
                out.push(format!("    {physical}"));
            }
        }
    }
    out.push(String::new());
    out.push(rule);
    out.join("\n")
}
