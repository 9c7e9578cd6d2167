//! Task lifecycle state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::DecodeError;
use super::wire;

/// Task state.
///
/// State transitions:
/// - Submitted -> Working
/// - Working -> InputRequired | Completed | Canceled | Failed
/// - InputRequired -> Working
///
/// `Unknown` is a catch-all that normal operation never enters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    Submitted,
    Working,
    InputRequired,
    Completed,
    Canceled,
    Failed,
    Unknown,
}

impl TaskState {
    pub const ALL: [TaskState; 7] = [
        TaskState::Submitted,
        TaskState::Working,
        TaskState::InputRequired,
        TaskState::Completed,
        TaskState::Canceled,
        TaskState::Failed,
        TaskState::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Submitted => "submitted",
            TaskState::Working => "working",
            TaskState::InputRequired => "input-required",
            TaskState::Completed => "completed",
            TaskState::Canceled => "canceled",
            TaskState::Failed => "failed",
            TaskState::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Result<Self, DecodeError> {
        wire::tag("state", value)
    }

    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Canceled | TaskState::Failed
        )
    }

    /// Does the lifecycle diagram allow `self -> next`?
    pub fn can_transition_to(self, next: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, next),
            (Submitted, Working)
                | (Working, InputRequired | Completed | Canceled | Failed)
                | (InputRequired, Working)
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::start(TaskState::Submitted, TaskState::Working)]
    #[case::ask(TaskState::Working, TaskState::InputRequired)]
    #[case::resume(TaskState::InputRequired, TaskState::Working)]
    #[case::complete(TaskState::Working, TaskState::Completed)]
    #[case::cancel(TaskState::Working, TaskState::Canceled)]
    #[case::fail(TaskState::Working, TaskState::Failed)]
    fn legal_transitions(#[case] from: TaskState, #[case] to: TaskState) {
        assert!(from.can_transition_to(to));
    }

    #[rstest]
    #[case::skip_working(TaskState::Submitted, TaskState::Completed)]
    #[case::reopen(TaskState::Completed, TaskState::Working)]
    #[case::revive(TaskState::Failed, TaskState::Working)]
    #[case::into_unknown(TaskState::Working, TaskState::Unknown)]
    fn illegal_transitions(#[case] from: TaskState, #[case] to: TaskState) {
        assert!(!from.can_transition_to(to));
    }

    #[test]
    fn terminal_states() {
        let terminal: Vec<_> = TaskState::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(
            terminal,
            vec![TaskState::Completed, TaskState::Canceled, TaskState::Failed]
        );
    }

    #[test]
    fn wire_names_match_serde() {
        for state in TaskState::ALL {
            let s = serde_json::to_value(state).unwrap();
            assert_eq!(s, state.as_str());
            assert_eq!(TaskState::parse(state.as_str()).unwrap(), state);
        }
        assert!(TaskState::parse("done").is_err());
    }
}
