//! TaskManager - タスクとセッションの台帳
//!
//! - タスクは ID で引ける（作成後は呼び出し側が直接更新する）
//! - セッションは作成順のタスク ID リスト
//! - セッション横断のコンテキストはタスク作成順 → 各タスクの履歴順で連結

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use crate::domain::task::tail;
use crate::domain::wire::Object;
use crate::domain::{Message, SessionId, Task, TaskError, TaskId};
use crate::observability::TaskStatistics;
use crate::ports::{Clock, IdGenerator, SystemClock, UlidGenerator};

pub struct TaskManager {
    tasks: HashMap<TaskId, Task>,
    sessions: HashMap<SessionId, Vec<TaskId>>,
    ids: Box<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskManager {
    pub fn new() -> Self {
        Self::with_ports(Box::new(UlidGenerator::new(SystemClock)), Arc::new(SystemClock))
    }

    /// Inject id generation and time (deterministic tests).
    pub fn with_ports(ids: Box<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            tasks: HashMap::new(),
            sessions: HashMap::new(),
            ids,
            clock,
        }
    }

    /// Create a task in `submitted`, opening a new session when none is given.
    ///
    /// An unknown `session_id` starts that session.
    pub fn create_task(&mut self, session_id: Option<SessionId>, metadata: Option<Object>) -> &mut Task {
        let task_id = self.ids.generate_task_id();
        let session_id = session_id.unwrap_or_else(|| self.ids.generate_session_id());

        let task = Task::with_clock(
            task_id.clone(),
            session_id.clone(),
            metadata.unwrap_or_default(),
            Arc::clone(&self.clock),
        );
        tracing::info!(task_id = %task_id, session_id = %session_id, "task created");

        let task = match self.tasks.entry(task_id.clone()) {
            Entry::Occupied(mut slot) => {
                let previous = slot.insert(task);
                tracing::warn!(
                    task_id = %task_id,
                    previous_session = %previous.session_id,
                    "task id reused; previous task replaced"
                );
                if let Some(ids) = self.sessions.get_mut(&previous.session_id) {
                    ids.retain(|id| id != &task_id);
                }
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(task),
        };
        self.sessions.entry(session_id).or_default().push(task_id);
        task
    }

    pub fn get_task(&self, task_id: &TaskId) -> Option<&Task> {
        self.tasks.get(task_id)
    }

    pub fn get_task_mut(&mut self, task_id: &TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(task_id)
    }

    /// Like `get_task_mut`, but a missing task is an error.
    pub fn require_task_mut(&mut self, task_id: &TaskId) -> Result<&mut Task, TaskError> {
        self.tasks
            .get_mut(task_id)
            .ok_or_else(|| TaskError::NotFound(task_id.clone()))
    }

    /// Tasks of a session in creation order (empty when unknown).
    pub fn get_session_tasks(&self, session_id: &SessionId) -> Vec<&Task> {
        self.sessions
            .get(session_id)
            .map(|ids| ids.iter().filter_map(|id| self.tasks.get(id)).collect())
            .unwrap_or_default()
    }

    /// Every message of the session, task creation order then history order,
    /// truncated to the last `max_messages` when given.
    pub fn get_session_context(&self, session_id: &SessionId, max_messages: Option<usize>) -> Vec<Message> {
        let all: Vec<Message> = self
            .get_session_tasks(session_id)
            .into_iter()
            .flat_map(|task| task.history().iter().cloned())
            .collect();
        tail(&all, max_messages).to_vec()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn statistics(&self) -> TaskStatistics {
        TaskStatistics::collect(self.tasks.values(), self.sessions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageRole, TaskState};
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};

    fn manager() -> TaskManager {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
        TaskManager::with_ports(Box::new(UlidGenerator::new(clock)), Arc::new(clock))
    }

    fn user(text: &str) -> Message {
        Message::text(MessageRole::User, text)
    }

    #[test]
    fn create_task_opens_a_session() {
        let mut tm = manager();
        let task = tm.create_task(None, None);
        assert_eq!(task.state(), TaskState::Submitted);
        assert!(task.id.as_str().starts_with("task-"));
        assert!(task.session_id.as_str().starts_with("session-"));

        let (task_id, session_id) = (task.id.clone(), task.session_id.clone());
        assert!(tm.get_task(&task_id).is_some());
        assert_eq!(tm.get_session_tasks(&session_id).len(), 1);
    }

    #[test]
    fn metadata_is_kept() {
        let mut tm = manager();
        let mut meta = Object::new();
        meta.insert("source".into(), "cli".into());
        let task = tm.create_task(None, Some(meta.clone()));
        assert_eq!(task.metadata, meta);
    }

    #[test]
    fn session_context_concatenates_in_creation_order() {
        let mut tm = manager();
        let session = SessionId::new("session-demo");

        let first = tm.create_task(Some(session.clone()), None);
        first.add_message(user("a1"));
        first.add_message(user("a2"));
        let second = tm.create_task(Some(session.clone()), None);
        second.add_message(user("b1"));
        second.add_message(user("b2"));

        let texts: Vec<String> = tm
            .get_session_context(&session, None)
            .iter()
            .filter_map(|m| m.first_text().map(str::to_string))
            .collect();
        assert_eq!(texts, vec!["a1", "a2", "b1", "b2"]);

        let last_three = tm.get_session_context(&session, Some(3));
        assert_eq!(last_three.len(), 3);
        assert_eq!(last_three[0].first_text(), Some("a2"));
    }

    #[test]
    fn unknown_lookups_are_empty() {
        let mut tm = manager();
        assert!(tm.get_task(&TaskId::new("task-x")).is_none());
        assert!(tm.get_session_tasks(&SessionId::new("session-x")).is_empty());
        assert!(tm.get_session_context(&SessionId::new("session-x"), None).is_empty());
        assert!(matches!(
            tm.require_task_mut(&TaskId::new("task-x")),
            Err(TaskError::NotFound(_))
        ));
    }

    #[test]
    fn statistics_count_tasks_sessions_and_states() {
        let mut tm = manager();
        let session = SessionId::new("s");
        tm.create_task(Some(session.clone()), None)
            .update_status(TaskState::Working, None);
        tm.create_task(Some(session), None);
        tm.create_task(None, None);

        let stats = tm.statistics();
        assert_eq!(stats.total_tasks, 3);
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.by_state["working"], 1);
        assert_eq!(stats.by_state["submitted"], 2);
    }

    /// Hands out the same task id every time.
    struct RepeatingIds;

    impl IdGenerator for RepeatingIds {
        fn generate_message_id(&self) -> crate::domain::MessageId {
            crate::domain::MessageId::new("msg-same")
        }

        fn generate_task_id(&self) -> TaskId {
            TaskId::new("task-same")
        }

        fn generate_session_id(&self) -> SessionId {
            SessionId::new("session-fresh")
        }
    }

    #[test]
    fn reused_task_id_replaces_the_old_task() {
        let mut tm = TaskManager::with_ports(Box::new(RepeatingIds), Arc::new(SystemClock));
        let first_session = SessionId::new("session-a");
        let second_session = SessionId::new("session-b");

        tm.create_task(Some(first_session.clone()), None)
            .add_message(user("old"));
        let task = tm.create_task(Some(second_session.clone()), None);
        assert!(task.history().is_empty());
        assert_eq!(task.session_id, second_session);

        assert_eq!(tm.tasks().count(), 1);
        assert!(tm.get_session_tasks(&first_session).is_empty());
        assert_eq!(tm.get_session_tasks(&second_session).len(), 1);
        assert_eq!(tm.get_task(&TaskId::new("task-same")).unwrap().session_id, second_session);
    }
}
