//! IdGenerator port - ID 生成の抽象化
//!
//! テスト容易性のために trait として抽象化しています。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use crate::domain::ids::{MessageId, SessionId, TaskId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator はプレフィックス付きの一意な ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（共有された TaskManager からも使える）
pub trait IdGenerator: Send + Sync {
    fn generate_message_id(&self) -> MessageId;

    fn generate_task_id(&self) -> TaskId;

    fn generate_session_id(&self) -> SessionId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock を使って時刻部分を決めるので、FixedClock を渡せば
/// timestamp 部分が固定された ID を生成できます。
#[derive(Debug)]
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub const fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_message_id(&self) -> MessageId {
        MessageId::from_ulid(self.next_ulid())
    }

    fn generate_task_id(&self) -> TaskId {
        TaskId::from_ulid(self.next_ulid())
    }

    fn generate_session_id(&self) -> SessionId {
        SessionId::from_ulid(self.next_ulid())
    }
}
