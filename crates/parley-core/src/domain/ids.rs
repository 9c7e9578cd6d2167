//! Domain identifiers (strongly-typed IDs).
//!
//! # ULID ベースの ID + Phantom type
//! 生成される ID は `{prefix}{ULID}` 形式の文字列です（例: `msg-01J...`）。
//! 受信側では ID を不透明な文字列として扱うため、デコード時は任意の文字列を受け付けます。
//!
//! `Id<T>` の `T` は実行時には使わないマーカー型で、
//! MessageId / TaskId / SessionId をコンパイル時に区別します。

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// 生成時に付けるプレフィックス（"msg-", "task-", "session-"）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// ```ignore
/// let message_id = MessageId::from_ulid(Ulid::new());
/// let task_id = TaskId::from_ulid(Ulid::new());
/// // message_id と task_id は異なる型なので、混同できない
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T: IdMarker> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    /// Wrap an existing id string (e.g. one received on the wire).
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    /// ULID から Id を作成（プレフィックス付き）
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self::new(format!("{}{}", T::prefix(), ulid))
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// 先頭 8 文字（プレフィックスを除く）。ログ表示用。
    pub fn short(&self) -> &str {
        let body = self.value.strip_prefix(T::prefix()).unwrap_or(&self.value);
        match body.char_indices().nth(8) {
            Some((idx, _)) => &body[..idx],
            None => body,
        }
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl<T: IdMarker> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de, T: IdMarker> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Message のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKey {}

impl IdMarker for MessageKey {
    fn prefix() -> &'static str {
        "msg-"
    }
}

/// Task のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKey {}

impl IdMarker for TaskKey {
    fn prefix() -> &'static str {
        "task-"
    }
}

/// Session のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SessionKey {}

impl IdMarker for SessionKey {
    fn prefix() -> &'static str {
        "session-"
    }
}

/// Identifier of a routed envelope (unique per bus).
pub type MessageId = Id<MessageKey>;

/// Identifier of a Task.
pub type TaskId = Id<TaskKey>;

/// Identifier of a Session (grouping of tasks).
pub type SessionId = Id<SessionKey>;
