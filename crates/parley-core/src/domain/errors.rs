//! Errors - メッセージモデルとタスクモデルのエラー型

use super::ids::TaskId;
use super::state::TaskState;

/// DecodeError はワイヤーツリー（`serde_json::Value`）からのデコード失敗
///
/// 必ず問題のあるフィールド名を含みます。黙ってデフォルト値を埋めることはしません。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("missing field `{0}`")]
    MissingField(String),

    #[error("field `{0}` must be an object")]
    NotAnObject(String),

    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("unknown value {value:?} for field `{field}`")]
    UnknownTag { field: String, value: String },
}

impl DecodeError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::UnknownTag {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            DecodeError::MissingField(field) | DecodeError::NotAnObject(field) => field,
            DecodeError::InvalidField { field, .. } | DecodeError::UnknownTag { field, .. } => {
                field
            }
        }
    }
}

/// TaskError はタスク操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("illegal task transition {from} -> {to}")]
    IllegalTransition { from: TaskState, to: TaskState },

    #[error("task not found: {0}")]
    NotFound(TaskId),
}
