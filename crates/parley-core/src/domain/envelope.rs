//! Envelope - バス上でルーティングされる単位
//!
//! 2 種類のワイヤー形式が共存します:
//! - **legacy**: `message_type` + 自由形式の `content`（[`LegacyEnvelope`](super::legacy::LegacyEnvelope)）
//! - **standard**: `role` + `parts[]` + `metadata` をルーティング情報で包んだもの
//!   （[`AgentMessage`](super::standard::AgentMessage)）
//!
//! バス・スレッド再構築・統計はこの trait だけを見て動きます。

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::fmt;

use super::ids::MessageId;
use super::role::AgentRole;

/// Envelope は sender/receiver/id/timestamp を持つルーティング用ラッパー
pub trait Envelope: Clone + fmt::Debug + Send + Sync + 'static {
    /// Kind labels counted by bus statistics (zero-filled).
    const KINDS: &'static [&'static str];

    /// Heading used for `kind()` in conversation dumps ("Type" or "Role").
    const KIND_LABEL: &'static str;

    fn message_id(&self) -> &MessageId;
    fn sender(&self) -> AgentRole;
    fn receiver(&self) -> AgentRole;
    fn timestamp(&self) -> DateTime<Utc>;
    fn in_reply_to(&self) -> Option<&MessageId>;

    /// Same envelope under a new id and timestamp.
    fn stamped(self, message_id: MessageId, timestamp: DateTime<Utc>) -> Self;

    /// `message_type` for legacy envelopes, `role` for standard ones.
    fn kind(&self) -> &'static str;

    /// One line per payload element, for send-time logging.
    fn summary_lines(&self, preview_chars: usize) -> Vec<String>;

    /// Payload rendering for conversation dumps.
    fn detail_lines(&self) -> Vec<String>;

    /// Plain key/value tree (logging/printing only).
    fn to_dict(&self) -> Value;
}

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Truncate `text` to `max` chars, appending "..." when cut.
pub(crate) fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

pub(crate) fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
