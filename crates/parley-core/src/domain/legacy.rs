//! Legacy envelope: `message_type` + free-form `content`.
//!
//! Content shape by message type:
//! - request: `{action, params}`
//! - response: `{data}`
//! - notification: `{event, data}`
//! - error: `{error}`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

use super::envelope::{Envelope, format_timestamp, pretty, preview};
use super::errors::DecodeError;
use super::ids::MessageId;
use super::role::AgentRole;
use super::wire::{self, Object};
use crate::ports::stamper::system_stamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Request,
    Response,
    Notification,
    Error,
}

impl MessageType {
    pub const ALL: [MessageType; 4] = [
        MessageType::Request,
        MessageType::Response,
        MessageType::Notification,
        MessageType::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Request => "request",
            MessageType::Response => "response",
            MessageType::Notification => "notification",
            MessageType::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Result<Self, DecodeError> {
        wire::tag("message_type", value)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view over `content`, selected by `message_type`.
#[derive(Debug, Clone, PartialEq)]
pub enum LegacyPayload {
    Request { action: String, params: Object },
    Response { data: Value },
    Notification { event: String, data: Value },
    Error { error: String },
}

/// Legacy routed message.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyEnvelope {
    pub sender: AgentRole,
    pub receiver: AgentRole,
    pub message_type: MessageType,
    pub content: Object,
    pub message_id: MessageId,
    pub timestamp: DateTime<Utc>,
    pub in_reply_to: Option<MessageId>,
}

impl LegacyEnvelope {
    /// Fresh envelope with a system-generated id and the current time.
    /// Use [`Stamper::stamp`](crate::ports::Stamper::stamp) to draw both from injected ports.
    pub fn new(
        sender: AgentRole,
        receiver: AgentRole,
        message_type: MessageType,
        content: Object,
        in_reply_to: Option<MessageId>,
    ) -> Self {
        let (message_id, timestamp) = system_stamp();
        Self {
            sender,
            receiver,
            message_type,
            content,
            message_id,
            timestamp,
            in_reply_to,
        }
    }

    pub fn request(
        sender: AgentRole,
        receiver: AgentRole,
        action: impl Into<String>,
        params: Value,
    ) -> Self {
        Self::new(
            sender,
            receiver,
            MessageType::Request,
            content(json!({"action": action.into(), "params": params})),
            None,
        )
    }

    pub fn response(
        sender: AgentRole,
        receiver: AgentRole,
        data: Value,
        in_reply_to: MessageId,
    ) -> Self {
        Self::new(
            sender,
            receiver,
            MessageType::Response,
            content(json!({"data": data})),
            Some(in_reply_to),
        )
    }

    pub fn notification(
        sender: AgentRole,
        receiver: AgentRole,
        event: impl Into<String>,
        data: Value,
    ) -> Self {
        Self::new(
            sender,
            receiver,
            MessageType::Notification,
            content(json!({"event": event.into(), "data": data})),
            None,
        )
    }

    pub fn error(
        sender: AgentRole,
        receiver: AgentRole,
        error: impl Into<String>,
        in_reply_to: MessageId,
    ) -> Self {
        Self::new(
            sender,
            receiver,
            MessageType::Error,
            content(json!({"error": error.into()})),
            Some(in_reply_to),
        )
    }

    pub fn with_id(mut self, message_id: MessageId) -> Self {
        self.message_id = message_id;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_reply_to(mut self, in_reply_to: MessageId) -> Self {
        self.in_reply_to = Some(in_reply_to);
        self
    }

    /// Interpret `content` according to `message_type`.
    pub fn payload(&self) -> Result<LegacyPayload, DecodeError> {
        let c = &self.content;
        match self.message_type {
            MessageType::Request => {
                let action = wire::required_str(c, "action")
                    .map_err(|e| nested("content", e))?
                    .to_string();
                let params = wire::optional_object(c, "params").map_err(|e| nested("content", e))?;
                Ok(LegacyPayload::Request { action, params })
            }
            MessageType::Response => {
                let data = c
                    .get("data")
                    .cloned()
                    .ok_or_else(|| DecodeError::MissingField("content.data".into()))?;
                Ok(LegacyPayload::Response { data })
            }
            MessageType::Notification => {
                let event = wire::required_str(c, "event")
                    .map_err(|e| nested("content", e))?
                    .to_string();
                let data = c.get("data").cloned().unwrap_or(Value::Null);
                Ok(LegacyPayload::Notification { event, data })
            }
            MessageType::Error => {
                let error = wire::required_str(c, "error")
                    .map_err(|e| nested("content", e))?
                    .to_string();
                Ok(LegacyPayload::Error { error })
            }
        }
    }

    pub fn from_dict(value: &Value) -> Result<Self, DecodeError> {
        let obj = wire::as_object(value, "envelope")?;
        Ok(Self {
            sender: AgentRole::parse("sender", wire::required_str(obj, "sender")?)?,
            receiver: AgentRole::parse("receiver", wire::required_str(obj, "receiver")?)?,
            message_type: MessageType::parse(wire::required_str(obj, "message_type")?)?,
            content: wire::required_object(obj, "content")?.clone(),
            message_id: MessageId::new(wire::required_str(obj, "message_id")?),
            timestamp: wire::timestamp(obj, "timestamp")?,
            in_reply_to: wire::optional_str(obj, "in_reply_to")?.map(MessageId::new),
        })
    }

    pub fn to_json(&self) -> String {
        pretty(&Envelope::to_dict(self))
    }
}

impl Envelope for LegacyEnvelope {
    const KINDS: &'static [&'static str] = &["request", "response", "notification", "error"];
    const KIND_LABEL: &'static str = "Type";

    fn stamped(self, message_id: MessageId, timestamp: DateTime<Utc>) -> Self {
        self.with_id(message_id).with_timestamp(timestamp)
    }

    fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    fn sender(&self) -> AgentRole {
        self.sender
    }

    fn receiver(&self) -> AgentRole {
        self.receiver
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn in_reply_to(&self) -> Option<&MessageId> {
        self.in_reply_to.as_ref()
    }

    fn kind(&self) -> &'static str {
        self.message_type.as_str()
    }

    fn summary_lines(&self, preview_chars: usize) -> Vec<String> {
        self.content
            .iter()
            .map(|(key, value)| {
                let rendered = match value {
                    Value::String(s) => format!("{s:?}"),
                    other => other.to_string(),
                };
                format!("{key}: {}", preview(&rendered, preview_chars))
            })
            .collect()
    }

    fn detail_lines(&self) -> Vec<String> {
        vec![format!(
            "Content: {}",
            pretty(&Value::Object(self.content.clone()))
        )]
    }

    fn to_dict(&self) -> Value {
        json!({
            "sender": self.sender.as_str(),
            "receiver": self.receiver.as_str(),
            "message_type": self.message_type.as_str(),
            "content": self.content,
            "message_id": self.message_id,
            "timestamp": format_timestamp(&self.timestamp),
            "in_reply_to": self.in_reply_to,
        })
    }
}

fn content(value: Value) -> Object {
    match value {
        Value::Object(map) => map,
        _ => Object::new(),
    }
}

fn nested(parent: &str, err: DecodeError) -> DecodeError {
    let field = format!("{parent}.{}", err.field());
    match err {
        DecodeError::MissingField(_) => DecodeError::MissingField(field),
        DecodeError::NotAnObject(_) => DecodeError::NotAnObject(field),
        DecodeError::InvalidField { reason, .. } => DecodeError::InvalidField { field, reason },
        DecodeError::UnknownTag { value, .. } => DecodeError::UnknownTag { field, value },
    }
}
