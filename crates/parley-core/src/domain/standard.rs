//! Standard message format: `role` + `parts[]` + `metadata`.
//!
//! A [`Message`] carries content; an [`AgentMessage`] wraps it with the same
//! routing shell as the legacy envelope (sender/receiver/id/timestamp/reply).
//!
//! Part type tags:
//! - `"text"` / `"text/plain"` -> [`Part::Text`]
//! - `"json"` / `"application/json"` -> [`Part::Json`]
//! - `"file"` or any MIME-style string containing `/` -> [`Part::File`]
//! - anything else is rejected

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

/// Role of the message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Client / coordinator side.
    User,
    Agent,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Agent => "agent",
        }
    }

    pub fn parse(value: &str) -> Result<Self, DecodeError> {
        wire::tag("role", value)
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextType {
    #[default]
    Text,
    TextPlain,
}

impl TextType {
    pub fn as_str(self) -> &'static str {
        match self {
            TextType::Text => "text",
            TextType::TextPlain => "text/plain",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonType {
    #[default]
    Json,
    ApplicationJson,
}

impl JsonType {
    pub fn as_str(self) -> &'static str {
        match self {
            JsonType::Json => "json",
            JsonType::ApplicationJson => "application/json",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextPart {
    pub type_tag: TextType,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonPart {
    pub type_tag: JsonType,
    pub json: Value,
}

/// File reference or inline content. `media_type` is `"file"` or a MIME type.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub media_type: String,
    pub uri: Option<String>,
    /// Base64 encoded content.
    pub data: Option<String>,
    pub filename: Option<String>,
}

/// Atomic content unit of a standard message.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(TextPart),
    Json(JsonPart),
    File(FilePart),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(TextPart {
            type_tag: TextType::Text,
            text: text.into(),
        })
    }

    pub fn json(json: Value) -> Self {
        Part::Json(JsonPart {
            type_tag: JsonType::Json,
            json,
        })
    }

    pub fn file_uri(uri: impl Into<String>, filename: Option<String>) -> Self {
        Part::File(FilePart {
            media_type: "file".to_string(),
            uri: Some(uri.into()),
            data: None,
            filename,
        })
    }

    pub fn type_tag(&self) -> &str {
        match self {
            Part::Text(p) => p.type_tag.as_str(),
            Part::Json(p) => p.type_tag.as_str(),
            Part::File(p) => &p.media_type,
        }
    }

    pub fn to_dict(&self) -> Value {
        match self {
            Part::Text(p) => json!({"type": p.type_tag.as_str(), "text": p.text}),
            Part::Json(p) => json!({"type": p.type_tag.as_str(), "json": p.json}),
            Part::File(p) => {
                let mut obj = Object::new();
                obj.insert("type".into(), Value::String(p.media_type.clone()));
                for (key, field) in [("uri", &p.uri), ("data", &p.data), ("filename", &p.filename)] {
                    if let Some(v) = field {
                        obj.insert(key.into(), Value::String(v.clone()));
                    }
                }
                Value::Object(obj)
            }
        }
    }

    /// Decode one part; `path` prefixes field names in errors (e.g. `parts[1]`).
    pub fn from_dict(value: &Value, path: &str) -> Result<Self, DecodeError> {
        let field = |name: &str| format!("{path}.{name}");
        let obj = wire::as_object(value, path)?;
        let type_tag = wire::required_str(obj, "type").map_err(|_| match obj.get("type") {
            None | Some(Value::Null) => DecodeError::MissingField(field("type")),
            Some(_) => DecodeError::invalid(field("type"), "expected a string"),
        })?;

        match type_tag {
            "text" | "text/plain" => {
                let text = match obj.get("text") {
                    None | Some(Value::Null) => return Err(DecodeError::MissingField(field("text"))),
                    Some(Value::String(text)) => text,
                    Some(_) => return Err(DecodeError::invalid(field("text"), "expected a string")),
                };
                Ok(Part::Text(TextPart {
                    type_tag: if type_tag == "text" {
                        TextType::Text
                    } else {
                        TextType::TextPlain
                    },
                    text: text.to_string(),
                }))
            }
            "json" | "application/json" => {
                let json = obj
                    .get("json")
                    .cloned()
                    .ok_or_else(|| DecodeError::MissingField(field("json")))?;
                Ok(Part::Json(JsonPart {
                    type_tag: if type_tag == "json" {
                        JsonType::Json
                    } else {
                        JsonType::ApplicationJson
                    },
                    json,
                }))
            }
            other if other == "file" || other.contains('/') => {
                let get = |name: &str| -> Result<Option<String>, DecodeError> {
                    wire::optional_str(obj, name)
                        .map(|v| v.map(str::to_string))
                        .map_err(|_| DecodeError::invalid(field(name), "expected a string"))
                };
                Ok(Part::File(FilePart {
                    media_type: other.to_string(),
                    uri: get("uri")?,
                    data: get("data")?,
                    filename: get("filename")?,
                }))
            }
            other => Err(DecodeError::unknown(field("type"), other)),
        }
    }
}

/// Standard message: the content unit exchanged between agents.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub parts: Vec<Part>,
    pub metadata: Object,
}

impl Message {
    pub fn new(role: MessageRole, parts: Vec<Part>) -> Self {
        Self {
            role,
            parts,
            metadata: Object::new(),
        }
    }

    pub fn text(role: MessageRole, text: impl Into<String>) -> Self {
        Self::new(role, vec![Part::text(text)])
    }

    pub fn json(role: MessageRole, data: Value) -> Self {
        Self::new(role, vec![Part::json(data)])
    }

    /// `role = user`, parts `[Text "Request: <action>", Json {action, params}]`.
    pub fn request(action: &str, params: Value) -> Self {
        Self::new(
            MessageRole::User,
            vec![
                Part::text(format!("Request: {action}")),
                Part::json(json!({"action": action, "params": params})),
            ],
        )
        .with_metadata("message_type", "request")
    }

    /// `role = agent`, parts `[Json data]`.
    pub fn response(data: Value) -> Self {
        Self::json(MessageRole::Agent, data).with_metadata("message_type", "response")
    }

    pub fn notification(event: &str, data: Value) -> Self {
        Self::json(MessageRole::Agent, json!({"event": event, "data": data}))
            .with_metadata("message_type", "notification")
    }

    pub fn error(error: impl Into<String>) -> Self {
        let error = error.into();
        Self::new(
            MessageRole::Agent,
            vec![Part::text(error.clone()), Part::json(json!({"error": error}))],
        )
        .with_metadata("message_type", "error")
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The `message_type` tag carried in metadata, if any.
    pub fn message_type(&self) -> Option<&str> {
        self.metadata.get("message_type").and_then(Value::as_str)
    }

    pub fn first_json(&self) -> Option<&Value> {
        self.parts.iter().find_map(|part| match part {
            Part::Json(p) => Some(&p.json),
            _ => None,
        })
    }

    pub fn first_text(&self) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            Part::Text(p) => Some(p.text.as_str()),
            _ => None,
        })
    }

    pub fn to_dict(&self) -> Value {
        json!({
            "role": self.role.as_str(),
            "parts": self.parts.iter().map(Part::to_dict).collect::<Vec<_>>(),
            "metadata": self.metadata,
        })
    }

    pub fn from_dict(value: &Value) -> Result<Self, DecodeError> {
        let obj = wire::as_object(value, "message")?;
        let role = MessageRole::parse(wire::required_str(obj, "role")?)?;
        let parts = match obj.get("parts") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| Part::from_dict(item, &format!("parts[{i}]")))
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(DecodeError::invalid("parts", "expected an array")),
        };
        Ok(Self {
            role,
            parts,
            metadata: wire::optional_object(obj, "metadata")?,
        })
    }

    pub fn to_json(&self) -> String {
        pretty(&self.to_dict())
    }
}

/// Standard message wrapped with routing information.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentMessage {
    pub message: Message,
    pub sender: AgentRole,
    pub receiver: AgentRole,
    pub message_id: MessageId,
    pub timestamp: DateTime<Utc>,
    pub in_reply_to: Option<MessageId>,
}

impl AgentMessage {
    /// Fresh envelope with a system-generated id and the current time.
    pub fn new(sender: AgentRole, receiver: AgentRole, message: Message) -> Self {
        let (message_id, timestamp) = system_stamp();
        Self {
            message,
            sender,
            receiver,
            message_id,
            timestamp,
            in_reply_to: None,
        }
    }

    pub fn reply(
        sender: AgentRole,
        receiver: AgentRole,
        message: Message,
        in_reply_to: MessageId,
    ) -> Self {
        Self::new(sender, receiver, message).with_reply_to(in_reply_to)
    }

    pub fn with_reply_to(mut self, in_reply_to: MessageId) -> Self {
        self.in_reply_to = Some(in_reply_to);
        self
    }

    pub fn with_id(mut self, message_id: MessageId) -> Self {
        self.message_id = message_id;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn from_dict(value: &Value) -> Result<Self, DecodeError> {
        let obj = wire::as_object(value, "envelope")?;
        let message = Message::from_dict(wire::required(obj, "message")?).map_err(|e| {
            match e {
                DecodeError::NotAnObject(f) if f == "message" => DecodeError::NotAnObject(f),
                other => prefix_message(other),
            }
        })?;
        Ok(Self {
            message,
            sender: AgentRole::parse("sender", wire::required_str(obj, "sender")?)?,
            receiver: AgentRole::parse("receiver", wire::required_str(obj, "receiver")?)?,
            message_id: MessageId::new(wire::required_str(obj, "message_id")?),
            timestamp: wire::timestamp(obj, "timestamp")?,
            in_reply_to: wire::optional_str(obj, "in_reply_to")?.map(MessageId::new),
        })
    }

    pub fn to_json(&self) -> String {
        pretty(&Envelope::to_dict(self))
    }
}

fn prefix_message(err: DecodeError) -> DecodeError {
    let field = format!("message.{}", err.field());
    match err {
        DecodeError::MissingField(_) => DecodeError::MissingField(field),
        DecodeError::NotAnObject(_) => DecodeError::NotAnObject(field),
        DecodeError::InvalidField { reason, .. } => DecodeError::InvalidField { field, reason },
        DecodeError::UnknownTag { value, .. } => DecodeError::UnknownTag { field, value },
    }
}

impl Envelope for AgentMessage {
    const KINDS: &'static [&'static str] = &["user", "agent"];
    const KIND_LABEL: &'static str = "Role";

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
        self.message.role.as_str()
    }

    fn summary_lines(&self, preview_chars: usize) -> Vec<String> {
        let mut lines: Vec<String> = self
            .message
            .parts
            .iter()
            .enumerate()
            .map(|(i, part)| {
                let n = i + 1;
                match part {
                    Part::Text(p) => format!("[{n}] TextPart: {:?}", preview(&p.text, preview_chars)),
                    Part::Json(p) => match &p.json {
                        Value::Object(map) => {
                            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
                            format!("[{n}] JsonPart: {keys:?}")
                        }
                        _ => format!("[{n}] JsonPart: data"),
                    },
                    Part::File(p) => {
                        let label = p
                            .filename
                            .as_deref()
                            .or(p.uri.as_deref())
                            .unwrap_or("embedded");
                        format!("[{n}] FilePart: {label}")
                    }
                }
            })
            .collect();
        if !self.message.metadata.is_empty() {
            lines.push(format!(
                "metadata: {}",
                Value::Object(self.message.metadata.clone())
            ));
        }
        lines
    }

    fn detail_lines(&self) -> Vec<String> {
        let mut lines = vec!["Parts:".to_string()];
        for (i, part) in self.message.parts.iter().enumerate() {
            lines.push(format!("  [{}] {}", i + 1, part.to_dict()));
        }
        if !self.message.metadata.is_empty() {
            lines.push(format!(
                "Metadata: {}",
                Value::Object(self.message.metadata.clone())
            ));
        }
        lines
    }

    fn to_dict(&self) -> Value {
        json!({
            "message": self.message.to_dict(),
            "sender": self.sender.as_str(),
            "receiver": self.receiver.as_str(),
            "message_id": self.message_id,
            "timestamp": format_timestamp(&self.timestamp),
            "in_reply_to": self.in_reply_to,
        })
    }
}
