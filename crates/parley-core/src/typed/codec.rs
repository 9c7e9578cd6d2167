//! ActionEnvelope - 2 種類のワイヤー形式とアクション呼び出しの相互変換
//!
//! # 抽出ルール
//! - legacy: `message_type = request` のとき `content.action` / `content.params`
//! - standard: role `user` かつ metadata `message_type = request` のとき、
//!   最初の Json パートの `action` / `params`
//!
//! 条件に当てはまらない envelope は `Ok(None)`、形が壊れていれば `DecodeError`。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::wire;
use crate::domain::{
    AgentMessage, AgentRole, DecodeError, Envelope, LegacyEnvelope, LegacyPayload, Message,
    MessageRole,
};

use super::action::Action;

/// Decoded `{action, params}` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    pub params: Value,
}

impl ActionRequest {
    pub fn new(action: impl Into<String>, params: Value) -> Self {
        Self {
            action: action.into(),
            params,
        }
    }

    /// Request for a typed action.
    pub fn of<A: Action>(params: &A) -> Result<Self, serde_json::Error> {
        Ok(Self::new(A::NAME, serde_json::to_value(params)?))
    }
}

/// Envelope shapes that can carry action requests, replies and notifications.
pub trait ActionEnvelope: Envelope {
    fn action_request(&self) -> Result<Option<ActionRequest>, DecodeError>;

    /// Event name when this is a notification.
    fn notification_event(&self) -> Option<String>;

    fn build_request(sender: AgentRole, receiver: AgentRole, request: &ActionRequest) -> Self;

    fn build_notification(sender: AgentRole, receiver: AgentRole, event: &str, data: Value) -> Self;

    /// Reply to `self` (sender/receiver swapped, `in_reply_to` = this id).
    fn build_response(&self, data: Value) -> Self;

    fn build_error(&self, error: String) -> Self;

    /// Data of a successful reply.
    fn response_data(&self) -> Option<Value>;

    /// Error text of an error reply.
    fn error_text(&self) -> Option<String>;
}

impl ActionEnvelope for LegacyEnvelope {
    fn action_request(&self) -> Result<Option<ActionRequest>, DecodeError> {
        match self.payload() {
            Ok(LegacyPayload::Request { action, params }) => {
                Ok(Some(ActionRequest::new(action, Value::Object(params))))
            }
            Ok(_) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn notification_event(&self) -> Option<String> {
        match self.payload() {
            Ok(LegacyPayload::Notification { event, .. }) => Some(event),
            _ => None,
        }
    }

    fn build_request(sender: AgentRole, receiver: AgentRole, request: &ActionRequest) -> Self {
        LegacyEnvelope::request(sender, receiver, request.action.clone(), request.params.clone())
    }

    fn build_notification(sender: AgentRole, receiver: AgentRole, event: &str, data: Value) -> Self {
        LegacyEnvelope::notification(sender, receiver, event, data)
    }

    fn build_response(&self, data: Value) -> Self {
        LegacyEnvelope::response(self.receiver, self.sender, data, self.message_id.clone())
    }

    fn build_error(&self, error: String) -> Self {
        LegacyEnvelope::error(self.receiver, self.sender, error, self.message_id.clone())
    }

    fn response_data(&self) -> Option<Value> {
        match self.payload() {
            Ok(LegacyPayload::Response { data }) => Some(data),
            _ => None,
        }
    }

    fn error_text(&self) -> Option<String> {
        match self.payload() {
            Ok(LegacyPayload::Error { error }) => Some(error),
            _ => None,
        }
    }
}

impl ActionEnvelope for AgentMessage {
    fn action_request(&self) -> Result<Option<ActionRequest>, DecodeError> {
        let message = &self.message;
        if message.role != MessageRole::User || message.message_type() != Some("request") {
            return Ok(None);
        }
        let body = message
            .first_json()
            .ok_or_else(|| DecodeError::MissingField("message.parts[json]".into()))?;
        let body = wire::as_object(body, "message.parts[json]")?;
        let action = wire::required_str(body, "action")?.to_string();
        let params = wire::optional_object(body, "params")?;
        Ok(Some(ActionRequest::new(action, Value::Object(params))))
    }

    fn notification_event(&self) -> Option<String> {
        if self.message.message_type() != Some("notification") {
            return None;
        }
        self.message
            .first_json()
            .and_then(|body| body.get("event"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn build_request(sender: AgentRole, receiver: AgentRole, request: &ActionRequest) -> Self {
        AgentMessage::new(
            sender,
            receiver,
            Message::request(&request.action, request.params.clone()),
        )
    }

    fn build_notification(sender: AgentRole, receiver: AgentRole, event: &str, data: Value) -> Self {
        AgentMessage::new(sender, receiver, Message::notification(event, data))
    }

    fn build_response(&self, data: Value) -> Self {
        let mut message = Message::response(data);
        if let Ok(Some(request)) = self.action_request() {
            message = message.with_metadata("action", request.action);
        }
        AgentMessage::reply(self.receiver, self.sender, message, self.message_id.clone())
    }

    fn build_error(&self, error: String) -> Self {
        AgentMessage::reply(
            self.receiver,
            self.sender,
            Message::error(error),
            self.message_id.clone(),
        )
    }

    fn response_data(&self) -> Option<Value> {
        if self.message.message_type() != Some("response") {
            return None;
        }
        self.message.first_json().cloned()
    }

    fn error_text(&self) -> Option<String> {
        if self.message.message_type() != Some("error") {
            return None;
        }
        self.message
            .first_json()
            .and_then(|body| body.get("error"))
            .and_then(Value::as_str)
            .or_else(|| self.message.first_text())
            .map(str::to_string)
    }
}
