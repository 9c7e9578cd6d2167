//! ActionAgent - アクションレジストリをバスのハンドラとして公開する
//!
//! - request → dispatch → response `{data}`
//! - 未知のアクション → error envelope "Unknown action: <name>"
//! - params 不正 / 処理失敗 → error envelope "Error processing request: <reason>"
//! - notification はログのみ（応答なし）
//! - response / error を受け取った場合も応答なし

use async_trait::async_trait;

use crate::app::AgentHandler;
use crate::domain::AgentRole;
use crate::error::HandlerError;
use crate::ports::Stamper;
use crate::typed::{ActionEnvelope, ActionError, ActionRegistry};

pub struct ActionAgent {
    role: AgentRole,
    actions: ActionRegistry,
    stamper: Stamper,
}

impl ActionAgent {
    pub fn new(role: AgentRole, actions: ActionRegistry) -> Self {
        Self {
            role,
            actions,
            stamper: Stamper::system(),
        }
    }

    /// Ids and timestamps of replies come from `stamper`.
    pub fn with_stamper(mut self, stamper: Stamper) -> Self {
        self.stamper = stamper;
        self
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn actions(&self) -> Vec<&'static str> {
        self.actions.names()
    }
}

#[async_trait]
impl<E: ActionEnvelope> AgentHandler<E> for ActionAgent {
    async fn handle(&self, envelope: E) -> Result<Option<E>, HandlerError> {
        if let Some(event) = envelope.notification_event() {
            tracing::info!(agent = %self.role, event = %event, "notification received");
            return Ok(None);
        }

        let request = match envelope.action_request() {
            Ok(Some(request)) => request,
            Ok(None) => {
                tracing::debug!(agent = %self.role, kind = envelope.kind(), "nothing to answer");
                return Ok(None);
            }
            Err(e) => {
                tracing::warn!(agent = %self.role, error = %e, "malformed request");
                let reply = envelope.build_error(format!("Error processing request: {e}"));
                return Ok(Some(self.stamper.stamp(reply)));
            }
        };

        tracing::info!(agent = %self.role, action = %request.action, "handling request");
        let reply = match self.actions.dispatch(request).await {
            Ok(data) => envelope.build_response(data),
            Err(e @ ActionError::UnknownAction(_)) => envelope.build_error(e.to_string()),
            Err(e) => {
                tracing::warn!(agent = %self.role, error = %e, "action failed");
                envelope.build_error(format!("Error processing request: {e}"))
            }
        };
        Ok(Some(self.stamper.stamp(reply)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgentMessage, LegacyEnvelope, Message, MessageType};
    use crate::typed::ActionRequest;
    use crate::typed::handler::fixtures::{Double, DoubleHandler};
    use serde_json::json;

    fn agent() -> ActionAgent {
        let actions = ActionRegistry::new().with::<Double, _>(DoubleHandler).unwrap();
        ActionAgent::new(AgentRole::CompanyAgent, actions)
    }

    fn legacy(action: &str, params: serde_json::Value) -> LegacyEnvelope {
        LegacyEnvelope::request(AgentRole::Coordinator, AgentRole::CompanyAgent, action, params)
    }

    #[tokio::test]
    async fn request_gets_response() {
        let request = legacy("double", json!({"value": 4}));
        let reply = agent().handle(request.clone()).await.unwrap().unwrap();

        assert_eq!(reply.message_type, MessageType::Response);
        assert_eq!(reply.in_reply_to.as_ref(), Some(&request.message_id));
        assert_eq!(reply.response_data(), Some(json!(8)));
    }

    #[tokio::test]
    async fn unknown_action_gets_error_envelope() {
        let reply = agent().handle(legacy("triple", json!({}))).await.unwrap().unwrap();
        assert_eq!(reply.message_type, MessageType::Error);
        assert_eq!(reply.error_text().as_deref(), Some("Unknown action: triple"));
    }

    #[tokio::test]
    async fn bad_params_get_processing_error() {
        let reply = agent().handle(legacy("double", json!({}))).await.unwrap().unwrap();
        let text = reply.error_text().unwrap();
        assert!(text.starts_with("Error processing request: "), "{text}");
    }

    #[tokio::test]
    async fn notifications_and_replies_are_silent() {
        let note = LegacyEnvelope::notification(
            AgentRole::Coordinator,
            AgentRole::CompanyAgent,
            "market_open",
            json!({}),
        );
        assert!(agent().handle(note).await.unwrap().is_none());

        let request = legacy("double", json!({"value": 1}));
        let response = LegacyEnvelope::response(
            AgentRole::PersonAgent,
            AgentRole::CompanyAgent,
            json!({}),
            request.message_id,
        );
        assert!(agent().handle(response).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn standard_shape_is_served_by_the_same_agent() {
        let request = AgentMessage::build_request(
            AgentRole::Coordinator,
            AgentRole::StandardCompanyAgent,
            &ActionRequest::new("double", json!({"value": 5})),
        );
        let reply = agent().handle(request).await.unwrap().unwrap();
        assert_eq!(reply.response_data(), Some(json!(10)));
        assert_eq!(reply.message.metadata["action"], json!("double"));

        let chatter = AgentMessage::new(
            AgentRole::Coordinator,
            AgentRole::StandardCompanyAgent,
            Message::text(crate::domain::MessageRole::User, "hello"),
        );
        assert!(agent().handle(chatter).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn replies_are_stamped_by_the_agent() {
        use chrono::{TimeZone, Utc};

        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let agent = agent().with_stamper(crate::ports::Stamper::fixed(at));

        let request = legacy("double", json!({"value": 2}));
        let reply = agent.handle(request.clone()).await.unwrap().unwrap();
        assert_eq!(reply.timestamp, at);
        assert!(reply.message_id.as_str().starts_with("msg-"));
        assert_eq!(reply.in_reply_to.as_ref(), Some(&request.message_id));

        let error = agent.handle(legacy("triple", json!({}))).await.unwrap().unwrap();
        assert_eq!(error.timestamp, at);
    }
}
