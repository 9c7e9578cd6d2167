//! Coordinator - バス越しに他のエージェントを組み合わせるワークフロー
//!
//! 自身はリクエストに答えません（受信はログのみ）。
//! 会社調査 → 役員ごとの人物調査、という多段の問い合わせを同期的に行います。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::app::{AgentHandler, MessageBus};
use crate::config::CoordinatorConfig;
use crate::domain::{AgentRole, Envelope};
use crate::error::{BusError, HandlerError};
use crate::typed::{Action, ActionEnvelope, ActionRequest};

use super::company::CompanyFullResearch;
use super::person::{PersonFullResearch, ResearchExecutive};

/// Inbox registered under `coordinator`: logs, never replies.
pub struct CoordinatorInbox;

#[async_trait]
impl<E: ActionEnvelope> AgentHandler<E> for CoordinatorInbox {
    async fn handle(&self, envelope: E) -> Result<Option<E>, HandlerError> {
        tracing::info!(
            from = %envelope.sender(),
            kind = envelope.kind(),
            message_id = %envelope.message_id().short(),
            "coordinator received message"
        );
        Ok(None)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveReport {
    pub executive: Value,
    pub research: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyExecutivesReport {
    pub ticker: String,
    pub company_data: Option<Value>,
    pub executives_research: Vec<ExecutiveReport>,
}

pub struct Coordinator<E: ActionEnvelope> {
    bus: MessageBus<E>,
    config: CoordinatorConfig,
    company: AgentRole,
    person: AgentRole,
}

impl<E: ActionEnvelope> Coordinator<E> {
    /// Register the coordinator inbox on `bus` and target the legacy agents.
    pub async fn attach(bus: MessageBus<E>, config: CoordinatorConfig) -> Self {
        bus.register(AgentRole::Coordinator, std::sync::Arc::new(CoordinatorInbox))
            .await;
        Self {
            bus,
            config,
            company: AgentRole::CompanyAgent,
            person: AgentRole::PersonAgent,
        }
    }

    /// Route research to other roles (e.g. the standard-format agents).
    pub fn with_targets(mut self, company: AgentRole, person: AgentRole) -> Self {
        self.company = company;
        self.person = person;
        self
    }

    pub fn bus(&self) -> &MessageBus<E> {
        &self.bus
    }

    async fn request(&self, receiver: AgentRole, request: ActionRequest) -> Result<Option<Value>, BusError> {
        let envelope = self
            .bus
            .stamper()
            .stamp(E::build_request(AgentRole::Coordinator, receiver, &request));
        let Some(reply) = self.bus.send(envelope).await? else {
            return Ok(None);
        };
        if let Some(error) = reply.error_text() {
            tracing::warn!(receiver = %receiver, action = %request.action, error = %error, "request failed");
        }
        Ok(reply.response_data())
    }

    /// `full_research` on the company agent; `None` when nothing usable came back.
    pub async fn request_company_research(&self, ticker: &str) -> Result<Option<Value>, BusError> {
        tracing::info!(ticker, "requesting company research");
        self.request(
            self.company,
            ActionRequest::new(CompanyFullResearch::NAME, json!({ "ticker": ticker })),
        )
        .await
    }

    pub async fn request_person_research(&self, person_name: &str) -> Result<Option<Value>, BusError> {
        tracing::info!(person_name, "requesting person research");
        self.request(
            self.person,
            ActionRequest::new(PersonFullResearch::NAME, json!({ "person_name": person_name })),
        )
        .await
    }

    /// Company research, then one `research_executive` request per executive
    /// (at most `max_executives`).
    pub async fn research_company_and_executives(
        &self,
        ticker: &str,
    ) -> Result<CompanyExecutivesReport, BusError> {
        tracing::info!(ticker, "starting company & executive research");
        let mut report = CompanyExecutivesReport {
            ticker: ticker.to_string(),
            company_data: None,
            executives_research: Vec::new(),
        };

        let Some(company_data) = self.request_company_research(ticker).await? else {
            return Ok(report);
        };
        let executives = executive_list(&company_data);
        report.company_data = Some(company_data);

        let Some(executives) = executives else {
            tracing::warn!(ticker, "no executives data available");
            return Ok(report);
        };
        tracing::info!(ticker, found = executives.len(), "researching executives");

        for executive in executives.into_iter().take(self.config.max_executives) {
            let Some(name) = executive.get("name").and_then(Value::as_str) else {
                tracing::warn!(?executive, "executive without a name skipped");
                continue;
            };
            let title = executive.get("title").and_then(Value::as_str).unwrap_or_default();
            let request = ActionRequest::new(
                ResearchExecutive::NAME,
                json!({ "name": name, "title": title }),
            );
            if let Some(research) = self.request(self.person, request).await? {
                report.executives_research.push(ExecutiveReport { executive, research });
            }
        }
        Ok(report)
    }

    /// Notification to the company and person agents.
    pub async fn notify_agents(&self, event: &str, data: Value) -> Result<(), BusError> {
        tracing::info!(event, "broadcasting notification");
        for receiver in [self.company, self.person] {
            let envelope = self.bus.stamper().stamp(E::build_notification(
                AgentRole::Coordinator,
                receiver,
                event,
                data.clone(),
            ));
            self.bus.send(envelope).await?;
        }
        Ok(())
    }
}

/// `executives.data.executives` when the executives lookup succeeded.
fn executive_list(company_data: &Value) -> Option<Vec<Value>> {
    let executives = company_data.get("executives")?;
    if executives.get("success").and_then(Value::as_bool) != Some(true) {
        return None;
    }
    let list = executives
        .get("data")
        .and_then(|data| data.get("executives"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    Some(list)
}
