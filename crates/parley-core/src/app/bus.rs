//! MessageBus - エージェント間の同期ルーティング
//!
//! `send` は受信側ハンドラを呼び出し、その応答をそのまま呼び出し元へ返します。
//! キューもバックグラウンド処理もありません（呼び出しとリターンだけ）。
//!
//! # 不変条件
//! - 送信された envelope はハンドラ呼び出し前に履歴へ追加される
//! - 応答は送信の後に追加される（ネストした send の分はその間に入る）
//! - ロックはハンドラの await をまたいで保持しない（ハンドラからの再入 send が可能）

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::app::registry::{AgentHandler, AgentRegistry, Registration};
use crate::app::thread::{self, ThreadTree};
use crate::config::BusConfig;
use crate::domain::{AgentRole, Envelope, MessageId};
use crate::error::BusError;
use crate::observability::{self, BusStatistics};
use crate::ports::Stamper;

struct BusState<E: Envelope> {
    registry: AgentRegistry<E>,
    history: Vec<E>,
    seen: HashSet<MessageId>,
}

impl<E: Envelope> BusState<E> {
    fn record(&mut self, envelope: &E) {
        if !self.seen.insert(envelope.message_id().clone()) {
            tracing::warn!(message_id = %envelope.message_id(), "duplicate message id on bus");
        }
        if let Some(parent) = envelope.in_reply_to()
            && !self.seen.contains(parent)
        {
            tracing::warn!(
                message_id = %envelope.message_id(),
                in_reply_to = %parent,
                "reply target not in history"
            );
        }
        self.history.push(envelope.clone());
    }
}

/// Cloneable handle to one bus. Clones share registry and history.
pub struct MessageBus<E: Envelope> {
    state: Arc<Mutex<BusState<E>>>,
    config: BusConfig,
    stamper: Stamper,
}

impl<E: Envelope> Clone for MessageBus<E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            config: self.config.clone(),
            stamper: self.stamper.clone(),
        }
    }
}

impl<E: Envelope> Default for MessageBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Envelope> MessageBus<E> {
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    pub fn with_config(config: BusConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(BusState {
                registry: AgentRegistry::new(),
                history: Vec::new(),
                seen: HashSet::new(),
            })),
            config,
            stamper: Stamper::system(),
        }
    }

    /// Id / time source for registration audit entries and for envelopes
    /// built through [`MessageBus::stamper`].
    pub fn with_stamper(mut self, stamper: Stamper) -> Self {
        self.stamper = stamper;
        self
    }

    pub fn stamper(&self) -> &Stamper {
        &self.stamper
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Bind `handler` to `role`. Re-registration replaces (last wins) and
    /// returns the previous handler.
    pub async fn register(
        &self,
        role: AgentRole,
        handler: Arc<dyn AgentHandler<E>>,
    ) -> Option<Arc<dyn AgentHandler<E>>> {
        let at = self.stamper.now();
        self.state.lock().await.registry.register(role, handler, at)
    }

    /// Route `envelope` to its receiver and return the handler's response.
    ///
    /// - receiver 未登録: warn ログを出して `Ok(None)`（送信は履歴に残る）
    /// - ハンドラが `None`: warn ログを出して `Ok(None)`
    /// - ハンドラのエラー: 応答は記録せず `BusError::Handler` で返す
    pub async fn send(&self, envelope: E) -> Result<Option<E>, BusError> {
        self.log_envelope("send", &envelope);

        let receiver = envelope.receiver();
        let handler = {
            let mut state = self.state.lock().await;
            state.record(&envelope);
            state.registry.get(receiver)
        };

        let Some(handler) = handler else {
            tracing::warn!(receiver = %receiver, message_id = %envelope.message_id(), "no agent registered for receiver");
            return Ok(None);
        };

        let message_id = envelope.message_id().clone();
        match handler.handle(envelope).await {
            Ok(Some(response)) => {
                self.log_envelope("response", &response);
                self.state.lock().await.record(&response);
                Ok(Some(response))
            }
            Ok(None) => {
                tracing::warn!(receiver = %receiver, message_id = %message_id, "no response generated");
                Ok(None)
            }
            Err(source) => {
                tracing::error!(receiver = %receiver, message_id = %message_id, error = %source, "handler failed");
                Err(BusError::Handler {
                    role: receiver,
                    source,
                })
            }
        }
    }

    /// Snapshot of every routed envelope in insertion order.
    pub async fn history(&self) -> Vec<E> {
        self.state.lock().await.history.clone()
    }

    pub async fn registered_agents(&self) -> Vec<AgentRole> {
        self.state.lock().await.registry.roles()
    }

    pub async fn registrations(&self) -> Vec<Registration> {
        self.state.lock().await.registry.registrations().to_vec()
    }

    /// Linear reply chain starting at `message_id` (empty when unknown).
    pub async fn get_conversation(&self, message_id: &MessageId) -> Vec<E> {
        let state = self.state.lock().await;
        thread::conversation(&state.history, message_id)
    }

    /// Reply tree rooted at `message_id`, keeping every branch.
    pub async fn get_conversation_tree(&self, message_id: &MessageId) -> Option<ThreadTree<E>> {
        let state = self.state.lock().await;
        thread::conversation_tree(&state.history, message_id)
    }

    pub async fn format_conversation(&self, message_id: &MessageId) -> String {
        let conversation = self.get_conversation(message_id).await;
        observability::format_conversation(message_id, &conversation)
    }

    pub async fn statistics(&self) -> BusStatistics {
        let state = self.state.lock().await;
        BusStatistics::collect(&state.history, state.registry.roles())
    }

    fn log_envelope(&self, direction: &'static str, envelope: &E) {
        tracing::info!(
            direction,
            sender = %envelope.sender(),
            receiver = %envelope.receiver(),
            kind = envelope.kind(),
            message_id = %envelope.message_id().short(),
            "{} → {}",
            envelope.sender(),
            envelope.receiver()
        );
        if self.config.verbose {
            for line in envelope.summary_lines(self.config.preview_chars) {
                tracing::debug!(message_id = %envelope.message_id().short(), "  {line}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::registry::handler_fn;
    use crate::domain::{AgentMessage, LegacyEnvelope, LegacyPayload, Message, MessageType};
    use crate::error::HandlerError;
    use crate::typed::{ActionEnvelope, ActionRequest};
    use rstest::rstest;
    use serde_json::json;

    async fn answer_stock(env: LegacyEnvelope) -> Result<Option<LegacyEnvelope>, HandlerError> {
        let LegacyPayload::Request { params, .. } = env.payload()? else {
            return Ok(None);
        };
        Ok(Some(LegacyEnvelope::response(
            env.receiver,
            env.sender,
            json!({"ticker": params.get("ticker"), "price": 189.5}),
            env.message_id.clone(),
        )))
    }

    fn stock_agent() -> Arc<dyn AgentHandler<LegacyEnvelope>> {
        handler_fn(answer_stock)
    }

    // person agent asks the company agent before answering
    async fn ask_company_first(
        bus: MessageBus<LegacyEnvelope>,
        env: LegacyEnvelope,
    ) -> Result<Option<LegacyEnvelope>, HandlerError> {
        let nested = LegacyEnvelope::request(
            AgentRole::PersonAgent,
            AgentRole::CompanyAgent,
            "get_stock_price",
            json!({"ticker": "MSFT"}),
        );
        let price = bus.send(nested).await?;
        Ok(Some(LegacyEnvelope::response(
            env.receiver,
            env.sender,
            json!({"nested": price.map(|p| p.content)}),
            env.message_id.clone(),
        )))
    }

    fn stock_request() -> LegacyEnvelope {
        LegacyEnvelope::request(
            AgentRole::Coordinator,
            AgentRole::CompanyAgent,
            "get_stock_price",
            json!({"ticker": "AAPL"}),
        )
    }

    #[tokio::test]
    async fn request_response_is_recorded() {
        let bus = MessageBus::new();
        bus.register(AgentRole::CompanyAgent, stock_agent()).await;

        let request = stock_request();
        let response = bus.send(request.clone()).await.unwrap().unwrap();

        assert_eq!(response.message_type, MessageType::Response);
        assert_eq!(response.in_reply_to.as_ref(), Some(&request.message_id));

        let stats = bus.statistics().await;
        assert_eq!(stats.total_messages, 2);
        assert_eq!(stats.registered_agents, 1);
        assert_eq!(stats.by_kind["request"], 1);
        assert_eq!(stats.by_kind["response"], 1);

        let history = bus.history().await;
        assert_eq!(history[0].message_id, request.message_id);
        assert_eq!(history[1].message_id, response.message_id);
    }

    #[tokio::test]
    async fn unregistered_receiver_returns_none_but_is_recorded() {
        let bus = MessageBus::<LegacyEnvelope>::new();
        let out = bus.send(stock_request()).await.unwrap();

        assert!(out.is_none());
        assert_eq!(bus.history().await.len(), 1);
    }

    #[tokio::test]
    async fn silent_handler_records_only_the_send() {
        let bus = MessageBus::new();
        bus.register(
            AgentRole::CompanyAgent,
            handler_fn(|_env: LegacyEnvelope| async move { Ok::<_, HandlerError>(None) }),
        )
        .await;

        assert!(bus.send(stock_request()).await.unwrap().is_none());
        assert_eq!(bus.history().await.len(), 1);
    }

    #[tokio::test]
    async fn handler_failure_propagates() {
        let bus = MessageBus::new();
        bus.register(
            AgentRole::CompanyAgent,
            handler_fn(|_env: LegacyEnvelope| async move {
                Err::<Option<LegacyEnvelope>, HandlerError>("boom".into())
            }),
        )
        .await;

        let err = bus.send(stock_request()).await.unwrap_err();
        assert_eq!(err.failed_role(), Some(AgentRole::CompanyAgent));
        assert!(err.to_string().contains("boom"));
        assert_eq!(bus.history().await.len(), 1);
    }

    #[tokio::test]
    async fn nested_sends_interleave_in_history() {
        let bus = MessageBus::new();
        bus.register(AgentRole::CompanyAgent, stock_agent()).await;

        let inner_bus = bus.clone();
        bus.register(
            AgentRole::PersonAgent,
            handler_fn(move |env: LegacyEnvelope| ask_company_first(inner_bus.clone(), env)),
        )
        .await;

        let outer = LegacyEnvelope::request(
            AgentRole::Coordinator,
            AgentRole::PersonAgent,
            "get_person_info",
            json!({"name": "Tim Cook"}),
        );
        bus.send(outer.clone()).await.unwrap().unwrap();

        let history = bus.history().await;
        let kinds: Vec<(AgentRole, MessageType)> =
            history.iter().map(|m| (m.sender, m.message_type)).collect();
        assert_eq!(
            kinds,
            vec![
                (AgentRole::Coordinator, MessageType::Request),
                (AgentRole::PersonAgent, MessageType::Request),
                (AgentRole::CompanyAgent, MessageType::Response),
                (AgentRole::PersonAgent, MessageType::Response),
            ]
        );
        assert_eq!(history[3].in_reply_to.as_ref(), Some(&outer.message_id));
    }

    #[tokio::test]
    async fn re_registration_routes_to_latest_handler() {
        let bus = MessageBus::new();
        bus.register(
            AgentRole::CompanyAgent,
            handler_fn(|_env: LegacyEnvelope| async move { Ok::<_, HandlerError>(None) }),
        )
        .await;
        let previous = bus.register(AgentRole::CompanyAgent, stock_agent()).await;

        assert!(previous.is_some());
        assert!(bus.send(stock_request()).await.unwrap().is_some());
        assert_eq!(bus.registered_agents().await, vec![AgentRole::CompanyAgent]);
        let replaced: Vec<bool> = bus.registrations().await.iter().map(|r| r.replaced).collect();
        assert_eq!(replaced, vec![false, true]);
    }

    #[tokio::test]
    async fn conversation_follows_request_and_response() {
        let bus = MessageBus::new();
        bus.register(AgentRole::CompanyAgent, stock_agent()).await;
        let request = stock_request();
        bus.send(request.clone()).await.unwrap();

        let conversation = bus.get_conversation(&request.message_id).await;
        assert_eq!(conversation.len(), 2);
        assert!(bus.get_conversation(&MessageId::new("missing")).await.is_empty());

        let dump = bus.format_conversation(&request.message_id).await;
        assert!(dump.contains("[2] company_agent → coordinator"));
    }

    #[tokio::test]
    async fn standard_envelopes_use_the_same_bus() {
        let bus = MessageBus::new();
        bus.register(
            AgentRole::StandardCompanyAgent,
            handler_fn(|env: AgentMessage| async move {
                Ok::<_, HandlerError>(Some(AgentMessage::reply(
                    env.receiver,
                    env.sender,
                    Message::response(json!({"ok": true})),
                    env.message_id.clone(),
                )))
            }),
        )
        .await;

        let request = AgentMessage::new(
            AgentRole::Coordinator,
            AgentRole::StandardCompanyAgent,
            Message::request("get_company_info", json!({"ticker": "AAPL"})),
        );
        bus.send(request).await.unwrap().unwrap();

        let stats = bus.statistics().await;
        assert_eq!(stats.by_kind["user"], 1);
        assert_eq!(stats.by_kind["agent"], 1);
    }

    async fn answer<E: ActionEnvelope>(env: E) -> Result<Option<E>, HandlerError> {
        Ok(env
            .action_request()?
            .map(|_| env.build_response(json!({"price": 189.5}))))
    }

    async fn relay<E: ActionEnvelope>(bus: MessageBus<E>, env: E) -> Result<Option<E>, HandlerError> {
        let nested = E::build_request(
            AgentRole::PersonAgent,
            AgentRole::CompanyAgent,
            &ActionRequest::new("get_stock_price", json!({"ticker": "MSFT"})),
        );
        let price = bus.send(nested).await?;
        Ok(Some(env.build_response(json!({"nested": price.is_some()}))))
    }

    /// answered request, nested request, routing miss, silent notification
    async fn mixed_traffic<E: ActionEnvelope>() -> Vec<E> {
        let bus = MessageBus::<E>::new();
        bus.register(AgentRole::CompanyAgent, handler_fn(answer::<E>)).await;
        let inner = bus.clone();
        bus.register(
            AgentRole::PersonAgent,
            handler_fn(move |env: E| relay(inner.clone(), env)),
        )
        .await;

        let ask = |to| {
            E::build_request(
                AgentRole::Coordinator,
                to,
                &ActionRequest::new("get_stock_price", json!({"ticker": "AAPL"})),
            )
        };
        bus.send(ask(AgentRole::CompanyAgent)).await.unwrap();
        bus.send(ask(AgentRole::PersonAgent)).await.unwrap();
        bus.send(ask(AgentRole::WeatherAgent)).await.unwrap();
        bus.send(E::build_notification(
            AgentRole::Coordinator,
            AgentRole::CompanyAgent,
            "market_open",
            json!({}),
        ))
        .await
        .unwrap();
        bus.history().await
    }

    /// (sender, receiver, history position of the reply target)
    fn routes<E: Envelope>(history: &[E]) -> Vec<(AgentRole, AgentRole, Option<usize>)> {
        history
            .iter()
            .map(|m| {
                let target = m
                    .in_reply_to()
                    .and_then(|parent| history.iter().position(|h| h.message_id() == parent));
                (m.sender(), m.receiver(), target)
            })
            .collect()
    }

    #[derive(Debug, Clone, Copy)]
    enum Shape {
        Legacy,
        Standard,
    }

    #[rstest]
    #[case::legacy(Shape::Legacy)]
    #[case::standard(Shape::Standard)]
    #[tokio::test]
    async fn history_keeps_send_order_across_mixed_traffic(#[case] shape: Shape) {
        use AgentRole::{CompanyAgent, Coordinator, PersonAgent, WeatherAgent};

        let got = match shape {
            Shape::Legacy => routes(&mixed_traffic::<LegacyEnvelope>().await),
            Shape::Standard => routes(&mixed_traffic::<AgentMessage>().await),
        };
        assert_eq!(
            got,
            vec![
                (Coordinator, CompanyAgent, None),
                (CompanyAgent, Coordinator, Some(0)),
                (Coordinator, PersonAgent, None),
                (PersonAgent, CompanyAgent, None),
                (CompanyAgent, PersonAgent, Some(3)),
                (PersonAgent, Coordinator, Some(2)),
                (Coordinator, WeatherAgent, None),
                (Coordinator, CompanyAgent, None),
            ]
        );
    }

    #[tokio::test]
    async fn stamper_drives_registration_time() {
        use chrono::{TimeZone, Utc};

        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let bus = MessageBus::<LegacyEnvelope>::new().with_stamper(Stamper::fixed(at));
        bus.register(AgentRole::CompanyAgent, stock_agent()).await;

        assert_eq!(bus.registrations().await[0].at, at);
        let stamped = bus.stamper().stamp(stock_request());
        assert_eq!(stamped.timestamp, at);
    }
}
