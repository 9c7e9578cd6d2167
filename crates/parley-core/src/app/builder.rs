//! BusBuilder - バスの構築とワイヤリング
//!
//! 起動時検証（Fail-fast）: `expect_agents()` で指定したロールが
//! `build()` 時点ですべて登録されていなければ `BusError::MissingAgents` を返す。

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::app::bus::MessageBus;
use crate::app::registry::AgentHandler;
use crate::config::BusConfig;
use crate::domain::{AgentRole, Envelope};
use crate::error::BusError;
use crate::ports::Stamper;

/// # 使用例
/// ```ignore
/// let bus = BusBuilder::new()
///     .register(AgentRole::CompanyAgent, company)
///     .expect_agents(&[AgentRole::CompanyAgent])
///     .build()
///     .await?;
/// ```
pub struct BusBuilder<E: Envelope> {
    handlers: Vec<(AgentRole, Arc<dyn AgentHandler<E>>)>,
    expected_agents: Option<Vec<AgentRole>>,
    config: BusConfig,
    stamper: Option<Stamper>,
}

impl<E: Envelope> BusBuilder<E> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            expected_agents: None,
            config: BusConfig::default(),
            stamper: None,
        }
    }

    /// Handler を登録（同じロールは後勝ち）
    pub fn register(mut self, role: AgentRole, handler: Arc<dyn AgentHandler<E>>) -> Self {
        self.handlers.push((role, handler));
        self
    }

    /// 期待されるロールのリストを設定
    pub fn expect_agents(mut self, roles: &[AgentRole]) -> Self {
        self.expected_agents = Some(roles.to_vec());
        self
    }

    pub fn with_config(mut self, config: BusConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_stamper(mut self, stamper: Stamper) -> Self {
        self.stamper = Some(stamper);
        self
    }

    /// Validate expectations, then wire every handler into a fresh bus.
    pub async fn build(self) -> Result<MessageBus<E>, BusError> {
        if let Some(expected) = &self.expected_agents {
            let missing: BTreeSet<AgentRole> = expected
                .iter()
                .filter(|role| !self.handlers.iter().any(|(r, _)| r == *role))
                .copied()
                .collect();
            if !missing.is_empty() {
                return Err(BusError::MissingAgents(missing.into_iter().collect()));
            }
        }

        let mut bus = MessageBus::with_config(self.config);
        if let Some(stamper) = self.stamper {
            bus = bus.with_stamper(stamper);
        }
        for (role, handler) in self.handlers {
            bus.register(role, handler).await;
        }
        Ok(bus)
    }
}

impl<E: Envelope> Default for BusBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}
