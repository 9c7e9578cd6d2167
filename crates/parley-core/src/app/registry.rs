use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{AgentRole, Envelope};
use crate::error::HandlerError;

/// A handler bound to one agent role.
///
/// Returns the response envelope, or `None` when the agent has nothing to say.
/// Handlers may call back into the bus (nested sends).
#[async_trait]
pub trait AgentHandler<E: Envelope>: Send + Sync {
    async fn handle(&self, envelope: E) -> Result<Option<E>, HandlerError>;
}

/// Adapter so closures can be registered directly.
pub struct FnHandler<E, F> {
    f: F,
    _marker: PhantomData<fn(E)>,
}

#[async_trait]
impl<E, F, Fut> AgentHandler<E> for FnHandler<E, F>
where
    E: Envelope,
    F: Fn(E) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<E>, HandlerError>> + Send,
{
    async fn handle(&self, envelope: E) -> Result<Option<E>, HandlerError> {
        (self.f)(envelope).await
    }
}

/// Wrap a closure as a shareable handler.
pub fn handler_fn<E, F, Fut>(f: F) -> Arc<dyn AgentHandler<E>>
where
    E: Envelope,
    F: Fn(E) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<E>, HandlerError>> + Send + 'static,
{
    Arc::new(FnHandler {
        f,
        _marker: PhantomData,
    })
}

/// Audit entry written on every registration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    pub role: AgentRole,
    /// A previous handler for this role was swapped out.
    pub replaced: bool,
    pub at: DateTime<Utc>,
}

/// Registry of handlers (role -> handler).
///
/// Re-registering a role swaps the handler ("last wins"); the swap is
/// returned to the caller, logged and recorded in the audit trail.
pub struct AgentRegistry<E: Envelope> {
    handlers: HashMap<AgentRole, Arc<dyn AgentHandler<E>>>,
    registrations: Vec<Registration>,
}

impl<E: Envelope> Default for AgentRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Envelope> AgentRegistry<E> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            registrations: Vec::new(),
        }
    }

    pub fn register(
        &mut self,
        role: AgentRole,
        handler: Arc<dyn AgentHandler<E>>,
        at: DateTime<Utc>,
    ) -> Option<Arc<dyn AgentHandler<E>>> {
        let previous = self.handlers.insert(role, handler);
        let replaced = previous.is_some();
        if replaced {
            tracing::warn!(role = %role, "agent handler replaced");
        } else {
            tracing::info!(role = %role, "agent registered");
        }
        self.registrations.push(Registration { role, replaced, at });
        previous
    }

    pub fn get(&self, role: AgentRole) -> Option<Arc<dyn AgentHandler<E>>> {
        self.handlers.get(&role).cloned()
    }

    pub fn contains(&self, role: AgentRole) -> bool {
        self.handlers.contains_key(&role)
    }

    /// Registered roles in a stable order.
    pub fn roles(&self) -> Vec<AgentRole> {
        let mut roles: Vec<AgentRole> = self.handlers.keys().copied().collect();
        roles.sort();
        roles
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LegacyEnvelope;
    use serde_json::json;

    struct Silent;

    #[async_trait]
    impl AgentHandler<LegacyEnvelope> for Silent {
        async fn handle(&self, _envelope: LegacyEnvelope) -> Result<Option<LegacyEnvelope>, HandlerError> {
            Ok(None)
        }
    }

    #[test]
    fn register_then_get() {
        let mut reg = AgentRegistry::<LegacyEnvelope>::new();
        let previous = reg.register(AgentRole::CompanyAgent, Arc::new(Silent), Utc::now());

        assert!(previous.is_none());
        assert!(reg.get(AgentRole::CompanyAgent).is_some());
        assert!(reg.get(AgentRole::PersonAgent).is_none());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn re_registration_overwrites_and_is_audited() {
        let mut reg = AgentRegistry::<LegacyEnvelope>::new();
        reg.register(AgentRole::CompanyAgent, Arc::new(Silent), Utc::now());
        let previous = reg.register(AgentRole::CompanyAgent, Arc::new(Silent), Utc::now());

        assert!(previous.is_some());
        assert_eq!(reg.len(), 1);
        let audit: Vec<bool> = reg.registrations().iter().map(|r| r.replaced).collect();
        assert_eq!(audit, vec![false, true]);
    }

    #[test]
    fn roles_are_sorted() {
        let mut reg = AgentRegistry::<LegacyEnvelope>::new();
        reg.register(AgentRole::PersonAgent, Arc::new(Silent), Utc::now());
        reg.register(AgentRole::Coordinator, Arc::new(Silent), Utc::now());
        assert_eq!(reg.roles(), vec![AgentRole::Coordinator, AgentRole::PersonAgent]);
    }

    #[tokio::test]
    async fn closures_can_be_handlers() {
        let handler = handler_fn(|env: LegacyEnvelope| async move {
            Ok::<_, HandlerError>(Some(LegacyEnvelope::response(
                env.receiver,
                env.sender,
                json!({"echo": env.content}),
                env.message_id.clone(),
            )))
        });
        let request = LegacyEnvelope::request(
            AgentRole::Coordinator,
            AgentRole::WeatherAgent,
            "get_weather",
            json!({"city": "Paris"}),
        );

        let response = handler.handle(request.clone()).await.unwrap().unwrap();
        assert_eq!(response.in_reply_to, Some(request.message_id));
    }
}
