//! ActionRegistry - アクション名 → Handler の登録と管理
//!
//! 型消去された `DynActionHandler` を HashMap で保持します。
//! 同じアクション名の二重登録はエラー。

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::action::Action;
use super::codec::ActionRequest;
use super::handler::{ActionError, ActionHandler, DynActionHandler, TypedActionHandler};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Handler for action '{0}' is already registered")]
    AlreadyRegistered(String),
}

#[derive(Clone, Default)]
pub struct ActionRegistry {
    handlers: HashMap<&'static str, Arc<dyn DynActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<A: Action, H: ActionHandler<A> + 'static>(
        &mut self,
        handler: H,
    ) -> Result<(), RegistryError> {
        if self.handlers.contains_key(A::NAME) {
            return Err(RegistryError::AlreadyRegistered(A::NAME.to_string()));
        }
        self.handlers
            .insert(A::NAME, Arc::new(TypedActionHandler::<A, H>::new(handler)));
        Ok(())
    }

    /// Builder-style `register`.
    pub fn with<A: Action, H: ActionHandler<A> + 'static>(
        mut self,
        handler: H,
    ) -> Result<Self, RegistryError> {
        self.register::<A, H>(handler)?;
        Ok(self)
    }

    pub fn get(&self, action: &str) -> Option<Arc<dyn DynActionHandler>> {
        self.handlers.get(action).cloned()
    }

    /// Registered action names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub async fn dispatch(&self, request: ActionRequest) -> Result<Value, ActionError> {
        let handler = self
            .get(&request.action)
            .ok_or_else(|| ActionError::UnknownAction(request.action.clone()))?;
        handler.handle_dyn(request.params).await
    }
}
