//! ActionHandler - アクションを実行する Handler の定義
//!
//! - 表層: `ActionHandler<A>`（params は型付き）
//! - 内部: `DynActionHandler`（object-safe, JSON in / JSON out）
//! - `TypedActionHandler<A, H>` が両者をつなぐ

use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::Value;

use super::action::Action;

/// Failure of a dispatched action. Rendered into error envelopes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("invalid params for {action}: {reason}")]
    InvalidParams { action: String, reason: String },

    #[error("{0}")]
    Failed(String),
}

impl ActionError {
    pub fn failed(reason: impl Into<String>) -> Self {
        ActionError::Failed(reason.into())
    }
}

/// `Handler<GetStockPrice>` は `GetStockPrice` しか受け取れない
#[async_trait]
pub trait ActionHandler<A: Action>: Send + Sync {
    async fn handle(&self, params: A) -> Result<A::Output, ActionError>;
}

/// object-safe な Handler の抽象化
#[async_trait]
pub trait DynActionHandler: Send + Sync {
    async fn handle_dyn(&self, params: Value) -> Result<Value, ActionError>;
    fn action_name(&self) -> &'static str;
}

pub struct TypedActionHandler<A: Action, H: ActionHandler<A>> {
    handler: H,
    _marker: PhantomData<A>,
}

impl<A: Action, H: ActionHandler<A>> TypedActionHandler<A, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<A: Action, H: ActionHandler<A>> DynActionHandler for TypedActionHandler<A, H> {
    async fn handle_dyn(&self, params: Value) -> Result<Value, ActionError> {
        let params: A = serde_json::from_value(params).map_err(|e| ActionError::InvalidParams {
            action: A::NAME.to_string(),
            reason: e.to_string(),
        })?;
        let output = self.handler.handle(params).await?;
        serde_json::to_value(output).map_err(|e| ActionError::failed(format!("json encode: {e}")))
    }

    fn action_name(&self) -> &'static str {
        A::NAME
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{Double, DoubleHandler};
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_typed_handler() {
        let handler = TypedActionHandler::<Double, _>::new(DoubleHandler);
        assert_eq!(handler.action_name(), "double");
        assert_eq!(handler.handle_dyn(json!({"value": 21})).await.unwrap(), json!(42));
    }

    #[tokio::test]
    async fn bad_params_are_invalid_params() {
        let handler = TypedActionHandler::<Double, _>::new(DoubleHandler);
        let err = handler.handle_dyn(json!({"value": "x"})).await.unwrap_err();
        assert!(matches!(err, ActionError::InvalidParams { ref action, .. } if action == "double"));
    }

    #[tokio::test]
    async fn handler_failure_passes_through() {
        let handler = TypedActionHandler::<Double, _>::new(DoubleHandler);
        let err = handler.handle_dyn(json!({"value": i64::MAX})).await.unwrap_err();
        assert_eq!(err, ActionError::Failed("overflow".into()));
    }
}
