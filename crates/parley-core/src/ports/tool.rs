//! Tool port - 外部データ取得コラボレータ
//!
//! Ticker lookups, person search, weather calls and similar I/O live outside
//! this crate. Agents reach them through [`Tool`] and only ever see a
//! [`ToolResult`]; a failing tool is ordinary data, never an `Err`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// `{success, data, error}` result convention shared by all tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    async fn invoke(&self, params: Value) -> ToolResult;
}

/// Name -> tool lookup handed to agents.
#[derive(Clone, Default)]
pub struct Toolbox {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl Toolbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, name: impl Into<String>, tool: Arc<dyn Tool>) -> Self {
        self.tools.insert(name.into(), tool);
        self
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Invoke `name`; a missing tool yields a failed result.
    pub async fn invoke(&self, name: &str, params: Value) -> ToolResult {
        match self.tools.get(name) {
            Some(tool) => tool.invoke(params).await,
            None => {
                tracing::warn!(tool = name, "tool not available");
                ToolResult::err(format!("tool not available: {name}"))
            }
        }
    }
}

/// Adapter so plain closures can stand in for tools (fixtures, demos).
pub struct FnTool<F> {
    f: F,
}

#[async_trait]
impl<F> Tool for FnTool<F>
where
    F: Fn(Value) -> ToolResult + Send + Sync,
{
    async fn invoke(&self, params: Value) -> ToolResult {
        (self.f)(params)
    }
}

pub fn tool_fn<F>(f: F) -> Arc<dyn Tool>
where
    F: Fn(Value) -> ToolResult + Send + Sync + 'static,
{
    Arc::new(FnTool { f })
}
