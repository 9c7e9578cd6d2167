//! Company research actions (ticker keyed).
//!
//! Every output wraps the raw `ToolResult` under a fixed key so callers can
//! inspect `success` / `error` themselves.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::AgentRole;
use crate::ports::{ToolResult, Toolbox};
use crate::typed::{Action, ActionError, ActionHandler, ActionRegistry, RegistryError};

use super::ActionAgent;

pub const COMPANY_INFO_TOOL: &str = "get_company_info";
pub const STOCK_PRICE_TOOL: &str = "get_stock_price";
pub const EXECUTIVES_TOOL: &str = "get_company_executives";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCompanyInfo {
    pub ticker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetStockPrice {
    pub ticker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetExecutives {
    pub ticker: String,
}

/// `full_research` on the company agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyFullResearch {
    pub ticker: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub company_info: ToolResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPrice {
    pub stock_price: ToolResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Executives {
    pub executives: ToolResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyResearch {
    pub ticker: String,
    pub company_info: ToolResult,
    pub stock_price: ToolResult,
    pub executives: ToolResult,
}

impl Action for GetCompanyInfo {
    const NAME: &'static str = "get_company_info";
    type Output = CompanyInfo;
}

impl Action for GetStockPrice {
    const NAME: &'static str = "get_stock_price";
    type Output = StockPrice;
}

impl Action for GetExecutives {
    const NAME: &'static str = "get_executives";
    type Output = Executives;
}

impl Action for CompanyFullResearch {
    const NAME: &'static str = "full_research";
    type Output = CompanyResearch;
}

#[derive(Clone)]
pub struct CompanyTools {
    tools: Toolbox,
}

impl CompanyTools {
    pub fn new(tools: Toolbox) -> Self {
        Self { tools }
    }

    async fn lookup(&self, tool: &str, ticker: &str) -> ToolResult {
        tracing::debug!(tool, ticker, "company lookup");
        self.tools.invoke(tool, json!({ "ticker": ticker })).await
    }
}

#[async_trait]
impl ActionHandler<GetCompanyInfo> for CompanyTools {
    async fn handle(&self, params: GetCompanyInfo) -> Result<CompanyInfo, ActionError> {
        Ok(CompanyInfo {
            company_info: self.lookup(COMPANY_INFO_TOOL, &params.ticker).await,
        })
    }
}

#[async_trait]
impl ActionHandler<GetStockPrice> for CompanyTools {
    async fn handle(&self, params: GetStockPrice) -> Result<StockPrice, ActionError> {
        Ok(StockPrice {
            stock_price: self.lookup(STOCK_PRICE_TOOL, &params.ticker).await,
        })
    }
}

#[async_trait]
impl ActionHandler<GetExecutives> for CompanyTools {
    async fn handle(&self, params: GetExecutives) -> Result<Executives, ActionError> {
        Ok(Executives {
            executives: self.lookup(EXECUTIVES_TOOL, &params.ticker).await,
        })
    }
}

#[async_trait]
impl ActionHandler<CompanyFullResearch> for CompanyTools {
    async fn handle(&self, params: CompanyFullResearch) -> Result<CompanyResearch, ActionError> {
        tracing::info!(ticker = %params.ticker, "full company research");
        let company_info = self.lookup(COMPANY_INFO_TOOL, &params.ticker).await;
        let stock_price = self.lookup(STOCK_PRICE_TOOL, &params.ticker).await;
        let executives = self.lookup(EXECUTIVES_TOOL, &params.ticker).await;
        Ok(CompanyResearch {
            ticker: params.ticker,
            company_info,
            stock_price,
            executives,
        })
    }
}

pub fn company_actions(tools: Toolbox) -> Result<ActionRegistry, RegistryError> {
    let handler = CompanyTools::new(tools);
    ActionRegistry::new()
        .with::<GetCompanyInfo, _>(handler.clone())?
        .with::<GetStockPrice, _>(handler.clone())?
        .with::<GetExecutives, _>(handler.clone())?
        .with::<CompanyFullResearch, _>(handler)
}

/// Company agent bound to `role` (`company_agent` or `standard_company_agent`).
pub fn company_agent(role: AgentRole, tools: Toolbox) -> Result<ActionAgent, RegistryError> {
    Ok(ActionAgent::new(role, company_actions(tools)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::fixtures::toolbox;
    use crate::typed::ActionRequest;
    use rstest::rstest;
    use serde_json::Value;

    #[rstest]
    #[case::info("get_company_info", "company_info")]
    #[case::price("get_stock_price", "stock_price")]
    #[case::executives("get_executives", "executives")]
    #[tokio::test]
    async fn single_lookups_wrap_tool_result(#[case] action: &str, #[case] key: &str) {
        let actions = company_actions(toolbox()).unwrap();
        let out = actions
            .dispatch(ActionRequest::new(action, json!({"ticker": "AAPL"})))
            .await
            .unwrap();
        assert_eq!(out[key]["success"], Value::Bool(true));
    }

    #[tokio::test]
    async fn full_research_bundles_everything() {
        let actions = company_actions(toolbox()).unwrap();
        let out = actions
            .dispatch(ActionRequest::new("full_research", json!({"ticker": "AAPL"})))
            .await
            .unwrap();
        let research: CompanyResearch = serde_json::from_value(out).unwrap();
        assert_eq!(research.ticker, "AAPL");
        assert!(research.company_info.success);
        assert_eq!(research.stock_price.data.unwrap()["price"], json!(189.5));
        assert!(research.executives.success);
    }

    #[tokio::test]
    async fn missing_tool_is_data_not_error() {
        let actions = company_actions(Toolbox::new()).unwrap();
        let out = actions
            .dispatch(ActionRequest::new("get_stock_price", json!({"ticker": "AAPL"})))
            .await
            .unwrap();
        assert_eq!(out["stock_price"]["success"], json!(false));
        assert_eq!(out["stock_price"]["error"], json!("tool not available: get_stock_price"));
    }

    #[tokio::test]
    async fn missing_ticker_is_invalid_params() {
        let actions = company_actions(toolbox()).unwrap();
        let err = actions
            .dispatch(ActionRequest::new("get_stock_price", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidParams { .. }));
    }

    #[rstest]
    #[case::no_ticker(json!({}))]
    #[case::null_ticker(json!({"ticker": null}))]
    #[case::numeric_ticker(json!({"ticker": 42}))]
    #[tokio::test]
    async fn agent_answers_bad_ticker_with_error_envelope(#[case] params: Value) {
        use crate::app::AgentHandler;
        use crate::domain::{LegacyEnvelope, MessageType};
        use crate::typed::ActionEnvelope;

        let agent = company_agent(AgentRole::CompanyAgent, toolbox()).unwrap();
        let request = LegacyEnvelope::request(
            AgentRole::Coordinator,
            AgentRole::CompanyAgent,
            "get_stock_price",
            params,
        );
        let reply = agent.handle(request).await.unwrap().unwrap();

        assert_eq!(reply.message_type, MessageType::Error);
        let text = reply.error_text().unwrap();
        assert!(
            text.starts_with("Error processing request: invalid params for get_stock_price"),
            "{text}"
        );
    }
}
