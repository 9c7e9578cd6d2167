//! Canned tools shared by agent tests.

use serde_json::{Value, json};

use crate::ports::{ToolResult, Toolbox, tool_fn};

fn ticker(params: &Value) -> String {
    params["ticker"].as_str().unwrap_or_default().to_string()
}

fn person(params: &Value) -> String {
    params["person_name"].as_str().unwrap_or_default().to_string()
}

pub fn executives() -> Value {
    json!([
        {"name": "Tim Cook", "title": "CEO"},
        {"name": "Luca Maestri", "title": "CFO"},
        {"name": "Jeff Williams", "title": "COO"},
    ])
}

pub fn toolbox() -> Toolbox {
    Toolbox::new()
        .with_tool(
            "get_company_info",
            tool_fn(|p| ToolResult::ok(json!({"ticker": ticker(&p), "name": "Apple Inc."}))),
        )
        .with_tool(
            "get_stock_price",
            tool_fn(|p| ToolResult::ok(json!({"ticker": ticker(&p), "price": 189.5}))),
        )
        .with_tool(
            "get_company_executives",
            tool_fn(|p| ToolResult::ok(json!({"ticker": ticker(&p), "executives": executives()}))),
        )
        .with_tool(
            "get_person_info",
            tool_fn(|p| ToolResult::ok(json!({"name": person(&p)}))),
        )
        .with_tool(
            "get_person_career_info",
            tool_fn(|p| ToolResult::ok(json!({"name": person(&p), "roles": []}))),
        )
        .with_tool(
            "search_person_news",
            tool_fn(|p| ToolResult::ok(json!({"name": person(&p), "articles": []}))),
        )
        .with_tool(
            "get_person_social_media",
            tool_fn(|p| ToolResult::ok(json!({"name": person(&p), "profiles": []}))),
        )
        .with_tool(
            "get_weather",
            tool_fn(|p| ToolResult::ok(json!({"city": p["city"], "temp_c": 18}))),
        )
}
