use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};

use parley_core::agents::{Coordinator, company_agent, person_agent, weather_agent};
use parley_core::domain::{AgentMessage, AgentRole, LegacyEnvelope, Message, MessageRole, TaskState, message_with_context};
use parley_core::ports::{Stamper, ToolResult, Toolbox, tool_fn};
use parley_core::typed::{ActionEnvelope, ActionRequest};
use parley_core::{BusBuilder, ParleyConfig, TaskManager};

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "parley - in-process agent-to-agent messaging demos")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON config file (defaults apply when omitted)
    #[arg(short = 'C', long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Coordinator + company + person agents over legacy envelopes
    Legacy {
        #[arg(long, default_value = "AAPL")]
        ticker: String,
    },
    /// One stock price request over standard envelopes
    Standard {
        #[arg(long, default_value = "AAPL")]
        ticker: String,
    },
    /// City weather lookup through the weather agent
    Weather {
        #[arg(long, default_value = "Paris")]
        city: String,
    },
    /// Multi-turn task / session walkthrough
    Tasks,
}

/// Canned lookups so the demos run offline.
fn demo_tools() -> Toolbox {
    fn ticker(p: &Value) -> String {
        p["ticker"].as_str().unwrap_or("UNKNOWN").to_uppercase()
    }
    fn person(p: &Value) -> String {
        p["person_name"].as_str().unwrap_or_default().to_string()
    }

    Toolbox::new()
        .with_tool(
            "get_company_info",
            tool_fn(|p| {
                ToolResult::ok(json!({
                    "ticker": ticker(&p),
                    "name": format!("{} Corp.", ticker(&p)),
                    "sector": "Technology",
                }))
            }),
        )
        .with_tool(
            "get_stock_price",
            tool_fn(|p| ToolResult::ok(json!({"ticker": ticker(&p), "price": 189.5, "currency": "USD"}))),
        )
        .with_tool(
            "get_company_executives",
            tool_fn(|p| {
                ToolResult::ok(json!({
                    "ticker": ticker(&p),
                    "executives": [
                        {"name": "Ada Lovelace", "title": "CEO"},
                        {"name": "Grace Hopper", "title": "CTO"},
                        {"name": "Alan Turing", "title": "CFO"},
                    ],
                }))
            }),
        )
        .with_tool(
            "get_person_info",
            tool_fn(|p| ToolResult::ok(json!({"name": person(&p), "summary": "Executive profile"}))),
        )
        .with_tool(
            "get_person_career_info",
            tool_fn(|p| ToolResult::ok(json!({"name": person(&p), "positions": ["Founder"]}))),
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
            tool_fn(|p| {
                ToolResult::ok(json!({
                    "city": p["city"],
                    "current": {"condition": "Partly cloudy", "temperature": 18},
                    "forecast": [{"condition": "Light rain", "min_temp": 12, "max_temp": 19}],
                }))
            }),
        )
}

async fn run_legacy(config: &ParleyConfig, ticker: &str) -> Result<()> {
    let tools = demo_tools();
    let stamper = Stamper::system();
    let bus = BusBuilder::<LegacyEnvelope>::new()
        .with_config(config.bus.clone())
        .with_stamper(stamper.clone())
        .register(
            AgentRole::CompanyAgent,
            Arc::new(company_agent(AgentRole::CompanyAgent, tools.clone())?.with_stamper(stamper.clone())),
        )
        .register(
            AgentRole::PersonAgent,
            Arc::new(person_agent(AgentRole::PersonAgent, tools)?.with_stamper(stamper)),
        )
        .expect_agents(&[AgentRole::CompanyAgent, AgentRole::PersonAgent])
        .build()
        .await?;
    let coordinator = Coordinator::attach(bus.clone(), config.coordinator.clone()).await;

    let report = coordinator.research_company_and_executives(ticker).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    coordinator
        .notify_agents("research_complete", json!({"ticker": ticker}))
        .await?;

    if let Some(first) = bus.history().await.first() {
        println!("{}", bus.format_conversation(&first.message_id).await);
    }
    println!("{}", serde_json::to_string_pretty(&bus.statistics().await)?);
    Ok(())
}

async fn run_standard(config: &ParleyConfig, ticker: &str) -> Result<()> {
    let stamper = Stamper::system();
    let bus = BusBuilder::<AgentMessage>::new()
        .with_config(config.bus.clone())
        .with_stamper(stamper.clone())
        .register(
            AgentRole::StandardCompanyAgent,
            Arc::new(
                company_agent(AgentRole::StandardCompanyAgent, demo_tools())?.with_stamper(stamper.clone()),
            ),
        )
        .expect_agents(&[AgentRole::StandardCompanyAgent])
        .build()
        .await?;

    let request = stamper.stamp(AgentMessage::build_request(
        AgentRole::Coordinator,
        AgentRole::StandardCompanyAgent,
        &ActionRequest::new("get_stock_price", json!({ "ticker": ticker })),
    ));
    println!("{}", request.to_json());

    let response = bus
        .send(request.clone())
        .await?
        .context("standard company agent produced no response")?;
    println!("{}", response.to_json());

    println!("{}", bus.format_conversation(&request.message_id).await);
    println!("{}", serde_json::to_string_pretty(&bus.statistics().await)?);
    Ok(())
}

async fn run_weather(config: &ParleyConfig, city: &str) -> Result<()> {
    let stamper = Stamper::system();
    let bus = BusBuilder::<LegacyEnvelope>::new()
        .with_config(config.bus.clone())
        .with_stamper(stamper.clone())
        .register(
            AgentRole::WeatherAgent,
            Arc::new(weather_agent(demo_tools())?.with_stamper(stamper.clone())),
        )
        .expect_agents(&[AgentRole::WeatherAgent])
        .build()
        .await?;

    let request = stamper.stamp(LegacyEnvelope::build_request(
        AgentRole::Coordinator,
        AgentRole::WeatherAgent,
        &ActionRequest::new("get_weather", json!({ "city": city })),
    ));
    let reply = bus
        .send(request.clone())
        .await?
        .context("weather agent produced no response")?;

    if let Some(error) = reply.error_text() {
        anyhow::bail!("weather lookup failed: {error}");
    }
    let data = reply.response_data().context("weather reply carried no data")?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    println!("{}", weather_summary(city, &data["weather"]));

    println!("{}", bus.format_conversation(&request.message_id).await);
    println!("{}", serde_json::to_string_pretty(&bus.statistics().await)?);
    Ok(())
}

/// One-line report from a `get_weather` tool result.
fn weather_summary(city: &str, weather: &Value) -> String {
    if weather["success"] != json!(true) {
        let error = weather["error"].as_str().unwrap_or("unknown error");
        return format!("No weather for {city}: {error}");
    }
    let data = &weather["data"];
    let mut summary = format!(
        "Current weather in {city}: {}, {} degrees Celsius.",
        data["current"]["condition"].as_str().unwrap_or("unknown"),
        data["current"]["temperature"],
    );
    if let Some(next) = data["forecast"].get(0) {
        summary.push_str(&format!(
            " Tomorrow: {}, between {} and {} degrees.",
            next["condition"].as_str().unwrap_or("unknown"),
            next["min_temp"],
            next["max_temp"],
        ));
    }
    summary
}

fn run_tasks(config: &ParleyConfig) -> Result<()> {
    let window = config.tasks.context_messages;
    let mut manager = TaskManager::new();

    let first = manager.create_task(None, None);
    let (first_id, session_id) = (first.id.clone(), first.session_id.clone());
    first.add_message(Message::text(MessageRole::User, "What is the stock price of AAPL?"));
    first.transition(TaskState::Working, None)?;
    first.add_message(Message::text(MessageRole::Agent, "AAPL is trading at $189.50."));
    first.add_artifact(json!({"type": "stock_price", "ticker": "AAPL", "price": 189.5}));
    first.transition(
        TaskState::Completed,
        Some(Message::text(MessageRole::Agent, "Answered stock price question")),
    )?;
    println!("{}", first.summary());

    let follow_up = {
        let previous = manager
            .get_task(&first_id)
            .context("first task vanished")?;
        message_with_context(MessageRole::User, "And who is the CEO?", previous, true, window)
    };
    println!("{}", follow_up.to_json());

    let second = manager.create_task(Some(session_id.clone()), None);
    second.add_message(follow_up);
    second.transition(TaskState::Working, None)?;
    second.add_message(Message::text(MessageRole::Agent, "The CEO is Tim Cook."));
    second.transition(TaskState::Completed, None)?;
    println!("{}", second.summary());

    let context = manager.get_session_context(&session_id, Some(window));
    println!("session {session_id}: {} messages in context", context.len());
    for message in &context {
        println!("  [{}] {}", message.role, message.first_text().unwrap_or("<non-text>"));
    }

    println!("{}", serde_json::to_string_pretty(&manager.statistics())?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let config = match &cli.config {
        Some(path) => ParleyConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ParleyConfig::default(),
    };
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Legacy { ticker } => run_legacy(&config, &ticker).await,
        Commands::Standard { ticker } => run_standard(&config, &ticker).await,
        Commands::Weather { city } => run_weather(&config, &city).await,
        Commands::Tasks => run_tasks(&config),
    }
}
