//! Weather lookup action.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::AgentRole;
use crate::ports::{ToolResult, Toolbox};
use crate::typed::{Action, ActionError, ActionHandler, ActionRegistry, RegistryError};

use super::ActionAgent;

pub const WEATHER_TOOL: &str = "get_weather";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetWeather {
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub city: String,
    pub weather: ToolResult,
}

impl Action for GetWeather {
    const NAME: &'static str = "get_weather";
    type Output = Weather;
}

pub struct WeatherTools {
    tools: Toolbox,
}

#[async_trait]
impl ActionHandler<GetWeather> for WeatherTools {
    async fn handle(&self, params: GetWeather) -> Result<Weather, ActionError> {
        if params.city.trim().is_empty() {
            return Err(ActionError::failed("No city name provided"));
        }
        let weather = self
            .tools
            .invoke(WEATHER_TOOL, json!({ "city": params.city }))
            .await;
        Ok(Weather {
            city: params.city,
            weather,
        })
    }
}

pub fn weather_agent(tools: Toolbox) -> Result<ActionAgent, RegistryError> {
    let actions = ActionRegistry::new().with::<GetWeather, _>(WeatherTools { tools })?;
    Ok(ActionAgent::new(AgentRole::WeatherAgent, actions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::fixtures::toolbox;
    use crate::app::AgentHandler;
    use crate::domain::{LegacyEnvelope, MessageType};
    use crate::typed::ActionEnvelope;

    fn ask(city: &str) -> LegacyEnvelope {
        LegacyEnvelope::request(
            AgentRole::Coordinator,
            AgentRole::WeatherAgent,
            "get_weather",
            json!({ "city": city }),
        )
    }

    #[tokio::test]
    async fn weather_for_city() {
        let agent = weather_agent(toolbox()).unwrap();
        let reply = agent.handle(ask("Paris")).await.unwrap().unwrap();
        let data = reply.response_data().unwrap();
        assert_eq!(data["city"], json!("Paris"));
        assert_eq!(data["weather"]["success"], json!(true));
    }

    #[tokio::test]
    async fn blank_city_is_an_error_reply() {
        let agent = weather_agent(toolbox()).unwrap();
        let reply = agent.handle(ask("  ")).await.unwrap().unwrap();
        assert_eq!(reply.message_type, MessageType::Error);
        assert_eq!(
            reply.error_text().as_deref(),
            Some("Error processing request: No city name provided")
        );
    }
}
