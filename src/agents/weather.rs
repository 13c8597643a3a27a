//! Weather assistant

use std::sync::Arc;

use crate::{
    agent::Agent,
    model::LanguageModel,
    scorer::weather::weather_scorers,
    tools::{ToolSet, WeatherTool},
    transport::Transport,
};

use super::WEATHER_AGENT_ID;

pub const WEATHER_AGENT_NAME: &str = "Weather Agent";
pub const WEATHER_AGENT_MODEL: &str = "openai/gpt-4o-mini";

pub const WEATHER_INSTRUCTIONS: &str = "\
You are a helpful weather assistant that provides accurate weather information and can help planning activities based on the weather.

Your primary function is to help users get weather details for specific locations. When responding:
- Always ask for a location if none is provided
- If the location name isn't in English, please translate it
- If giving a location with multiple parts (e.g. \"New York, NY\"), use the most relevant part (e.g. \"New York\")
- Include relevant details like humidity, wind conditions, and precipitation
- Keep responses concise but informative
- If the user asks for activities and provides the weather forecast, suggest activities based on the weather forecast.
- If the user asks for activities, respond in the format they request.

Use the weatherTool to fetch current weather data.";

/// The weather agent with its tool and scorers attached
pub fn weather_agent<T: Transport>(
    model: Arc<dyn LanguageModel>,
    judge: Arc<dyn LanguageModel>,
    tool: WeatherTool<T>,
) -> Agent {
    Agent::new(WEATHER_AGENT_ID, WEATHER_AGENT_NAME, WEATHER_INSTRUCTIONS, model)
        .with_tools(ToolSet::new().with_tool("weatherTool", Arc::new(tool)))
        .with_scorers(weather_scorers(judge))
}
