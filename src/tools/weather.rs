//! Current weather lookup backed by Open-Meteo

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use crate::transport::{HttpTransport, Transport, TransportError, TransportRequest};

use super::{Tool, ToolError};

pub const GEOCODING_BASE_URL: &str = "https://geocoding-api.open-meteo.com";
pub const FORECAST_BASE_URL: &str = "https://api.open-meteo.com";

const CURRENT_FIELDS: &str =
    "temperature_2m,apparent_temperature,relative_humidity_2m,wind_speed_10m,wind_gusts_10m,weather_code";

/// Current conditions for a location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub wind_gust: f64,
    pub conditions: String,
    pub location: String,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    latitude: f64,
    longitude: f64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentWeather,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature_2m: f64,
    apparent_temperature: f64,
    relative_humidity_2m: f64,
    wind_speed_10m: f64,
    wind_gusts_10m: f64,
    weather_code: u16,
}

#[derive(Debug, Deserialize)]
struct WeatherInput {
    location: String,
}

/// Human readable label for a WMO weather code
pub fn weather_condition(code: u16) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Foggy",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

/// Tool that geocodes a location and fetches its current weather
#[derive(Debug, Clone)]
pub struct WeatherTool<T = HttpTransport> {
    geocoding: T,
    forecast: T,
}

impl WeatherTool<HttpTransport> {
    /// Tool backed by the public Open-Meteo endpoints
    pub fn public() -> Result<Self, TransportError> {
        Ok(Self::new(
            HttpTransport::new(Url::parse(GEOCODING_BASE_URL)?),
            HttpTransport::new(Url::parse(FORECAST_BASE_URL)?),
        ))
    }
}

impl<T: Transport> WeatherTool<T> {
    pub fn new(geocoding: T, forecast: T) -> Self {
        Self { geocoding, forecast }
    }

    /// Look up current weather for `location`
    pub async fn current(&self, location: &str) -> Result<WeatherReport, ToolError> {
        let request = TransportRequest::get("v1/search")
            .query("name", location)
            .query("count", "1");
        let response = self.geocoding.execute(request).await.map_err(execution)?;
        if !response.is_success() {
            return Err(ToolError::Execution(format!(
                "Geocoding request failed: {} {}",
                response.status,
                response.reason()
            )));
        }

        let geocoding: GeocodingResponse = serde_json::from_slice(&response.body)?;
        let place = geocoding
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ToolError::Execution(format!("Location '{}' not found", location)))?;
        debug!(location, latitude = place.latitude, longitude = place.longitude, "geocoded");

        let request = TransportRequest::get("v1/forecast")
            .query("latitude", place.latitude.to_string())
            .query("longitude", place.longitude.to_string())
            .query("current", CURRENT_FIELDS);
        let response = self.forecast.execute(request).await.map_err(execution)?;
        if !response.is_success() {
            return Err(ToolError::Execution(format!(
                "Forecast request failed: {} {}",
                response.status,
                response.reason()
            )));
        }

        let forecast: ForecastResponse = serde_json::from_slice(&response.body)?;
        let current = forecast.current;

        Ok(WeatherReport {
            temperature: current.temperature_2m,
            feels_like: current.apparent_temperature,
            humidity: current.relative_humidity_2m,
            wind_speed: current.wind_speed_10m,
            wind_gust: current.wind_gusts_10m,
            conditions: weather_condition(current.weather_code).to_string(),
            location: place.name,
        })
    }
}

fn execution(err: TransportError) -> ToolError {
    ToolError::Execution(err.to_string())
}

#[async_trait]
impl<T: Transport> Tool for WeatherTool<T> {
    fn id(&self) -> &str {
        "get-weather"
    }

    fn description(&self) -> &str {
        "Get current weather for a location"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "location": {"type": "string", "description": "City name"}
            },
            "required": ["location"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let input: WeatherInput =
            serde_json::from_value(input).map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        let report = self.current(&input.location).await?;
        Ok(serde_json::to_value(report)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    fn forecast_body() -> Value {
        json!({
            "current": {
                "time": "2025-06-01T12:00",
                "temperature_2m": 21.5,
                "apparent_temperature": 20.1,
                "relative_humidity_2m": 55.0,
                "wind_speed_10m": 12.3,
                "wind_gusts_10m": 25.0,
                "weather_code": 2
            }
        })
    }

    #[tokio::test]
    async fn test_current_weather() {
        let geocoding = MockTransport::json(
            200,
            json!({"results": [{"latitude": 52.52, "longitude": 13.41, "name": "Berlin"}]}),
        );
        let forecast = MockTransport::json(200, forecast_body());
        let tool = WeatherTool::new(geocoding.clone(), forecast.clone());

        let output = tool.execute(json!({"location": "berlin"})).await.unwrap();

        assert_eq!(output["location"], "Berlin");
        assert_eq!(output["conditions"], "Partly cloudy");
        assert_eq!(output["feelsLike"], 20.1);
        assert_eq!(output["windGust"], 25.0);

        assert_eq!(geocoding.requests()[0].query_param("name"), Some("berlin"));
        let sent = &forecast.requests()[0];
        assert_eq!(sent.endpoint, "v1/forecast");
        assert_eq!(sent.query_param("latitude"), Some("52.52"));
        assert_eq!(sent.query_param("current"), Some(CURRENT_FIELDS));
    }

    #[tokio::test]
    async fn test_unknown_location() {
        let geocoding = MockTransport::json(200, json!({}));
        let forecast = MockTransport::json(200, forecast_body());
        let tool = WeatherTool::new(geocoding, forecast.clone());

        let err = tool.execute(json!({"location": "Atlantis"})).await.unwrap_err();

        assert_eq!(err.to_string(), "Location 'Atlantis' not found");
        assert!(forecast.requests().is_empty());
    }

    #[test]
    fn test_weather_codes() {
        assert_eq!(weather_condition(0), "Clear sky");
        assert_eq!(weather_condition(57), "Dense freezing drizzle");
        assert_eq!(weather_condition(99), "Thunderstorm with heavy hail");
        assert_eq!(weather_condition(4), "Unknown");
    }
}
