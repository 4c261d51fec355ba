//! National Weather Service API access.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::client::ClientError;
use crate::http::{add_extra_headers, build_http_client, ResponseExt};
use crate::options::TransportOptions;

pub const NWS_API_BASE: &str = "https://api.weather.gov";
pub const USER_AGENT: &str = "weather-app/1.0";
const ACCEPT_GEO_JSON: &str = "application/geo+json";

/// Why a fetch produced no data.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("malformed body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("not a two-letter area code: {0:?}")]
    InvalidArea(String),
}

/// Where and how to reach the NWS API.
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub base_url: String,
    pub transport: TransportOptions,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: NWS_API_BASE.to_string(),
            transport: TransportOptions::new()
                .with_timeout(Duration::from_secs(30))
                .with_user_agent(USER_AGENT)
                .with_header("Accept", ACCEPT_GEO_JSON),
        }
    }
}

impl WeatherConfig {
    /// Defaults, with the base URL overridable through `NWS_API_BASE`.
    pub fn from_env() -> Self {
        match env::var("NWS_API_BASE") {
            Ok(base_url) if !base_url.is_empty() => Self::default().with_base_url(base_url),
            _ => Self::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct AlertCollection {
    pub features: Vec<AlertFeature>,
}

#[derive(Debug, Deserialize)]
pub struct AlertFeature {
    pub properties: AlertProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertProperties {
    pub event: Option<String>,
    pub area_desc: Option<String>,
    pub severity: Option<String>,
    pub description: Option<String>,
    pub instruction: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Point {
    pub properties: PointProperties,
}

#[derive(Debug, Deserialize)]
pub struct PointProperties {
    /// URL of the gridpoint forecast for this point.
    pub forecast: String,
}

#[derive(Debug, Deserialize)]
pub struct Forecast {
    pub properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
pub struct ForecastProperties {
    pub periods: Vec<ForecastPeriod>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForecastPeriod {
    pub name: String,
    pub temperature: Value,
    pub temperature_unit: String,
    pub wind_speed: String,
    pub wind_direction: String,
    pub detailed_forecast: String,
}

/// Thin GeoJSON client for the NWS endpoints the weather tools use.
#[derive(Debug, Clone)]
pub struct NwsClient {
    http: reqwest::Client,
    config: WeatherConfig,
}

impl NwsClient {
    pub fn new(config: WeatherConfig) -> Result<Self, ClientError> {
        let http = build_http_client(&config.transport)?;
        Ok(Self { http, config })
    }

    /// GET `url` and decode the body.
    pub async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        debug!("NWS request: {}", url);
        let request = add_extra_headers(self.http.get(url), &self.config.transport);
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text_logged().await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn active_alerts(&self, state: &str) -> Result<AlertCollection, FetchError> {
        if state.len() != 2 || !state.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(FetchError::InvalidArea(state.to_string()));
        }
        let url = format!("{}/alerts/active/area/{}", self.config.base_url, state);
        self.fetch(&url).await
    }

    pub async fn point(&self, latitude: f64, longitude: f64) -> Result<Point, FetchError> {
        let url = format!("{}/points/{},{}", self.config.base_url, latitude, longitude);
        self.fetch(&url).await
    }

    pub async fn forecast(&self, url: &str) -> Result<Forecast, FetchError> {
        self.fetch(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_config_targets_nws() {
        let config = WeatherConfig::default();
        assert_eq!(config.base_url, NWS_API_BASE);
        assert_eq!(config.transport.user_agent.as_deref(), Some(USER_AGENT));
        assert_eq!(config.transport.headers.get("Accept").map(String::as_str), Some(ACCEPT_GEO_JSON));
        assert_eq!(config.transport.timeout, Some(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn rejects_area_codes_that_are_not_two_letters() {
        let nws = NwsClient::new(WeatherConfig::default().with_base_url("http://127.0.0.1:9")).unwrap();

        for state in ["CA/../points/1,1", "C", "CAL", "C1", ""] {
            let err = nws.active_alerts(state).await.unwrap_err();
            assert!(matches!(err, FetchError::InvalidArea(ref s) if s == state), "{}", state);
        }
    }

    #[test]
    fn decodes_forecast_periods() {
        let forecast: Forecast = serde_json::from_value(json!({
            "properties": {
                "periods": [{
                    "name": "Tonight",
                    "temperature": 58,
                    "temperatureUnit": "F",
                    "windSpeed": "5 mph",
                    "windDirection": "SW",
                    "detailedForecast": "Clear."
                }]
            }
        }))
        .unwrap();

        let period = &forecast.properties.periods[0];
        assert_eq!(period.name, "Tonight");
        assert_eq!(period.temperature, json!(58));
        assert_eq!(period.wind_direction, "SW");
    }

    #[test]
    fn alert_collection_requires_features() {
        let result = serde_json::from_value::<AlertCollection>(json!({"type": "FeatureCollection"}));
        assert!(result.is_err());
    }
}
