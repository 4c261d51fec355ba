//! MCP server exposing NWS weather alerts and forecasts as tools.

pub mod nws;

use itertools::Itertools;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{Implementation, ServerCapabilities, ServerInfo};
use rmcp::{schemars, tool, tool_handler, tool_router, ServerHandler};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::client::ClientError;
pub use nws::{FetchError, NwsClient, WeatherConfig};
use nws::{AlertCollection, AlertProperties, Forecast, ForecastPeriod};

pub const ALERTS_UNAVAILABLE: &str = "Unable to fetch alerts or no alerts found.";
pub const NO_ACTIVE_ALERTS: &str = "No active alerts for this state.";
pub const POINT_UNAVAILABLE: &str = "Unable to fetch forecast data for this location.";
pub const FORECAST_UNAVAILABLE: &str = "Unable to fetch detailed forecast.";

/// Number of forecast periods included in a report.
const FORECAST_PERIODS: usize = 5;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AlertsArgs {
    #[schemars(description = "Two-letter US state code (e.g. CA, NY)")]
    pub state: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ForecastArgs {
    #[schemars(description = "Latitude of the location")]
    pub latitude: f64,
    #[schemars(description = "Longitude of the location")]
    pub longitude: f64,
}

#[derive(Debug, Clone)]
pub struct WeatherServer {
    nws: NwsClient,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl WeatherServer {
    pub fn new(config: WeatherConfig) -> Result<Self, ClientError> {
        Ok(Self {
            nws: NwsClient::new(config)?,
            tool_router: Self::tool_router(),
        })
    }

    #[tool(description = "Get weather alerts for a US state.")]
    async fn get_alerts(&self, Parameters(AlertsArgs { state }): Parameters<AlertsArgs>) -> String {
        info!("get_alerts({})", state);
        alerts_report(self.nws.active_alerts(&state).await)
    }

    #[tool(description = "Get weather forecast for a location.")]
    async fn get_forecast(
        &self,
        Parameters(ForecastArgs { latitude, longitude }): Parameters<ForecastArgs>,
    ) -> String {
        info!("get_forecast({}, {})", latitude, longitude);
        let point = match self.nws.point(latitude, longitude).await {
            Ok(point) => point,
            Err(e) => {
                warn!("Points lookup for {},{} failed: {}", latitude, longitude, e);
                return POINT_UNAVAILABLE.to_string();
            }
        };

        forecast_report(self.nws.forecast(&point.properties.forecast).await)
    }
}

#[tool_handler]
impl ServerHandler for WeatherServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "weather".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "US weather alerts by state and forecasts by coordinates, from the National Weather Service."
                    .into(),
            ),
            ..Default::default()
        }
    }
}

/// Turn an alerts fetch into the text handed back to the model.
pub fn alerts_report(result: Result<AlertCollection, FetchError>) -> String {
    match result {
        Err(e) => {
            warn!("Alerts fetch failed: {}", e);
            ALERTS_UNAVAILABLE.to_string()
        }
        Ok(collection) if collection.features.is_empty() => NO_ACTIVE_ALERTS.to_string(),
        Ok(collection) => collection
            .features
            .iter()
            .map(|feature| format_alert(&feature.properties))
            .join("\n---\n"),
    }
}

/// Turn a forecast fetch into the text handed back to the model.
pub fn forecast_report(result: Result<Forecast, FetchError>) -> String {
    match result {
        Err(e) => {
            warn!("Forecast fetch failed: {}", e);
            FORECAST_UNAVAILABLE.to_string()
        }
        Ok(forecast) => forecast
            .properties
            .periods
            .iter()
            .take(FORECAST_PERIODS)
            .map(format_period)
            .join("\n---\n"),
    }
}

pub fn format_alert(props: &AlertProperties) -> String {
    format!(
        "\nEvent: {}\nArea: {}\nSeverity: {}\nDescription: {}\nInstructions: {}\n",
        props.event.as_deref().unwrap_or("Unknown"),
        props.area_desc.as_deref().unwrap_or("Unknown"),
        props.severity.as_deref().unwrap_or("Unknown"),
        props.description.as_deref().unwrap_or("No description available"),
        props
            .instruction
            .as_deref()
            .unwrap_or("No specific instructions provided"),
    )
}

pub fn format_period(period: &ForecastPeriod) -> String {
    let temperature = match &period.temperature {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    format!(
        "\n{}:\nTemperature: {}°{}\nWind: {} {}\nForecast: {}\n",
        period.name,
        temperature,
        period.temperature_unit,
        period.wind_speed,
        period.wind_direction,
        period.detailed_forecast,
    )
}
