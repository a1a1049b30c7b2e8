//! HTTP client for the OpenWeather current-weather and 5-day/3-hour forecast endpoints.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{ApiRequestError, Result, WeatherError};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiClient {
    /// Build a client. Fails with [`ApiRequestError::MissingApiKey`] on a blank key.
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(ApiRequestError::MissingApiKey.into());
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiRequestError::Network)?;

        Ok(Self { api_key: api_key.to_string(), base_url: DEFAULT_BASE_URL.to_string(), http })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_current_weather(&self, city_name: &str) -> Result<Value> {
        self.get_json("weather", &[("q", city_name.to_string())]).await
    }

    pub async fn fetch_forecast(&self, latitude: f64, longitude: f64) -> Result<Value> {
        self.get_json(
            "forecast",
            &[("lat", latitude.to_string()), ("lon", longitude.to_string())],
        )
        .await
    }

    #[instrument(level = "debug", skip(self, params))]
    async fn get_json(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}/{endpoint}", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(params)
            .query(&[("units", "metric"), ("lang", "en"), ("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(ApiRequestError::from_transport)?;

        let status = res.status();
        let body = res.text().await.map_err(ApiRequestError::from_transport)?;
        debug!(%status, bytes = body.len(), "weather API responded");

        if status == StatusCode::NOT_FOUND {
            // Objects without `message` get a generic text; anything else keeps the raw body.
            let message = match serde_json::from_str::<Value>(&body) {
                Ok(json) if json.is_object() => {
                    provider_message(&json).unwrap_or_else(|| "Not found".to_string())
                }
                _ => body,
            };
            return Err(WeatherError::CityNotFound { message });
        }

        if status != StatusCode::OK {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|json| provider_message(&json))
                .unwrap_or(body);
            return Err(ApiRequestError::Status { status: status.as_u16(), message }.into());
        }

        let json = serde_json::from_str(&body).map_err(ApiRequestError::Decode)?;
        Ok(json)
    }
}

/// The provider puts a human-readable explanation in `message`.
fn provider_message(json: &Value) -> Option<String> {
    match json.get("message")? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
