//! Facade used by front ends: validate, fetch, then process.

use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use crate::{
    client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, WeatherApiClient},
    config::Config,
    error::{ApiRequestError, Result, WeatherError},
    model::{CurrentWeather, DailySummary, ForecastSample},
    processor::{self, MAX_DAILY_DAYS},
};

pub const DEFAULT_HOURLY_ENTRIES: usize = 8;
pub const DEFAULT_DAILY_DAYS: usize = 3;
/// Five days of 3-hour samples.
pub const MAX_HOURLY_ENTRIES: usize = 40;

const MIN_CITY_LEN: usize = 2;

/// Construction never fails; a missing API key only surfaces once an operation needs the network.
#[derive(Debug)]
pub struct WeatherService {
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
    client: OnceCell<WeatherApiClient>,
}

impl WeatherService {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            client: OnceCell::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.resolve_api_key())
            .with_base_url(config.base_url.clone())
            .with_timeout(config.timeout())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the HTTP client has been built yet.
    pub fn is_ready(&self) -> bool {
        self.client.initialized()
    }

    async fn ensure_client(&self) -> Result<&WeatherApiClient> {
        self.client
            .get_or_try_init(|| async {
                let api_key = self.api_key.as_deref().ok_or(ApiRequestError::MissingApiKey)?;
                let client = WeatherApiClient::new(api_key, self.timeout)?
                    .with_base_url(self.base_url.as_str());
                info!(base_url = client.base_url(), "weather API client ready");
                Ok::<_, WeatherError>(client)
            })
            .await
    }

    /// Trim `city` and require at least two characters.
    pub fn validate_city_input(&self, city: &str) -> Result<String> {
        let normalized = city.trim();
        if normalized.is_empty() {
            return Err(WeatherError::InvalidInput("City name must not be empty".to_string()));
        }
        if normalized.chars().count() < MIN_CITY_LEN {
            return Err(WeatherError::InvalidInput(format!(
                "City name is too short (min {MIN_CITY_LEN} characters)"
            )));
        }
        Ok(normalized.to_string())
    }

    #[instrument(skip(self))]
    pub async fn get_current_weather(&self, city: &str) -> Result<CurrentWeather> {
        let normalized = self.validate_city_input(city)?;
        let client = self.ensure_client().await?;

        let raw = client.fetch_current_weather(&normalized).await?;
        Ok(processor::parse_current_weather(&raw, &normalized)?)
    }

    /// The first `n_entries` (clamped to 1..=40) forecast samples.
    #[instrument(skip(self))]
    pub async fn get_hourly_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        n_entries: usize,
    ) -> Result<Vec<ForecastSample>> {
        let n_entries = n_entries.clamp(1, MAX_HOURLY_ENTRIES);
        debug!(n_entries, "clamped hourly entry count");
        let client = self.ensure_client().await?;

        let raw = client.fetch_forecast(latitude, longitude).await?;
        let mut table = processor::build_forecast_table(&raw)?;
        table.truncate(n_entries);
        Ok(table)
    }

    /// Daily summaries for up to `n_days` (clamped to 1..=5) days.
    #[instrument(skip(self))]
    pub async fn get_daily_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        n_days: usize,
    ) -> Result<Vec<DailySummary>> {
        let n_days = n_days.clamp(1, MAX_DAILY_DAYS);
        debug!(n_days, "clamped daily day count");
        let client = self.ensure_client().await?;

        let raw = client.fetch_forecast(latitude, longitude).await?;
        let table = processor::build_forecast_table(&raw)?;
        Ok(processor::aggregate_daily(&table, n_days)?)
    }
}
