//! Error taxonomy shared by the client, processor and service.

use thiserror::Error;

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;

/// Top-level error. Callers match on the variant to decide how to present a failure.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Empty or too-short city name.
    #[error("{0}")]
    InvalidInput(String),

    /// The provider answered 404.
    #[error("{message} (status 404)")]
    CityNotFound { message: String },

    #[error(transparent)]
    ApiRequest(#[from] ApiRequestError),

    #[error(transparent)]
    Processing(#[from] ProcessingError),
}

/// Everything that can go wrong while talking to the provider.
#[derive(Debug, Error)]
pub enum ApiRequestError {
    #[error(
        "API key is not configured. Set the WEATHER_API_KEY environment variable or run `citycast configure`"
    )]
    MissingApiKey,

    #[error("request timed out while contacting the weather API")]
    Timeout(#[source] reqwest::Error),

    #[error("network error while contacting the weather API: {0}")]
    Network(#[source] reqwest::Error),

    #[error("API responded with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode JSON from the API response")]
    Decode(#[source] serde_json::Error),
}

impl ApiRequestError {
    /// Split transport failures into timeouts and everything else.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() { Self::Timeout(err) } else { Self::Network(err) }
    }
}

/// Structural problems in a provider payload or in a forecast table.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("malformed {what}: {source}")]
    Malformed {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{what} has no weather entries")]
    EmptyWeatherList { what: String },

    #[error("timestamp {timestamp} with offset {offset}s is out of range")]
    TimestampOutOfRange { timestamp: i64, offset: i64 },

    #[error("no forecast samples to aggregate")]
    EmptyTable,
}
