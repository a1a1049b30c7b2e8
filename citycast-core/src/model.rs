use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// URL of the provider's rendered icon for an icon code.
pub fn icon_url(icon: &str) -> String {
    format!("{ICON_BASE_URL}/{icon}@2x.png")
}

/// Current conditions for a single city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    /// City name as entered, after trimming.
    pub city: String,
    pub description: String,
    pub icon: String,
    pub temperature: f64,
    /// hPa.
    pub pressure: u32,
    /// Percent.
    pub humidity: u8,
    /// m/s. Zero when the provider omits wind data.
    pub wind_speed: f64,
    /// Coordinates reported by the provider, not derived from the query.
    pub latitude: f64,
    pub longitude: f64,
}

impl CurrentWeather {
    pub fn icon_url(&self) -> String {
        icon_url(&self.icon)
    }
}

/// One 3-hour forecast sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    /// Epoch seconds as reported by the provider.
    pub timestamp: i64,
    /// UTC timestamp shifted by the location's offset.
    pub local_datetime: NaiveDateTime,
    pub date: NaiveDate,
    pub temperature: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub description: String,
    pub icon: String,
}

impl ForecastSample {
    pub fn icon_url(&self) -> String {
        icon_url(&self.icon)
    }
}

/// Aggregate of all samples that fall on one local calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    /// `YYYY-MM-DD`.
    pub date_str: String,
    pub min_temp: f64,
    pub max_temp: f64,
    pub mean_temp: f64,
    pub mean_humidity: f64,
    pub mean_wind_speed: f64,
    /// Most frequent icon of the day.
    pub icon: String,
    /// Most frequent description of the day.
    pub description: String,
}

impl DailySummary {
    pub fn icon_url(&self) -> String {
        icon_url(&self.icon)
    }
}
