//! Pure transformations from provider JSON into [`CurrentWeather`], forecast tables and
//! daily summaries. Nothing here performs I/O.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Deserializer, de};
use serde_json::Value;

use crate::{
    error::ProcessingError,
    model::{CurrentWeather, DailySummary, ForecastSample},
};

/// The provider's forecast horizon, in days.
pub const MAX_DAILY_DAYS: usize = 5;

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentMain {
    temp: f64,
    #[serde(deserialize_with = "truncated")]
    pressure: u32,
    #[serde(deserialize_with = "truncated")]
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwCurrentMain,
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    coord: OwCoord,
}

#[derive(Debug, Default, Deserialize)]
struct OwCity {
    #[serde(default)]
    timezone: i64,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    #[serde(default)]
    city: OwCity,
    #[serde(default)]
    list: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct OwSampleMain {
    temp: f64,
    #[serde(deserialize_with = "truncated")]
    humidity: u8,
}

/// Accept any JSON number and drop its fractional part; `1008.7` reads as `1008`.
fn truncated<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let value = f64::deserialize(deserializer)?;
    let whole = value.trunc();
    if !whole.is_finite() || whole < i64::MIN as f64 || whole >= i64::MAX as f64 {
        return Err(de::Error::custom(format!("number {value} is out of range")));
    }

    T::try_from(whole as i64)
        .map_err(|_| de::Error::custom(format!("number {value} is out of range")))
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwSampleMain,
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
}

/// Interpret `timestamp` as UTC and shift it by `offset_secs`.
pub fn to_local_datetime(
    timestamp: i64,
    offset_secs: i64,
) -> Result<NaiveDateTime, ProcessingError> {
    let out_of_range = || ProcessingError::TimestampOutOfRange { timestamp, offset: offset_secs };

    let utc = DateTime::from_timestamp(timestamp, 0).ok_or_else(out_of_range)?;
    let offset = TimeDelta::try_seconds(offset_secs).ok_or_else(out_of_range)?;

    utc.naive_utc().checked_add_signed(offset).ok_or_else(out_of_range)
}

pub fn parse_current_weather(
    raw: &Value,
    city_name: &str,
) -> Result<CurrentWeather, ProcessingError> {
    let parsed = OwCurrentResponse::deserialize(raw).map_err(|source| {
        ProcessingError::Malformed { what: "current weather".to_string(), source }
    })?;

    let weather = parsed.weather.into_iter().next().ok_or_else(|| {
        ProcessingError::EmptyWeatherList { what: "current weather".to_string() }
    })?;

    Ok(CurrentWeather {
        city: city_name.to_string(),
        description: capitalize(&weather.description),
        icon: weather.icon,
        temperature: parsed.main.temp,
        pressure: parsed.main.pressure,
        humidity: parsed.main.humidity,
        wind_speed: parsed.wind.speed,
        latitude: parsed.coord.lat,
        longitude: parsed.coord.lon,
    })
}

/// One row per forecast entry, in provider order.
pub fn build_forecast_table(forecast: &Value) -> Result<Vec<ForecastSample>, ProcessingError> {
    let parsed = OwForecastResponse::deserialize(forecast).map_err(|source| {
        ProcessingError::Malformed { what: "forecast".to_string(), source }
    })?;
    let offset = parsed.city.timezone;

    parsed
        .list
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let entry = OwForecastEntry::deserialize(entry).map_err(|source| {
                ProcessingError::Malformed { what: format!("forecast entry {index}"), source }
            })?;

            let weather = entry.weather.into_iter().next().ok_or_else(|| {
                ProcessingError::EmptyWeatherList { what: format!("forecast entry {index}") }
            })?;

            let local_datetime = to_local_datetime(entry.dt, offset)?;

            Ok(ForecastSample {
                timestamp: entry.dt,
                local_datetime,
                date: local_datetime.date(),
                temperature: entry.main.temp,
                humidity: entry.main.humidity,
                wind_speed: entry.wind.speed,
                description: capitalize(&weather.description),
                icon: weather.icon,
            })
        })
        .collect()
}

/// Collapse a forecast table into at most `n_days` (clamped to 1..=5) daily rows, earliest first.
pub fn aggregate_daily(
    table: &[ForecastSample],
    n_days: usize,
) -> Result<Vec<DailySummary>, ProcessingError> {
    if table.is_empty() {
        return Err(ProcessingError::EmptyTable);
    }

    let mut groups: BTreeMap<NaiveDate, Vec<&ForecastSample>> = BTreeMap::new();
    for sample in table {
        groups.entry(sample.date).or_default().push(sample);
    }

    let n_days = n_days.clamp(1, MAX_DAILY_DAYS);

    groups
        .into_iter()
        .take(n_days)
        .map(|(date, samples)| summarize_day(date, &samples))
        .collect()
}

fn summarize_day(
    date: NaiveDate,
    samples: &[&ForecastSample],
) -> Result<DailySummary, ProcessingError> {
    if samples.is_empty() {
        return Err(ProcessingError::EmptyTable);
    }
    let count = samples.len() as f64;

    let min_temp = samples.iter().map(|s| s.temperature).fold(f64::INFINITY, f64::min);
    let max_temp = samples.iter().map(|s| s.temperature).fold(f64::NEG_INFINITY, f64::max);
    let mean_temp = samples.iter().map(|s| s.temperature).sum::<f64>() / count;
    let mean_humidity = samples.iter().map(|s| f64::from(s.humidity)).sum::<f64>() / count;
    let mean_wind_speed = samples.iter().map(|s| s.wind_speed).sum::<f64>() / count;

    let icon = mode(samples.iter().map(|s| s.icon.as_str())).unwrap_or_default();
    let description = mode(samples.iter().map(|s| s.description.as_str())).unwrap_or_default();

    Ok(DailySummary {
        date,
        date_str: date.format("%Y-%m-%d").to_string(),
        min_temp,
        max_temp,
        mean_temp,
        mean_humidity,
        mean_wind_speed,
        icon: icon.to_string(),
        description: description.to_string(),
    })
}

/// Most frequent value; on equal counts the earliest one wins.
fn mode<'a>(values: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value, 1)),
        }
    }

    // max_by_key keeps the last maximum, so walk backwards to keep the first.
    counts.into_iter().rev().max_by_key(|(_, n)| *n).map(|(value, _)| value)
}

/// Upper-case the first character and lower-case the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
