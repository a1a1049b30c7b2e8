//! Core library for the `citycast` CLI.
//!
//! This crate defines:
//! - The error taxonomy shared by every layer
//! - An HTTP client for the OpenWeather current-weather and forecast endpoints
//! - Pure processing of provider JSON into typed records and daily summaries
//! - A service facade that validates input and builds its client lazily
//! - Configuration & credentials handling
//!
//! It is used by `citycast-cli`, but can also be reused by other front ends.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod processor;
pub mod service;

pub use client::WeatherApiClient;
pub use config::Config;
pub use error::{ApiRequestError, ProcessingError, Result, WeatherError};
pub use model::{CurrentWeather, DailySummary, ForecastSample};
pub use service::WeatherService;
