use anyhow::Context;
use chrono::NaiveDate;
use citycast_core::{
    Config, CurrentWeather, DailySummary, ForecastSample, WeatherError, WeatherService,
    service::{DEFAULT_DAILY_DAYS, DEFAULT_HOURLY_ENTRIES},
};
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{Password, PasswordDisplayMode, validator::Validation};
use tracing::warn;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "citycast", version, about = "Current weather and short-range forecasts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// 3-hour samples.
    Hourly,
    /// One summary row per day.
    Daily,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key in the config file.
    Configure,

    /// Show current conditions for a city.
    Current {
        city: String,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Show current conditions followed by a forecast.
    Show {
        city: String,

        #[arg(long, value_enum, default_value_t = Mode::Hourly)]
        mode: Mode,

        /// Number of 3-hour samples (1-40) in hourly mode.
        #[arg(long, default_value_t = DEFAULT_HOURLY_ENTRIES)]
        entries: usize,

        /// Number of days (1-5) in daily mode.
        #[arg(long, default_value_t = DEFAULT_DAILY_DAYS)]
        days: usize,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Current { city, json } => {
                let service = load_service();
                let current = service.get_current_weather(&city).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&current)?);
                } else {
                    print!("{}", format_current(&current));
                }
                Ok(())
            }
            Command::Show { city, mode, entries, days, json } => {
                let service = load_service();
                let current = service.get_current_weather(&city).await?;
                let (lat, lon) = (current.latitude, current.longitude);

                match mode {
                    Mode::Hourly => {
                        let hourly = service.get_hourly_forecast(lat, lon, entries).await?;
                        if json {
                            let out = serde_json::json!({ "current": current, "hourly": hourly });
                            println!("{}", serde_json::to_string_pretty(&out)?);
                        } else {
                            print!("{}", format_current(&current));
                            print!("{}", format_hourly(&hourly));
                        }
                    }
                    Mode::Daily => {
                        let daily = service.get_daily_forecast(lat, lon, days).await?;
                        if json {
                            let out = serde_json::json!({ "current": current, "daily": daily });
                            println!("{}", serde_json::to_string_pretty(&out)?);
                        } else {
                            print!("{}", format_current(&current));
                            print!("{}", format_daily(&daily));
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

/// The service must come up even with a broken or missing config; a missing key is
/// reported by the first request instead.
fn load_service() -> WeatherService {
    let config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {e:#}");
        Config::default()
    });
    WeatherService::from_config(&config)
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_validator(|input: &str| {
            if input.trim().is_empty() {
                Ok(Validation::Invalid("API key must not be empty".into()))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()
        .context("Failed to read API key")?;

    config.set_api_key(&api_key);
    let path = config.save()?;

    println!("Saved API key to {}", path.display());
    Ok(())
}

/// A distinct message per error kind, with a generic fallback for anything else.
pub fn user_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<WeatherError>() {
        Some(WeatherError::InvalidInput(msg)) => format!("Invalid input: {msg}"),
        Some(e @ WeatherError::CityNotFound { .. }) => {
            format!("{e}\nTip: check the spelling or try the city's English name.")
        }
        Some(WeatherError::ApiRequest(e)) => {
            format!("API error: {e}\nPlease try again in a moment.")
        }
        Some(WeatherError::Processing(e)) => format!("Weather processing error: {e}"),
        None => format!(
            "Unexpected error: {err:#}\nPlease contact the administrator if the problem persists."
        ),
    }
}

/// Upper-case the first letter of every alphabetic run and lower-case the rest, so
/// `"new york"` becomes `"New York"` and `"o'neill"` becomes `"O'Neill"`.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

fn format_current(current: &CurrentWeather) -> String {
    format!(
        "Weather in {} ({:.4}°, {:.4}°)\n  {}  {}\n  \
         Temp {:.1} °C | Pressure {} hPa | Humidity {} % | Wind {} m/s\n",
        title_case(&current.city),
        current.latitude,
        current.longitude,
        current.description,
        current.icon_url(),
        current.temperature,
        current.pressure,
        current.humidity,
        current.wind_speed,
    )
}

fn day_heading(date: NaiveDate) -> String {
    date.format("%A, %d %B %Y").to_string()
}

fn format_hourly(samples: &[ForecastSample]) -> String {
    let mut out = format!("\nHourly forecast, next {} entries (3-hour interval)\n", samples.len());
    let mut current_day = None;

    for s in samples {
        if current_day != Some(s.date) {
            out.push_str(&format!("{}\n", day_heading(s.date)));
            current_day = Some(s.date);
        }
        out.push_str(&format!(
            "  {}  {:<20} {:>5.1} °C {:>3} % {:>5} m/s  {}\n",
            s.local_datetime.format("%H:%M"),
            s.description,
            s.temperature,
            s.humidity,
            s.wind_speed,
            s.icon_url(),
        ));
    }
    out
}

fn format_daily(days: &[DailySummary]) -> String {
    let mut out = format!("\nDaily summary, next {} day(s)\n", days.len());

    for d in days {
        out.push_str(&format!(
            "  {}  {:<20} min {:>5.1} °C  max {:>5.1} °C  mean {:>5.1} °C  {}\n",
            d.date_str,
            d.description,
            d.min_temp,
            d.max_temp,
            d.mean_temp,
            d.icon_url(),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use citycast_core::{ApiRequestError, ProcessingError};

    fn current() -> CurrentWeather {
        CurrentWeather {
            city: "Jakarta".into(),
            description: "Light rain".into(),
            icon: "10d".into(),
            temperature: 30.5,
            pressure: 1008,
            humidity: 70,
            wind_speed: 3.2,
            latitude: -6.2,
            longitude: 106.8,
        }
    }

    fn sample(date: NaiveDate, hour: u32) -> ForecastSample {
        let local_datetime = date.and_hms_opt(hour, 0, 0).expect("valid time");
        ForecastSample {
            timestamp: local_datetime.and_utc().timestamp(),
            local_datetime,
            date,
            temperature: 25.0,
            humidity: 80,
            wind_speed: 2.0,
            description: "Broken clouds".into(),
            icon: "04d".into(),
        }
    }

    #[test]
    fn parses_show_defaults() {
        let cli = Cli::try_parse_from(["citycast", "show", "Jakarta"]).expect("parse");
        match cli.command {
            Command::Show { city, mode, entries, days, json } => {
                assert_eq!(city, "Jakarta");
                assert_eq!(mode, Mode::Hourly);
                assert_eq!(entries, 8);
                assert_eq!(days, 3);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_daily_mode() {
        let args = ["citycast", "show", "Oslo", "--mode", "daily", "--days", "5"];
        let cli = Cli::try_parse_from(args).expect("parse");
        assert!(matches!(cli.command, Command::Show { mode: Mode::Daily, days: 5, .. }));
    }

    #[test]
    fn each_error_kind_gets_its_own_message() {
        let invalid =
            anyhow::Error::from(WeatherError::InvalidInput("City name must not be empty".into()));
        assert!(user_message(&invalid).starts_with("Invalid input:"));

        let not_found =
            anyhow::Error::from(WeatherError::CityNotFound { message: "city not found".into() });
        let msg = user_message(&not_found);
        assert!(msg.starts_with("city not found (status 404)"));
        assert!(msg.contains("Tip:"));

        let api = anyhow::Error::from(WeatherError::from(ApiRequestError::MissingApiKey));
        assert!(user_message(&api).starts_with("API error:"));

        let processing = anyhow::Error::from(WeatherError::from(ProcessingError::EmptyTable));
        assert!(user_message(&processing).starts_with("Weather processing error:"));

        let other = anyhow::anyhow!("disk on fire");
        assert!(user_message(&other).starts_with("Unexpected error: disk on fire"));
    }

    #[test]
    fn title_case_capitalizes_each_word() {
        assert_eq!(title_case("jakarta"), "Jakarta");
        assert_eq!(title_case("NEW york"), "New York");
        assert_eq!(title_case("são paulo"), "São Paulo");
        assert_eq!(title_case("o'neill"), "O'Neill");
        assert_eq!(title_case("  "), "  ");
    }

    #[test]
    fn heading_title_cases_the_city() {
        let text = format_current(&CurrentWeather { city: "new york".into(), ..current() });
        assert!(text.starts_with("Weather in New York ("), "{text}");
    }

    #[test]
    fn current_block_lists_all_readings() {
        let text = format_current(&current());
        assert!(text.contains("Weather in Jakarta (-6.2000°, 106.8000°)"));
        assert!(text.contains("Temp 30.5 °C"));
        assert!(text.contains("Pressure 1008 hPa"));
        assert!(text.contains("https://openweathermap.org/img/wn/10d@2x.png"));
    }

    #[test]
    fn hourly_list_groups_by_day() {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid date");
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 16).expect("valid date");
        let text = format_hourly(&[sample(d1, 18), sample(d1, 21), sample(d2, 0)]);

        assert!(text.contains("next 3 entries"));
        assert_eq!(text.matches("Monday, 15 January 2024").count(), 1);
        assert_eq!(text.matches("Tuesday, 16 January 2024").count(), 1);
        assert!(text.contains("21:00"));
    }

    #[test]
    fn daily_rows_show_min_max_mean() {
        let day = DailySummary {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid date"),
            date_str: "2024-01-15".into(),
            min_temp: 20.0,
            max_temp: 27.0,
            mean_temp: 23.5,
            mean_humidity: 63.5,
            mean_wind_speed: 1.0,
            icon: "01d".into(),
            description: "Clear sky".into(),
        };

        let text = format_daily(&[day]);
        assert!(text.contains("next 1 day(s)"));
        assert!(text.contains("2024-01-15"));
        assert!(text.contains("min  20.0 °C"));
        assert!(text.contains("max  27.0 °C"));
        assert!(text.contains("mean  23.5 °C"));
    }
}
