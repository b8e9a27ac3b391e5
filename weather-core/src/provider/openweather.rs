use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, TimeZone};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::{fmt, time::Duration};
use tracing::{debug, instrument};

use crate::{
    config::{ClockZone, Config},
    error::FetchError,
    model::{Alert, Coordinates, HOURLY_SAMPLE_LIMIT, HourlySample, Units, WeatherSnapshot},
};

use super::WeatherProvider;

/// Sections dropped from the One Call payload; only `hourly` is read.
const FORECAST_EXCLUDE: &str = "current,minutely,daily,alerts";

#[derive(Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    api_base: String,
    units: Option<Units>,
    clock: ClockZone,
    http: Client,
}

impl fmt::Debug for OpenWeatherProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenWeatherProvider")
            .field("api_base", &self.api_base)
            .field("units", &self.units)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl OpenWeatherProvider {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.require_api_key()?.to_owned();

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            units: config.units,
            clock: config.clock,
            http,
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{name}", self.api_base)
    }

    fn with_common_params<'a>(
        &'a self,
        mut params: Vec<(&'a str, String)>,
    ) -> Vec<(&'a str, String)> {
        if let Some(units) = self.units {
            params.push(("units", units.as_str().to_string()));
        }
        params.push(("appid", self.api_key.clone()));
        params
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let res = self.http.get(url).query(params).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::upstream(status.as_u16(), &body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self))]
    async fn fetch_current_weather(&self, city: &str) -> Result<WeatherSnapshot, FetchError> {
        let url = self.endpoint("weather");
        let params = self.with_common_params(vec![("q", city.to_string())]);
        debug!(url = %url, units = ?self.units, "Fetching current weather");

        let parsed: OwCurrentResponse = self.get_json(&url, &params).await?;
        snapshot_from_response(parsed)
    }

    #[instrument(skip(self), fields(lat = %coordinates.latitude, lon = %coordinates.longitude))]
    async fn fetch_hourly_forecast(
        &self,
        coordinates: Coordinates,
    ) -> Result<Vec<HourlySample>, FetchError> {
        let url = self.endpoint("onecall");
        let params = self.with_common_params(vec![
            ("lat", coordinates.latitude.to_string()),
            ("lon", coordinates.longitude.to_string()),
            ("exclude", FORECAST_EXCLUDE.to_string()),
        ]);
        debug!(url = %url, "Fetching hourly forecast");

        let parsed: OwOneCallResponse = self.get_json(&url, &params).await?;

        match self.clock {
            ClockZone::Local => hourly_samples(&parsed.hourly, &Local),
            ClockZone::Location => {
                let offset = FixedOffset::east_opt(parsed.timezone_offset).ok_or_else(|| {
                    FetchError::Malformed(format!(
                        "timezone_offset {} is out of range",
                        parsed.timezone_offset
                    ))
                })?;
                hourly_samples(&parsed.hourly, &offset)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwCondition {
    #[serde(default)]
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwAlert {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    coord: OwCoord,
    main: OwMain,
    weather: Vec<OwCondition>,
    timezone: i32,
    alerts: Option<Vec<OwAlert>>,
}

#[derive(Debug, Deserialize)]
struct OwHourly {
    dt: i64,
    temp: f64,
    weather: Vec<OwCondition>,
}

#[derive(Debug, Deserialize)]
struct OwOneCallResponse {
    #[serde(default)]
    timezone_offset: i32,
    hourly: Vec<OwHourly>,
}

fn snapshot_from_response(parsed: OwCurrentResponse) -> Result<WeatherSnapshot, FetchError> {
    let condition = parsed
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::Malformed("current weather has no conditions".into()))?;

    Ok(WeatherSnapshot {
        location_name: parsed.name,
        captured_at: parsed.dt,
        temperature: parsed.main.temp,
        description: condition.description,
        icon_code: condition.icon,
        coordinates: Coordinates {
            latitude: parsed.coord.lat,
            longitude: parsed.coord.lon,
        },
        timezone_offset_seconds: parsed.timezone,
        alerts: parsed.alerts.map(|alerts| {
            alerts
                .into_iter()
                .map(|a| Alert {
                    description: a.description,
                })
                .collect()
        }),
    })
}

fn hourly_samples<Tz>(entries: &[OwHourly], tz: &Tz) -> Result<Vec<HourlySample>, FetchError>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    entries
        .iter()
        .take(HOURLY_SAMPLE_LIMIT)
        .map(|entry| -> Result<HourlySample, FetchError> {
            let condition = entry.weather.first().ok_or_else(|| {
                FetchError::Malformed(format!("hourly entry {} has no conditions", entry.dt))
            })?;

            Ok(HourlySample {
                formatted_time: format_hour(entry.dt, tz)?,
                temperature: entry.temp,
                icon_code: condition.icon.clone(),
            })
        })
        .collect()
}

fn format_hour<Tz>(ts: i64, tz: &Tz) -> Result<String, FetchError>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let utc = DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| FetchError::Malformed(format!("timestamp {ts} is out of range")))?;
    Ok(utc.with_timezone(tz).format("%H:%M").to_string())
}
