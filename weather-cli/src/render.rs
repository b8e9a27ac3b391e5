//! Plain-text rendering of a [`DisplayModel`].

use std::fmt;

use chrono::{DateTime, FixedOffset, Local, TimeZone};
use weather_core::{
    ClockZone, DisplayModel, FetchErrorKind, ForecastStatus, Phase, Units, UpstreamKind,
    WeatherSnapshot, map::TILE_ATTRIBUTION, model::icon_url,
};

const LOCATION_EMOJI: &str = "📍";
const TEMPERATURE_EMOJI: &str = "🌡️";
const TIME_EMOJI: &str = "🕒";

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub units: Option<Units>,
    pub clock: ClockZone,
}

pub fn render(model: &DisplayModel, opts: RenderOptions) -> String {
    View { model, opts }.to_string()
}

struct View<'a> {
    model: &'a DisplayModel,
    opts: RenderOptions,
}

impl fmt::Display for View<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let model = self.model;
        let suffix = Units::temperature_suffix(self.opts.units);

        match model.phase() {
            Phase::Idle => writeln!(f, "Enter a city name to see its weather.")?,
            Phase::Searching => {
                writeln!(f, "Searching for \"{}\"...", model.last_query().unwrap_or(""))?
            }
            Phase::SearchFailed { kind } => {
                writeln!(f, "{}", failure_message(kind, model.last_query()))?
            }
            Phase::Shown { .. } => {}
        }

        let Some(snapshot) = model.snapshot() else {
            return Ok(());
        };

        write_snapshot(f, snapshot, suffix, self.opts.clock)?;

        let forecast = model.forecast();
        if !forecast.is_empty() {
            writeln!(f, "\nHourly forecast")?;
            for sample in forecast {
                writeln!(
                    f,
                    "  {}  {:>7.1} {suffix}  {}",
                    sample.formatted_time,
                    sample.temperature,
                    icon_url(&sample.icon_code)
                )?;
            }
        } else if matches!(
            model.phase(),
            Phase::Shown {
                forecast: ForecastStatus::Failed(_)
            }
        ) {
            writeln!(f, "\nHourly forecast unavailable.")?;
        }

        if let Some(marker) = model.map_marker() {
            writeln!(f, "\nMap")?;
            writeln!(
                f,
                "  {LOCATION_EMOJI} {}: {}",
                marker.popup(),
                marker.openstreetmap_url()
            )?;
            writeln!(f, "  Tile: {} ({TILE_ATTRIBUTION})", marker.tile_url())?;
        }

        Ok(())
    }
}

fn write_snapshot(
    f: &mut fmt::Formatter<'_>,
    snapshot: &WeatherSnapshot,
    suffix: &str,
    clock: ClockZone,
) -> fmt::Result {
    writeln!(f, "{}", snapshot.location_name)?;
    writeln!(f, "  Icon: {}", icon_url(&snapshot.icon_code))?;
    writeln!(
        f,
        "  Date and time: {TIME_EMOJI} {}",
        format_captured_at(snapshot, clock)
    )?;
    writeln!(
        f,
        "  {TEMPERATURE_EMOJI} Temperature: {:.1} {suffix}",
        snapshot.temperature
    )?;
    writeln!(
        f,
        "  Time zone: {}",
        format_utc_offset(snapshot.timezone_offset_seconds)
    )?;
    writeln!(f, "  Weather: {}", snapshot.description)?;
    writeln!(
        f,
        "  {LOCATION_EMOJI} Latitude: {} {LOCATION_EMOJI} Longitude: {}",
        snapshot.coordinates.latitude, snapshot.coordinates.longitude
    )?;

    if let Some(alert) = snapshot.first_alert() {
        writeln!(f, "\n  Weather alerts")?;
        writeln!(f, "  {}", alert.description)?;
    }
    Ok(())
}

fn failure_message(kind: FetchErrorKind, query: Option<&str>) -> &'static str {
    match kind {
        FetchErrorKind::UpstreamError(UpstreamKind::NotFound) => "City not found.",
        FetchErrorKind::UpstreamError(UpstreamKind::InvalidRequest) => {
            if query.is_none_or(|q| q.trim().is_empty()) {
                "Please enter a city name."
            } else {
                "The weather service rejected the request."
            }
        }
        FetchErrorKind::UpstreamError(UpstreamKind::Unauthorized) => {
            "The weather service rejected the API key."
        }
        FetchErrorKind::UpstreamError(UpstreamKind::Other) => {
            "The weather service is unavailable."
        }
        FetchErrorKind::NetworkFailure => "Network unavailable.",
        FetchErrorKind::MalformedResponse => "Unexpected response from the weather service.",
    }
}

fn format_captured_at(snapshot: &WeatherSnapshot, clock: ClockZone) -> String {
    let Some(utc) = DateTime::from_timestamp(snapshot.captured_at, 0) else {
        return snapshot.captured_at.to_string();
    };

    match clock {
        ClockZone::Local => format_in(&utc, &Local),
        ClockZone::Location => match FixedOffset::east_opt(snapshot.timezone_offset_seconds) {
            Some(offset) => format_in(&utc, &offset),
            None => format_in(&utc, &chrono::Utc),
        },
    }
}

fn format_in<Tz>(utc: &DateTime<chrono::Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    utc.with_timezone(tz).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn format_utc_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let abs = seconds.unsigned_abs();
    format!("UTC{sign}{:02}:{:02}", abs / 3600, (abs % 3600) / 60)
}
