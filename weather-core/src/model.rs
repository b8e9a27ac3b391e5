use serde::{Deserialize, Serialize};

/// Maximum number of hourly samples kept from a forecast.
pub const HOURLY_SAMPLE_LIMIT: usize = 8;

const ICON_URL_BASE: &str = "https://openweathermap.org/img/wn";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub description: String,
}

/// Point-in-time weather reading for a resolved location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: String,
    /// Seconds since the Unix epoch.
    pub captured_at: i64,
    /// In whatever unit system the request used; upstream default is Kelvin.
    pub temperature: f64,
    pub description: String,
    pub icon_code: String,
    pub coordinates: Coordinates,
    pub timezone_offset_seconds: i32,
    /// `None` when upstream sent no alerts section at all.
    pub alerts: Option<Vec<Alert>>,
}

impl WeatherSnapshot {
    pub fn first_alert(&self) -> Option<&Alert> {
        self.alerts.as_deref().and_then(<[Alert]>::first)
    }
}

/// One forecasted hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySample {
    /// Local `HH:MM`.
    pub formatted_time: String,
    pub temperature: f64,
    pub icon_code: String,
}

/// Unit system sent as the `units` query parameter.
///
/// Leaving it unset in config means no parameter is sent and upstream
/// defaults apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Standard,
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Standard => "standard",
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Standard, Units::Metric, Units::Imperial]
    }

    /// Display suffix for temperatures. `None` maps to the upstream default.
    pub fn temperature_suffix(units: Option<Units>) -> &'static str {
        match units {
            None | Some(Units::Standard) => "K",
            Some(Units::Metric) => "°C",
            Some(Units::Imperial) => "°F",
        }
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "standard" => Ok(Units::Standard),
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported: standard, metric, imperial."
            )),
        }
    }
}

/// Image URL for an OpenWeather condition icon code.
pub fn icon_url(icon_code: &str) -> String {
    format!("{ICON_URL_BASE}/{icon_code}.png")
}
