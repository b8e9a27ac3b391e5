//! Core library for the `weather-widget` client.
//!
//! This crate defines:
//! - Configuration & credential handling
//! - The OpenWeather provider (current weather and hourly forecast)
//! - The display model, its transitions, and the session that drives them
//!
//! It is used by `weather-widget-cli`, but a different front end can drive a
//! [`Session`] the same way.

pub mod config;
pub mod error;
pub mod map;
pub mod model;
pub mod provider;
pub mod session;
pub mod state;

pub use config::{ClockZone, Config, ConfigOverrides};
pub use error::{FetchError, FetchErrorKind, UpstreamKind};
pub use map::MapMarker;
pub use model::{Alert, Coordinates, HOURLY_SAMPLE_LIMIT, HourlySample, Units, WeatherSnapshot};
pub use provider::{WeatherProvider, provider_from_config};
pub use session::Session;
pub use state::{DisplayModel, Effect, Event, ForecastStatus, Phase, UiState};
