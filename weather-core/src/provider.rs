use crate::{
    Config,
    error::FetchError,
    model::{Coordinates, HourlySample, WeatherSnapshot},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Source of current weather and hourly forecasts.
///
/// Implementations perform one fresh request per call; nothing is cached.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Resolve `city` and return its current conditions.
    async fn fetch_current_weather(&self, city: &str) -> Result<WeatherSnapshot, FetchError>;

    /// Return at most [`HOURLY_SAMPLE_LIMIT`](crate::model::HOURLY_SAMPLE_LIMIT)
    /// samples in chronological order.
    async fn fetch_hourly_forecast(
        &self,
        coordinates: Coordinates,
    ) -> Result<Vec<HourlySample>, FetchError>;
}

/// Construct the OpenWeather provider from a fully layered config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let provider = OpenWeatherProvider::from_config(config)?;
    Ok(Arc::new(provider))
}
