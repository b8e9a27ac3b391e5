//! Display state and its transitions.
//!
//! `DisplayModel::apply` is the only way state changes. It never performs
//! I/O; network work is returned as an [`Effect`] for the caller to run, and
//! the result comes back later as another [`Event`].

use tracing::{debug, warn};

use crate::{
    error::{FetchError, FetchErrorKind},
    map::MapMarker,
    model::{Coordinates, HOURLY_SAMPLE_LIMIT, HourlySample, WeatherSnapshot},
};

/// Monotonic search counter; results tagged with an older value are dropped.
pub type Generation = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastStatus {
    Pending,
    Loaded,
    Failed(FetchErrorKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing searched yet.
    Idle,
    Searching,
    Shown { forecast: ForecastStatus },
    SearchFailed { kind: FetchErrorKind },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub city_input: String,
    pub map_visible: bool,
}

#[derive(Debug)]
pub enum Event {
    /// Text field changed.
    CityInput(String),
    /// Search for whatever is in the text field, even if empty.
    Submit,
    WeatherLoaded {
        generation: Generation,
        result: Result<WeatherSnapshot, FetchError>,
    },
    ForecastLoaded {
        generation: Generation,
        result: Result<Vec<HourlySample>, FetchError>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchWeather {
        generation: Generation,
        city: String,
    },
    FetchForecast {
        generation: Generation,
        coordinates: Coordinates,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayModel {
    snapshot: Option<WeatherSnapshot>,
    forecast: Vec<HourlySample>,
    ui: UiState,
    phase: Phase,
    generation: Generation,
    last_query: Option<String>,
}

impl Default for DisplayModel {
    fn default() -> Self {
        Self {
            snapshot: None,
            forecast: Vec::new(),
            ui: UiState::default(),
            phase: Phase::Idle,
            generation: 0,
            last_query: None,
        }
    }
}

impl DisplayModel {
    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        self.snapshot.as_ref()
    }

    /// Empty unless a snapshot is present.
    pub fn forecast(&self) -> &[HourlySample] {
        if self.snapshot.is_some() {
            &self.forecast
        } else {
            &[]
        }
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// City of the most recent search, as typed.
    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    pub fn map_marker(&self) -> Option<MapMarker> {
        if !self.ui.map_visible {
            return None;
        }
        self.snapshot
            .as_ref()
            .map(|s| MapMarker::new(s.coordinates, s.location_name.clone()))
    }

    pub fn apply(&mut self, event: Event) -> Option<Effect> {
        match event {
            Event::CityInput(text) => {
                self.ui.city_input = text;
                None
            }
            Event::Submit => Some(self.on_submit()),
            Event::WeatherLoaded { generation, result } => {
                self.on_weather_loaded(generation, result)
            }
            Event::ForecastLoaded { generation, result } => {
                self.on_forecast_loaded(generation, result);
                None
            }
        }
    }

    fn on_submit(&mut self) -> Effect {
        self.generation += 1;
        self.phase = Phase::Searching;

        let city = std::mem::take(&mut self.ui.city_input);
        self.last_query = Some(city.clone());

        debug!(generation = self.generation, city = %city, "Search issued");
        Effect::FetchWeather {
            generation: self.generation,
            city,
        }
    }

    fn on_weather_loaded(
        &mut self,
        generation: Generation,
        result: Result<WeatherSnapshot, FetchError>,
    ) -> Option<Effect> {
        if generation != self.generation {
            debug!(
                generation,
                latest = self.generation,
                "Discarding weather result from superseded search"
            );
            return None;
        }

        match result {
            Ok(snapshot) => {
                self.snapshot = Some(snapshot);
                self.forecast.clear();
                self.ui.map_visible = true;
                self.phase = Phase::Shown {
                    forecast: ForecastStatus::Pending,
                };

                // Derived from the stored snapshot, not from the event payload.
                self.snapshot.as_ref().map(|s| Effect::FetchForecast {
                    generation: self.generation,
                    coordinates: s.coordinates,
                })
            }
            Err(err) => {
                warn!(error = %err, query = ?self.last_query, "Weather fetch failed");
                self.snapshot = None;
                self.forecast.clear();
                self.ui.map_visible = false;
                self.phase = Phase::SearchFailed { kind: err.kind() };
                None
            }
        }
    }

    fn on_forecast_loaded(
        &mut self,
        generation: Generation,
        result: Result<Vec<HourlySample>, FetchError>,
    ) {
        let accepting = generation == self.generation
            && self.snapshot.is_some()
            && matches!(self.phase, Phase::Shown { .. });
        if !accepting {
            debug!(
                generation,
                latest = self.generation,
                "Discarding forecast result from superseded search"
            );
            return;
        }

        match result {
            Ok(mut samples) => {
                samples.truncate(HOURLY_SAMPLE_LIMIT);
                self.forecast = samples;
                self.phase = Phase::Shown {
                    forecast: ForecastStatus::Loaded,
                };
            }
            Err(err) => {
                warn!(error = %err, "Hourly forecast fetch failed");
                self.forecast.clear();
                self.phase = Phase::Shown {
                    forecast: ForecastStatus::Failed(err.kind()),
                };
            }
        }
    }
}
