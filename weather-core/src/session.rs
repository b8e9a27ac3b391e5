use std::{collections::HashMap, sync::Arc};

use tokio::task::{self, JoinSet};
use tracing::error;

use crate::{
    error::FetchError,
    provider::WeatherProvider,
    state::{DisplayModel, Effect, Event, Generation},
};

/// What a spawned task was fetching, so a task that dies still reports back.
#[derive(Debug, Clone, Copy)]
enum InFlight {
    Weather(Generation),
    Forecast(Generation),
}

impl InFlight {
    fn of(effect: &Effect) -> Self {
        match effect {
            Effect::FetchWeather { generation, .. } => Self::Weather(*generation),
            Effect::FetchForecast { generation, .. } => Self::Forecast(*generation),
        }
    }

    fn failed(self, err: FetchError) -> Event {
        match self {
            Self::Weather(generation) => Event::WeatherLoaded {
                generation,
                result: Err(err),
            },
            Self::Forecast(generation) => Event::ForecastLoaded {
                generation,
                result: Err(err),
            },
        }
    }
}

/// Owns the display model and runs the effects it asks for.
///
/// Fetches run on spawned tasks so several can be in flight at once; their
/// results are applied one at a time, in completion order, by whoever drives
/// [`Session::next`].
#[derive(Debug)]
pub struct Session {
    provider: Arc<dyn WeatherProvider>,
    model: DisplayModel,
    tasks: JoinSet<Event>,
    in_flight: HashMap<task::Id, InFlight>,
}

impl Session {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self {
            provider,
            model: DisplayModel::default(),
            tasks: JoinSet::new(),
            in_flight: HashMap::new(),
        }
    }

    pub fn model(&self) -> &DisplayModel {
        &self.model
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.dispatch(Event::CityInput(text.into()));
    }

    /// Issue a search without waiting for it.
    pub fn submit(&mut self, city: impl Into<String>) {
        self.set_input(city);
        self.dispatch(Event::Submit);
    }

    /// Apply the next completed fetch. Returns `false` once nothing is in flight.
    ///
    /// A task that panicked is applied as a network failure for its search.
    pub async fn next(&mut self) -> bool {
        let Some(joined) = self.tasks.join_next_with_id().await else {
            return false;
        };

        let event = match joined {
            Ok((id, event)) => {
                self.in_flight.remove(&id);
                event
            }
            Err(err) => {
                error!(error = %err, "Fetch task did not complete");
                let Some(fetch) = self.in_flight.remove(&err.id()) else {
                    return true;
                };
                fetch.failed(FetchError::Network(err.to_string()))
            }
        };
        self.dispatch(event);
        true
    }

    /// Drive until every fetch, including follow-up forecasts, has landed.
    pub async fn settle(&mut self) {
        while self.next().await {}
    }

    pub async fn search(&mut self, city: impl Into<String>) -> &DisplayModel {
        self.submit(city);
        self.settle().await;
        &self.model
    }

    fn dispatch(&mut self, event: Event) {
        if let Some(effect) = self.model.apply(event) {
            self.spawn(effect);
        }
    }

    fn spawn(&mut self, effect: Effect) {
        let provider = Arc::clone(&self.provider);
        let fetch = InFlight::of(&effect);

        let handle = self.tasks.spawn(async move {
            match effect {
                Effect::FetchWeather { generation, city } => Event::WeatherLoaded {
                    generation,
                    result: provider.fetch_current_weather(&city).await,
                },
                Effect::FetchForecast {
                    generation,
                    coordinates,
                } => Event::ForecastLoaded {
                    generation,
                    result: provider.fetch_hourly_forecast(coordinates).await,
                },
            }
        });
        self.in_flight.insert(handle.id(), fetch);
    }
}
