use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};

use crate::domain::Forecast;

/// Latest published forecast, shared between the sampler and web handlers.
///
/// The forecast is a small `Copy` value, so a publish is a single write under
/// the lock and a snapshot is a single copy. Readers only ever contend with
/// that write, never with a sampling round.
#[derive(Debug)]
pub struct ForecastStore {
    current: RwLock<Forecast>,
}

impl ForecastStore {
    /// Start out with the unresolved forecast stamped at `started_at`
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            current: RwLock::new(Forecast::unresolved(started_at)),
        }
    }

    pub fn publish(&self, forecast: Forecast) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = forecast;
    }

    pub fn snapshot(&self) -> Forecast {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }
}
