use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::application::ForecastStore;
use crate::domain::{format_duration, Forecast, Sample, SampleBuffer};
use crate::ports::{SampleSource, SampleStore};

/// What a single sampling round did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The source failed; nothing changed
    Skipped,
    /// A sample was buffered but the window is too short for a trend
    Buffered { size: usize },
    /// A sample was buffered and a new forecast published
    Published(Forecast),
}

/// Owns the sample history and turns fresh samples into published forecasts
pub struct ForecastEngine {
    source: Arc<dyn SampleSource>,
    persistence: Option<Arc<dyn SampleStore>>,
    buffer: Mutex<SampleBuffer>,
    forecasts: Arc<ForecastStore>,
    cadence: Duration,
}

impl ForecastEngine {
    pub fn new(
        source: Arc<dyn SampleSource>,
        buffer: SampleBuffer,
        forecasts: Arc<ForecastStore>,
        cadence: Duration,
    ) -> Self {
        Self {
            source,
            persistence: None,
            buffer: Mutex::new(buffer),
            forecasts,
            cadence,
        }
    }

    pub fn with_persistence(mut self, persistence: Arc<dyn SampleStore>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Rebuild the sample window from the persistent store.
    ///
    /// Persistence is best effort: an unreadable store yields an empty window.
    pub async fn restore_buffer(
        persistence: Option<&dyn SampleStore>,
        capacity: NonZeroUsize,
    ) -> SampleBuffer {
        let Some(store) = persistence else {
            return SampleBuffer::new(capacity);
        };

        match store.fetch_all().await {
            Ok(samples) => {
                let buffer = SampleBuffer::rehydrate(capacity, samples);
                info!("Restored {} samples from store (capacity {})", buffer.size(), buffer.capacity());
                buffer
            }
            Err(e) => {
                warn!("Failed to restore samples: {}. Starting with an empty history.", e);
                SampleBuffer::new(capacity)
            }
        }
    }

    pub fn forecasts(&self) -> Arc<ForecastStore> {
        Arc::clone(&self.forecasts)
    }

    pub fn history(&self) -> Vec<Sample> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner).snapshot()
    }

    /// Run one sampling round: fetch, buffer, forecast, persist
    pub async fn tick(&self) -> TickOutcome {
        debug!("Updating prediction from {}", self.source.describe());

        let sample = match self.source.fetch().await {
            Ok(sample) => sample,
            Err(e) => {
                warn!("Get milestone error: {}", e);
                return TickOutcome::Skipped;
            }
        };

        info!("Got milestone data: {}", sample);
        let outcome = self.record(sample, Utc::now());

        if let Some(persistence) = &self.persistence {
            if let Err(e) = persistence.store(sample).await {
                warn!("Failed to persist sample {}: {}", sample, e);
            }
        }

        outcome
    }

    /// Append and republish under one lock so rounds never interleave
    fn record(&self, sample: Sample, timestamp: DateTime<Utc>) -> TickOutcome {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.append(sample);

        let size = buffer.size();
        info!("Buffer size: {}", size);
        if size < 2 {
            return TickOutcome::Buffered { size };
        }

        let forecast = Forecast::compute(&buffer.snapshot(), self.cadence, timestamp);
        let rates = forecast.issue_rates;
        info!(
            "Diffs: {}, {}, {}",
            rates.closed.abs_diff(rates.opened),
            rates.opened,
            rates.closed
        );
        info!("Time: {}", forecast.estimate_label());
        if forecast.is_resolved() {
            info!("Date: {}", forecast.date_label());
        }

        self.forecasts.publish(forecast);
        TickOutcome::Published(forecast)
    }

    /// Sampling cadence, formatted for humans
    pub fn timespan(&self) -> String {
        format_duration(self.cadence.as_secs())
    }
}
