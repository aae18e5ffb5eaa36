use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time;
use tracing::{debug, info};

use crate::application::{ForecastEngine, TickOutcome};

/// How often the scheduler wakes to advance its tick counter
pub const DEFAULT_WAKE_PERIOD: Duration = Duration::from_secs(1);

/// Drives the engine on a fixed cadence from a background task.
///
/// The task wakes on a repeating timer every `wake_period` and counts wakes;
/// a sampling round runs whenever the counter is zero, and the counter wraps
/// back to zero once a full cadence has elapsed. Because the timer period is
/// fixed, time spent inside a round does not push later rounds back.
pub struct Scheduler {
    engine: Arc<ForecastEngine>,
    cadence: Duration,
    wake_period: Duration,
}

impl Scheduler {
    pub fn new(engine: Arc<ForecastEngine>, cadence: Duration) -> Self {
        Self {
            engine,
            cadence,
            wake_period: DEFAULT_WAKE_PERIOD,
        }
    }

    /// Number of wakes in one cadence, never less than one
    fn wakes_per_round(&self) -> u64 {
        let wake = self.wake_period.as_millis().max(1);
        (self.cadence.as_millis() / wake).max(1) as u64
    }

    /// Spawn the sampling loop. Consumes the scheduler so it starts once.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(shutdown_rx));

        SchedulerHandle { shutdown_tx, task }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("Start update task");

        let wakes_per_round = self.wakes_per_round();
        let mut ticker = time::interval(self.wake_period);
        let mut counter = 0u64;

        loop {
            tokio::select! {
                biased;
                // Also fires if the handle was dropped without a signal
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }

            if counter == 0 {
                match self.engine.tick().await {
                    TickOutcome::Skipped => debug!("No sample this round"),
                    TickOutcome::Buffered { size } => {
                        debug!("Waiting for a trend ({} sample buffered)", size)
                    }
                    TickOutcome::Published(forecast) => {
                        debug!("Published forecast: {}", forecast.date_label())
                    }
                }
            }

            counter += 1;
            if counter == wakes_per_round {
                counter = 0;
            }
        }

        info!("End update task");
    }
}

/// Stop signal and join handle for a running scheduler
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Ask the loop to stop and wait for it. A round already in progress
    /// runs to completion first.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        // The receiver only goes away once the task has ended
        let _ = self.shutdown_tx.send(true);
        self.task.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MockSource;
    use crate::application::ForecastStore;
    use crate::domain::{Sample, SampleBuffer};
    use crate::ports::{FetchError, SampleSource};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::num::NonZeroUsize;

    const CADENCE: Duration = Duration::from_secs(60);

    fn engine_with(source: Arc<dyn SampleSource>, capacity: usize) -> Arc<ForecastEngine> {
        let forecasts = Arc::new(ForecastStore::new(Utc::now()));
        Arc::new(ForecastEngine::new(
            source,
            SampleBuffer::new(NonZeroUsize::new(capacity).unwrap()),
            forecasts,
            CADENCE,
        ))
    }

    fn scenario_engine() -> Arc<ForecastEngine> {
        let mock = MockSource::new(vec![
            Sample::new(100, 10),
            Sample::new(90, 20),
            Sample::new(80, 30),
        ])
        .unwrap();
        engine_with(Arc::new(mock), 3)
    }

    /// Takes ten seconds to answer
    struct SlowSource;

    #[async_trait]
    impl SampleSource for SlowSource {
        async fn fetch(&self) -> Result<Sample, FetchError> {
            time::sleep(Duration::from_secs(10)).await;
            Ok(Sample::new(1, 1))
        }

        fn describe(&self) -> String {
            "slow".to_string()
        }
    }

    /// Records when each fetch starts, then takes 25 seconds to answer
    struct TimedSource {
        origin: time::Instant,
        starts: std::sync::Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl SampleSource for TimedSource {
        async fn fetch(&self) -> Result<Sample, FetchError> {
            let elapsed = time::Instant::now().duration_since(self.origin).as_secs();
            self.starts.lock().unwrap().push(elapsed);
            time::sleep(Duration::from_secs(25)).await;
            Ok(Sample::new(1, 1))
        }

        fn describe(&self) -> String {
            "timed".to_string()
        }
    }

    #[test]
    fn test_wakes_per_round() {
        let engine = scenario_engine();

        assert_eq!(Scheduler::new(engine.clone(), CADENCE).wakes_per_round(), 60);
        let coarse = Scheduler {
            engine: engine.clone(),
            cadence: Duration::from_secs(90),
            wake_period: Duration::from_secs(5),
        };
        assert_eq!(coarse.wakes_per_round(), 18);
        assert_eq!(
            Scheduler::new(engine, Duration::from_millis(500)).wakes_per_round(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_samples_once_per_cadence() {
        let engine = scenario_engine();
        let handle = Scheduler::new(engine.clone(), CADENCE).start();

        // Rounds at t = 0, 60 and 120
        time::sleep(Duration::from_secs(150)).await;
        handle.shutdown().await.unwrap();

        assert_eq!(
            engine.history(),
            vec![Sample::new(100, 10), Sample::new(90, 20), Sample::new(80, 30)]
        );
        let forecast = engine.forecasts().snapshot();
        assert_eq!(forecast.issue_rates.opened, 6);
        assert_eq!(forecast.issue_rates.closed, 6);
        assert!(!forecast.is_resolved());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_rounds_keep_cadence() {
        let source = Arc::new(TimedSource {
            origin: time::Instant::now(),
            starts: std::sync::Mutex::new(Vec::new()),
        });
        let engine = engine_with(source.clone(), 3);
        let handle = Scheduler::new(engine, CADENCE).start();

        time::sleep(Duration::from_secs(250)).await;
        handle.shutdown().await.unwrap();

        assert_eq!(*source.starts.lock().unwrap(), vec![0, 60, 120, 180, 240]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_rounds_after_shutdown() {
        let engine = scenario_engine();
        let handle = Scheduler::new(engine.clone(), CADENCE).start();

        time::sleep(Duration::from_secs(30)).await;
        handle.shutdown().await.unwrap();
        time::sleep(Duration::from_secs(300)).await;

        assert_eq!(engine.history(), vec![Sample::new(100, 10)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_round_completes_before_exit() {
        let engine = engine_with(Arc::new(SlowSource), 3);
        let handle = Scheduler::new(engine.clone(), CADENCE).start();

        // The first round is still waiting on the source
        time::sleep(Duration::from_secs(5)).await;
        assert!(engine.history().is_empty());

        handle.shutdown().await.unwrap();
        assert_eq!(engine.history(), vec![Sample::new(1, 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_stops_loop() {
        let engine = scenario_engine();
        let SchedulerHandle { shutdown_tx, task } = Scheduler::new(engine.clone(), CADENCE).start();

        time::sleep(Duration::from_secs(1)).await;
        drop(shutdown_tx);
        task.await.unwrap();

        assert_eq!(engine.history().len(), 1);
    }
}
