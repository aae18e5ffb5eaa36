mod adapters;
mod application;
mod config;
mod domain;
mod interface;
mod ports;

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adapters::{GithubMilestoneSource, JsonFileStore, MockSource};
use application::{ForecastEngine, ForecastStore, Scheduler};
use config::{Config, ConfigError};
use interface::http::{create_router, handlers::PageInfo};
use ports::{SampleSource, SampleStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("godotwhen={},tower_http=info", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting godotwhen v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", config);

    // Pick the sample source
    let source: Arc<dyn SampleSource> = if config.mock {
        let mock = MockSource::new(config.mock_samples.clone()).ok_or(ConfigError::EmptyMockSequence)?;
        Arc::new(mock)
    } else {
        Arc::new(GithubMilestoneSource::new(config.api_url.clone(), config.fetch_timeout())?)
    };
    info!("✓ Sampling from {}", source.describe());

    // Persistence is optional
    let persistence: Option<Arc<dyn SampleStore>> = match &config.store_path {
        Some(path) => {
            let store = JsonFileStore::new(path, config.history_size);
            info!("✓ Persisting samples to {}", store.path().display());
            Some(Arc::new(store))
        }
        None => {
            info!("GODOTWHEN_STORE_PATH not set, samples will not be persisted");
            None
        }
    };

    let buffer = ForecastEngine::restore_buffer(persistence.as_deref(), config.history_size).await;
    let forecasts = Arc::new(ForecastStore::new(Utc::now()));

    let mut engine = ForecastEngine::new(source, buffer, forecasts, config.poll_interval());
    if let Some(persistence) = persistence {
        engine = engine.with_persistence(persistence);
    }
    let engine = Arc::new(engine);

    info!("Buffer capacity: {}", config.history_size);
    info!("Interval: {}", engine.timespan());
    debug!("Restored history: {:?}", engine.history());

    // Create HTTP server
    let app = create_router(
        engine.forecasts(),
        PageInfo {
            release: config.release.clone(),
            timespan: engine.timespan(),
        },
    );
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let scheduler = Scheduler::new(engine.clone(), config.poll_interval()).start();

    info!("✓ godotwhen listening on {}", addr);
    info!("  → Page: http://localhost:{}", config.port);
    info!("  → API: http://localhost:{}/api/forecast", config.port);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Stop sampling even if the server failed
    info!("Stopping update task");
    if let Err(e) = scheduler.shutdown().await {
        warn!("Update task ended abnormally: {}", e);
    }

    served?;
    info!("Finished run");

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
