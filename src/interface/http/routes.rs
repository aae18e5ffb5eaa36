use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::application::ForecastStore;

use super::handlers::{
    date_handler, forecast_handler, health_handler, index_handler, AppState, PageInfo,
};

pub fn create_router(forecasts: Arc<ForecastStore>, page: PageInfo) -> Router {
    let state = AppState {
        forecasts,
        page: Arc::new(page),
        views: Arc::new(AtomicUsize::new(0)),
    };

    Router::new()
        // Pages
        .route("/", get(index_handler))
        .route("/date", get(date_handler))
        // API routes
        .route("/api/health", get(health_handler))
        .route("/api/forecast", get(forecast_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
