pub mod engine;
pub mod forecast_store;
pub mod scheduler;

pub use engine::{ForecastEngine, TickOutcome};
pub use forecast_store::ForecastStore;
pub use scheduler::Scheduler;
