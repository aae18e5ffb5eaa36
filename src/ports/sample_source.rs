use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Sample;

/// Reasons a sampling attempt produced no sample
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned status {status}")]
    Status { status: u16 },

    #[error("Malformed milestone payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Port for taking one reading of the milestone's issue counts
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Fetch the current open/closed counts
    async fn fetch(&self) -> Result<Sample, FetchError>;

    /// Short name for logs
    fn describe(&self) -> String;
}
