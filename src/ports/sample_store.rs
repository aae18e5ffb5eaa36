use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Sample;

/// Errors raised by a persistent sample store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read sample store '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write sample store '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to decode sample store '{path}': {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to encode samples: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Port for persisting samples across restarts.
///
/// Implementations keep at most as many samples as the in-memory buffer and
/// return them in insertion order.
#[async_trait]
pub trait SampleStore: Send + Sync {
    /// Append one sample, dropping the oldest ones past the retention bound
    async fn store(&self, sample: Sample) -> Result<(), StoreError>;

    /// All retained samples, oldest first
    async fn fetch_all(&self) -> Result<Vec<Sample>, StoreError>;
}
