use std::io::ErrorKind;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::Sample;
use crate::ports::{SampleStore, StoreError};

/// Sample store backed by a JSON array on disk, oldest sample first
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    capacity: NonZeroUsize,
    // Serialises read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, capacity: NonZeroUsize) -> Self {
        Self {
            path: path.into(),
            capacity,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Vec<Sample>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
                path: self.path.clone(),
                source,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(StoreError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    async fn write(&self, samples: &[Sample]) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec_pretty(samples)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        // Write beside the target and rename so readers never see a torn file
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, encoded)
            .await
            .map_err(|source| StoreError::Write {
                path: tmp.clone(),
                source,
            })?;

        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

#[async_trait]
impl SampleStore for JsonFileStore {
    async fn store(&self, sample: Sample) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut samples = self.read().await?;

        let capacity = self.capacity.get();
        if samples.len() >= capacity {
            let excess = samples.len() + 1 - capacity;
            samples.drain(..excess);
        }

        samples.push(sample);
        self.write(&samples).await
    }

    async fn fetch_all(&self) -> Result<Vec<Sample>, StoreError> {
        let _guard = self.lock.lock().await;
        self.read().await
    }
}
