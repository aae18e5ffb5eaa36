pub mod sample_source;
pub mod sample_store;

pub use sample_source::{FetchError, SampleSource};
pub use sample_store::{SampleStore, StoreError};
