use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::domain::Sample;
use crate::ports::{FetchError, SampleSource};

/// Replays a fixed sequence of samples round-robin, without any network
#[derive(Debug)]
pub struct MockSource {
    samples: Vec<Sample>,
    next: AtomicUsize,
}

impl MockSource {
    /// Returns `None` for an empty sequence
    pub fn new(samples: Vec<Sample>) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        Some(Self {
            samples,
            next: AtomicUsize::new(0),
        })
    }

    fn advance(&self) -> usize {
        let len = self.samples.len();
        // The closure always returns Some, so both arms carry the previous index
        match self
            .next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |i| Some((i + 1) % len))
        {
            Ok(index) | Err(index) => index,
        }
    }
}

#[async_trait]
impl SampleSource for MockSource {
    async fn fetch(&self) -> Result<Sample, FetchError> {
        Ok(self.samples[self.advance()])
    }

    fn describe(&self) -> String {
        format!("mock ({} samples)", self.samples.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sequence_is_rejected() {
        assert!(MockSource::new(Vec::new()).is_none());
    }

    #[tokio::test]
    async fn test_round_robin() {
        let source = MockSource::new(vec![Sample::new(3, 1), Sample::new(2, 2)]).unwrap();

        let mut fetched = Vec::new();
        for _ in 0..5 {
            fetched.push(source.fetch().await.unwrap());
        }

        assert_eq!(
            fetched,
            vec![
                Sample::new(3, 1),
                Sample::new(2, 2),
                Sample::new(3, 1),
                Sample::new(2, 2),
                Sample::new(3, 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_single_sample_repeats() {
        let source = MockSource::new(vec![Sample::new(7, 7)]).unwrap();

        assert_eq!(source.fetch().await.unwrap(), Sample::new(7, 7));
        assert_eq!(source.fetch().await.unwrap(), Sample::new(7, 7));
    }
}
