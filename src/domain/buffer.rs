use std::collections::VecDeque;
use std::num::NonZeroUsize;

use super::Sample;

/// Sliding window over the most recent samples, oldest first
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<Sample>,
    capacity: NonZeroUsize,
}

impl SampleBuffer {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.get()),
            capacity,
        }
    }

    /// Build a buffer from previously persisted samples, keeping the newest
    /// `capacity` of them.
    pub fn rehydrate(capacity: NonZeroUsize, persisted: impl IntoIterator<Item = Sample>) -> Self {
        let mut buffer = Self::new(capacity);
        for sample in persisted {
            buffer.append(sample);
        }
        buffer
    }

    pub fn append(&mut self, sample: Sample) {
        if self.samples.len() >= self.capacity.get() {
            self.samples.pop_front();
        }

        self.samples.push_back(sample);
    }

    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    pub fn size(&self) -> usize {
        self.samples.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}
