use serde::{Deserialize, Serialize};

/// Point-in-time issue counts for the tracked milestone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub open: u64,
    pub closed: u64,
}

impl Sample {
    pub const fn new(open: u64, closed: u64) -> Self {
        Self { open, closed }
    }
}

impl From<(u64, u64)> for Sample {
    fn from((open, closed): (u64, u64)) -> Self {
        Self::new(open, closed)
    }
}

impl std::fmt::Display for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.open, self.closed)
    }
}
