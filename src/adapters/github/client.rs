use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;

use crate::domain::Sample;
use crate::ports::{FetchError, SampleSource};

/// Subset of the milestone object returned by the GitHub REST API
#[derive(Debug, Deserialize)]
struct MilestoneStats {
    open_issues: u64,
    closed_issues: u64,
}

/// Sample source reading a milestone's issue counts over HTTP
#[derive(Debug, Clone)]
pub struct GithubMilestoneSource {
    client: Client,
    url: String,
}

impl GithubMilestoneSource {
    /// Build a source for `url`; every request is bounded by `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            // GitHub rejects requests without a user agent
            .user_agent(format!("godotwhen/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    fn parse_stats(body: &[u8]) -> Result<Sample, FetchError> {
        let stats: MilestoneStats = serde_json::from_slice(body)?;
        Ok(Sample::new(stats.open_issues, stats.closed_issues))
    }
}

#[async_trait]
impl SampleSource for GithubMilestoneSource {
    async fn fetch(&self) -> Result<Sample, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        Self::parse_stats(&body)
    }

    fn describe(&self) -> String {
        format!("remote ({})", self.url)
    }
}
