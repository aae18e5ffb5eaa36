use std::env;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::Sample;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_POLL_INTERVAL: u64 = 6 * 60 * 60;
const DEFAULT_MOCK_POLL_INTERVAL: u64 = 5;
const DEFAULT_HISTORY_SIZE: usize = 6;
const DEFAULT_FETCH_TIMEOUT: u64 = 10;
const DEFAULT_API_URL: &str = "https://api.github.com/repos/godotengine/godot/milestones/9";
const DEFAULT_RELEASE: &str = "4.0";

/// Sequence replayed in mock mode when none is configured
pub const DEFAULT_MOCK_SAMPLES: [Sample; 6] = [
    Sample::new(349, 3214),
    Sample::new(350, 3216),
    Sample::new(348, 3218),
    Sample::new(346, 3220),
    Sample::new(350, 3222),
    Sample::new(352, 3224),
];

/// Startup configuration problems; any of these stops the process
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Poll interval must be at least one second")]
    ZeroPollInterval,

    #[error("History size must be at least 1")]
    ZeroHistorySize,

    #[error("Fetch timeout must be at least one second")]
    ZeroFetchTimeout,

    #[error("Mock mode is enabled but the mock sample sequence is empty")]
    EmptyMockSequence,

    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Optional base values loaded from the TOML file named by `GODOTWHEN_CONFIG`
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    port: Option<u16>,
    poll_interval: Option<u64>,
    history_size: Option<usize>,
    mock: Option<bool>,
    mock_samples: Option<Vec<Sample>>,
    api_url: Option<String>,
    fetch_timeout: Option<u64>,
    store_path: Option<PathBuf>,
    release: Option<String>,
    log_level: Option<String>,
}

impl FileConfig {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Seconds between samples
    pub poll_interval: u64,
    pub history_size: NonZeroUsize,
    pub mock: bool,
    pub mock_samples: Vec<Sample>,
    pub api_url: String,
    /// Seconds before a milestone request is abandoned
    pub fetch_timeout: u64,
    pub store_path: Option<PathBuf>,
    pub release: String,
    pub log_level: String,
}

impl Config {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let file = match lookup("GODOTWHEN_CONFIG") {
            Some(path) => FileConfig::load(Path::new(&path))?,
            None => FileConfig::default(),
        };

        let mock = lookup("GODOTWHEN_MOCK").is_some()
            || lookup("MOCK").is_some()
            || file.mock.unwrap_or(false);

        let default_interval = if mock {
            DEFAULT_MOCK_POLL_INTERVAL
        } else {
            DEFAULT_POLL_INTERVAL
        };

        let history_size = parse_var(&lookup, "GODOTWHEN_HISTORY_SIZE")?
            .or(file.history_size)
            .unwrap_or(DEFAULT_HISTORY_SIZE);
        let history_size = NonZeroUsize::new(history_size).ok_or(ConfigError::ZeroHistorySize)?;

        let config = Self {
            // An unusable port is skipped in favour of the next source
            port: lookup("GODOTWHEN_PORT")
                .and_then(|s| s.parse().ok())
                .or_else(|| lookup("PORT").and_then(|s| s.parse().ok()))
                .or(file.port)
                .unwrap_or(DEFAULT_PORT),
            poll_interval: parse_var(&lookup, "GODOTWHEN_POLL_INTERVAL")?
                .or(file.poll_interval)
                .unwrap_or(default_interval),
            history_size,
            mock,
            mock_samples: file
                .mock_samples
                .unwrap_or_else(|| DEFAULT_MOCK_SAMPLES.to_vec()),
            api_url: lookup("GODOTWHEN_API_URL")
                .or(file.api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            fetch_timeout: parse_var(&lookup, "GODOTWHEN_FETCH_TIMEOUT")?
                .or(file.fetch_timeout)
                .unwrap_or(DEFAULT_FETCH_TIMEOUT),
            store_path: lookup("GODOTWHEN_STORE_PATH")
                .map(PathBuf::from)
                .or(file.store_path),
            release: lookup("GODOTWHEN_RELEASE")
                .or(file.release)
                .unwrap_or_else(|| DEFAULT_RELEASE.to_string()),
            log_level: lookup("GODOTWHEN_LOG_LEVEL")
                .or(file.log_level)
                .unwrap_or_else(|| "info".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the forecast engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.fetch_timeout == 0 {
            return Err(ConfigError::ZeroFetchTimeout);
        }
        if self.mock && self.mock_samples.is_empty() {
            return Err(ConfigError::EmptyMockSequence);
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key, value })
        })
        .transpose()
}
