//! Run configuration.
//!
//! Layered as defaults, then an optional JSON file, then environment and
//! command line overrides applied by the CLI.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::download::{RetryPolicy, MAX_ATTEMPTS};
use crate::error::PipelineError;

pub const DEFAULT_BASE_URL: &str = "https://www.ncei.noaa.gov/data/global-summary-of-the-day/archive";
pub const DEFAULT_DATA_DIR: &str = "./local_data/global-summary-of-the-day-archive";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_secs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Archive listing page; archives are fetched from `{base_url}/{name}`.
    pub base_url: String,
    pub data_dir: PathBuf,
    pub retry: RetryConfig,
    pub connect_timeout_secs: u64,
    /// Longest wait for a response or the next body chunk.
    pub stall_timeout_secs: u64,
    pub write_parquet: bool,
    /// Years to process. Empty means every year in the listing.
    pub years: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            retry: RetryConfig::default(),
            connect_timeout_secs: 30,
            stall_timeout_secs: 120,
            write_parquet: false,
            years: Vec::new(),
        }
    }
}

impl Config {
    /// `~/.config/gsod-sync/config.json` on Linux.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gsod-sync").join("config.json"))
    }

    /// Reads `path` if given, otherwise the default path if it exists,
    /// otherwise the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let default_path = Self::default_config_path().filter(|p| p.exists());

        let Some(path) = path.or(default_path.as_deref()) else {
            debug!("No config file, using defaults");
            return Ok(Config::default());
        };

        debug!(path = %path.display(), "Loading config file");
        let text = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;

        serde_json::from_str(&text).map_err(|e| {
            PipelineError::Config(format!("cannot parse '{}': {}", path.display(), e))
        })
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.base_url.trim().is_empty() {
            return Err(PipelineError::Config("base_url is empty".to_string()));
        }
        if !(1..=MAX_ATTEMPTS).contains(&self.retry.max_attempts) {
            return Err(PipelineError::Config(format!(
                "retry.max_attempts must be between 1 and {}, got {}",
                MAX_ATTEMPTS, self.retry.max_attempts
            )));
        }
        if self.stall_timeout_secs == 0 {
            return Err(PipelineError::Config(
                "stall_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_secs(self.retry.delay_secs),
        )
    }

    pub fn build_client(&self) -> Result<reqwest::Client, PipelineError> {
        reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PipelineError::Config(format!("cannot build HTTP client: {}", e)))
    }
}

// -- Tests -------------------------------------------------------------------
