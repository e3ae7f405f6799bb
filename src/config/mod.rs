//! Configuration management for the harvester
//!
//! Configuration is loaded from a TOML file (or defaults) and then
//! overridden by `HARVEST_*` environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::crawler::cluster::ExhaustionPolicy;
use crate::utils::retry::{DelayRange, RetryPolicy};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote endpoints and HTTP client settings
    pub api: ApiConfig,

    /// Link expansion settings
    pub crawl: CrawlConfig,

    /// Retry policy for individual fetches
    pub retry: RetryConfig,

    /// Delays used by the sequenced harvest jobs
    pub sequencer: SequencerConfig,

    /// Worker fan-out
    pub workers: WorkersConfig,

    /// Input and output locations
    pub paths: PathsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Remote endpoints and HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the vacancy API
    pub base_url: String,

    /// Base URL of the employer review site
    pub employer_site_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// User agent for API requests
    pub user_agent: String,
}

/// Link expansion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Largest result count a single query can page through
    pub result_cap: u64,

    /// Page size for search requests
    pub per_page: u32,

    /// Area id applied to every role query
    pub area: String,

    /// Professional role ids to expand
    pub professional_roles: Vec<String>,

    /// Pause between two roles in milliseconds
    pub role_delay_ms: u64,

    /// Attempts per search call during expansion
    pub max_attempts: u32,

    /// What to do when every facet is used and the query is still too large
    pub exhaustion: ExhaustionPolicy,
}

/// Retry policy for individual fetches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,
}

/// Delays used by the sequenced harvest jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Attempts per sequenced operation
    pub max_attempts: u32,

    /// Between two search result pages
    pub page_delay_ms: u64,

    /// Between two employer records
    pub employer_delay_ms: u64,

    /// Between two employer page scrapes
    pub employer_page_delay_ms: u64,

    /// Between two page batches of vacancy details
    pub batch_delay_min_ms: u64,
    pub batch_delay_max_ms: u64,
}

/// Worker fan-out
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    /// Number of parallel workers
    pub count: usize,
}

/// Input and output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Newline-delimited `login:pass@host:port` proxy list
    pub proxy_file: PathBuf,

    /// Newline-delimited query URL list
    pub links_file: PathBuf,

    /// Spreadsheet with previously harvested vacancies
    pub employer_source: PathBuf,

    /// Root directory for exported files
    pub output_dir: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl ApiConfig {
    /// Per-request timeout applied by every HTTP session
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://api.hh.ru"),
            employer_site_url: String::from("https://dreamjob.ru"),
            timeout_secs: 30,
            user_agent: format!("harvester/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            result_cap: 2_000,
            per_page: 100,
            area: String::from("113"),
            professional_roles: [
                "156", "160", "12", "150", "25", "165", "34", "36", "73", "155", "164", "104",
                "107", "112", "113", "148", "114", "116", "121", "124", "125", "126",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            role_delay_ms: 5_150,
            max_attempts: 20,
            exhaustion: ExhaustionPolicy::AcceptOversized,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            delay_min_ms: policy.delay.min_ms,
            delay_max_ms: policy.delay.max_ms,
        }
    }
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            page_delay_ms: 2_500,
            employer_delay_ms: 0,
            employer_page_delay_ms: 37_500,
            batch_delay_min_ms: 60_000,
            batch_delay_max_ms: 65_000,
        }
    }
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self { count: 10 }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            proxy_file: PathBuf::from("context/proxy.txt"),
            links_file: PathBuf::from("context/links.txt"),
            employer_source: PathBuf::from("merged_vacs.xlsx"),
            output_dir: PathBuf::from("context"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load from `path` when given, otherwise defaults, then apply the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Load configuration from environment variables over the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Override fields from `HARVEST_*` environment variables
    pub fn apply_env(&mut self) {
        if let Some(url) = env_var("HARVEST_API_URL").or_else(|| env_var("API_HH_URL")) {
            self.api.base_url = url;
        }

        if let Some(url) = env_var("HARVEST_EMPLOYER_SITE_URL") {
            self.api.employer_site_url = url;
        }

        if let Some(count) = env_var("HARVEST_WORKERS").and_then(|v| v.parse().ok()) {
            self.workers.count = count;
        }

        if let Some(dir) = env_var("HARVEST_OUTPUT_DIR") {
            self.paths.output_dir = dir.into();
        }

        if let Some(file) = env_var("HARVEST_PROXY_FILE") {
            self.paths.proxy_file = file.into();
        }

        if let Some(level) = env_var("HARVEST_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(format) = env_var("HARVEST_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.workers.count == 0 {
            anyhow::bail!("workers.count must be greater than 0");
        }

        if self.crawl.result_cap == 0 {
            anyhow::bail!("crawl.result_cap must be greater than 0");
        }

        if self.crawl.per_page == 0 || self.crawl.per_page > 100 {
            anyhow::bail!("crawl.per_page must be between 1 and 100");
        }

        if self.retry.max_attempts == 0 || self.sequencer.max_attempts == 0 {
            anyhow::bail!("max_attempts must be greater than 0");
        }

        url::Url::parse(&self.api.base_url)
            .with_context(|| format!("api.base_url is not a URL: {}", self.api.base_url))?;
        url::Url::parse(&self.api.employer_site_url).with_context(|| {
            format!(
                "api.employer_site_url is not a URL: {}",
                self.api.employer_site_url
            )
        })?;

        Ok(())
    }

    /// Retry policy for single fetches such as vacancy details
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_delay(self.retry.max_attempts, self.retry_delay())
    }

    /// Retry policy for sequenced operations
    #[must_use]
    pub fn sequenced_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_delay(self.sequencer.max_attempts, self.retry_delay())
    }

    /// Retry policy for search calls during link expansion
    #[must_use]
    pub fn crawl_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_delay(self.crawl.max_attempts, self.retry_delay())
    }

    #[must_use]
    pub fn batch_delay(&self) -> DelayRange {
        DelayRange::new(
            self.sequencer.batch_delay_min_ms,
            self.sequencer.batch_delay_max_ms,
        )
    }

    fn retry_delay(&self) -> DelayRange {
        DelayRange::new(self.retry.delay_min_ms, self.retry.delay_max_ms)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
