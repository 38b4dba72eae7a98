//! Runtime configuration for the relay

use crate::error::ConfigError;
use reqwest::Url;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.sting9.org";
pub const DEFAULT_MAX_EMAIL_SIZE_MB: u64 = 10;
pub const DEFAULT_RATE_LIMIT_PER_HOUR: u32 = 10;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings shared by the intake handler and the submission client
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the submission API, without the `/api/v1` suffix
    pub api_base_url: String,

    /// Largest raw message accepted, in MiB
    pub max_email_size_mb: u64,

    /// Successful submissions allowed per sender per hour
    pub rate_limit_per_hour: u32,

    /// Retries after the first failed attempt
    pub max_retries: u32,

    /// Timeout of a single HTTP attempt
    pub request_timeout: Duration,

    /// Delay before the first retry, doubled for each later one
    pub retry_base_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            max_email_size_mb: DEFAULT_MAX_EMAIL_SIZE_MB,
            rate_limit_per_hour: DEFAULT_RATE_LIMIT_PER_HOUR,
            max_retries: DEFAULT_MAX_RETRIES,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry_base_delay: Duration::from_secs(1),
        }
    }
}

impl Config {
    /// Config pointing at a different API, defaults elsewhere
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.api_base_url).map_err(|e| ConfigError::BaseUrl {
            url: self.api_base_url.clone(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::BaseUrl {
                url: self.api_base_url.clone(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        if self.max_email_size_mb == 0 {
            return Err(ConfigError::Zero("max_email_size_mb"));
        }
        if self.rate_limit_per_hour == 0 {
            return Err(ConfigError::Zero("rate_limit_per_hour"));
        }

        Ok(())
    }

    /// Size ceiling in bytes, saturating at `u64::MAX`
    #[must_use]
    pub const fn max_email_size_bytes(&self) -> u64 {
        self.max_email_size_mb.saturating_mul(1024 * 1024)
    }

    /// Absolute URL of an API path
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_base_url.trim_end_matches('/'))
    }
}
