//! Connection and polling settings for the GitHub client

use std::time::Duration;

use compact_str::CompactString;

use super::error::{ClientError, Result};
use crate::config::MergeBellConfig;

/// Default GitHub API root
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Everything [`GithubApi`](super::GithubApi) needs to talk to GitHub
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, `https://api.github.com` or a GitHub Enterprise `/api/v3`
    pub base_url: CompactString,
    /// Personal access token, sent verbatim
    pub private_token: CompactString,
    pub polling: PollingConfig,
    pub request: RequestConfig,
}

/// Polling cadence and per-cycle work bound
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Delay between poll cycles
    pub interval: Duration,
    /// Most feed pages fetched in one cycle
    pub max_pages: u32,
}

/// Per-request HTTP settings
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Request timeout, the only deadline a poll cycle has
    pub timeout: Duration,
    /// User-Agent header value, required by GitHub
    pub user_agent: CompactString,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            max_pages: 4,
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("merge-bell/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl ClientConfig {
    pub fn new(
        base_url: impl Into<CompactString>,
        private_token: impl Into<CompactString>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            private_token: private_token.into(),
            polling: PollingConfig::default(),
            request: RequestConfig::default(),
        }
    }

    /// Rejects settings that would make every request fail
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ClientError::config_validation(
                "github_url",
                "Base URL cannot be empty",
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::config_validation(
                "github_url",
                "Base URL must start with http:// or https://",
            ));
        }

        if url::Url::parse(&self.base_url).is_err() {
            return Err(ClientError::InvalidUrl { url: self.base_url.clone() });
        }

        if self.private_token.trim().is_empty() {
            return Err(ClientError::config_validation(
                "github_token",
                "GitHub token cannot be empty",
            ));
        }

        if self.polling.interval.is_zero() {
            return Err(ClientError::config_validation(
                "poll_interval_secs",
                "Poll interval must be greater than zero",
            ));
        }

        if self.polling.max_pages == 0 {
            return Err(ClientError::config_validation(
                "max_pages",
                "At least one page must be fetched per cycle",
            ));
        }

        if self.request.timeout.is_zero() {
            return Err(ClientError::config_validation(
                "request_timeout_secs",
                "Timeout must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Base URL without a trailing slash, ready for path concatenation
    pub fn api_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl From<&MergeBellConfig> for ClientConfig {
    fn from(config: &MergeBellConfig) -> Self {
        Self::new(config.github_url.clone(), config.github_token.clone())
            .with_polling(PollingConfig {
                interval: Duration::from_secs(config.poll_interval_secs),
                max_pages: config.max_pages,
            })
            .with_timeout(Duration::from_secs(config.request_timeout_secs))
    }
}

impl ClientConfig {
    pub fn with_polling(mut self, polling: PollingConfig) -> Self {
        self.polling = polling;
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = timeout;
        self
    }
}
