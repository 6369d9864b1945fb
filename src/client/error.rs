//! Error types for the GitHub client

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("GitHub API error (HTTP {status}): {message}")]
    GithubApi { status: u16, message: CompactString },

    #[error("Authentication failed, check the GitHub token")]
    Authentication,

    #[error("Rate limit exceeded")]
    RateLimit { reset_at: Option<DateTime<Utc>> },

    #[error("Not found: {resource}")]
    NotFound { resource: CompactString },

    #[error("Response from {endpoint} has no `{field}` field")]
    MissingField { endpoint: CompactString, field: &'static str },

    #[error("Invalid URL: {url}")]
    InvalidUrl { url: CompactString },

    #[error("Configuration error: {0}")]
    Config(CompactString),

    #[error("Invalid {field}: {message}")]
    ConfigValidation { field: CompactString, message: CompactString },
}

impl ClientError {
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() { Self::Timeout } else { Self::Http(e) }
    }

    pub fn github_api(status: u16, message: impl Into<CompactString>) -> Self {
        Self::GithubApi { status, message: message.into() }
    }

    pub fn rate_limit(reset_at: Option<DateTime<Utc>>) -> Self {
        Self::RateLimit { reset_at }
    }

    pub fn not_found(resource: impl Into<CompactString>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    pub fn missing_field(endpoint: impl Into<CompactString>, field: &'static str) -> Self {
        Self::MissingField { endpoint: endpoint.into(), field }
    }

    pub fn config(message: impl Into<CompactString>) -> Self {
        Self::Config(message.into())
    }

    pub fn config_validation(
        field: impl Into<CompactString>,
        message: impl Into<CompactString>,
    ) -> Self {
        Self::ConfigValidation { field: field.into(), message: message.into() }
    }

    /// Whether the next poll cycle has a reasonable chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Http(_) | ClientError::Timeout | ClientError::RateLimit { .. } => true,
            ClientError::GithubApi { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
