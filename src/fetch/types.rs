use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Request headers, treated as opaque by the fetcher
pub type Headers = BTreeMap<String, String>;

/// What to do when a page cannot be fetched after retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageErrorPolicy {
    /// Fail the whole fetch on the first page error
    #[default]
    Abort,
    /// Log the page, leave its records out and keep going
    Skip,
}

/// Configuration for batched page fetching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Pages requested concurrently; batches run one after another
    pub batch_size: usize,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Retries for a page after a retryable error
    pub max_retries: u32,

    /// Delay before the first retry, doubled for each further attempt
    pub retry_backoff_ms: u64,

    pub on_page_error: PageErrorPolicy,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            batch_size: 10,
            timeout_secs: 10,
            max_retries: 0,
            retry_backoff_ms: 500,
            on_page_error: PageErrorPolicy::Abort,
        }
    }
}

/// Outcome of a batched fetch
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub table: Table,
    pub requested_pages: u32,
    pub batches: usize,
    /// Pages left out under `PageErrorPolicy::Skip`, ascending
    pub skipped_pages: Vec<u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Connection { url: String, message: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("response from {url} is not valid JSON: {message}")]
    Decode { url: String, message: String },

    #[error("response from {url} has no '{key}' field")]
    MissingKey { url: String, key: String },

    #[error("field '{key}' in response from {url} is not an array")]
    NotAnArray { url: String, key: String },

    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    #[error("failed to build HTTP client: {message}")]
    Client { message: String },
}

impl FetchError {
    /// Timeouts, connection failures, 5xx and 429 are worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Connection { .. } | FetchError::Timeout { .. } => true,
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let status = |status| FetchError::Status {
            url: "u".to_string(),
            status,
        };
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(FetchError::Timeout { url: "u".to_string() }.is_retryable());
        assert!(!FetchError::MissingKey {
            url: "u".to_string(),
            key: "k".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_config_defaults() {
        let config = FetchConfig::default();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.on_page_error, PageErrorPolicy::Abort);
    }
}
