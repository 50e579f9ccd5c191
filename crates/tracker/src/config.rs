use std::time::Duration;

use ocrdesk_core::error::CoreError;

use crate::poller::DEFAULT_POLL_INTERVAL;

/// Default base URL of the OCR service.
pub const DEFAULT_API_URL: &str = "http://localhost:8101";

/// Default per-request HTTP timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Tracker configuration loaded from environment variables.
///
/// All fields have defaults suitable for a locally running service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Base URL of the OCR service (default: `http://localhost:8101`).
    pub api_url: String,
    /// Period between status poll ticks (default: 3000 ms).
    pub poll_interval: Duration,
    /// HTTP request timeout (default: 30 s).
    pub request_timeout: Duration,
    /// Bearer token sent with every request, if set.
    pub api_token: Option<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            api_token: None,
        }
    }
}

impl TrackerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                    | Default                 |
    /// |----------------------------|-------------------------|
    /// | `OCR_API_URL`              | `http://localhost:8101` |
    /// | `OCR_POLL_INTERVAL_MS`     | `3000`                  |
    /// | `OCR_REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `OCR_API_TOKEN`            | unset                   |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let defaults = Self::default();

        let api_url = lookup("OCR_API_URL")
            .map(|v| v.trim().to_string())
            .unwrap_or(defaults.api_url);
        if api_url.is_empty() {
            return Err(CoreError::Validation(
                "OCR_API_URL must not be empty".to_string(),
            ));
        }

        let poll_interval = match lookup("OCR_POLL_INTERVAL_MS") {
            Some(raw) => Duration::from_millis(parse_positive("OCR_POLL_INTERVAL_MS", &raw)?),
            None => defaults.poll_interval,
        };

        let request_timeout = match lookup("OCR_REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("OCR_REQUEST_TIMEOUT_SECS", &raw)?),
            None => defaults.request_timeout,
        };

        let api_token = lookup("OCR_API_TOKEN").filter(|t| !t.trim().is_empty());

        Ok(Self {
            api_url,
            poll_interval,
            request_timeout,
            api_token,
        })
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64, CoreError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(CoreError::Validation(format!("{key} must be greater than zero"))),
        Ok(value) => Ok(value),
        Err(_) => Err(CoreError::Validation(format!(
            "{key} must be a positive integer, got '{raw}'"
        ))),
    }
}
