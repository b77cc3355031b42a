//! client config
//!
//! This config is shared by the JSON client, the pollers and the one-shot
//! retry helper.

use std::time::Duration;

/// HTTP polling client config.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// backend base url
    pub base_url: String,
    /// HTTP request timeout
    pub request_timeout: Duration,
    /// default poll interval
    pub poll_interval: Duration,
    /// max attempts for one-shot operations
    pub max_retries: u32,
    /// initial retry delay
    pub retry_delay: Duration,
    /// max retry delay
    pub max_retry_delay: Duration,
}

impl ClientConfig {
    /// create new client config with default parameters.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(2500),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            max_retry_delay: Duration::from_secs(30),
        }
    }

    /// set request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// set poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// set retry_config
    pub fn with_retry_config(
        mut self,
        max_retries: u32,
        base_delay: Duration,
        max_delay: Duration,
    ) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = base_delay;
        self.max_retry_delay = max_delay;
        self
    }
}
