//! HTTP polling library.
//!
//! This library provides a generic framework for keeping an
//! eventually-consistent local view of remote HTTP resources. It abstracts
//! the common pattern where:
//!
//! - Each concern polls its endpoint on an independent fixed cadence
//! - A failed tick records its error but keeps the previous data visible
//! - Out-of-order responses are discarded by a per-request sequence number
//! - Teardown cancels the timers and abandons in-flight requests
//!
//! # Features
//!
//! - Generic snapshot type per concern
//! - Cache-bypassing JSON GET client
//! - Cancellation-aware poll loops
//! - One-shot retry helper with exponential backoff
//! - Structured error handling with context
//!
//! # Examples
//!
//! ```no_run
//! # use std::time::Duration;
//! # use http_poll_comm::{ClientConfig, JsonClient, Poller};
//! # use tokio_util::sync::CancellationToken;
//! # use serde::Deserialize;
//! #
//! # #[derive(Debug, Clone, Deserialize)]
//! # struct Reading {
//! #     value: f64,
//! # }
//! #
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("http://localhost:8000");
//! let client = std::sync::Arc::new(JsonClient::new(&config)?);
//! let poller = Poller::<Vec<Reading>>::new("readings", Duration::from_millis(2500));
//! let token = CancellationToken::new();
//!
//! let fetch_client = client.clone();
//! poller
//!     .run(move || {
//!         let client = fetch_client.clone();
//!         async move { client.get_json(&["readings"]).await }
//!     }, token)
//!     .await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod poller;
pub mod retry;
pub mod types;

pub use client::JsonClient;
pub use config::ClientConfig;
pub use error::CommError;
pub use error::CommResult;
pub use poller::Poller;
pub use retry::retry_with_backoff;
pub use types::PollState;
pub use types::Snapshot;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use similar_asserts::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn create_client_config() {
        let config = ClientConfig::new("http://localhost:8000")
            .with_poll_interval(Duration::from_millis(500))
            .with_request_timeout(Duration::from_secs(5));

        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(1));
    }

    #[test]
    fn client_creation() {
        let config = ClientConfig::new("http://localhost:8000");
        let client = JsonClient::new(&config);

        assert!(client.is_ok());
    }

    #[test]
    fn client_rejects_invalid_base_url() {
        let config = ClientConfig::new("not a url");
        let client = JsonClient::new(&config);

        assert!(client.is_err(), "garbage base URL should be rejected");
    }

    #[test]
    fn url_building_encodes_segments() {
        let config = ClientConfig::new("http://localhost:8000");
        let client = JsonClient::new(&config).expect("client should build");

        let url = client
            .url_for(&["feeders", "F 12", "state"])
            .expect("url should build");
        assert_eq!(url.as_str(), "http://localhost:8000/feeders/F%2012/state");

        let root = client.url_for(&[]).expect("root url should build");
        assert_eq!(root.as_str(), "http://localhost:8000/");
    }

    #[test]
    fn poll_state_keeps_stale_data_on_failure() {
        let mut state = PollState::<u32>::default();

        assert!(state.apply_success(1, 7));
        assert_eq!(state.data(), Some(&7));
        assert_eq!(state.last_error(), None);

        state.apply_failure(2, "backend unreachable");
        assert_eq!(
            state.data(),
            Some(&7),
            "a failed tick must not discard the previous snapshot"
        );
        assert_eq!(state.last_error(), Some("backend unreachable"));

        assert!(state.apply_success(3, 9));
        assert_eq!(state.data(), Some(&9));
        assert_eq!(state.last_error(), None, "a success clears the error");
    }

    #[test]
    fn poll_state_discards_out_of_order_responses() {
        let mut state = PollState::<u32>::default();

        assert!(state.apply_success(5, 50));
        assert!(
            !state.apply_success(3, 30),
            "a response older than the last applied one must be dropped"
        );
        assert_eq!(state.data(), Some(&50));
        assert_eq!(state.stale_drops(), 1);

        assert!(
            !state.apply_failure(2, "late failure"),
            "a stale failure must not overwrite the error state"
        );
        assert_eq!(state.last_error(), None);
    }

    #[test]
    fn error_messages_carry_context() {
        let error = CommError::Http {
            status: 503,
            message: "Service Unavailable".into(),
        };
        assert!(error.to_string().contains("503"));

        let network = CommError::Network {
            message: "connection refused".into(),
        };
        assert!(network.to_string().contains("connection refused"));
    }
}
