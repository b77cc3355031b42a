//! Thin JSON-over-HTTP client used by every polling concern.

use error_stack::Report;
use error_stack::ResultExt;
use reqwest::header;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::CommError;
use crate::error::CommResult;

/// JSON GET client with cache-bypassing defaults.
///
/// Every request carries `Cache-Control: no-store` since the data is
/// time-sensitive; responses are JSON and nothing else.
pub struct JsonClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl JsonClient {
    /// create client
    pub fn new(config: &ClientConfig) -> CommResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CACHE_CONTROL,
            header::HeaderValue::from_static("no-store"),
        );
        headers.insert(header::PRAGMA, header::HeaderValue::from_static("no-cache"));

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .change_context(CommError::Configuration {
                message: "Failed to create HTTP client".into(),
            })?;

        let base_url = Url::parse(&config.base_url).change_context(CommError::Configuration {
            message: format!("Invalid base URL: {}", config.base_url),
        })?;

        debug!(base_url = %base_url, "JSON client created");

        Ok(Self {
            http,
            base_url,
            timeout_secs: config.request_timeout.as_secs(),
        })
    }

    /// Base URL this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build a URL from path segments; each segment is percent-encoded.
    pub fn url_for(&self, segments: &[&str]) -> CommResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                Report::new(CommError::Configuration {
                    message: format!("Base URL cannot carry a path: {}", self.base_url),
                })
            })?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    /// GET the given path and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> CommResult<T> {
        let url = self.url_for(segments)?;
        let response = self.send(url.clone()).await?;
        response
            .json::<T>()
            .await
            .change_context(CommError::Serialization {
                message: format!("Failed to decode response from {url}"),
            })
    }

    /// GET the given path and only check for a success status.
    pub async fn get_ok(&self, segments: &[&str]) -> CommResult<()> {
        let url = self.url_for(segments)?;
        self.send(url).await.map(|_| ())
    }

    async fn send(&self, url: Url) -> CommResult<reqwest::Response> {
        let response = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                Report::new(CommError::Timeout {
                    seconds: self.timeout_secs,
                })
            } else {
                Report::new(CommError::Network {
                    message: e.to_string(),
                })
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Report::new(CommError::Http {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unrecognized status")
                    .to_string(),
            }));
        }
        Ok(response)
    }
}
