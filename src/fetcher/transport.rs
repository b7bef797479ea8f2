//! Blocking HTTP transport

use crate::config::schema::HttpConfig;
use crate::error::{FetchError, FetchResult};
use std::io::Read;
use std::time::Duration;
use tracing::debug;

/// An open response body
pub struct Download {
    /// Size announced by the server, if any
    pub content_length: Option<u64>,
    /// Response body
    pub body: Box<dyn Read>,
}

/// HTTP GET abstraction so the fetcher can run against canned responses
pub trait Transport {
    /// Issue a GET. Connection failures and non-success statuses are
    /// `FetchError::Download`.
    fn get(&self, url: &str) -> FetchResult<Download>;
}

/// `ureq` backed transport
pub struct UreqTransport {
    agent: ureq::Agent,
    user_agent: String,
}

impl UreqTransport {
    /// Create a transport with an overall per-request timeout.
    ///
    /// 4xx/5xx responses are errors, never bodies to be saved as archives.
    pub fn new(timeout: Option<Duration>, user_agent: impl Into<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .http_status_as_error(true)
            .build();

        Self {
            agent: config.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Build from the `[http]` config section
    pub fn from_config(config: &HttpConfig) -> Self {
        let timeout = (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs));
        Self::new(timeout, config.user_agent.clone())
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str) -> FetchResult<Download> {
        debug!("GET {}", url);
        let response = self
            .agent
            .get(url)
            .header("User-Agent", self.user_agent.as_str())
            .call()
            .map_err(|e| FetchError::download(url, e))?;

        let content_length = response.body().content_length();
        let body = response.into_body().into_reader();

        Ok(Download {
            content_length,
            body: Box::new(body),
        })
    }
}
