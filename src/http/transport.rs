//! Single-request transport
//!
//! A [`Transport`] issues exactly one GET and turns anything other than a
//! 2xx JSON response into a typed error. It never retries; that is the
//! executor's job.

use super::redact::redact_text;
use crate::error::{Error, Result};
use crate::types::StringMap;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Longest response body kept in an error message
const MAX_ERROR_BODY: usize = 512;

/// A single page request: a path (or absolute URL) plus query and headers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Path relative to the transport's base URL, or an absolute URL
    pub url: String,
    /// Query parameters
    pub query: StringMap,
    /// Request headers
    pub headers: StringMap,
}

impl PageRequest {
    /// Create a request for a path or URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add several query parameters, replacing existing ones
    #[must_use]
    pub fn with_params(mut self, params: &StringMap) -> Self {
        for (key, value) in params {
            self.query.insert(key.clone(), value.clone());
        }
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// URL with query string, credentials redacted, for log lines
    pub fn display_url(&self) -> String {
        if self.query.is_empty() {
            return redact_text(&self.url);
        }

        let mut pairs: Vec<_> = self.query.iter().collect();
        pairs.sort();
        let query = pairs
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let separator = if self.url.contains('?') { '&' } else { '?' };
        redact_text(&format!("{}{separator}{query}", self.url))
    }
}

/// Issues one request and decodes the JSON body
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a GET and return the decoded body
    async fn get(&self, request: &PageRequest) -> Result<Value>;
}

/// Configuration for the HTTP transport
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Base URL for relative request paths
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            user_agent: format!("pagereaper/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl TransportConfig {
    /// Create a new config builder
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::default()
    }
}

/// Builder for transport config
#[derive(Default)]
pub struct TransportConfigBuilder {
    config: TransportConfig,
}

impl TransportConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> TransportConfig {
        self.config
    }
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
    config: TransportConfig,
}

impl HttpTransport {
    /// Create a transport with the given configuration
    pub fn new(config: TransportConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a transport rooted at a base URL with default settings
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::new(TransportConfig::builder().base_url(base_url).build())
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                format!("{base}/{path}")
            }
            None => path.to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: &PageRequest) -> Result<Value> {
        let full_url = self.build_url(&request.url);
        // Reject garbage early instead of letting reqwest fail mid-retry
        url::Url::parse(&full_url)?;

        let mut req = self.client.get(&full_url);

        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_ms: self.config.timeout.as_millis() as u64,
                }
            } else {
                Error::Http(e.without_url())
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| Error::Http(e.without_url()))?;

        if !status.is_success() {
            let mut body = redact_text(&body);
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(Error::http_status(status.as_u16(), body));
        }

        debug!("GET {} -> {}", request.display_url(), status.as_u16());

        serde_json::from_str(&body)
            .map_err(|e| Error::decode(format!("Response is not valid JSON: {e}")))
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .finish_non_exhaustive()
    }
}
