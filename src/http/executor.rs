//! Retrying request executor
//!
//! Wraps a [`Transport`] with bounded retries and backoff, then classifies
//! the outcome:
//! - success clears the failure flag
//! - retries exhausted with the flag clear: [`Error::Recoverable`], flag set
//! - retries exhausted with the flag already set: [`Error::Fatal`]
//! - a non-retryable failure: [`Error::Fatal`] straight away
//!
//! The flag lets a traversal shrug off one bad call, but two failed calls
//! in a row stop it.

use super::redact::redact_text;
use super::transport::{PageRequest, Transport};
use crate::error::{Error, Result};
use crate::types::BackoffType;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Configuration for retries and failure classification
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Total attempts per fetch (the first try included)
    pub num_retries: u32,
    /// Base delay for backoff
    pub retry_rate: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// Statuses that are never retried (auth rejection)
    pub fatal_statuses: Vec<u16>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            num_retries: 5,
            retry_rate: Duration::from_secs(5),
            max_backoff: Duration::from_secs(60),
            backoff_type: BackoffType::Linear,
            fatal_statuses: vec![401, 403],
        }
    }
}

impl ExecutorConfig {
    /// Create a new config builder
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::default()
    }
}

/// Builder for executor config
#[derive(Default)]
pub struct ExecutorConfigBuilder {
    config: ExecutorConfig,
}

impl ExecutorConfigBuilder {
    /// Set total attempts per fetch
    pub fn num_retries(mut self, retries: u32) -> Self {
        self.config.num_retries = retries;
        self
    }

    /// Set the base backoff delay
    pub fn retry_rate(mut self, rate: Duration) -> Self {
        self.config.retry_rate = rate;
        self
    }

    /// Set backoff configuration
    pub fn backoff(mut self, backoff_type: BackoffType, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.max_backoff = max;
        self
    }

    /// Set the statuses that fail immediately
    pub fn fatal_statuses(mut self, statuses: Vec<u16>) -> Self {
        self.config.fatal_statuses = statuses;
        self
    }

    /// Build the config
    pub fn build(self) -> ExecutorConfig {
        self.config
    }
}

/// Executes page requests with retry, backoff and failure escalation
pub struct RetryingExecutor {
    transport: Arc<dyn Transport>,
    config: ExecutorConfig,
    failed_last: AtomicBool,
}

impl RetryingExecutor {
    /// Create an executor with default configuration
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, ExecutorConfig::default())
    }

    /// Create an executor with custom configuration
    pub fn with_config(transport: Arc<dyn Transport>, config: ExecutorConfig) -> Self {
        Self {
            transport,
            config,
            failed_last: AtomicBool::new(false),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Whether the previous fetch ended with exhausted retries
    pub fn failed_last(&self) -> bool {
        self.failed_last.load(Ordering::SeqCst)
    }

    /// Fetch one page
    pub async fn fetch(&self, request: &PageRequest) -> Result<Value> {
        let attempts = self.config.num_retries.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.calculate_backoff(attempt);
                warn!(
                    "Retrying {} in {:?}, attempt {}/{}",
                    request.display_url(),
                    delay,
                    attempt + 1,
                    attempts
                );
                tokio::time::sleep(delay).await;
            }

            match self.transport.get(request).await {
                Ok(body) => {
                    if attempt > 0 {
                        info!("New request successful: {}", request.display_url());
                    }
                    self.failed_last.store(false, Ordering::SeqCst);
                    return Ok(body);
                }
                Err(e) if !self.is_retryable(&e) => {
                    error!(
                        "Request failed permanently: {} ({})",
                        request.display_url(),
                        redact_text(&e.to_string())
                    );
                    return Err(Error::fatal(e));
                }
                Err(e) => {
                    warn!(
                        "Request failed: {} ({})",
                        request.display_url(),
                        redact_text(&e.to_string())
                    );
                    last_error = Some(e);
                }
            }
        }

        let cause = last_error.unwrap_or_else(|| Error::Other("no attempt was made".into()));
        error!(
            "Retries exhausted after {} attempts: {}",
            attempts,
            request.display_url()
        );

        // One exhausted fetch is forgiven, the next in a row is not
        if self.failed_last.swap(true, Ordering::SeqCst) {
            Err(Error::fatal(cause))
        } else {
            Err(Error::recoverable(cause))
        }
    }

    /// Check if a transport error should be retried
    fn is_retryable(&self, error: &Error) -> bool {
        match error {
            Error::HttpStatus { status, .. } => !self.config.fatal_statuses.contains(status),
            other => other.is_retryable(),
        }
    }

    /// Calculate the delay before the given retry (1-based)
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let base = self.config.retry_rate;
        let delay = match self.config.backoff_type {
            BackoffType::Constant => base,
            BackoffType::Linear => base * attempt,
            BackoffType::Exponential => base * 2u32.saturating_pow(attempt.saturating_sub(1)),
        };

        std::cmp::min(delay, self.config.max_backoff)
    }
}

impl std::fmt::Debug for RetryingExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingExecutor")
            .field("config", &self.config)
            .field("failed_last", &self.failed_last())
            .finish_non_exhaustive()
    }
}
