//! HTTP module
//!
//! Provides the single-request transport, the retrying executor, request
//! pacing and credential redaction.
//!
//! # Features
//!
//! - **Transport**: one GET, typed failure on non-2xx or network error
//! - **Automatic Retries**: bounded retries with linear backoff
//! - **Failure Escalation**: one exhausted fetch is recoverable, two in a row are fatal
//! - **Pacing**: at most one request per interval, using governor
//! - **Redaction**: credentials never reach the logs

mod executor;
mod rate_limit;
/// Credential redaction for log lines and error bodies
pub mod redact;
mod transport;

pub use executor::{ExecutorConfig, ExecutorConfigBuilder, RetryingExecutor};
pub use rate_limit::RequestPacer;
pub use transport::{
    HttpTransport, PageRequest, Transport, TransportConfig, TransportConfigBuilder,
};
