//! Error types for pagereaper
//!
//! This module defines the error hierarchy for the whole engine.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Transport failures (`Http`, `Timeout`, `HttpStatus`) are what the retrying
//! executor sees. Once retries are exhausted they are wrapped in one of the
//! two classified variants, [`Error::Recoverable`] or [`Error::Fatal`], and
//! only those two ever reach a consumer from a fetch.

use thiserror::Error;

/// The main error type for pagereaper
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    /// Catalog or option error
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong
        message: String,
    },

    /// A single field holds an unusable value
    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue {
        /// Offending field or argument
        field: String,
        /// Why it was rejected
        message: String,
    },

    /// Traversal path names a source the catalog lacks
    #[error("Source '{name}' not found in catalog")]
    SourceNotFound {
        /// Requested source name
        name: String,
    },

    // ============================================================================
    // Transport Errors
    // ============================================================================
    /// Connection or protocol failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// Response status code
        status: u16,
        /// Redacted, truncated response body
        body: String,
    },

    /// Request exceeded the transport timeout
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds
        timeout_ms: u64,
    },

    /// Request URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Classified API Errors
    // ============================================================================
    /// One unit of work failed after retries; the job as a whole may go on
    #[error("Recoverable API error: {source}")]
    Recoverable {
        /// Last transport failure
        #[source]
        source: Box<Error>,
    },

    /// The job must stop
    #[error("Fatal API error: {source}")]
    Fatal {
        /// Failure that stopped the job
        #[source]
        source: Box<Error>,
    },

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    /// Records could not be read from a page
    #[error("Failed to extract records from path '{path}': {message}")]
    RecordExtraction {
        /// Dotted records path
        path: String,
        /// What was found instead
        message: String,
    },

    /// Response body is not usable JSON
    #[error("Failed to decode response: {message}")]
    Decode {
        /// Decoder message
        message: String,
    },

    // ============================================================================
    // Template Errors
    // ============================================================================
    /// Malformed or unsupported placeholder
    #[error("Template error: {message}")]
    Template {
        /// What is wrong
        message: String,
    },

    /// Placeholder refers to a value that was not supplied
    #[error("Undefined variable in template: {variable}")]
    UndefinedVariable {
        /// Placeholder name, such as `auth.access_token`
        variable: String,
    },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    /// Anything else
    #[error("{0}")]
    Other(String),
}

/// Severity of a classified failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Skip one unit of work and keep going
    Recoverable,
    /// Stop the traversal
    Fatal,
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a record extraction error
    pub fn extraction(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RecordExtraction {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a template error
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template {
            message: message.into(),
        }
    }

    /// Create an undefined variable error
    pub fn undefined_var(variable: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            variable: variable.into(),
        }
    }

    /// Create a source-not-found error
    pub fn source_not_found(name: impl Into<String>) -> Self {
        Self::SourceNotFound { name: name.into() }
    }

    /// Wrap an error as recoverable
    pub fn recoverable(source: Error) -> Self {
        Self::Recoverable {
            source: Box::new(source),
        }
    }

    /// Wrap an error as fatal. An already fatal error is returned unchanged,
    /// a recoverable one is promoted.
    pub fn fatal(source: Error) -> Self {
        match source {
            Self::Fatal { .. } => source,
            Self::Recoverable { source } => Self::Fatal { source },
            other => Self::Fatal {
                source: Box::new(other),
            },
        }
    }

    /// Check if this error is a transient transport failure worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Error::Timeout { .. } | Error::HttpStatus { .. } => true,
            _ => false,
        }
    }

    /// Check if this error may be skipped by a combinator
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable { .. })
    }

    /// Check if this error must end the traversal
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }

    /// Severity of a classified error, `None` for unclassified ones
    pub fn severity(&self) -> Option<Severity> {
        match self {
            Self::Recoverable { .. } => Some(Severity::Recoverable),
            Self::Fatal { .. } => Some(Severity::Fatal),
            _ => None,
        }
    }

    /// Underlying cause of a classified error
    pub fn cause(&self) -> &Error {
        match self {
            Self::Recoverable { source } | Self::Fatal { source } => source.cause(),
            other => other,
        }
    }

    /// HTTP status of the underlying cause, if any
    pub fn status(&self) -> Option<u16> {
        match self.cause() {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for pagereaper
pub type Result<T> = std::result::Result<T, Error>;
