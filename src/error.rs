//! Error types for the HTTP adapter
//!
//! Every failing request surfaces as an [`Error`]. Transport failures,
//! non-success statuses and transport timeouts share one shape,
//! [`RequestError`], while a cancellation requested by the caller is kept
//! as its own variant so it can never be confused with a timeout.

use thiserror::Error;

/// Unified failure of a single request
///
/// Carries a human-readable message, the HTTP status code when the server
/// answered with a non-success status, and whether the transport gave up
/// waiting.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct RequestError {
    /// Human-readable description of the failure
    pub message: String,
    /// Status code of a non-success response
    pub status_code: Option<u16>,
    /// Whether the transport aborted the request on its own timeout
    pub timed_out: bool,
    /// Underlying transport error, if any
    #[source]
    pub source: Option<reqwest::Error>,
}

impl RequestError {
    /// Create a transport failure (DNS, refused connection, reset, ...)
    pub fn transport(source: reqwest::Error) -> Self {
        Self {
            message: source.to_string(),
            status_code: None,
            timed_out: false,
            source: Some(source),
        }
    }

    /// Create a non-success status failure
    pub fn status(status_code: u16, reason: impl Into<String>) -> Self {
        Self {
            message: reason.into(),
            status_code: Some(status_code),
            timed_out: false,
            source: None,
        }
    }

    /// Create a timeout failure for a request to `url`
    pub fn timeout(url: &str) -> Self {
        Self {
            message: format!("Connection to {url} timed out"),
            status_code: None,
            timed_out: true,
            source: None,
        }
    }

    /// Attach the underlying transport error
    #[must_use]
    pub fn with_source(mut self, source: reqwest::Error) -> Self {
        self.source = Some(source);
        self
    }
}

/// The main error type for the HTTP adapter
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Request Errors
    // ============================================================================
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("Request to {url} was cancelled")]
    Cancelled { url: String },

    #[error("HTTP adapter has been disposed")]
    Disposed,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid value for header '{name}': {message}")]
    InvalidHeader { name: String, message: String },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Create a cancellation error
    pub fn cancelled(url: impl Into<String>) -> Self {
        Self::Cancelled { url: url.into() }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid header error
    pub fn invalid_header(name: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            message: message.to_string(),
        }
    }

    /// The request failure, if this error is one
    pub fn as_request_error(&self) -> Option<&RequestError> {
        match self {
            Error::Request(e) => Some(e),
            _ => None,
        }
    }

    /// Status code of a non-success response
    pub fn status_code(&self) -> Option<u16> {
        self.as_request_error().and_then(|e| e.status_code)
    }

    /// Whether the transport timed out
    pub fn timed_out(&self) -> bool {
        self.as_request_error().is_some_and(|e| e.timed_out)
    }

    /// Whether the caller cancelled the request
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }
}

/// Result type alias for the HTTP adapter
pub type Result<T> = std::result::Result<T, Error>;
