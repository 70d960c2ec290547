//! Error Types
//!
//! Transport and store errors for the streaming clients. Configuration
//! errors live in [`crate::config::ConfigError`].

use thiserror::Error;

/// A transport-level failure that ends a stream
///
/// Delivered in-band as the single terminal item of a chat or upload stream.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StreamError {
    /// The request never produced a response (refused, DNS, timeout)
    #[error("Error connecting to API: {0}")]
    Connect(String),

    /// The request could not be assembled (for example a bad MIME type)
    #[error("Invalid request: {0}")]
    Request(String),

    /// The server answered with a non-2xx status
    #[error("API returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },
}

impl StreamError {
    /// Map a request error, separating bad statuses from connection failures
    #[must_use]
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        match error.status() {
            Some(status) => Self::Status {
                status: status.as_u16(),
                body: String::new(),
            },
            None => Self::Connect(error.to_string()),
        }
    }
}

/// Errors from the conversation store
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A turn index past the end of the history
    #[error("Turn index {index} out of range (history has {len} turns)")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of committed turns
        len: usize,
    },
}
