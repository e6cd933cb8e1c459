//! Error types for the roomview crate.

use std::fmt;

/// Result type for roomview operations.
pub type Result<T> = std::result::Result<T, LoadFailure>;

/// Errors that end a scene load.
///
/// A failure is reported once to the progress layer and is never retried.
#[derive(Debug, Clone)]
pub enum LoadFailure {
    /// HTTP request failed.
    Http {
        /// The URL that failed.
        url: String,
        /// The error message.
        message: String,
    },
    /// HTTP response had a non-success status code.
    HttpStatus {
        /// The URL that returned the error.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
    /// Reading a local file failed.
    Io {
        /// The path that failed.
        path: String,
        /// The error message.
        message: String,
    },
    /// Scene decoding failed.
    Decode(roomview_decode::DecodeError),
    /// Invalid data in a response.
    InvalidData {
        /// Context for where the error occurred.
        context: &'static str,
        /// Description of what was invalid.
        detail: String,
    },
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadFailure::Http { url, message } => {
                write!(f, "http request to {url} failed: {message}")
            }
            LoadFailure::HttpStatus { url, status } => {
                write!(f, "http request to {url} returned status {status}")
            }
            LoadFailure::Io { path, message } => {
                write!(f, "reading {path} failed: {message}")
            }
            LoadFailure::Decode(e) => write!(f, "decode error: {e}"),
            LoadFailure::InvalidData { context, detail } => {
                write!(f, "invalid {context}: {detail}")
            }
        }
    }
}

impl std::error::Error for LoadFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadFailure::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<roomview_decode::DecodeError> for LoadFailure {
    fn from(e: roomview_decode::DecodeError) -> Self {
        LoadFailure::Decode(e)
    }
}
