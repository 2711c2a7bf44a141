//! Error types for Notion access.

/// Error from Notion API operations.
#[derive(Debug, thiserror::Error)]
pub enum NotionError {
    /// HTTP request failed (network error, timeout, etc).
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] ureq::Error),

    /// The object does not exist or is not shared with the integration.
    #[error("object not found")]
    NotFound,

    /// HTTP response error (server returned error status).
    #[error("HTTP error: {status} - {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body (may contain error details).
        body: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why an object could not be fetched.
///
/// Unlike [`NotionError`] this is cheap to clone, so one outcome can be
/// handed to every caller waiting on the same object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The object does not exist or is not shared with the integration.
    #[error("not found")]
    NotFound,

    /// Network or API failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The payload did not have the expected shape.
    #[error("unexpected payload: {0}")]
    Decode(String),
}

impl From<NotionError> for FetchError {
    fn from(err: NotionError) -> Self {
        match err {
            NotionError::NotFound => Self::NotFound,
            NotionError::Json(e) => Self::Decode(e.to_string()),
            other => Self::Transport(other.to_string()),
        }
    }
}
