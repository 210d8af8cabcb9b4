//! Error types shared by the feed client, controller and persistence layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GalleryError {
    /// Transport-level failure talking to the image server.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("server returned HTTP {0}")]
    Status(u16),

    /// The response body was not the expected JSON shape.
    #[error("failed to decode feed response: {0}")]
    Decode(String),

    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// No response within the configured request timeout.
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The request was superseded by a newer one. Not a real failure.
    #[error("request cancelled")]
    Cancelled,

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    /// A background fetch task panicked.
    #[error("background task failed: {0}")]
    Task(String),

    #[error("share failed: {0}")]
    Share(String),

    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
}

impl GalleryError {
    /// True for superseded requests, which callers must ignore silently.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// True when the server could not be reached or refused the request.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Status(_) | Self::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, GalleryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cancelled_is_not_connectivity() {
        assert!(GalleryError::Cancelled.is_cancelled());
        assert!(!GalleryError::Cancelled.is_connectivity());
    }

    #[test]
    fn test_status_and_timeout_are_connectivity() {
        assert!(GalleryError::Status(503).is_connectivity());
        assert!(GalleryError::Timeout(Duration::from_secs(1)).is_connectivity());
        assert!(!GalleryError::Decode("bad".into()).is_connectivity());
    }

    #[test]
    fn test_display() {
        assert_eq!(GalleryError::Status(404).to_string(), "server returned HTTP 404");
    }
}
