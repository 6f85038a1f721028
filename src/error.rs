//! Error types for rs-chatscrape.
//!
//! These are faults: a malformed request, an unreachable selector backend,
//! a cache that cannot be written. A page that simply has no conversation on
//! it is not an error; it comes back as [`crate::ExtractionError`] inside a
//! [`crate::ScrapeOutcome`].

/// Error type for pipeline faults.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A CSS selector could not be parsed.
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// The inbound request could not be understood.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Network failure talking to the backend or an image host.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The selector payload was not the expected shape.
    #[error("Malformed selector payload: {0}")]
    MalformedPayload(String),

    /// Reading or writing the local selector cache failed.
    #[error("Cache I/O failed: {0}")]
    Cache(#[from] std::io::Error),

    /// The invoking context went away before the work finished.
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::MalformedPayload(err.to_string())
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
