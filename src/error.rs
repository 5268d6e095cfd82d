//! Error types shared across the collector pipeline.

use thiserror::Error;

/// Failures raised by a page source.
///
/// None of these are retried by the collector; the whole collection
/// call fails and the caller decides whether to run it again.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport failure (DNS, connect, timeout, body read)
    #[error("relay request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Relay answered with a non-success status
    #[error("relay error {status}: {body}")]
    Status { status: u16, body: String },

    /// Relay answered with something other than JSON (usually an HTML error page)
    #[error("relay returned non-JSON content: {body}")]
    NotJson { body: String },

    /// JSON body did not match the expected shape
    #[error("could not decode relay response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Upstream API reported an error in an otherwise valid response
    #[error("upstream API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("invalid relay URL: {0}")]
    InvalidUrl(String),
}

/// Outcome of a failed `collect` call.
#[derive(Debug, Error)]
pub enum CollectError {
    /// Request rejected before any fetch happened
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    /// A page came back without an items collection
    #[error("page {page} has no items collection")]
    MalformedPage { page: usize },

    #[error("collection cancelled")]
    Cancelled,
}

impl CollectError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}

/// Failures while writing export files.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}
