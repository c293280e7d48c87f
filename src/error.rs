use std::time::Duration;
use thiserror::Error;

/// Failure of a single market source lookup.
///
/// Never fatal to a market request: the aggregator records it against the
/// source and carries on with the others.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Connection, TLS or body transfer failure
    #[error("request failed: {0}")]
    Network(String),

    /// Source answered with a non-2xx status
    #[error("source returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not match the expected schema
    #[error("malformed response: {0}")]
    Parse(String),

    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Adapter task aborted before producing a result
    #[error("source task failed: {0}")]
    Panicked(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}
