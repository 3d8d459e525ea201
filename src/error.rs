use std::time::Duration;

/// Error type returned by this crate.
///
/// A closed taxonomy of request failures. Only [`Failure::Timeout`] and
/// [`Failure::ConnectionRefused`] are retried by the executor; every other
/// kind ends the attempt loop immediately.
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    /// The attempt exceeded the configured per-request timeout.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// Configured per-request timeout in milliseconds.
        timeout_ms: u64,
        /// Underlying timeout error from `reqwest`.
        #[source]
        source: reqwest::Error,
    },
    /// The connection could not be established.
    #[error("connection refused: {0}")]
    ConnectionRefused(reqwest::Error),
    /// Non-success HTTP status code (400 and above, other than 429) with raw
    /// response body.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// The server answered 429 and the rate-limit budget was exhausted.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Wait the server requested before the next attempt.
        retry_after: Duration,
    },
    /// Network or request execution error from `reqwest` outside the
    /// retryable kinds.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Anything that does not fit the taxonomy above; never retried.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl Failure {
    /// True for the kinds the executor retries with exponential backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::ConnectionRefused(_))
    }

    /// Status code for definitive HTTP failures, `None` for every other kind.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
