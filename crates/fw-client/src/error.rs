//! Transport error types.

use thiserror::Error;

use fw_models::ValidationError;

pub type ClientResult<T> = Result<T, ClientError>;

/// Failure of a one-shot batch request. Never affects a running session.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected before any network call.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Non-2xx response, with the body text the service returned.
    #[error("detection service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Request exceeded the configured timeout.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// Connection or protocol failure below HTTP.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body did not parse.
    #[error("invalid response: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Timeout(_) | ClientError::Network(_))
    }
}

pub type ChannelResult<T> = Result<T, ChannelError>;

/// Failure of the persistent stream channel. Fatal to an active session.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Could not open the channel.
    #[error("channel connect failed: {0}")]
    Connect(String),

    /// Transport fault after the channel was open.
    #[error("channel transport error: {0}")]
    Transport(String),

    /// Message that does not match any known kind; rejected at the
    /// transport boundary.
    #[error("channel protocol violation: {0}")]
    Protocol(String),

    /// Channel is already closed.
    #[error("channel closed")]
    Closed,
}
