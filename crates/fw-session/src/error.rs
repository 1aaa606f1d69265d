//! Session error types.

use thiserror::Error;

use fw_capture::CaptureError;
use fw_client::{ChannelError, ClientError};

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    /// A session is already running on this controller. Stop it first.
    #[error("a session is already active")]
    AlreadyActive,

    /// Capture device could not be acquired. Fatal to session start.
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),

    /// Stream channel fault. Fatal to the session.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Batch request failure. Never affects a running session.
    #[error("request error: {0}")]
    Request(#[from] ClientError),
}
