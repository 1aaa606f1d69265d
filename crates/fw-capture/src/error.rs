//! Capture error types.

use thiserror::Error;

pub type CaptureResult<T> = Result<T, CaptureError>;

#[derive(Debug, Error)]
pub enum CaptureError {
    /// Device access denied by the platform or the user.
    #[error("capture device access denied: {0}")]
    Denied(String),

    /// No usable device present.
    #[error("capture device unavailable: {0}")]
    Unavailable(String),

    /// Reading a single frame failed. Not fatal to a session.
    #[error("frame capture failed: {0}")]
    Frame(String),

    /// Encoding a single frame failed. Not fatal to a session.
    #[error("frame encode failed: {0}")]
    Encode(String),
}

impl CaptureError {
    /// True for failures that abort session start; per-tick frame and
    /// encode failures are skipped instead.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CaptureError::Denied(_) | CaptureError::Unavailable(_))
    }
}
