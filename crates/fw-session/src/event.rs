//! Events surfaced to the consumer.

use crate::sink::DisplayHandle;

/// Asynchronous session event.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A new annotated stream frame is available. The handle is the same
    /// one stored in the sink's stream slot; each supersedes the previous.
    StreamFrame(DisplayHandle),

    /// The session failed (server-reported error or transport fault).
    /// Teardown has already run by the time this is observed.
    Failed { message: String },
}
