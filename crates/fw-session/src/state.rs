//! Session lifecycle states.

/// Lifecycle of a live session.
///
/// `Idle → Starting → Active → Stopping → Idle`, with a transition through
/// `Error` when an active or starting session fails. Consumers observe
/// snapshots through a watch channel, never live state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No session. The only state `start` accepts.
    Idle,
    /// Acquiring the capture device and opening the channel.
    Starting,
    /// Sampling frames and receiving annotated frames.
    Active,
    /// Tearing down timer, channel and device.
    Stopping,
    /// A fatal fault was observed; teardown follows immediately.
    Error,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Starting => "starting",
            SessionState::Active => "active",
            SessionState::Stopping => "stopping",
            SessionState::Error => "error",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_labels() {
        assert_eq!(SessionState::Idle.to_string(), "idle");
        assert_eq!(SessionState::Active.to_string(), "active");
    }
}
