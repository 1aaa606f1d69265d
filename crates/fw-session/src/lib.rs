//! Live detection session controller.
//!
//! A [`SessionController`] owns at most one live session at a time: it
//! acquires a capture device, opens the stream channel, runs a periodic
//! [frame sampler](sampler) and an inbound reader, and guarantees the same
//! teardown order (timer, channel, device) on every exit path. Batch
//! submissions go through the same controller but never touch session
//! state. Results of both shapes land in the [`ResultSink`].

pub mod controller;
pub mod error;
pub mod event;
pub mod sampler;
pub mod sink;
pub mod state;

pub use controller::{SessionConfig, SessionController};
pub use error::{SessionError, SessionResult};
pub use event::SessionEvent;
pub use sink::{BatchDisplay, CountingRegistry, DisplayHandle, HandleRegistry, ResultSink};
pub use state::SessionState;
