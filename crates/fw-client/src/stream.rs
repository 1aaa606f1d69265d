//! Stream channel seams.
//!
//! The channel is split into two halves so the sampler and the inbound
//! reader can run independently: a [`FrameSink`] for fire-and-forget
//! outbound frames and an [`EventSource`] for asynchronously arriving
//! annotated frames and server errors. A [`StreamConnector`] opens one
//! channel per session.

use async_trait::async_trait;

use fw_models::{InboundEvent, OutboundFrame};

use crate::error::ChannelResult;

/// Outbound half of the channel.
#[async_trait]
pub trait FrameSink: Send {
    /// Send one frame. Fire-and-forget: no acknowledgment is awaited and
    /// inbound events interleave independently of sends.
    async fn send_frame(&mut self, frame: OutboundFrame) -> ChannelResult<()>;

    /// Close the channel. Best-effort; must be safe to call once the peer
    /// is already gone.
    async fn close(&mut self) -> ChannelResult<()>;
}

/// Inbound half of the channel.
#[async_trait]
pub trait EventSource: Send {
    /// Wait for the next inbound event.
    ///
    /// `None` means the channel closed in an orderly way. `Some(Err(_))` is
    /// a transport or protocol fault, fatal to the session.
    async fn next_event(&mut self) -> Option<ChannelResult<InboundEvent>>;
}

/// Opens a persistent channel to the detection service.
#[async_trait]
pub trait StreamConnector: Send + Sync {
    async fn connect(&self) -> ChannelResult<(Box<dyn FrameSink>, Box<dyn EventSource>)>;
}
