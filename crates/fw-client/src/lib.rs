//! Transport layer for the remote fire-detection service.
//!
//! Two independent sub-protocols:
//! - [`DetectClient`]: one-shot HTTP requests for image/video/URL batch
//!   detection (multipart and JSON bodies).
//! - [`StreamConnector`] / [`FrameSink`] / [`EventSource`]: a persistent
//!   bidirectional channel for live sessions, implemented over WebSocket by
//!   [`WsConnector`].

pub mod client;
pub mod config;
pub mod error;
pub mod stream;
pub mod ws;

pub use client::DetectClient;
pub use config::DetectClientConfig;
pub use error::{ChannelError, ChannelResult, ClientError, ClientResult};
pub use stream::{EventSource, FrameSink, StreamConnector};
pub use ws::WsConnector;
