//! Stream channel message schemas.
//!
//! The channel carries three message kinds: outbound `frame` (binary JPEG
//! plus the parameters to run it with), inbound `annotated_frame` (binary
//! JPEG), and inbound `error` (fatal to the session). Payloads are tagged
//! variants validated at the transport boundary, never duck-typed blobs.

use serde::{Deserialize, Serialize};

use crate::params::DetectionParameters;

/// One outbound frame paired with the parameters in effect at send time.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundFrame {
    /// Encoded frame bytes (JPEG).
    pub payload: Vec<u8>,
    /// Parameter snapshot read at the sampling tick.
    pub params: DetectionParameters,
}

/// One inbound channel event, already validated by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Annotated frame bytes. Supersedes the previously displayed frame;
    /// no ordering guarantee beyond "most recent wins".
    AnnotatedFrame(Vec<u8>),

    /// Server-reported fault. Fatal to the session.
    Error { message: String },
}

/// Wire envelope for text messages on the channel.
///
/// An outbound frame is sent as a `Frame` meta message immediately followed
/// by one binary message carrying the JPEG payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMeta {
    /// Parameters for the binary frame payload that follows.
    Frame { conf: f64, iou: f64, imgsz: u32 },

    /// Server-reported fault.
    Error { message: String },
}

impl StreamMeta {
    /// Build the meta message for an outbound frame.
    pub fn for_frame(params: &DetectionParameters) -> Self {
        StreamMeta::Frame {
            conf: params.confidence,
            iou: params.iou,
            imgsz: params.image_size,
        }
    }
}
