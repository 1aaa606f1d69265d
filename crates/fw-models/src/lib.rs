//! Shared data models for the firewatch detection client.
//!
//! This crate provides Serde-serializable types for:
//! - Detection parameters (confidence/IoU thresholds, inference image size)
//! - Batch inputs (image, video, remote URL)
//! - Detection results and per-frame video annotations
//! - Stream channel message schemas

pub mod detection;
pub mod input;
pub mod params;
pub mod result;
pub mod stream;

// Re-export common types
pub use detection::{Detection, VideoEntry};
pub use input::{BatchInput, ValidationError};
pub use params::{DetectionParameters, ParameterError};
pub use result::DetectionResult;
pub use stream::{InboundEvent, OutboundFrame, StreamMeta};
