//! Capture device capability boundary.
//!
//! The browser media APIs (or whatever platform acquires a camera) sit
//! behind these traits: a [`CaptureDevice`] hands out a [`FrameSource`],
//! frames are encoded through a [`FrameEncoder`], and releasing a source
//! stops its underlying tracks. A deterministic test-pattern device is
//! included for demos and tests.

pub mod encoder;
pub mod error;
pub mod source;
pub mod stub;

pub use encoder::{FrameEncoder, JpegFrameEncoder, DEFAULT_JPEG_QUALITY};
pub use error::{CaptureError, CaptureResult};
pub use source::{CaptureDevice, FrameSource, RawFrame};
pub use stub::{TestPatternDevice, TestPatternSource};
