//! Frame source and capture device traits.

use async_trait::async_trait;

use crate::error::CaptureResult;

/// One uncompressed frame, tightly packed RGB8.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    /// `width * height * 3` bytes, row-major.
    pub pixels: Vec<u8>,
}

impl RawFrame {
    /// Create a frame, checking the pixel buffer length.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() == (width as usize) * (height as usize) * 3 {
            Some(Self {
                width,
                height,
                pixels,
            })
        } else {
            None
        }
    }
}

/// A live stream of frames from an acquired device.
///
/// Reads are synchronous and cheap (a buffer copy from the driver);
/// `stop_tracks` releases the underlying capture tracks and is idempotent.
pub trait FrameSource: Send {
    /// Read the next frame. Per-frame failures are recoverable.
    fn read_frame(&mut self) -> CaptureResult<RawFrame>;

    /// Stop the underlying tracks. Safe to call more than once.
    fn stop_tracks(&mut self);

    /// True once the tracks have been stopped.
    fn is_stopped(&self) -> bool;
}

/// Hands out frame sources. Acquisition can prompt the platform/user and
/// may fail with a denied/unavailable error.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    async fn acquire(&self) -> CaptureResult<Box<dyn FrameSource>>;
}
