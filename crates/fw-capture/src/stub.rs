//! Synthetic test-pattern source.
//!
//! Stands in for a real camera in demos and tests: frames are a moving
//! gradient so consecutive reads differ.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{CaptureError, CaptureResult};
use crate::source::{CaptureDevice, FrameSource, RawFrame};

/// Device that always succeeds and hands out [`TestPatternSource`]s.
#[derive(Debug, Clone)]
pub struct TestPatternDevice {
    width: u32,
    height: u32,
    /// Sources acquired so far, visible to tests.
    acquired: Arc<AtomicUsize>,
}

impl TestPatternDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            acquired: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of sources this device has handed out.
    pub fn acquired_count(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }
}

impl Default for TestPatternDevice {
    fn default() -> Self {
        Self::new(320, 240)
    }
}

#[async_trait]
impl CaptureDevice for TestPatternDevice {
    async fn acquire(&self) -> CaptureResult<Box<dyn FrameSource>> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        debug!(width = self.width, height = self.height, "acquired test pattern source");
        Ok(Box::new(TestPatternSource::new(self.width, self.height)))
    }
}

/// Frame source producing a moving gradient.
#[derive(Debug)]
pub struct TestPatternSource {
    width: u32,
    height: u32,
    frame_index: u64,
    stopped: bool,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_index: 0,
            stopped: false,
        }
    }
}

impl FrameSource for TestPatternSource {
    fn read_frame(&mut self) -> CaptureResult<RawFrame> {
        if self.stopped {
            return Err(CaptureError::Frame("source already stopped".into()));
        }

        let phase = (self.frame_index % 256) as u8;
        self.frame_index += 1;

        let mut pixels = Vec::with_capacity((self.width * self.height * 3) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                pixels.push((x % 256) as u8 ^ phase);
                pixels.push((y % 256) as u8);
                pixels.push(phase);
            }
        }

        Ok(RawFrame {
            width: self.width,
            height: self.height,
            pixels,
        })
    }

    fn stop_tracks(&mut self) {
        self.stopped = true;
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_counts_sources() {
        let device = TestPatternDevice::default();
        let _a = device.acquire().await.unwrap();
        let _b = device.acquire().await.unwrap();
        assert_eq!(device.acquired_count(), 2);
    }

    #[test]
    fn test_consecutive_frames_differ() {
        let mut source = TestPatternSource::new(16, 16);
        let a = source.read_frame().unwrap();
        let b = source.read_frame().unwrap();
        assert_ne!(a.pixels, b.pixels);
    }

    #[test]
    fn test_stop_tracks_is_idempotent_and_blocks_reads() {
        let mut source = TestPatternSource::new(16, 16);
        source.stop_tracks();
        source.stop_tracks();
        assert!(source.is_stopped());
        assert!(matches!(
            source.read_frame(),
            Err(CaptureError::Frame(_))
        ));
    }
}
