//! Frame encoding.

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::error::{CaptureError, CaptureResult};
use crate::source::RawFrame;

/// JPEG quality used for sampled frames (~0.8).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Encodes raw frames into a compressed representation for the channel.
pub trait FrameEncoder: Send + Sync {
    fn encode(&self, frame: &RawFrame) -> CaptureResult<Vec<u8>>;
}

/// JPEG encoder over the `image` crate.
#[derive(Debug, Clone)]
pub struct JpegFrameEncoder {
    quality: u8,
}

impl JpegFrameEncoder {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

impl Default for JpegFrameEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl FrameEncoder for JpegFrameEncoder {
    fn encode(&self, frame: &RawFrame) -> CaptureResult<Vec<u8>> {
        let expected = (frame.width as usize) * (frame.height as usize) * 3;
        if frame.pixels.len() != expected {
            return Err(CaptureError::Encode(format!(
                "pixel buffer length {} does not match {}x{} RGB8",
                frame.pixels.len(),
                frame.width,
                frame.height
            )));
        }

        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, self.quality)
            .write_image(
                &frame.pixels,
                frame.width,
                frame.height,
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: u32, height: u32, rgb: [u8; 3]) -> RawFrame {
        let pixels = rgb
            .iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect();
        RawFrame::new(width, height, pixels).unwrap()
    }

    #[test]
    fn test_encode_produces_jpeg_magic() {
        let encoder = JpegFrameEncoder::default();
        let jpeg = encoder.encode(&solid_frame(64, 48, [200, 30, 10])).unwrap();
        assert!(jpeg.len() > 2);
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_rejects_mismatched_buffer() {
        let frame = RawFrame {
            width: 64,
            height: 48,
            pixels: vec![0; 10],
        };
        let result = JpegFrameEncoder::default().encode(&frame);
        assert!(matches!(result, Err(CaptureError::Encode(_))));
    }

    #[test]
    fn test_quality_clamped() {
        // 0 would panic inside the jpeg encoder; the constructor snaps it.
        let encoder = JpegFrameEncoder::new(0);
        assert!(encoder.encode(&solid_frame(8, 8, [1, 2, 3])).is_ok());
    }
}
