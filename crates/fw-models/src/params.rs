//! Detection parameters and their bounds.
//!
//! The detection service accepts a confidence threshold, an IoU threshold,
//! and an inference image size. Values are validated (or clamped) here so
//! that nothing out of range ever reaches the transport layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum accepted confidence/IoU threshold.
pub const MIN_THRESHOLD: f64 = 0.1;
/// Maximum accepted confidence/IoU threshold.
pub const MAX_THRESHOLD: f64 = 1.0;
/// Minimum inference image size in pixels.
pub const MIN_IMAGE_SIZE: u32 = 320;
/// Maximum inference image size in pixels.
pub const MAX_IMAGE_SIZE: u32 = 1280;
/// Inference image size must be a multiple of this.
pub const IMAGE_SIZE_STEP: u32 = 32;

/// Parameter validation error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterError {
    #[error("confidence {0} out of range [{MIN_THRESHOLD}, {MAX_THRESHOLD}]")]
    Confidence(f64),

    #[error("iou {0} out of range [{MIN_THRESHOLD}, {MAX_THRESHOLD}]")]
    Iou(f64),

    #[error("image size {0} out of range [{MIN_IMAGE_SIZE}, {MAX_IMAGE_SIZE}] step {IMAGE_SIZE_STEP}")]
    ImageSize(u32),
}

/// Per-request detection parameters.
///
/// An immutable snapshot per batch request; for a live session the current
/// value is re-read at every sampling tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionParameters {
    /// Confidence threshold, within [0.1, 1.0].
    pub confidence: f64,
    /// IoU threshold for non-max suppression, within [0.1, 1.0].
    pub iou: f64,
    /// Inference image size in pixels, within [320, 1280] step 32.
    pub image_size: u32,
}

impl Default for DetectionParameters {
    fn default() -> Self {
        // Defaults of the detection service itself.
        Self {
            confidence: 0.25,
            iou: 0.45,
            image_size: 640,
        }
    }
}

impl DetectionParameters {
    /// Create parameters, rejecting any out-of-range value.
    pub fn new(confidence: f64, iou: f64, image_size: u32) -> Result<Self, ParameterError> {
        if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&confidence) {
            return Err(ParameterError::Confidence(confidence));
        }
        if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&iou) {
            return Err(ParameterError::Iou(iou));
        }
        if !(MIN_IMAGE_SIZE..=MAX_IMAGE_SIZE).contains(&image_size)
            || image_size % IMAGE_SIZE_STEP != 0
        {
            return Err(ParameterError::ImageSize(image_size));
        }
        Ok(Self {
            confidence,
            iou,
            image_size,
        })
    }

    /// Snap all values into range.
    ///
    /// Thresholds clamp to [0.1, 1.0]; the image size clamps to [320, 1280]
    /// and rounds to the nearest multiple of 32. Every transmission path
    /// goes through this, so the wire invariant holds even for values poked
    /// directly into the struct.
    pub fn clamped(self) -> Self {
        let image_size = self.image_size.clamp(MIN_IMAGE_SIZE, MAX_IMAGE_SIZE);
        let remainder = image_size % IMAGE_SIZE_STEP;
        let image_size = if remainder == 0 {
            image_size
        } else if remainder >= IMAGE_SIZE_STEP / 2 && image_size + (IMAGE_SIZE_STEP - remainder) <= MAX_IMAGE_SIZE {
            image_size + (IMAGE_SIZE_STEP - remainder)
        } else {
            image_size - remainder
        };

        Self {
            confidence: self.confidence.clamp(MIN_THRESHOLD, MAX_THRESHOLD),
            iou: self.iou.clamp(MIN_THRESHOLD, MAX_THRESHOLD),
            image_size,
        }
    }

    /// Check that all values are within bounds.
    pub fn is_valid(&self) -> bool {
        Self::new(self.confidence, self.iou, self.image_size).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = DetectionParameters::default();
        assert!(params.is_valid());
        assert_eq!(params.confidence, 0.25);
        assert_eq!(params.iou, 0.45);
        assert_eq!(params.image_size, 640);
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(matches!(
            DetectionParameters::new(0.05, 0.45, 640),
            Err(ParameterError::Confidence(_))
        ));
        assert!(matches!(
            DetectionParameters::new(0.5, 1.5, 640),
            Err(ParameterError::Iou(_))
        ));
        assert!(matches!(
            DetectionParameters::new(0.5, 0.45, 4096),
            Err(ParameterError::ImageSize(_))
        ));
        // In range but not a multiple of 32.
        assert!(matches!(
            DetectionParameters::new(0.5, 0.45, 650),
            Err(ParameterError::ImageSize(_))
        ));
    }

    #[test]
    fn test_new_accepts_bounds() {
        assert!(DetectionParameters::new(0.1, 1.0, 320).is_ok());
        assert!(DetectionParameters::new(1.0, 0.1, 1280).is_ok());
    }

    #[test]
    fn test_clamped_thresholds() {
        let params = DetectionParameters {
            confidence: 0.0,
            iou: 2.0,
            image_size: 640,
        }
        .clamped();
        assert_eq!(params.confidence, MIN_THRESHOLD);
        assert_eq!(params.iou, MAX_THRESHOLD);
        assert!(params.is_valid());
    }

    #[test]
    fn test_clamped_image_size_snaps_to_step() {
        let clamp = |size| {
            DetectionParameters {
                image_size: size,
                ..Default::default()
            }
            .clamped()
            .image_size
        };
        assert_eq!(clamp(100), 320);
        assert_eq!(clamp(5000), 1280);
        assert_eq!(clamp(650), 640); // remainder 10, rounds down
        assert_eq!(clamp(660), 672); // remainder 20, rounds up
        assert_eq!(clamp(640), 640);
    }

    #[test]
    fn test_clamped_is_always_valid() {
        for size in [0, 319, 321, 650, 666, 1281, 9999] {
            let params = DetectionParameters {
                confidence: -1.0,
                iou: 99.0,
                image_size: size,
            }
            .clamped();
            assert!(params.is_valid(), "size {} clamped to {}", size, params.image_size);
        }
    }
}
