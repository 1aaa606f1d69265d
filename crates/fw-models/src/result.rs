//! Normalized detection results.

use chrono::{DateTime, Utc};

use crate::detection::VideoEntry;

/// Result of a detection request, normalized across the three request
/// shapes the service supports.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionResult {
    /// Annotated image returned for image and URL batch requests.
    AnnotatedImage {
        /// Encoded annotated image (JPEG).
        bytes: Vec<u8>,
        /// When the response was received.
        timestamp: DateTime<Utc>,
    },

    /// Structured per-frame detections returned for video batch requests.
    VideoAnnotation {
        /// Ordered by frame time offset.
        entries: Vec<VideoEntry>,
        /// When the response was received.
        timestamp: DateTime<Utc>,
    },

    /// One annotated frame from a live stream. Transient: each frame
    /// supersedes the previous one and is never retained.
    StreamFrame {
        /// Encoded annotated frame (JPEG).
        bytes: Vec<u8>,
    },
}

impl DetectionResult {
    /// Create an annotated-image result stamped with the current time.
    pub fn annotated_image(bytes: Vec<u8>) -> Self {
        Self::AnnotatedImage {
            bytes,
            timestamp: Utc::now(),
        }
    }

    /// Create a video-annotation result stamped with the current time.
    pub fn video_annotation(entries: Vec<VideoEntry>) -> Self {
        Self::VideoAnnotation {
            entries,
            timestamp: Utc::now(),
        }
    }

    /// True for transient stream frames.
    pub fn is_stream_frame(&self) -> bool {
        matches!(self, Self::StreamFrame { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_stamp_time() {
        let before = Utc::now();
        let result = DetectionResult::annotated_image(vec![1, 2, 3]);
        let DetectionResult::AnnotatedImage { bytes, timestamp } = result else {
            panic!("expected AnnotatedImage");
        };
        assert_eq!(bytes, vec![1, 2, 3]);
        assert!(timestamp >= before);
    }

    #[test]
    fn test_stream_frame_is_transient() {
        assert!(DetectionResult::StreamFrame { bytes: vec![] }.is_stream_frame());
        assert!(!DetectionResult::annotated_image(vec![]).is_stream_frame());
    }
}
