//! Per-frame detections returned by the video endpoint.

use serde::{Deserialize, Serialize};

/// One detected object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding box as [x1, y1, x2, y2] in pixels.
    pub bbox: [f32; 4],
    /// Detection confidence, 0.0 to 1.0.
    pub confidence: f32,
    /// Class label (e.g. "fire", "smoke").
    #[serde(rename = "class")]
    pub class_name: String,
}

/// Detections for one sampled frame of a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoEntry {
    /// Offset of the frame from the start of the video, in seconds.
    #[serde(rename = "timestamp")]
    pub time_offset_seconds: f64,
    /// Detections in that frame, possibly empty.
    pub detections: Vec<Detection>,
}
