//! Landmark frames produced by the external pose detector.
//!
//! Frames can be recorded as JSONL (one frame per line) for replay.
//! Coordinates are normalized to `[0.0, 1.0]` relative to the camera frame;
//! `z` is the detector's relative depth estimate.

use serde::{Deserialize, Serialize};

use crate::joint::{Joint, LANDMARK_COUNT};

/// Monotonic timestamp in nanoseconds since session start.
pub type TimestampNs = u64;

/// A single body keypoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Normalized X coordinate.
    pub x: f64,
    /// Normalized Y coordinate.
    pub y: f64,
    /// Relative depth.
    #[serde(default)]
    pub z: f64,
    /// Detector confidence that the landmark is visible, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            visibility: None,
        }
    }

    pub fn with_visibility(mut self, visibility: f64) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Whether the detector considers this landmark visible enough.
    ///
    /// Landmarks without a visibility score always count as visible.
    pub fn is_visible(&self, min_visibility: f64) -> bool {
        self.visibility.map_or(true, |v| v >= min_visibility)
    }
}

/// All landmarks detected in one camera frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Monotonic nanoseconds since session start.
    #[serde(rename = "t", default)]
    pub timestamp_ns: TimestampNs,

    /// Landmarks in detector slot order.
    pub landmarks: Vec<Landmark>,
}

impl LandmarkFrame {
    pub fn new(timestamp_ns: TimestampNs, landmarks: Vec<Landmark>) -> Self {
        Self {
            timestamp_ns,
            landmarks,
        }
    }

    /// A full frame with every landmark at the same position.
    ///
    /// Handy as a base for building synthetic frames.
    pub fn uniform(timestamp_ns: TimestampNs, landmark: Landmark) -> Self {
        Self::new(timestamp_ns, vec![landmark; LANDMARK_COUNT])
    }

    /// Landmark for a joint, if the frame is long enough to contain it.
    pub fn get(&self, joint: Joint) -> Option<&Landmark> {
        self.landmarks.get(joint.index())
    }

    /// Replace the landmark for a joint. No-op on short frames.
    pub fn set(&mut self, joint: Joint, landmark: Landmark) {
        if let Some(slot) = self.landmarks.get_mut(joint.index()) {
            *slot = landmark;
        }
    }

    /// Whether the frame has the full detector vocabulary.
    pub fn is_complete(&self) -> bool {
        self.landmarks.len() >= LANDMARK_COUNT
    }

    /// Timestamp as fractional seconds since session start.
    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp_ns as f64 / 1_000_000_000.0
    }
}

/// Parse frames from JSONL content (one JSON object per line).
///
/// Blank lines and `#` comment lines are skipped.
pub fn parse_frames(jsonl: &str) -> Result<Vec<LandmarkFrame>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_defaults_to_visible() {
        let lm = Landmark::new(0.5, 0.5, 0.0);
        assert!(lm.is_visible(0.9));
        assert!(!lm.with_visibility(0.3).is_visible(0.5));
        assert!(lm.with_visibility(0.5).is_visible(0.5));
    }

    #[test]
    fn test_frame_joint_access() {
        let mut frame = LandmarkFrame::uniform(0, Landmark::new(0.5, 0.5, 0.0));
        assert!(frame.is_complete());

        frame.set(Joint::LeftKnee, Landmark::new(0.4, 0.7, 0.0));
        assert_eq!(frame.get(Joint::LeftKnee).unwrap().x, 0.4);
        assert_eq!(frame.get(Joint::RightKnee).unwrap().x, 0.5);
    }

    #[test]
    fn test_short_frame_is_incomplete() {
        let frame = LandmarkFrame::new(0, vec![Landmark::new(0.1, 0.1, 0.0); 12]);
        assert!(!frame.is_complete());
        assert!(frame.get(Joint::LeftHip).is_none());
    }

    #[test]
    fn test_parse_frames_skips_comments() {
        let jsonl = r#"
# recorded by pose-capture
{"t": 0, "landmarks": [{"x": 0.1, "y": 0.2}]}

{"t": 33000000, "landmarks": [{"x": 0.1, "y": 0.2, "z": -0.1, "visibility": 0.9}]}
"#;
        let frames = parse_frames(jsonl).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].landmarks[0].z, 0.0);
        assert_eq!(frames[1].landmarks[0].visibility, Some(0.9));
        assert!((frames[1].timestamp_secs() - 0.033).abs() < 1e-9);
    }
}
