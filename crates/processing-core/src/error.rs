//! Processing errors and their recovery scope.

use crate::geometry::GeometryError;

/// Errors raised while setting up a session or processing a frame.
///
/// Frame-local errors leave the session untouched; the caller drops the
/// frame and carries on. Session errors mean the exercise configuration
/// cannot be counted at all.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProcessingError {
    #[error("frame has {found} landmarks, expected at least {expected}")]
    InsufficientLandmarks { found: usize, expected: usize },

    #[error("required keypoint '{0}' has no measurement in this frame")]
    MissingKeypoint(String),

    #[error("keypoint '{keypoint}' has degenerate geometry: {source}")]
    DegenerateGeometry {
        keypoint: String,
        source: GeometryError,
    },

    #[error("unsupported counting type '{0}'")]
    UnsupportedExerciseType(String),

    #[error("{exercise}: {reason}")]
    InvalidCountingRule { exercise: String, reason: String },
}

impl ProcessingError {
    /// Whether the error only affects the current frame.
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            Self::InsufficientLandmarks { .. }
                | Self::MissingKeypoint(_)
                | Self::DegenerateGeometry { .. }
        )
    }

    /// Whether the error aborts the session.
    pub fn is_fatal(&self) -> bool {
        !self.is_frame_local()
    }
}
