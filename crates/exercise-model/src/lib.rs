//! RepSense Exercise Model
//!
//! Defines the core data contracts for exercise sessions:
//! - **Landmarks:** Per-frame body keypoints from an external pose detector
//! - **Joints:** The fixed 33-slot landmark vocabulary, by name
//! - **Exercises:** Declarative per-exercise keypoints, thresholds, and counting rules
//! - **Catalog:** A read-only snapshot of validated exercise definitions
//!
//! All landmark coordinates are normalized to `[0.0, 1.0]` relative to the
//! camera frame, so measurements derived from them are frame-relative.

pub mod catalog;
pub mod exercise;
pub mod joint;
pub mod landmark;

pub use catalog::*;
pub use exercise::*;
pub use joint::*;
pub use landmark::*;
