//! RepSense Processing Core — The Rep Counter
//!
//! Turns landmark frames into exercise feedback:
//! - **Geometry:** Angles and distances between landmarks
//! - **Posture:** Per-frame threshold checks with feedback messages
//! - **Counting:** A tagged state machine for reps and timed holds
//! - **Calories:** A restricted arithmetic formula evaluator
//!
//! This crate is pure computation — no I/O, no threads, no clocks.
//! Frame timestamps are the only notion of time.

pub mod calories;
pub mod counter;
pub mod error;
pub mod formula;
pub mod geometry;
pub mod measurement;
pub mod posture;
pub mod processor;

pub use calories::{CalorieContext, CalorieEstimate, CalorieEstimator};
pub use counter::{CountingEngine, PositionState};
pub use error::ProcessingError;
pub use formula::{Formula, FormulaError};
pub use posture::{PostureReport, PostureValidator};
pub use processor::{ExerciseProcessor, ProcessorEvent, ProcessorOptions, SessionSummary};
