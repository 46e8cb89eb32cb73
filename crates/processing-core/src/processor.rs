//! Exercise session processor.
//!
//! One [`ExerciseProcessor`] per session. Each frame goes through
//! measurement, posture validation and the counting engine; the new state
//! is committed only after every step succeeded, so a rejected frame leaves
//! the session exactly as it was.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use repsense_common::clock::SessionClock;
use repsense_common::config::{GeometryProjection, SessionDefaults};
use repsense_exercise_model::exercise::ExerciseDefinition;
use repsense_exercise_model::joint::LANDMARK_COUNT;
use repsense_exercise_model::landmark::{LandmarkFrame, TimestampNs};

use crate::calories::{CalorieContext, CalorieEstimator};
use crate::counter::{CountingEngine, PositionState};
use crate::error::ProcessingError;
use crate::measurement::{self, MeasureOptions, Measurements};
use crate::posture::{PostureReport, PostureValidator};

/// Per-session processing options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessorOptions {
    pub projection: GeometryProjection,
    pub min_visibility: f64,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        let m = MeasureOptions::default();
        Self {
            projection: m.projection,
            min_visibility: m.min_visibility,
        }
    }
}

impl From<&SessionDefaults> for ProcessorOptions {
    fn from(defaults: &SessionDefaults) -> Self {
        Self {
            projection: defaults.projection,
            min_visibility: defaults.min_visibility,
        }
    }
}

impl ProcessorOptions {
    fn measure_options(&self) -> MeasureOptions {
        MeasureOptions {
            projection: self.projection,
            min_visibility: self.min_visibility,
        }
    }
}

/// Mutable session state. Only [`ExerciseProcessor::process_frame`] changes it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorState {
    pub total_count: u32,
    pub position_state: PositionState,
    pub last_posture_correct: Option<bool>,
    pub last_messages: Vec<String>,
    pub first_frame_ns: Option<TimestampNs>,
    pub last_frame_ns: Option<TimestampNs>,
    pub frames_processed: u64,
}

/// Something a caller may want to show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProcessorEvent {
    RepCompleted {
        total: u32,
    },
    PostureFeedback {
        is_correct: bool,
        message: String,
    },
    StateChanged {
        from: PositionState,
        to: PositionState,
    },
}

/// Result of one accepted frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameOutcome {
    pub timestamp_ns: TimestampNs,
    pub measurements: Measurements,
    pub posture: PostureReport,
    pub events: Vec<ProcessorEvent>,
}

impl FrameOutcome {
    pub fn rep_completed(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, ProcessorEvent::RepCompleted { .. }))
    }
}

/// End-of-session figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub exercise_id: String,
    pub exercise_name: String,
    pub total_count: u32,
    pub elapsed_secs: f64,
    pub frames_processed: u64,
    pub calories_kcal: f64,
    pub calorie_unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calorie_error: Option<String>,
}

/// Processes the frames of one exercise session.
pub struct ExerciseProcessor {
    definition: Arc<ExerciseDefinition>,
    engine: CountingEngine,
    options: ProcessorOptions,
    state: ProcessorState,
}

impl ExerciseProcessor {
    /// Start a session. Fails if the exercise's counting strategy is unusable.
    pub fn new(
        definition: Arc<ExerciseDefinition>,
        options: ProcessorOptions,
    ) -> Result<Self, ProcessingError> {
        let engine = CountingEngine::new(Arc::clone(&definition))?;
        let state = ProcessorState {
            total_count: 0,
            position_state: engine.initial_state(),
            last_posture_correct: None,
            last_messages: Vec::new(),
            first_frame_ns: None,
            last_frame_ns: None,
            frames_processed: 0,
        };
        tracing::info!(
            exercise = %definition.exercise_id,
            rule = ?engine.rule(),
            "Exercise session started"
        );
        Ok(Self {
            definition,
            engine,
            options,
            state,
        })
    }

    /// Process one landmark frame.
    ///
    /// Frame-local errors are returned without touching the session state.
    pub fn process_frame(&mut self, frame: &LandmarkFrame) -> Result<FrameOutcome, ProcessingError> {
        let outcome = self.evaluate(frame);
        if let Err(e) = &outcome {
            tracing::warn!(
                exercise = %self.definition.exercise_id,
                t = frame.timestamp_ns,
                error = %e,
                "Frame skipped"
            );
        }
        outcome
    }

    fn evaluate(&mut self, frame: &LandmarkFrame) -> Result<FrameOutcome, ProcessingError> {
        if !frame.is_complete() {
            return Err(ProcessingError::InsufficientLandmarks {
                found: frame.landmarks.len(),
                expected: LANDMARK_COUNT,
            });
        }

        let measurements =
            measurement::measure(frame, &self.definition, &self.options.measure_options())?;
        let current = self.state.position_state;
        let posture =
            PostureValidator::new(&self.definition).validate(&measurements, current.target())?;

        let step = self.engine.advance(
            current,
            self.state.total_count,
            &measurements,
            posture.is_correct,
            frame.timestamp_ns,
        );

        let mut events = Vec::new();
        if step.changed_state() {
            tracing::debug!(from = %step.from, to = %step.to, "Position changed");
            events.push(ProcessorEvent::StateChanged {
                from: step.from,
                to: step.to,
            });
        }
        if step.rep_completed {
            tracing::info!(
                exercise = %self.definition.exercise_id,
                total = step.total_count,
                "Rep completed"
            );
            events.push(ProcessorEvent::RepCompleted {
                total: step.total_count,
            });
        }
        events.push(ProcessorEvent::PostureFeedback {
            is_correct: posture.is_correct,
            message: posture.message.clone(),
        });

        let state = &mut self.state;
        state.total_count = step.total_count;
        state.position_state = step.to;
        state.last_posture_correct = Some(posture.is_correct);
        state.last_messages = posture.messages();
        state.first_frame_ns.get_or_insert(frame.timestamp_ns);
        state.last_frame_ns = Some(frame.timestamp_ns);
        state.frames_processed += 1;

        Ok(FrameOutcome {
            timestamp_ns: frame.timestamp_ns,
            measurements,
            posture,
            events,
        })
    }

    pub fn state(&self) -> &ProcessorState {
        &self.state
    }

    pub fn total_count(&self) -> u32 {
        self.state.total_count
    }

    /// Time between the first and last accepted frame.
    pub fn elapsed_secs(&self) -> f64 {
        match (self.state.first_frame_ns, self.state.last_frame_ns) {
            (Some(first), Some(last)) => SessionClock::ns_to_secs(last.saturating_sub(first)),
            _ => 0.0,
        }
    }

    /// Summarize the session, including a calorie estimate.
    ///
    /// A failing calorie formula yields `0` and the error text; it never
    /// fails the summary.
    pub fn session_summary(
        &self,
        body_weight: f64,
        extra: &BTreeMap<String, f64>,
    ) -> SessionSummary {
        let elapsed_secs = self.elapsed_secs();
        let mut ctx = CalorieContext::new(body_weight, self.state.total_count, elapsed_secs);
        ctx.extra = extra.clone();
        let estimate = CalorieEstimator::estimate(&self.definition.calorie_formula, &ctx);

        SessionSummary {
            exercise_id: self.definition.exercise_id.clone(),
            exercise_name: self.definition.name.clone(),
            total_count: self.state.total_count,
            elapsed_secs,
            frames_processed: self.state.frames_processed,
            calories_kcal: estimate.value,
            calorie_unit: estimate.unit,
            calorie_error: estimate.error.map(|e| e.to_string()),
        }
    }
}
