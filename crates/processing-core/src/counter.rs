//! Repetition counting state machine.
//!
//! Cycle exercises move `Idle → InUp → InDown → InUp → ...` and count on
//! each `InUp → InDown` edge whose frame has correct posture. Hold
//! exercises stay in `Holding`, restart their timer on every posture
//! violation, and complete once the timer reaches the configured duration.
//!
//! The engine never mutates anything: [`CountingEngine::advance`] returns
//! the next state and count, and the caller decides whether to commit it.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use repsense_common::clock::SessionClock;
use repsense_exercise_model::exercise::{CountingType, ExerciseDefinition, Phase, ThresholdGroup};
use repsense_exercise_model::landmark::TimestampNs;

use crate::error::ProcessingError;
use crate::measurement::{expected_measurements, Measurements};
use crate::posture::{reaches, Target};

/// Where the exercise currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PositionState {
    Idle,
    InUp,
    InDown,
    /// Hold timer; `None` until the first frame arrives.
    Holding { started_at_ns: Option<TimestampNs> },
}

impl PositionState {
    /// Direction posture is checked against while in this state.
    pub fn target(&self) -> Target {
        match self {
            PositionState::InUp => Target::Down,
            PositionState::Idle | PositionState::InDown | PositionState::Holding { .. } => {
                Target::Up
            }
        }
    }
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::InUp => f.write_str("in_up"),
            Self::InDown => f.write_str("in_down"),
            Self::Holding { .. } => f.write_str("holding"),
        }
    }
}

/// All required keypoints with a threshold in `group` have reached it.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub group: ThresholdGroup,
    pub keypoints: Vec<String>,
}

impl Condition {
    fn for_group(definition: &ExerciseDefinition, group: ThresholdGroup) -> Self {
        let keypoints = definition
            .counting_logic
            .requirements
            .iter()
            .filter(|name| definition.thresholds.get(group, name).is_some())
            .cloned()
            .collect();
        Self { group, keypoints }
    }

    /// An empty condition never holds.
    pub fn holds(&self, definition: &ExerciseDefinition, measurements: &Measurements) -> bool {
        !self.keypoints.is_empty()
            && self.keypoints.iter().all(|name| {
                measurements
                    .get(name)
                    .and_then(|value| reaches(definition, self.group, name, value))
                    .unwrap_or(false)
            })
    }
}

/// How an exercise is counted.
#[derive(Debug, Clone, PartialEq)]
pub enum CountingRule {
    /// Count on each extend → close cycle.
    Cycle { extend: Condition, close: Condition },
    /// Complete once after a continuous correct hold.
    Hold { duration_ns: u64 },
}

impl CountingRule {
    /// Derive the rule for an exercise, rejecting strategies that cannot be counted.
    pub fn from_definition(definition: &ExerciseDefinition) -> Result<Self, ProcessingError> {
        let logic = &definition.counting_logic;
        let invalid = |reason: String| ProcessingError::InvalidCountingRule {
            exercise: definition.exercise_id.clone(),
            reason,
        };

        let (extend, close) = match (&logic.kind, logic.count_on) {
            (CountingType::Other(kind), _) => {
                return Err(ProcessingError::UnsupportedExerciseType(kind.clone()))
            }
            (CountingType::AngleThreshold, Phase::Up) => (ThresholdGroup::Up, ThresholdGroup::Down),
            (CountingType::DistanceThreshold, Phase::Closed) => {
                (ThresholdGroup::Extended, ThresholdGroup::Closed)
            }
            (CountingType::PositionThreshold, Phase::Hold) => {
                let duration = logic
                    .duration
                    .ok_or_else(|| invalid("hold exercise has no duration".into()))?;
                if expected_measurements(definition).is_empty() {
                    return Err(invalid(
                        "hold exercise needs at least three position keypoints".into(),
                    ));
                }
                if definition.thresholds.min_pose_angle.is_none()
                    && definition.thresholds.max_pose_angle.is_none()
                {
                    return Err(invalid("hold exercise has no pose angle band".into()));
                }
                return Ok(Self::Hold {
                    duration_ns: SessionClock::secs_to_ns(duration),
                });
            }
            (kind, count_on) => {
                return Err(invalid(format!("{kind} cannot count on '{count_on}'")));
            }
        };

        let extend = Condition::for_group(definition, extend);
        let close = Condition::for_group(definition, close);
        for condition in [&extend, &close] {
            if condition.keypoints.is_empty() {
                return Err(invalid(format!(
                    "no required keypoint has a '{}' threshold",
                    condition.group
                )));
            }
        }
        Ok(Self::Cycle { extend, close })
    }
}

/// Outcome of one [`CountingEngine::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub from: PositionState,
    pub to: PositionState,
    pub total_count: u32,
    pub rep_completed: bool,
}

impl Step {
    /// Whether the state tag changed. Hold timer restarts do not count.
    pub fn changed_state(&self) -> bool {
        std::mem::discriminant(&self.from) != std::mem::discriminant(&self.to)
    }
}

/// Pure transition function for one exercise.
#[derive(Debug, Clone)]
pub struct CountingEngine {
    definition: Arc<ExerciseDefinition>,
    rule: CountingRule,
}

impl CountingEngine {
    pub fn new(definition: Arc<ExerciseDefinition>) -> Result<Self, ProcessingError> {
        let rule = CountingRule::from_definition(&definition)?;
        Ok(Self { definition, rule })
    }

    pub fn rule(&self) -> &CountingRule {
        &self.rule
    }

    pub fn initial_state(&self) -> PositionState {
        match self.rule {
            CountingRule::Cycle { .. } => PositionState::Idle,
            CountingRule::Hold { .. } => PositionState::Holding {
                started_at_ns: None,
            },
        }
    }

    /// Compute the next state and count.
    ///
    /// `posture_correct` gates counting only. The closing transition of a
    /// cycle happens either way, so a bad rep is not counted later.
    pub fn advance(
        &self,
        state: PositionState,
        total_count: u32,
        measurements: &Measurements,
        posture_correct: bool,
        timestamp_ns: TimestampNs,
    ) -> Step {
        let mut step = Step {
            from: state,
            to: state,
            total_count,
            rep_completed: false,
        };

        match &self.rule {
            CountingRule::Cycle { extend, close } => match state {
                PositionState::InUp => {
                    if close.holds(&self.definition, measurements) {
                        step.to = PositionState::InDown;
                        if posture_correct {
                            step.total_count = total_count.saturating_add(1);
                            step.rep_completed = step.total_count != total_count;
                        }
                    }
                }
                PositionState::Idle | PositionState::InDown | PositionState::Holding { .. } => {
                    if extend.holds(&self.definition, measurements) {
                        step.to = PositionState::InUp;
                    }
                }
            },
            CountingRule::Hold { duration_ns } => {
                let started = match state {
                    PositionState::Holding {
                        started_at_ns: Some(started),
                    } => started,
                    _ => timestamp_ns,
                };
                if !posture_correct {
                    step.to = PositionState::Holding {
                        started_at_ns: Some(timestamp_ns),
                    };
                } else {
                    step.to = PositionState::Holding {
                        started_at_ns: Some(started),
                    };
                    if total_count == 0 && timestamp_ns.saturating_sub(started) >= *duration_ns {
                        step.total_count = 1;
                        step.rep_completed = true;
                    }
                }
            }
        }

        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use repsense_exercise_model::catalog::ExerciseCatalog;

    const SEC: u64 = 1_000_000_000;

    fn engine(id: &str) -> CountingEngine {
        let catalog = ExerciseCatalog::builtin().unwrap();
        CountingEngine::new(catalog.get(id).unwrap()).unwrap()
    }

    fn legs(angle: f64) -> Measurements {
        [("leftLeg", angle), ("rightLeg", angle)].into_iter().collect()
    }

    #[test]
    fn test_squat_cycle_counts_once() {
        let engine = engine("squat_1");
        let mut state = engine.initial_state();
        let mut total = 0;
        let mut completions = 0;

        for (i, angle) in [165.0, 85.0, 85.0].into_iter().enumerate() {
            let step = engine.advance(state, total, &legs(angle), true, i as u64 * SEC);
            state = step.to;
            total = step.total_count;
            completions += step.rep_completed as u32;
            if i == 0 {
                assert_eq!(state, PositionState::InUp);
            }
        }
        assert_eq!(state, PositionState::InDown);
        assert_eq!(total, 1);
        assert_eq!(completions, 1);
    }

    #[test]
    fn test_bad_posture_on_closing_frame_skips_count() {
        let engine = engine("squat_1");
        let step = engine.advance(PositionState::InUp, 4, &legs(80.0), false, 0);
        assert_eq!(step.to, PositionState::InDown);
        assert_eq!(step.total_count, 4);
        assert!(!step.rep_completed);
        assert!(step.changed_state());
    }

    #[test]
    fn test_partial_condition_does_not_transition() {
        let engine = engine("squat_1");
        let mixed: Measurements = [("leftLeg", 165.0), ("rightLeg", 120.0)]
            .into_iter()
            .collect();
        let step = engine.advance(PositionState::Idle, 0, &mixed, true, 0);
        assert_eq!(step.to, PositionState::Idle);
        assert!(!step.changed_state());
    }

    #[test]
    fn test_curl_uses_configured_bounds() {
        let engine = engine("bicep_curl_1");
        let arms = |a: f64| -> Measurements {
            [("leftArm", a), ("rightArm", a)].into_iter().collect()
        };

        // up is reached at >= 60, down at <= 140.
        let s1 = engine.advance(engine.initial_state(), 0, &arms(170.0), true, 0);
        assert_eq!(s1.to, PositionState::InUp);
        let s2 = engine.advance(s1.to, s1.total_count, &arms(150.0), true, SEC);
        assert_eq!(s2.to, PositionState::InUp);
        let s3 = engine.advance(s2.to, s2.total_count, &arms(130.0), true, 2 * SEC);
        assert_eq!(s3.to, PositionState::InDown);
        assert_eq!(s3.total_count, 1);
        let s4 = engine.advance(s3.to, s3.total_count, &arms(45.0), true, 3 * SEC);
        assert_eq!(s4.to, PositionState::InDown);
        let s5 = engine.advance(s4.to, s4.total_count, &arms(70.0), true, 4 * SEC);
        assert_eq!(s5.to, PositionState::InUp);
        assert_eq!(s5.total_count, 1);
    }

    #[test]
    fn test_jumping_jack_cycle() {
        let engine = engine("jumping_jack_1");
        let spread: Measurements = [("handsDistance", 0.6), ("feetDistance", 0.4)]
            .into_iter()
            .collect();
        let closed: Measurements = [("handsDistance", 0.1), ("feetDistance", 0.05)]
            .into_iter()
            .collect();

        let s1 = engine.advance(engine.initial_state(), 0, &spread, true, 0);
        assert_eq!(s1.to, PositionState::InUp);
        let s2 = engine.advance(s1.to, s1.total_count, &closed, true, SEC);
        assert_eq!(s2.to, PositionState::InDown);
        assert_eq!(s2.total_count, 1);
    }

    #[test]
    fn test_hold_completes_once() {
        let engine = engine("plank_1");
        assert_eq!(engine.rule(), &CountingRule::Hold { duration_ns: 30 * SEC });
        let chain: Measurements = [("Hip", 175.0), ("Knee", 178.0)].into_iter().collect();

        let first = engine.advance(engine.initial_state(), 0, &chain, true, 5 * SEC);
        assert_eq!(
            first.to,
            PositionState::Holding {
                started_at_ns: Some(5 * SEC)
            }
        );
        let early = engine.advance(first.to, 0, &chain, true, 34 * SEC);
        assert_eq!(early.total_count, 0);
        let done = engine.advance(early.to, 0, &chain, true, 35 * SEC);
        assert_eq!(done.total_count, 1);
        assert!(done.rep_completed);
        let after = engine.advance(done.to, 1, &chain, true, 90 * SEC);
        assert_eq!(after.total_count, 1);
        assert!(!after.rep_completed);
    }

    #[test]
    fn test_hold_violation_restarts_timer() {
        let engine = engine("plank_1");
        let chain = Measurements::new();
        let state = PositionState::Holding {
            started_at_ns: Some(0),
        };
        let step = engine.advance(state, 0, &chain, false, 29 * SEC);
        assert_eq!(
            step.to,
            PositionState::Holding {
                started_at_ns: Some(29 * SEC)
            }
        );
        assert!(!step.changed_state());
    }

    #[test]
    fn test_unknown_counting_type_is_unsupported() {
        let catalog = ExerciseCatalog::builtin().unwrap();
        let mut squat = (*catalog.get("squat_1").unwrap()).clone();
        squat.counting_logic.kind = CountingType::Other("velocity_threshold".into());
        let err = CountingEngine::new(Arc::new(squat)).unwrap_err();
        assert_eq!(
            err,
            ProcessingError::UnsupportedExerciseType("velocity_threshold".into())
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn test_mismatched_count_on_is_invalid() {
        let catalog = ExerciseCatalog::builtin().unwrap();
        let mut squat = (*catalog.get("squat_1").unwrap()).clone();
        squat.counting_logic.count_on = Phase::Hold;
        let err = CountingEngine::new(Arc::new(squat)).unwrap_err();
        assert!(matches!(err, ProcessingError::InvalidCountingRule { .. }));
    }

    #[test]
    fn test_hold_without_duration_is_invalid() {
        let catalog = ExerciseCatalog::builtin().unwrap();
        let mut plank = (*catalog.get("plank_1").unwrap()).clone();
        plank.counting_logic.duration = None;
        let err = CountingEngine::new(Arc::new(plank)).unwrap_err();
        assert_eq!(
            err,
            ProcessingError::InvalidCountingRule {
                exercise: "plank_1".into(),
                reason: "hold exercise has no duration".into(),
            }
        );
    }

    #[test]
    fn test_cycle_without_thresholds_is_invalid() {
        let catalog = ExerciseCatalog::builtin().unwrap();
        let mut squat = (*catalog.get("squat_1").unwrap()).clone();
        squat.thresholds.down.clear();
        assert!(CountingEngine::new(Arc::new(squat)).is_err());
    }

    proptest! {
        #[test]
        fn prop_total_never_decreases(
            frames in prop::collection::vec((0.0f64..180.0, 0.0f64..180.0, any::<bool>()), 1..200)
        ) {
            let engine = engine("squat_1");
            let mut state = engine.initial_state();
            let mut total = 0u32;
            for (i, (left, right, correct)) in frames.into_iter().enumerate() {
                let m: Measurements = [("leftLeg", left), ("rightLeg", right)].into_iter().collect();
                let step = engine.advance(state, total, &m, correct, i as u64);
                prop_assert!(step.total_count >= total);
                prop_assert!(step.total_count <= total + 1);
                prop_assert_eq!(step.rep_completed, step.total_count > total);
                state = step.to;
                total = step.total_count;
            }
        }
    }
}
