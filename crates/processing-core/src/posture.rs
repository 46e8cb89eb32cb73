//! Per-frame posture checks.
//!
//! Which bands apply depends on where the movement is heading. On the way
//! up only the `up`/`extended` bands are checked, on the way down only the
//! `down`/`closed` bands. The `correct` band is an upper bound checked on
//! every frame. Hold exercises compare each chain angle against the
//! `[minPoseAngle, maxPoseAngle]` band.
//!
//! `up`/`extended` are lower bounds and `down`/`closed` are upper bounds,
//! whatever the relative order of a keypoint's two thresholds.

use serde::Serialize;

use repsense_exercise_model::exercise::{ExerciseDefinition, MeasurementType, ThresholdGroup};

use crate::error::ProcessingError;
use crate::measurement::{expected_measurements, Measurements};

/// Direction the movement is expected to go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Toward `up` / `extended`.
    Up,
    /// Toward `down` / `closed`.
    Down,
}

impl Target {
    /// Threshold groups checked for this target.
    pub fn groups(self) -> [ThresholdGroup; 2] {
        match self {
            Target::Up => [ThresholdGroup::Up, ThresholdGroup::Extended],
            Target::Down => [ThresholdGroup::Down, ThresholdGroup::Closed],
        }
    }
}

/// What kind of bound a violation broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Has not reached the `up`/`extended` band.
    NotRaised,
    /// Has not reached the `down`/`closed` band.
    NotLowered,
    /// Above the `correct` upper bound.
    AboveLimit,
    /// Chain angle under `minPoseAngle`.
    BelowPoseBand,
    /// Chain angle over `maxPoseAngle`.
    AbovePoseBand,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub keypoint: String,
    pub measured_value: f64,
    pub threshold_value: f64,
    pub kind: ViolationKind,
    pub message: String,
}

/// Result of checking one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostureReport {
    pub is_correct: bool,
    pub violations: Vec<Violation>,
    /// The correct message, or the first violation's message.
    pub message: String,
}

impl PostureReport {
    /// Every distinct message, in violation order.
    pub fn messages(&self) -> Vec<String> {
        if self.is_correct {
            return vec![self.message.clone()];
        }
        let mut out: Vec<String> = Vec::with_capacity(self.violations.len());
        for v in &self.violations {
            if !out.contains(&v.message) {
                out.push(v.message.clone());
            }
        }
        out
    }
}

/// Whether `value` has reached a keypoint's band in `group`.
///
/// `None` when the keypoint has no threshold in that group.
pub fn reaches(
    definition: &ExerciseDefinition,
    group: ThresholdGroup,
    keypoint: &str,
    value: f64,
) -> Option<bool> {
    let threshold = definition.thresholds.get(group, keypoint)?;
    Some(match group {
        ThresholdGroup::Up | ThresholdGroup::Extended => value >= threshold,
        ThresholdGroup::Down | ThresholdGroup::Closed | ThresholdGroup::Correct => {
            value <= threshold
        }
    })
}

/// Checks measurements against one exercise's thresholds.
pub struct PostureValidator<'a> {
    definition: &'a ExerciseDefinition,
}

impl<'a> PostureValidator<'a> {
    pub fn new(definition: &'a ExerciseDefinition) -> Self {
        Self { definition }
    }

    /// Validate one frame's measurements.
    ///
    /// Every expected measurement must be present, otherwise the frame is
    /// rejected with [`ProcessingError::MissingKeypoint`].
    pub fn validate(
        &self,
        measurements: &Measurements,
        target: Target,
    ) -> Result<PostureReport, ProcessingError> {
        let def = self.definition;
        let expected = expected_measurements(def);
        if let Some(missing) = expected.iter().find(|name| !measurements.contains(name)) {
            return Err(ProcessingError::MissingKeypoint(missing.to_string()));
        }

        let mut violations = Vec::new();
        for name in &expected {
            let Some(value) = measurements.get(name) else {
                continue;
            };

            let kind = match target {
                Target::Up => ViolationKind::NotRaised,
                Target::Down => ViolationKind::NotLowered,
            };
            for group in target.groups() {
                let Some(threshold) = def.thresholds.get(group, name) else {
                    continue;
                };
                if reaches(def, group, name, value) == Some(false) {
                    violations.push(self.violation(name, value, threshold, kind));
                }
            }

            if let Some(limit) = def.thresholds.get(ThresholdGroup::Correct, name) {
                if value > limit {
                    violations.push(self.violation(name, value, limit, ViolationKind::AboveLimit));
                }
            }

            let is_position = def
                .key_point(name)
                .is_some_and(|kp| kp.measurement == MeasurementType::Position);
            if is_position {
                if let Some(min) = def.thresholds.min_pose_angle {
                    if value < min {
                        violations.push(self.violation(
                            name,
                            value,
                            min,
                            ViolationKind::BelowPoseBand,
                        ));
                    }
                }
                if let Some(max) = def.thresholds.max_pose_angle {
                    if value > max {
                        violations.push(self.violation(
                            name,
                            value,
                            max,
                            ViolationKind::AbovePoseBand,
                        ));
                    }
                }
            }
        }

        let is_correct = violations.is_empty();
        let message = match violations.first() {
            Some(v) => v.message.clone(),
            None => def.validation.correct.clone(),
        };
        Ok(PostureReport {
            is_correct,
            violations,
            message,
        })
    }

    fn violation(&self, keypoint: &str, measured: f64, threshold: f64, kind: ViolationKind) -> Violation {
        Violation {
            keypoint: keypoint.to_string(),
            measured_value: measured,
            threshold_value: threshold,
            kind,
            message: interpolate(&self.definition.validation.incorrect, keypoint, measured, threshold),
        }
    }
}

/// Fill `{keypoint}`, `{value}` and `{threshold}` placeholders. A template
/// without any placeholder gets the details appended instead.
fn interpolate(template: &str, keypoint: &str, measured: f64, threshold: f64) -> String {
    const PLACEHOLDERS: [&str; 3] = ["{keypoint}", "{value}", "{threshold}"];
    if !PLACEHOLDERS.iter().any(|p| template.contains(p)) {
        return format!("{template} ({keypoint}: {measured:.1} vs {threshold})");
    }
    template
        .replace("{keypoint}", keypoint)
        .replace("{value}", &format!("{measured:.1}"))
        .replace("{threshold}", &threshold.to_string())
}
