//! Declarative exercise definitions.
//!
//! An exercise names the keypoints to measure (angles at a joint, distances
//! between joints, or a chain of body positions), the threshold bands those
//! measurements are compared against, how repetitions are counted, and how
//! calories are estimated. The JSON shape uses camelCase keys.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::joint::Joint;

/// One exercise, as stored in a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseDefinition {
    /// Catalog key (e.g. `squat_1`).
    pub exercise_id: String,

    /// Human-readable name.
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub muscle_groups: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    pub calorie_formula: CalorieFormula,

    pub key_points: Vec<KeyPoint>,

    #[serde(default)]
    pub thresholds: Thresholds,

    pub counting_logic: CountingLogic,

    pub validation: ValidationMessages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// A named measurement point defined over one or more landmarks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPoint {
    pub name: String,

    /// Joints in measurement order. For angles the middle joint is the vertex.
    #[serde(alias = "landmarkIndices")]
    pub landmarks: Vec<Joint>,

    #[serde(rename = "type", alias = "measurementType")]
    pub measurement: MeasurementType,

    /// Display unit from the configuration. Informational only.
    #[serde(default)]
    pub unit: String,
}

/// What a keypoint measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", rename_all = "lowercase")]
pub enum MeasurementType {
    /// Angle in degrees at the middle of three joints.
    Angle,
    /// Frame-relative distance between two joints.
    Distance,
    /// Position of a single joint; consecutive positions form an angle chain.
    Position,
}

impl MeasurementType {
    /// Number of joints a keypoint of this type must name.
    pub fn arity(self) -> usize {
        match self {
            Self::Angle => 3,
            Self::Distance => 2,
            Self::Position => 1,
        }
    }
}

impl TryFrom<String> for MeasurementType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "angle" => Ok(Self::Angle),
            "distance" => Ok(Self::Distance),
            "position" => Ok(Self::Position),
            other => Err(format!("unknown measurement type '{other}'")),
        }
    }
}

impl fmt::Display for MeasurementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Angle => "angle",
            Self::Distance => "distance",
            Self::Position => "position",
        })
    }
}

/// Threshold bands keyed by keypoint name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    /// Angle at or below which the keypoint is "down".
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub down: BTreeMap<String, f64>,

    /// Angle at or above which the keypoint is "up".
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub up: BTreeMap<String, f64>,

    /// Distance at or above which the keypoint is "extended".
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extended: BTreeMap<String, f64>,

    /// Distance at or below which the keypoint is "closed".
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub closed: BTreeMap<String, f64>,

    /// Upper bound that must hold on every frame.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub correct: BTreeMap<String, f64>,

    /// Lowest acceptable chain angle for position exercises.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_pose_angle: Option<f64>,

    /// Highest acceptable chain angle for position exercises.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pose_angle: Option<f64>,
}

/// Named threshold groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThresholdGroup {
    Down,
    Up,
    Extended,
    Closed,
    Correct,
}

impl ThresholdGroup {
    pub const ALL: [ThresholdGroup; 5] = [
        ThresholdGroup::Down,
        ThresholdGroup::Up,
        ThresholdGroup::Extended,
        ThresholdGroup::Closed,
        ThresholdGroup::Correct,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Down => "down",
            Self::Up => "up",
            Self::Extended => "extended",
            Self::Closed => "closed",
            Self::Correct => "correct",
        }
    }
}

impl fmt::Display for ThresholdGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Thresholds {
    pub fn group(&self, group: ThresholdGroup) -> &BTreeMap<String, f64> {
        match group {
            ThresholdGroup::Down => &self.down,
            ThresholdGroup::Up => &self.up,
            ThresholdGroup::Extended => &self.extended,
            ThresholdGroup::Closed => &self.closed,
            ThresholdGroup::Correct => &self.correct,
        }
    }

    /// Threshold for a keypoint in a group.
    pub fn get(&self, group: ThresholdGroup, keypoint: &str) -> Option<f64> {
        self.group(group).get(keypoint).copied()
    }
}

/// Rules governing how repetitions are counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountingLogic {
    #[serde(rename = "type")]
    pub kind: CountingType,

    pub count_on: Phase,

    /// Keypoints that are measured and checked. Order matters for position chains.
    #[serde(default)]
    pub requirements: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_on: Option<Phase>,

    /// Hold duration in seconds, for hold exercises.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Counting strategy.
///
/// Unknown strategies are preserved rather than rejected at parse time, so a
/// catalog with one bad entry still loads and the session that picks it fails
/// on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CountingType {
    AngleThreshold,
    DistanceThreshold,
    PositionThreshold,
    Other(String),
}

impl From<String> for CountingType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "angle_threshold" => Self::AngleThreshold,
            "distance_threshold" => Self::DistanceThreshold,
            "position_threshold" => Self::PositionThreshold,
            _ => Self::Other(value),
        }
    }
}

impl From<CountingType> for String {
    fn from(value: CountingType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for CountingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AngleThreshold => f.write_str("angle_threshold"),
            Self::DistanceThreshold => f.write_str("distance_threshold"),
            Self::PositionThreshold => f.write_str("position_threshold"),
            Self::Other(other) => f.write_str(other),
        }
    }
}

/// A named body position used as a counting trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Up,
    Down,
    Extended,
    Closed,
    Hold,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Extended => "extended",
            Self::Closed => "closed",
            Self::Hold => "hold",
        })
    }
}

/// Calorie estimate formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalorieFormula {
    /// Arithmetic expression over named variables.
    #[serde(alias = "expression")]
    pub formula: String,

    #[serde(default)]
    pub unit: String,

    /// Variable name to tag. A numeric tag is a literal default value;
    /// anything else is a unit annotation.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

/// Feedback messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationMessages {
    #[serde(alias = "correctMessage")]
    pub correct: String,

    #[serde(alias = "incorrectMessage")]
    pub incorrect: String,
}

impl ExerciseDefinition {
    /// Keypoint by name.
    pub fn key_point(&self, name: &str) -> Option<&KeyPoint> {
        self.key_points.iter().find(|kp| kp.name == name)
    }

    /// Required keypoints, in requirement order.
    pub fn required_key_points(&self) -> impl Iterator<Item = &KeyPoint> {
        self.counting_logic
            .requirements
            .iter()
            .filter_map(|name| self.key_point(name))
    }

    /// Check internal consistency.
    ///
    /// Joint references are already resolved during deserialization; this
    /// covers the cross-field rules. The counting strategy itself is checked
    /// when a session starts.
    pub fn validate(&self) -> Result<(), ExerciseError> {
        let id = || self.exercise_id.clone();

        if self.exercise_id.trim().is_empty() {
            return Err(ExerciseError::MissingId);
        }

        let mut seen = BTreeSet::new();
        for kp in &self.key_points {
            if !seen.insert(kp.name.as_str()) {
                return Err(ExerciseError::DuplicateKeyPoint {
                    exercise: id(),
                    name: kp.name.clone(),
                });
            }
            let expected = kp.measurement.arity();
            if kp.landmarks.len() != expected {
                return Err(ExerciseError::LandmarkArity {
                    exercise: id(),
                    keypoint: kp.name.clone(),
                    measurement: kp.measurement,
                    expected,
                    found: kp.landmarks.len(),
                });
            }
        }

        for name in &self.counting_logic.requirements {
            if !seen.contains(name.as_str()) {
                return Err(ExerciseError::UnknownRequirement {
                    exercise: id(),
                    name: name.clone(),
                });
            }
        }

        for group in ThresholdGroup::ALL {
            for (name, value) in self.thresholds.group(group) {
                if !seen.contains(name.as_str()) {
                    return Err(ExerciseError::UnknownThresholdKey {
                        exercise: id(),
                        group,
                        name: name.clone(),
                    });
                }
                if !value.is_finite() {
                    return Err(ExerciseError::InvalidThreshold {
                        exercise: id(),
                        name: format!("{group}.{name}"),
                        value: *value,
                    });
                }
            }
        }

        let (min, max) = (
            self.thresholds.min_pose_angle,
            self.thresholds.max_pose_angle,
        );
        for (label, value) in [("minPoseAngle", min), ("maxPoseAngle", max)] {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(ExerciseError::InvalidThreshold {
                        exercise: id(),
                        name: label.to_string(),
                        value: v,
                    });
                }
            }
        }
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(ExerciseError::InvertedPoseBand {
                    exercise: id(),
                    min,
                    max,
                });
            }
        }

        if let Some(duration) = self.counting_logic.duration {
            if !duration.is_finite() || duration < 0.0 {
                return Err(ExerciseError::InvalidDuration {
                    exercise: id(),
                    value: duration,
                });
            }
        }

        Ok(())
    }
}

/// Inconsistencies in an exercise definition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExerciseError {
    #[error("exercise has an empty exerciseId")]
    MissingId,

    #[error("{exercise}: keypoint '{name}' is defined more than once")]
    DuplicateKeyPoint { exercise: String, name: String },

    #[error("{exercise}: {measurement} keypoint '{keypoint}' needs {expected} landmarks, found {found}")]
    LandmarkArity {
        exercise: String,
        keypoint: String,
        measurement: MeasurementType,
        expected: usize,
        found: usize,
    },

    #[error("{exercise}: requirement '{name}' does not name a keypoint")]
    UnknownRequirement { exercise: String, name: String },

    #[error("{exercise}: {group} threshold '{name}' does not name a keypoint")]
    UnknownThresholdKey {
        exercise: String,
        group: ThresholdGroup,
        name: String,
    },

    #[error("{exercise}: threshold {name} is not a finite number ({value})")]
    InvalidThreshold {
        exercise: String,
        name: String,
        value: f64,
    },

    #[error("{exercise}: minPoseAngle {min} exceeds maxPoseAngle {max}")]
    InvertedPoseBand {
        exercise: String,
        min: f64,
        max: f64,
    },

    #[error("{exercise}: hold duration must be a non-negative number of seconds, got {value}")]
    InvalidDuration { exercise: String, value: f64 },
}
