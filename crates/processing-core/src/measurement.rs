//! Per-frame measurement extraction.
//!
//! Only keypoints named in the exercise's requirements are measured. Position
//! keypoints form an ordered chain; every interior link of the chain yields
//! the angle at that link, stored under the link's keypoint name.

use std::collections::BTreeMap;

use serde::Serialize;

use repsense_common::config::GeometryProjection;
use repsense_exercise_model::exercise::{ExerciseDefinition, KeyPoint, MeasurementType};
use repsense_exercise_model::landmark::{Landmark, LandmarkFrame};

use crate::error::ProcessingError;
use crate::geometry::{self, GeometryError};

/// Measured values for one frame, keyed by keypoint name.
///
/// Angles are degrees; distances are fractions of the camera frame, not
/// physical lengths, regardless of the unit a configuration declares.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Measurements {
    values: BTreeMap<String, f64>,
}

impl Measurements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Measurements {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// How landmarks are turned into measurements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureOptions {
    pub projection: GeometryProjection,
    /// Landmarks below this visibility are treated as absent.
    pub min_visibility: f64,
}

impl Default for MeasureOptions {
    fn default() -> Self {
        Self {
            projection: GeometryProjection::Planar,
            min_visibility: 0.5,
        }
    }
}

/// Names that a complete frame produces a measurement for, in requirement order.
///
/// Non-position requirements map to themselves. For the position chain only
/// the interior links carry an angle.
pub fn expected_measurements(definition: &ExerciseDefinition) -> Vec<&str> {
    let mut names = Vec::new();
    let chain = position_chain(definition);
    let interior = chain.len().saturating_sub(1);

    for kp in definition.required_key_points() {
        match kp.measurement {
            MeasurementType::Position => {}
            _ => names.push(kp.name.as_str()),
        }
    }
    if chain.len() >= 3 {
        names.extend(chain[1..interior].iter().map(|kp| kp.name.as_str()));
    }
    names
}

/// Measure every required keypoint present in the frame.
///
/// Keypoints with an absent landmark are left out of the result; whether
/// that is acceptable is the validator's call. Degenerate angles are errors,
/// but an absent keypoint is reported ahead of them.
pub fn measure(
    frame: &LandmarkFrame,
    definition: &ExerciseDefinition,
    options: &MeasureOptions,
) -> Result<Measurements, ProcessingError> {
    let mut out = Measurements::new();
    let mut collapsed: Vec<(&str, GeometryError)> = Vec::new();

    for kp in definition.required_key_points() {
        match kp.measurement {
            MeasurementType::Angle => {
                if let Some([a, b, c]) = usable_landmarks::<3>(frame, kp, options) {
                    match geometry::angle(a, b, c, options.projection) {
                        Ok(value) => out.insert(kp.name.clone(), value),
                        Err(e) => collapsed.push((kp.name.as_str(), e)),
                    }
                }
            }
            MeasurementType::Distance => {
                if let Some([a, b]) = usable_landmarks::<2>(frame, kp, options) {
                    out.insert(kp.name.clone(), geometry::distance(a, b, options.projection));
                }
            }
            MeasurementType::Position => {}
        }
    }

    let chain = position_chain(definition);
    for link in chain.windows(3) {
        let (prev, vertex, next) = (link[0], link[1], link[2]);
        let points = (
            usable_landmarks::<1>(frame, prev, options),
            usable_landmarks::<1>(frame, vertex, options),
            usable_landmarks::<1>(frame, next, options),
        );
        if let (Some([a]), Some([b]), Some([c])) = points {
            match geometry::angle(a, b, c, options.projection) {
                Ok(value) => out.insert(vertex.name.clone(), value),
                Err(e) => collapsed.push((vertex.name.as_str(), e)),
            }
        }
    }

    let Some((keypoint, source)) = collapsed.first().cloned() else {
        return Ok(out);
    };
    let missing = expected_measurements(definition)
        .into_iter()
        .find(|name| !out.contains(name) && collapsed.iter().all(|(c, _)| c != name));
    Err(match missing {
        Some(name) => ProcessingError::MissingKeypoint(name.to_string()),
        None => ProcessingError::DegenerateGeometry {
            keypoint: keypoint.to_string(),
            source,
        },
    })
}

/// Required position keypoints in requirement order.
fn position_chain(definition: &ExerciseDefinition) -> Vec<&KeyPoint> {
    definition
        .required_key_points()
        .filter(|kp| kp.measurement == MeasurementType::Position)
        .collect()
}

/// The keypoint's landmarks, if all are present, finite and visible enough.
fn usable_landmarks<'f, const N: usize>(
    frame: &'f LandmarkFrame,
    kp: &KeyPoint,
    options: &MeasureOptions,
) -> Option<[&'f Landmark; N]> {
    if kp.landmarks.len() != N {
        return None;
    }
    let mut out = [frame.get(*kp.landmarks.first()?)?; N];
    for (slot, joint) in out.iter_mut().zip(&kp.landmarks) {
        let lm = frame.get(*joint)?;
        let finite = lm.x.is_finite() && lm.y.is_finite() && lm.z.is_finite();
        if !finite || !lm.is_visible(options.min_visibility) {
            return None;
        }
        *slot = lm;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use repsense_exercise_model::catalog::ExerciseCatalog;
    use repsense_exercise_model::joint::Joint;

    fn base_frame() -> LandmarkFrame {
        LandmarkFrame::uniform(0, Landmark::new(0.5, 0.5, 0.0))
    }

    fn straight_legs(frame: &mut LandmarkFrame) {
        for (hip, knee, ankle, x) in [
            (Joint::LeftHip, Joint::LeftKnee, Joint::LeftAnkle, 0.45),
            (Joint::RightHip, Joint::RightKnee, Joint::RightAnkle, 0.55),
        ] {
            frame.set(hip, Landmark::new(x, 0.5, 0.0));
            frame.set(knee, Landmark::new(x, 0.7, 0.0));
            frame.set(ankle, Landmark::new(x, 0.9, 0.0));
        }
    }

    #[test]
    fn test_squat_measures_required_angles() {
        let catalog = ExerciseCatalog::builtin().unwrap();
        let squat = catalog.get("squat_1").unwrap();
        let mut frame = base_frame();
        straight_legs(&mut frame);

        let m = measure(&frame, &squat, &MeasureOptions::default()).unwrap();
        assert_eq!(m.len(), 2);
        assert!((m.get("leftLeg").unwrap() - 180.0).abs() < 1e-9);
        assert!((m.get("rightLeg").unwrap() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_low_visibility_landmark_leaves_keypoint_unmeasured() {
        let catalog = ExerciseCatalog::builtin().unwrap();
        let squat = catalog.get("squat_1").unwrap();
        let mut frame = base_frame();
        straight_legs(&mut frame);
        frame.set(
            Joint::RightKnee,
            Landmark::new(0.55, 0.7, 0.0).with_visibility(0.1),
        );

        let m = measure(&frame, &squat, &MeasureOptions::default()).unwrap();
        assert!(m.contains("leftLeg"));
        assert!(!m.contains("rightLeg"));
    }

    #[test]
    fn test_collapsed_joint_is_degenerate() {
        let catalog = ExerciseCatalog::builtin().unwrap();
        let squat = catalog.get("squat_1").unwrap();
        // Every landmark at the same spot: both arms of each angle have zero length.
        let frame = base_frame();

        let err = measure(&frame, &squat, &MeasureOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ProcessingError::DegenerateGeometry { ref keypoint, .. } if keypoint == "leftLeg"
        ));
    }

    #[test]
    fn test_absent_keypoint_reported_before_collapsed_one() {
        let catalog = ExerciseCatalog::builtin().unwrap();
        let squat = catalog.get("squat_1").unwrap();
        let mut frame = base_frame();
        straight_legs(&mut frame);
        // leftLeg collapses onto the knee, rightLeg is occluded.
        frame.set(Joint::LeftHip, Landmark::new(0.45, 0.7, 0.0));
        frame.set(
            Joint::RightKnee,
            Landmark::new(0.55, 0.7, 0.0).with_visibility(0.1),
        );

        let err = measure(&frame, &squat, &MeasureOptions::default()).unwrap_err();
        assert_eq!(err, ProcessingError::MissingKeypoint("rightLeg".into()));
    }

    #[test]
    fn test_unrequired_keypoints_are_skipped() {
        let catalog = ExerciseCatalog::builtin().unwrap();
        let mut squat = (*catalog.get("squat_1").unwrap()).clone();
        squat.counting_logic.requirements = vec!["leftLeg".into()];
        let mut frame = base_frame();
        straight_legs(&mut frame);

        let m = measure(&frame, &squat, &MeasureOptions::default()).unwrap();
        assert_eq!(m.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec!["leftLeg"]);
    }

    #[test]
    fn test_jumping_jack_distances() {
        let catalog = ExerciseCatalog::builtin().unwrap();
        let jack = catalog.get("jumping_jack_1").unwrap();
        let mut frame = base_frame();
        frame.set(Joint::LeftWrist, Landmark::new(0.2, 0.1, 0.0));
        frame.set(Joint::RightWrist, Landmark::new(0.8, 0.1, 0.0));
        frame.set(Joint::LeftAnkle, Landmark::new(0.3, 0.9, 0.0));
        frame.set(Joint::RightAnkle, Landmark::new(0.7, 0.9, 0.0));

        let m = measure(&frame, &jack, &MeasureOptions::default()).unwrap();
        assert!((m.get("handsDistance").unwrap() - 0.6).abs() < 1e-9);
        assert!((m.get("feetDistance").unwrap() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_plank_chain_measures_interior_links() {
        let catalog = ExerciseCatalog::builtin().unwrap();
        let plank = catalog.get("plank_1").unwrap();
        assert_eq!(expected_measurements(&plank), vec!["Hip", "Knee"]);

        let mut frame = base_frame();
        frame.set(Joint::LeftShoulder, Landmark::new(0.2, 0.5, 0.0));
        frame.set(Joint::LeftHip, Landmark::new(0.4, 0.5, 0.0));
        frame.set(Joint::LeftKnee, Landmark::new(0.6, 0.5, 0.0));
        frame.set(Joint::LeftAnkle, Landmark::new(0.8, 0.5, 0.0));

        let m = measure(&frame, &plank, &MeasureOptions::default()).unwrap();
        assert_eq!(m.len(), 2);
        assert!((m.get("Hip").unwrap() - 180.0).abs() < 1e-9);
        assert!((m.get("Knee").unwrap() - 180.0).abs() < 1e-9);
    }
}
