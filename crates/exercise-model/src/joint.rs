//! Named landmark vocabulary.
//!
//! The pose detector reports 33 landmarks in a fixed order. Exercise
//! configuration refers to them either by raw slot index or by name; both
//! resolve to a [`Joint`] when the configuration is deserialized, so
//! computation code never handles bare indices.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

/// Number of landmarks in every detector frame.
pub const LANDMARK_COUNT: usize = 33;

/// One landmark slot of the detector's body model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "JointRef")]
#[repr(u8)]
pub enum Joint {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl Joint {
    /// All joints in slot order.
    pub const ALL: [Joint; LANDMARK_COUNT] = [
        Joint::Nose,
        Joint::LeftEyeInner,
        Joint::LeftEye,
        Joint::LeftEyeOuter,
        Joint::RightEyeInner,
        Joint::RightEye,
        Joint::RightEyeOuter,
        Joint::LeftEar,
        Joint::RightEar,
        Joint::MouthLeft,
        Joint::MouthRight,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftPinky,
        Joint::RightPinky,
        Joint::LeftIndex,
        Joint::RightIndex,
        Joint::LeftThumb,
        Joint::RightThumb,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
        Joint::LeftHeel,
        Joint::RightHeel,
        Joint::LeftFootIndex,
        Joint::RightFootIndex,
    ];

    const NAMES: [&'static str; LANDMARK_COUNT] = [
        "nose",
        "left_eye_inner",
        "left_eye",
        "left_eye_outer",
        "right_eye_inner",
        "right_eye",
        "right_eye_outer",
        "left_ear",
        "right_ear",
        "mouth_left",
        "mouth_right",
        "left_shoulder",
        "right_shoulder",
        "left_elbow",
        "right_elbow",
        "left_wrist",
        "right_wrist",
        "left_pinky",
        "right_pinky",
        "left_index",
        "right_index",
        "left_thumb",
        "right_thumb",
        "left_hip",
        "right_hip",
        "left_knee",
        "right_knee",
        "left_ankle",
        "right_ankle",
        "left_heel",
        "right_heel",
        "left_foot_index",
        "right_foot_index",
    ];

    /// Slot index in a detector frame.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up a joint by slot index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Canonical snake_case name.
    pub fn name(self) -> &'static str {
        Self::NAMES[self.index()]
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Joint {
    type Err = JointError;

    /// Accepts the canonical name, case-insensitively, with `-` or `_`
    /// separators (`left_hip`, `LEFT-HIP`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::NAMES
            .iter()
            .position(|name| *name == normalized)
            .and_then(Self::from_index)
            .ok_or_else(|| JointError::UnknownName(s.to_string()))
    }
}

impl Serialize for Joint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// How a joint is written in configuration: slot index or name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JointRef {
    Index(u64),
    Name(String),
}

impl TryFrom<JointRef> for Joint {
    type Error = JointError;

    fn try_from(value: JointRef) -> Result<Self, Self::Error> {
        match value {
            JointRef::Index(i) => usize::try_from(i)
                .ok()
                .and_then(Joint::from_index)
                .ok_or(JointError::IndexOutOfRange(i)),
            JointRef::Name(name) => name.parse(),
        }
    }
}

/// Errors resolving a joint reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JointError {
    #[error("landmark index {0} is outside 0..=32")]
    IndexOutOfRange(u64),

    #[error("unknown joint name '{0}'")]
    UnknownName(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_index_round_trip_for_every_slot() {
        for (i, joint) in Joint::ALL.iter().enumerate() {
            assert_eq!(joint.index(), i);
            assert_eq!(Joint::from_index(i), Some(*joint));
        }
        assert_eq!(Joint::from_index(LANDMARK_COUNT), None);
    }

    #[test]
    fn test_well_known_slots() {
        assert_eq!(Joint::LeftShoulder.index(), 11);
        assert_eq!(Joint::RightShoulder.index(), 12);
        assert_eq!(Joint::LeftHip.index(), 23);
        assert_eq!(Joint::RightKnee.index(), 26);
        assert_eq!(Joint::LeftAnkle.index(), 27);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("left_hip".parse::<Joint>().unwrap(), Joint::LeftHip);
        assert_eq!("Right-Knee".parse::<Joint>().unwrap(), Joint::RightKnee);
        assert!(matches!(
            "left_tail".parse::<Joint>(),
            Err(JointError::UnknownName(_))
        ));
    }

    #[test]
    fn test_deserialize_index_or_name() {
        let joints: Vec<Joint> = serde_json::from_str(r#"[23, "left_knee", 27]"#).unwrap();
        assert_eq!(
            joints,
            vec![Joint::LeftHip, Joint::LeftKnee, Joint::LeftAnkle]
        );
    }

    #[test]
    fn test_deserialize_rejects_out_of_range_index() {
        let err = serde_json::from_str::<Joint>("33").unwrap_err();
        assert!(err.to_string().contains("outside"));
    }

    #[test]
    fn test_serializes_as_name() {
        let json = serde_json::to_string(&Joint::RightWrist).unwrap();
        assert_eq!(json, "\"right_wrist\"");
    }

    proptest! {
        #[test]
        fn prop_index_and_name_agree(index in 0usize..LANDMARK_COUNT, shout in any::<bool>()) {
            let joint = Joint::from_index(index).unwrap();
            let written = if shout {
                joint.name().to_ascii_uppercase().replace('_', "-")
            } else {
                joint.name().to_string()
            };
            prop_assert_eq!(written.parse::<Joint>().unwrap(), joint);
            prop_assert_eq!(Joint::try_from(JointRef::Index(index as u64)).unwrap(), joint);
            prop_assert_eq!(Joint::try_from(JointRef::Name(written)).unwrap(), joint);
        }

        #[test]
        fn prop_out_of_range_index_rejected(index in (LANDMARK_COUNT as u64)..u64::MAX) {
            prop_assert_eq!(
                Joint::try_from(JointRef::Index(index)),
                Err(JointError::IndexOutOfRange(index))
            );
        }
    }
}
