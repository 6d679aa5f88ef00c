use std::collections::HashMap;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::PoseError;

/// Body landmarks recognised by the aligner (COCO-17 vocabulary)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeypointName {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl KeypointName {
    pub const ALL: [KeypointName; 17] = [
        KeypointName::Nose,
        KeypointName::LeftEye,
        KeypointName::RightEye,
        KeypointName::LeftEar,
        KeypointName::RightEar,
        KeypointName::LeftShoulder,
        KeypointName::RightShoulder,
        KeypointName::LeftElbow,
        KeypointName::RightElbow,
        KeypointName::LeftWrist,
        KeypointName::RightWrist,
        KeypointName::LeftHip,
        KeypointName::RightHip,
        KeypointName::LeftKnee,
        KeypointName::RightKnee,
        KeypointName::LeftAnkle,
        KeypointName::RightAnkle,
    ];

    /// Position in the COCO-17 keypoint order
    pub fn coco_index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KeypointName::Nose => "nose",
            KeypointName::LeftEye => "left_eye",
            KeypointName::RightEye => "right_eye",
            KeypointName::LeftEar => "left_ear",
            KeypointName::RightEar => "right_ear",
            KeypointName::LeftShoulder => "left_shoulder",
            KeypointName::RightShoulder => "right_shoulder",
            KeypointName::LeftElbow => "left_elbow",
            KeypointName::RightElbow => "right_elbow",
            KeypointName::LeftWrist => "left_wrist",
            KeypointName::RightWrist => "right_wrist",
            KeypointName::LeftHip => "left_hip",
            KeypointName::RightHip => "right_hip",
            KeypointName::LeftKnee => "left_knee",
            KeypointName::RightKnee => "right_knee",
            KeypointName::LeftAnkle => "left_ankle",
            KeypointName::RightAnkle => "right_ankle",
        }
    }
}

/// A single named landmark in image space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub name: KeypointName,
    pub x: f64,
    pub y: f64,
    /// Depth, when the detector provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    /// Detection confidence (0.0 to 1.0)
    #[serde(default = "full_confidence")]
    pub score: f64,
}

fn full_confidence() -> f64 {
    1.0
}

impl Keypoint {
    pub fn new(name: KeypointName, x: f64, y: f64, score: f64) -> Self {
        Self {
            name,
            x,
            y,
            z: None,
            score,
        }
    }

    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }
}

/// Keypoints for one detected body, as captured from a still image or video frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub keypoints: Vec<Keypoint>,
    /// Overall detection confidence
    #[serde(default = "full_confidence")]
    pub score: f64,
    /// Capture time in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

/// Name to position lookup built from a pose
pub type KeypointMap = HashMap<KeypointName, Point2<f64>>;

impl Pose {
    pub fn new(keypoints: Vec<Keypoint>, score: f64) -> Self {
        Self {
            keypoints,
            score,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Build the name lookup; a repeated name keeps its last position
    pub fn keypoint_map(&self) -> KeypointMap {
        self.keypoints
            .iter()
            .map(|kp| (kp.name, kp.position()))
            .collect()
    }

    pub fn get(&self, name: KeypointName) -> Option<&Keypoint> {
        self.keypoints.iter().rev().find(|kp| kp.name == name)
    }

    /// Reject keypoints whose coordinates are NaN or infinite
    pub fn validate(&self) -> Result<(), PoseError> {
        for kp in &self.keypoints {
            let finite = kp.x.is_finite() && kp.y.is_finite() && kp.z.map_or(true, f64::is_finite);
            if !finite {
                return Err(PoseError::NonFiniteCoordinate {
                    name: kp.name.as_str(),
                    x: kp.x,
                    y: kp.y,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coco_order() {
        assert_eq!(KeypointName::Nose.coco_index(), 0);
        assert_eq!(KeypointName::LeftShoulder.coco_index(), 5);
        assert_eq!(KeypointName::RightAnkle.coco_index(), 16);
        for (i, name) in KeypointName::ALL.iter().enumerate() {
            assert_eq!(name.coco_index(), i);
        }
    }

    #[test]
    fn test_last_duplicate_wins() {
        let pose = Pose::new(
            vec![
                Keypoint::new(KeypointName::Nose, 1.0, 2.0, 0.9),
                Keypoint::new(KeypointName::Nose, 3.0, 4.0, 0.9),
            ],
            1.0,
        );
        let map = pose.keypoint_map();
        assert_eq!(map[&KeypointName::Nose], Point2::new(3.0, 4.0));
        assert_eq!(pose.get(KeypointName::Nose).map(|kp| kp.x), Some(3.0));
    }

    #[test]
    fn test_validate_rejects_nan() {
        let pose = Pose::new(vec![Keypoint::new(KeypointName::LeftHip, f64::NAN, 1.0, 1.0)], 1.0);
        assert!(matches!(
            pose.validate(),
            Err(PoseError::NonFiniteCoordinate { name: "left_hip", .. })
        ));
    }

    #[test]
    fn test_deserialize_defaults() {
        let pose: Pose =
            serde_json::from_str(r#"{"keypoints":[{"name":"right_knee","x":1,"y":2}]}"#).unwrap();
        assert_eq!(pose.score, 1.0);
        assert_eq!(pose.timestamp, None);
        assert_eq!(pose.keypoints[0].name, KeypointName::RightKnee);
        assert_eq!(pose.keypoints[0].score, 1.0);
    }
}
