use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::PoseError;
use crate::pose::{Keypoint, KeypointName, Pose};

/// Anything that can hand the aligner a pose: a detector, a recording, a fixture
pub trait PoseSource {
    fn capture(&mut self) -> Result<Pose, PoseError>;
}

/// Front-facing standing pose in a 512x600 frame, arms hanging at the sides
pub fn reference_pose() -> Pose {
    use KeypointName::*;

    let points = [
        (Nose, 256.0, 100.0, 0.95),
        (LeftEye, 248.0, 92.0, 0.93),
        (RightEye, 264.0, 92.0, 0.93),
        (LeftEar, 238.0, 98.0, 0.85),
        (RightEar, 274.0, 98.0, 0.85),
        (LeftShoulder, 220.0, 130.0, 0.92),
        (RightShoulder, 292.0, 130.0, 0.92),
        (LeftElbow, 200.0, 190.0, 0.88),
        (RightElbow, 312.0, 190.0, 0.88),
        (LeftWrist, 195.0, 240.0, 0.85),
        (RightWrist, 317.0, 240.0, 0.85),
        (LeftHip, 240.0, 250.0, 0.9),
        (RightHip, 272.0, 250.0, 0.9),
        (LeftKnee, 235.0, 350.0, 0.87),
        (RightKnee, 277.0, 350.0, 0.87),
        (LeftAnkle, 232.0, 450.0, 0.82),
        (RightAnkle, 280.0, 450.0, 0.82),
    ];

    Pose::new(
        points
            .iter()
            .map(|&(name, x, y, score)| Keypoint::new(name, x, y, score))
            .collect(),
        0.9,
    )
}

/// Always yields the built-in reference pose
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferencePoseSource;

impl PoseSource for ReferencePoseSource {
    fn capture(&mut self) -> Result<Pose, PoseError> {
        Ok(reference_pose())
    }
}

/// A pose file holds one pose or a sequence of frames
#[derive(Deserialize)]
#[serde(untagged)]
enum PoseFile {
    Single(Pose),
    Frames(Vec<Pose>),
}

/// Replays poses recorded to a JSON file, one per capture
#[derive(Debug)]
pub struct JsonPoseSource {
    path: PathBuf,
    frames: VecDeque<Pose>,
}

impl JsonPoseSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PoseError> {
        let path = path.as_ref().to_path_buf();
        let text = fs::read_to_string(&path).map_err(|source| PoseError::Io {
            path: path.clone(),
            source,
        })?;
        let mut source = Self::from_json(&text).map_err(|source| PoseError::Parse {
            path: path.clone(),
            source,
        })?;
        source.path = path;
        Ok(source)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let frames = match serde_json::from_str(text)? {
            PoseFile::Single(pose) => VecDeque::from([pose]),
            PoseFile::Frames(frames) => VecDeque::from(frames),
        };
        if frames.is_empty() {
            return Err(serde::de::Error::custom("pose file contains no frames"));
        }
        Ok(Self {
            path: PathBuf::new(),
            frames,
        })
    }

    /// Frames not yet captured
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl PoseSource for JsonPoseSource {
    fn capture(&mut self) -> Result<Pose, PoseError> {
        let pose = self.frames.pop_front().ok_or(PoseError::Exhausted)?;
        pose.validate()?;
        debug!(
            "Captured pose from {:?}: {} keypoints, score {:.2}",
            self.path,
            pose.keypoints.len(),
            pose.score
        );
        Ok(pose)
    }
}
