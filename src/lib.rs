pub mod cli;
pub mod error;
pub mod geometry;
pub mod pose;
pub mod skeleton;
pub mod source;
pub mod transform;

pub use cli::Cli;
pub use error::PoseError;
pub use geometry::{
    align, compute_pallu_position, compute_pleat_warp, compute_transform, detect_arm_position,
    to_css_transform, AlignmentTransform, ArmPosition, Calibration, PalluPosition, PleatWarpPoint,
    PoseAlignment,
};
pub use pose::{Keypoint, KeypointName, Pose};
pub use skeleton::{draw_pallu_anchor, draw_pose};
pub use source::{reference_pose, JsonPoseSource, PoseSource, ReferencePoseSource};
pub use transform::{apply_pleat_warp, overlay_garment, prepare_garment};
