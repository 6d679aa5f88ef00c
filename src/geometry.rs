use std::f64::consts::FRAC_PI_2;

use nalgebra::{center, distance, Matrix3};
use serde::{Deserialize, Serialize};

use crate::pose::{KeypointName, Pose};

/// Reference measurements the alignment constants were tuned against.
///
/// All lengths are in the pixel space of the incoming pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Shoulder width that maps to a scale of 1
    pub reference_shoulder_width: f64,
    /// Nose-to-knee height that maps to a vertical scale of 1
    pub reference_body_height: f64,
    /// Width that pleat spans are normalised by
    pub pleat_reference_width: f64,
    /// Horizontal overhang of the pallu past the right shoulder
    pub pallu_offset: f64,
    /// Shoulder-to-elbow distance giving a neutral drape curve
    pub elbow_reference_distance: f64,
    /// Where the garment sits when the pose is incomplete
    pub default_translate: (f64, f64),
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            reference_shoulder_width: 70.0,
            reference_body_height: 400.0,
            pleat_reference_width: 256.0,
            pallu_offset: 50.0,
            elbow_reference_distance: 100.0,
            default_translate: (256.0, 300.0),
        }
    }
}

const SKEW_X_FACTOR: f64 = 0.3;
const SKEW_Y_FACTOR: f64 = 0.2;
const PALLU_CURVE_LIMIT: f64 = 0.3;
const RAISED_THRESHOLD: f64 = 30.0;
const CROSSED_DROP: f64 = 100.0;
const CROSSED_SPREAD: f64 = 50.0;

/// Placement of a garment overlay derived from a pose.
///
/// Angles are in radians; translation is the shoulder center in pose pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentTransform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotation_angle: f64,
    pub skew_x: f64,
    pub skew_y: f64,
}

impl AlignmentTransform {
    /// Fallback used when shoulders or hips are missing
    pub fn fallback(calibration: &Calibration) -> Self {
        let (tx, ty) = calibration.default_translate;
        Self {
            translate_x: tx,
            translate_y: ty,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation_angle: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
        }
    }

    /// Homogeneous matrix for translate, rotate, scale, skewX, skewY applied in CSS order
    pub fn to_matrix(&self) -> Matrix3<f64> {
        let (sin, cos) = self.rotation_angle.sin_cos();

        #[rustfmt::skip]
        let translate = Matrix3::new(
            1.0, 0.0, self.translate_x,
            0.0, 1.0, self.translate_y,
            0.0, 0.0, 1.0,
        );
        #[rustfmt::skip]
        let rotate = Matrix3::new(
            cos, -sin, 0.0,
            sin,  cos, 0.0,
            0.0,  0.0, 1.0,
        );
        #[rustfmt::skip]
        let scale = Matrix3::new(
            self.scale_x, 0.0,          0.0,
            0.0,          self.scale_y, 0.0,
            0.0,          0.0,          1.0,
        );
        #[rustfmt::skip]
        let skew_x = Matrix3::new(
            1.0, self.skew_x.tan(), 0.0,
            0.0, 1.0,               0.0,
            0.0, 0.0,               1.0,
        );
        #[rustfmt::skip]
        let skew_y = Matrix3::new(
            1.0,               0.0, 0.0,
            self.skew_y.tan(), 1.0, 0.0,
            0.0,               0.0, 1.0,
        );

        translate * rotate * scale * skew_x * skew_y
    }
}

impl Default for AlignmentTransform {
    fn default() -> Self {
        Self::fallback(&Calibration::default())
    }
}

/// Horizontal stretch sample at a fraction of the body height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PleatWarpPoint {
    /// 0.0 at the shoulders, 0.5 at the hips, 1.0 at the knees
    pub point: f64,
    pub warp: f64,
}

/// Anchor and drape of the loose end of the saree
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PalluPosition {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub curve: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmPosition {
    Raised,
    Relaxed,
    Crossed,
    /// Exactly one wrist raised above its shoulder. The basic raised/crossed rules
    /// would report this as `Relaxed`; it is split out so a one-sided drape can be used.
    Custom,
}

/// Everything the overlay renderer needs for one pose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseAlignment {
    pub transform: AlignmentTransform,
    pub css_transform: String,
    pub pleat_warp: Vec<PleatWarpPoint>,
    pub pallu: PalluPosition,
    pub arm_position: ArmPosition,
}

pub fn compute_transform(pose: &Pose) -> AlignmentTransform {
    compute_transform_with(pose, &Calibration::default())
}

/// Derive the overlay transform from shoulder, hip, nose and knee keypoints
pub fn compute_transform_with(pose: &Pose, calibration: &Calibration) -> AlignmentTransform {
    let points = pose.keypoint_map();
    let get = |name: KeypointName| points.get(&name).copied();

    let (Some(left_shoulder), Some(right_shoulder), Some(left_hip), Some(right_hip)) = (
        get(KeypointName::LeftShoulder),
        get(KeypointName::RightShoulder),
        get(KeypointName::LeftHip),
        get(KeypointName::RightHip),
    ) else {
        return AlignmentTransform::fallback(calibration);
    };

    let shoulder_center = center(&left_shoulder, &right_shoulder);
    let shoulder_width = distance(&left_shoulder, &right_shoulder);
    let hip_center = center(&left_hip, &right_hip);
    let hip_width = distance(&left_hip, &right_hip);

    // Coincident shoulders leave scale and skew undefined
    if shoulder_width == 0.0 {
        return AlignmentTransform::fallback(calibration);
    }

    let head = get(KeypointName::Nose).unwrap_or(shoulder_center);
    let body_height = match get(KeypointName::LeftKnee) {
        Some(knee) => distance(&head, &knee),
        None => calibration.reference_body_height,
    };

    let shoulder_delta = right_shoulder - left_shoulder;
    let rotation_angle = shoulder_delta.y.atan2(shoulder_delta.x);

    // Torso direction measured from the downward vertical; a torso that does not
    // point down (collapsed or horizontal) has no usable lean
    let torso = hip_center - shoulder_center;
    let skew_y = if torso.y > 0.0 {
        let body_lean = torso.y.atan2(torso.x) - FRAC_PI_2;
        body_lean.tan() * SKEW_Y_FACTOR
    } else {
        0.0
    };

    let scale = shoulder_width / calibration.reference_shoulder_width;
    let scale_y = scale * (body_height / calibration.reference_body_height);
    let skew = (hip_width - shoulder_width) / shoulder_width;

    AlignmentTransform {
        translate_x: shoulder_center.x,
        translate_y: shoulder_center.y,
        scale_x: scale,
        scale_y,
        rotation_angle,
        skew_x: skew * SKEW_X_FACTOR,
        skew_y,
    }
}

/// Render the transform as a CSS transform list.
///
/// Functions are emitted in a fixed order (translate, rotate, scale, skewX, skewY);
/// `AlignmentTransform::to_matrix` composes in the same order.
pub fn to_css_transform(transform: &AlignmentTransform) -> String {
    format!(
        "translate({}px, {}px) rotate({}rad) scale({}, {}) skewX({}rad) skewY({}rad)",
        transform.translate_x,
        transform.translate_y,
        transform.rotation_angle,
        transform.scale_x,
        transform.scale_y,
        transform.skew_x,
        transform.skew_y
    )
}

pub fn compute_pleat_warp(pose: &Pose) -> Vec<PleatWarpPoint> {
    compute_pleat_warp_with(pose, &Calibration::default())
}

/// Sample garment stretch at shoulder, hip and knee level, skipping incomplete pairs
pub fn compute_pleat_warp_with(pose: &Pose, calibration: &Calibration) -> Vec<PleatWarpPoint> {
    let points = pose.keypoint_map();
    let levels = [
        (0.0, KeypointName::LeftShoulder, KeypointName::RightShoulder),
        (0.5, KeypointName::LeftHip, KeypointName::RightHip),
        (1.0, KeypointName::LeftKnee, KeypointName::RightKnee),
    ];

    levels
        .iter()
        .filter_map(|&(point, left, right)| {
            let left = points.get(&left)?;
            let right = points.get(&right)?;
            Some(PleatWarpPoint {
                point,
                warp: (left.x - right.x).abs() / calibration.pleat_reference_width,
            })
        })
        .collect()
}

pub fn compute_pallu_position(pose: &Pose) -> PalluPosition {
    compute_pallu_position_with(pose, &Calibration::default())
}

/// Anchor the pallu off the right shoulder, angled toward the right hip
pub fn compute_pallu_position_with(pose: &Pose, calibration: &Calibration) -> PalluPosition {
    let points = pose.keypoint_map();
    let (Some(shoulder), Some(hip)) = (
        points.get(&KeypointName::RightShoulder),
        points.get(&KeypointName::RightHip),
    ) else {
        return PalluPosition::default();
    };

    let elbow_bend = points
        .get(&KeypointName::RightElbow)
        .map(|elbow| distance(elbow, shoulder) / calibration.elbow_reference_distance)
        .unwrap_or(0.0);

    let drop = hip - shoulder;

    PalluPosition {
        x: shoulder.x + calibration.pallu_offset,
        y: shoulder.y,
        rotation: drop.y.atan2(drop.x),
        curve: (elbow_bend - 1.0).clamp(-PALLU_CURVE_LIMIT, PALLU_CURVE_LIMIT),
    }
}

/// Classify arm placement from wrist height relative to the shoulders (image y grows downward)
pub fn detect_arm_position(pose: &Pose) -> ArmPosition {
    let points = pose.keypoint_map();
    let get = |name: KeypointName| points.get(&name).copied();

    let (Some(left_shoulder), Some(right_shoulder), Some(left_wrist), Some(right_wrist)) = (
        get(KeypointName::LeftShoulder),
        get(KeypointName::RightShoulder),
        get(KeypointName::LeftWrist),
        get(KeypointName::RightWrist),
    ) else {
        return ArmPosition::Relaxed;
    };

    let left_rise = left_shoulder.y - left_wrist.y;
    let right_rise = right_shoulder.y - right_wrist.y;
    let left_raised = left_rise >= RAISED_THRESHOLD;
    let right_raised = right_rise >= RAISED_THRESHOLD;

    if left_raised && right_raised {
        return ArmPosition::Raised;
    }

    let wrist_spread = (left_wrist.x - right_wrist.x).abs();
    if -left_rise >= CROSSED_DROP && -right_rise >= CROSSED_DROP && wrist_spread <= CROSSED_SPREAD
    {
        return ArmPosition::Crossed;
    }

    if left_raised != right_raised {
        return ArmPosition::Custom;
    }

    ArmPosition::Relaxed
}

/// Run every derivation for a pose
pub fn align(pose: &Pose, calibration: &Calibration) -> PoseAlignment {
    let transform = compute_transform_with(pose, calibration);
    PoseAlignment {
        css_transform: to_css_transform(&transform),
        transform,
        pleat_warp: compute_pleat_warp_with(pose, calibration),
        pallu: compute_pallu_position_with(pose, calibration),
        arm_position: detect_arm_position(pose),
    }
}

/// Transform a point using the affine matrix
pub fn transform_point(matrix: &Matrix3<f64>, x: f64, y: f64) -> (f64, f64) {
    let p = nalgebra::Vector3::new(x, y, 1.0);
    let result = matrix * p;
    (result.x / result.z, result.y / result.z)
}
