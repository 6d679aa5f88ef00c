use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use crate::geometry::PalluPosition;
use crate::pose::{KeypointName, Pose};

use crate::pose::KeypointName::*;

/// Limbs drawn between keypoint pairs (COCO-17 layout)
pub const SKELETON: [(KeypointName, KeypointName); 19] = [
    (LeftAnkle, LeftKnee),
    (LeftKnee, LeftHip),
    (RightAnkle, RightKnee),
    (RightKnee, RightHip),
    (LeftHip, RightHip),
    (LeftShoulder, LeftHip),
    (RightShoulder, RightHip),
    (LeftShoulder, RightShoulder),
    (LeftShoulder, LeftElbow),
    (RightShoulder, RightElbow),
    (LeftElbow, LeftWrist),
    (RightElbow, RightWrist),
    (LeftEye, RightEye),
    (Nose, LeftEye),
    (Nose, RightEye),
    (LeftEye, LeftEar),
    (RightEye, RightEar),
    (LeftEar, LeftShoulder),
    (RightEar, RightShoulder),
];

const ARM_COLOR: Rgba<u8> = Rgba([51, 153, 255, 255]);
const LEG_COLOR: Rgba<u8> = Rgba([255, 128, 0, 255]);
const TORSO_COLOR: Rgba<u8> = Rgba([255, 51, 255, 255]);
const FACE_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);
const PALLU_COLOR: Rgba<u8> = Rgba([255, 255, 0, 255]);
const KEYPOINT_RADIUS: i32 = 4;

fn part_color(name: KeypointName) -> Rgba<u8> {
    match name {
        Nose | LeftEye | RightEye | LeftEar | RightEar => FACE_COLOR,
        LeftElbow | RightElbow | LeftWrist | RightWrist => ARM_COLOR,
        LeftKnee | RightKnee | LeftAnkle | RightAnkle => LEG_COLOR,
        LeftShoulder | RightShoulder | LeftHip | RightHip => TORSO_COLOR,
    }
}

/// Limbs touching a torso joint take the colour of their other end
fn limb_color(from: KeypointName, to: KeypointName) -> Rgba<u8> {
    let (a, b) = (part_color(from), part_color(to));
    if a == TORSO_COLOR {
        b
    } else {
        a
    }
}

/// Draw limbs and keypoints whose confidence reaches `min_score`
pub fn draw_pose(img: &mut RgbaImage, pose: &Pose, min_score: f64) {
    let visible = |name: KeypointName| pose.get(name).filter(|kp| kp.score >= min_score);

    for &(from, to) in SKELETON.iter() {
        if let (Some(a), Some(b)) = (visible(from), visible(to)) {
            draw_line_segment_mut(
                img,
                (a.x as f32, a.y as f32),
                (b.x as f32, b.y as f32),
                limb_color(from, to),
            );
        }
    }

    for kp in pose.keypoints.iter().filter(|kp| kp.score >= min_score) {
        draw_filled_circle_mut(
            img,
            (kp.x.round() as i32, kp.y.round() as i32),
            KEYPOINT_RADIUS,
            part_color(kp.name),
        );
    }
}

/// Mark where the pallu hangs from
pub fn draw_pallu_anchor(img: &mut RgbaImage, pallu: &PalluPosition) {
    let (x, y) = (pallu.x as f32, pallu.y as f32);
    let length = 40.0;
    let (sin, cos) = pallu.rotation.sin_cos();
    draw_line_segment_mut(
        img,
        (x, y),
        (x + length * cos as f32, y + length * sin as f32),
        PALLU_COLOR,
    );
    draw_filled_circle_mut(
        img,
        (pallu.x.round() as i32, pallu.y.round() as i32),
        KEYPOINT_RADIUS,
        PALLU_COLOR,
    );
}
