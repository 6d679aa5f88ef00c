use saree_fit::{
    align, compute_pallu_position, compute_pleat_warp, compute_transform, detect_arm_position,
    reference_pose, AlignmentTransform, ArmPosition, Calibration, JsonPoseSource, Keypoint,
    KeypointName, Pose, PoseError, PoseSource,
};

use saree_fit::KeypointName::*;

fn pose(points: &[(KeypointName, f64, f64)]) -> Pose {
    Pose::new(
        points
            .iter()
            .map(|&(name, x, y)| Keypoint::new(name, x, y, 0.9))
            .collect(),
        0.9,
    )
}

fn torso() -> Vec<(KeypointName, f64, f64)> {
    vec![
        (LeftShoulder, 220.0, 130.0),
        (RightShoulder, 292.0, 130.0),
        (LeftHip, 240.0, 250.0),
        (RightHip, 272.0, 250.0),
    ]
}

#[test]
fn missing_torso_keypoint_gives_default_transform() {
    let expected = AlignmentTransform {
        translate_x: 256.0,
        translate_y: 300.0,
        scale_x: 1.0,
        scale_y: 1.0,
        rotation_angle: 0.0,
        skew_x: 0.0,
        skew_y: 0.0,
    };

    for skip in 0..4 {
        let mut points = torso();
        points.remove(skip);
        points.push((Nose, 256.0, 100.0));
        assert_eq!(compute_transform(&pose(&points)), expected);
    }
    assert_eq!(compute_transform(&pose(&[])), expected);
}

#[test]
fn symmetric_pose_has_no_rotation_or_vertical_skew() {
    let mut points = torso();
    points.push((Nose, 256.0, 100.0));
    points.push((LeftKnee, 235.0, 350.0));
    let t = compute_transform(&pose(&points));
    assert_eq!(t.rotation_angle, 0.0);
    assert_eq!(t.skew_y, 0.0);
}

#[test]
fn transform_is_deterministic() {
    let p = reference_pose();
    let a = compute_transform(&p);
    let b = compute_transform(&p);
    assert_eq!(a.translate_x.to_bits(), b.translate_x.to_bits());
    assert_eq!(a.scale_y.to_bits(), b.scale_y.to_bits());
    assert_eq!(a.skew_x.to_bits(), b.skew_x.to_bits());
    assert_eq!(a, b);
    assert_eq!(align(&p, &Calibration::default()), align(&p, &Calibration::default()));
}

#[test]
fn worked_example() {
    let mut points = torso();
    points.push((Nose, 256.0, 100.0));
    points.push((LeftKnee, 235.0, 350.0));
    let t = compute_transform(&pose(&points));

    assert_eq!(t.translate_x, 256.0);
    assert_eq!(t.translate_y, 130.0);
    assert!((t.scale_x - 72.0 / 70.0).abs() < 1e-12);
    assert!((t.scale_x - 1.0286).abs() < 1e-4);
    assert_eq!(t.rotation_angle, 0.0);
    assert!((t.skew_x - (-0.5556 * 0.3)).abs() < 1e-4);
    assert!((t.skew_x + 0.1667).abs() < 1e-4);

    // nose-to-knee distance is sqrt(21^2 + 250^2)
    let body_height = (21.0f64 * 21.0 + 250.0 * 250.0).sqrt();
    assert!((t.scale_y - (72.0 / 70.0) * body_height / 400.0).abs() < 1e-12);
}

#[test]
fn pleat_warp_follows_present_pairs() {
    let all = reference_pose();
    let samples = compute_pleat_warp(&all);
    let points: Vec<f64> = samples.iter().map(|s| s.point).collect();
    assert_eq!(points, vec![0.0, 0.5, 1.0]);
    assert_eq!(samples[0].warp, 72.0 / 256.0);
    assert_eq!(samples[1].warp, 32.0 / 256.0);
    assert_eq!(samples[2].warp, 42.0 / 256.0);

    let no_hips = pose(&[
        (LeftShoulder, 220.0, 130.0),
        (RightShoulder, 292.0, 130.0),
        (LeftHip, 240.0, 250.0),
        (LeftKnee, 235.0, 350.0),
        (RightKnee, 277.0, 350.0),
    ]);
    let points: Vec<f64> = compute_pleat_warp(&no_hips).iter().map(|s| s.point).collect();
    assert_eq!(points, vec![0.0, 1.0]);

    assert!(compute_pleat_warp(&pose(&[(RightKnee, 1.0, 1.0)])).is_empty());
}

#[test]
fn pallu_without_elbow_curves_to_minimum() {
    let p = pose(&[(RightShoulder, 292.0, 130.0), (RightHip, 272.0, 250.0)]);
    let pallu = compute_pallu_position(&p);
    assert_eq!(pallu.curve, -0.3);
    assert_eq!(pallu.x, 342.0);
    assert_eq!(pallu.y, 130.0);
    assert_eq!(pallu.rotation, 120.0f64.atan2(-20.0));
}

#[test]
fn arm_position_rules() {
    let shoulders = [(LeftShoulder, 220.0, 130.0), (RightShoulder, 292.0, 130.0)];

    let raised = pose(&[
        shoulders[0],
        shoulders[1],
        (LeftWrist, 220.0, 90.0),
        (RightWrist, 292.0, 90.0),
    ]);
    assert_eq!(detect_arm_position(&raised), ArmPosition::Raised);

    let crossed = pose(&[
        shoulders[0],
        shoulders[1],
        (LeftWrist, 260.0, 280.0),
        (RightWrist, 250.0, 280.0),
    ]);
    assert_eq!(detect_arm_position(&crossed), ArmPosition::Crossed);

    assert_eq!(detect_arm_position(&reference_pose()), ArmPosition::Relaxed);

    let missing_wrist = pose(&[shoulders[0], shoulders[1], (LeftWrist, 220.0, 90.0)]);
    assert_eq!(detect_arm_position(&missing_wrist), ArmPosition::Relaxed);
}

#[test]
fn demo_frames_replay_in_order() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/pose_frames.json");
    let mut source = JsonPoseSource::open(path).unwrap();
    assert_eq!(source.remaining(), 2);

    let first = source.capture().unwrap();
    assert_eq!(first.timestamp, Some(0));
    assert_eq!(detect_arm_position(&first), ArmPosition::Relaxed);
    assert_eq!(compute_pleat_warp(&first).len(), 3);

    let second = source.capture().unwrap();
    assert_eq!(second.timestamp, Some(33));
    assert_eq!(detect_arm_position(&second), ArmPosition::Custom);
    assert!(compute_transform(&second).rotation_angle > 0.0);
    assert_eq!(compute_pleat_warp(&second).len(), 2);

    assert!(matches!(source.capture(), Err(PoseError::Exhausted)));
}

#[test]
fn non_finite_coordinates_fail_validation_but_not_geometry() {
    let mut points = torso();
    points.push((Nose, f64::NAN, 100.0));
    let bad = pose(&points);
    assert!(matches!(bad.validate(), Err(PoseError::NonFiniteCoordinate { .. })));

    // geometry still returns a value for the well-formed torso
    assert_eq!(compute_pleat_warp(&bad).len(), 2);
}

#[test]
fn empty_pose_file_is_rejected() {
    let path = std::env::temp_dir().join(format!("saree-fit-empty-{}.json", std::process::id()));
    std::fs::write(&path, "[]").unwrap();
    let result = JsonPoseSource::open(&path);
    std::fs::remove_file(&path).ok();
    assert!(matches!(result, Err(PoseError::Parse { .. })));
}

#[test]
fn degenerate_torso_keeps_transform_usable() {
    let p = pose(&[
        (LeftShoulder, 0.0, 0.0),
        (RightShoulder, 70.0, 0.0),
        (LeftHip, 100.0, 0.0),
        (RightHip, 170.0, 0.0),
    ]);
    let t = compute_transform(&p);
    assert_eq!(t.skew_y, 0.0);
    assert!(t.to_matrix().iter().all(|v| v.is_finite()));
}
