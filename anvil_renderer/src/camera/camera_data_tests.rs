use glam::{Mat4, UVec2, Vec2, Vec3};
use super::*;

const EPS: f32 = 1e-3;

fn camera() -> CameraData {
    CameraData::perspective(60f32.to_radians(), UVec2::new(1280, 720), 0.1, 100.0)
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_perspective_defaults() {
    let cam = camera();
    assert_eq!(cam.eye, Vec3::ZERO);
    assert_eq!(cam.view, Mat4::IDENTITY);
    assert_eq!(cam.viewport.width, 1280.0);
    assert_eq!(cam.viewport.height, 720.0);
    assert!((cam.aspect() - 1280.0 / 720.0).abs() < 1e-6);
}

#[test]
fn test_looking_at_moves_eye() {
    let cam = camera().looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
    assert_eq!(cam.eye, Vec3::new(0.0, 0.0, 10.0));
    // The eye maps to the view-space origin
    let eye_in_view = cam.view.transform_point3(cam.eye);
    assert!(eye_in_view.length() < EPS);
}

#[test]
fn test_view_projection_order() {
    let cam = camera().looking_at(Vec3::new(3.0, 1.0, 5.0), Vec3::ZERO, Vec3::Y);
    assert_eq!(cam.view_projection(), cam.projection * cam.view);
}

// ============================================================================
// Slice corners
// ============================================================================

#[test]
fn test_slice_corners_full_range_depths() {
    let cam = camera();
    let corners = cam.slice_corners(0.1, 100.0).unwrap();
    for c in &corners[..4] {
        assert!((c.z + 0.1).abs() < EPS, "near corner {:?}", c);
    }
    for c in &corners[4..] {
        assert!((c.z + 100.0).abs() < 0.5, "far corner {:?}", c);
    }
}

#[test]
fn test_slice_corners_sub_range() {
    let cam = camera();
    let corners = cam.slice_corners(10.0, 20.0).unwrap();
    for c in &corners[..4] {
        assert!((c.z + 10.0).abs() < 0.05, "{:?}", c);
    }
    for c in &corners[4..] {
        assert!((c.z + 20.0).abs() < 0.05, "{:?}", c);
    }
    // Far slice is twice as wide as the near slice
    let near_width = (corners[1] - corners[0]).length();
    let far_width = (corners[5] - corners[4]).length();
    assert!((far_width / near_width - 2.0).abs() < 0.01);
}

#[test]
fn test_slice_corners_follow_view() {
    let eye = Vec3::new(5.0, 0.0, 0.0);
    let cam = camera().looking_at(eye, eye + Vec3::X, Vec3::Y);
    let corners = cam.slice_corners(1.0, 2.0).unwrap();
    let center_near = corners[..4].iter().copied().sum::<Vec3>() / 4.0;
    assert!((center_near - Vec3::new(6.0, 0.0, 0.0)).length() < 0.01);
}

#[test]
fn test_slice_corners_degenerate_range() {
    let mut cam = camera();
    cam.far_clip = cam.near_clip;
    assert!(cam.slice_corners(0.1, 1.0).is_none());
}

// ============================================================================
// Rays
// ============================================================================

#[test]
fn test_center_ray_points_forward() {
    let cam = camera().looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
    let ray = cam.ray_through(Vec2::ZERO).unwrap();
    assert!((ray.direction - Vec3::NEG_Z).length() < EPS);
    assert!((ray.origin.z - 4.9).abs() < 0.01);
}

#[test]
fn test_singular_camera_has_no_ray() {
    let mut cam = camera();
    cam.projection = Mat4::ZERO;
    assert!(cam.ray_through(Vec2::ZERO).is_none());
    assert!(cam.slice_corners(1.0, 2.0).is_none());
}
