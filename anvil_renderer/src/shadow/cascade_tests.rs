use glam::{UVec2, Vec3, Vec4Swizzles};
use super::*;
use crate::camera::CameraData;
use crate::geometry::Bounds3D;

fn camera() -> CameraData {
    CameraData::perspective(60f32.to_radians(), UVec2::new(1280, 720), 1.0, 100.0)
        .looking_at(Vec3::new(0.0, 5.0, 20.0), Vec3::ZERO, Vec3::Y)
}

fn scene() -> Bounds3D {
    Bounds3D::new(Vec3::new(-20.0, 0.0, -20.0), Vec3::new(20.0, 10.0, 20.0))
}

fn project(m: &Mat4, p: Vec3) -> Vec3 {
    let clip = *m * p.extend(1.0);
    clip.xyz() / clip.w
}

// ============================================================================
// Splits
// ============================================================================

#[test]
fn test_linear_splits() {
    let splits = compute_splits(1.0, 101.0, 4, SplitScheme::Linear);
    assert_eq!(splits, vec![26.0, 51.0, 76.0, 101.0]);
}

#[test]
fn test_logarithmic_splits() {
    let splits = compute_splits(1.0, 100.0, 2, SplitScheme::Logarithmic);
    assert!((splits[0] - 10.0).abs() < 1e-3);
    assert_eq!(splits[1], 100.0);
}

#[test]
fn test_blend_between_schemes() {
    let linear = compute_splits(1.0, 100.0, 3, SplitScheme::Linear);
    let log = compute_splits(1.0, 100.0, 3, SplitScheme::Logarithmic);
    let blend = compute_splits(1.0, 100.0, 3, SplitScheme::Blend(0.5));
    for i in 0..3 {
        let expected = (linear[i] + log[i]) * 0.5;
        assert!((blend[i] - expected).abs() < 1e-3, "split {}: {} vs {}", i, blend[i], expected);
    }
}

#[test]
fn test_blend_lambda_is_clamped() {
    assert_eq!(
        compute_splits(0.5, 50.0, 3, SplitScheme::Blend(7.0)),
        compute_splits(0.5, 50.0, 3, SplitScheme::Logarithmic),
    );
    assert_eq!(
        compute_splits(0.5, 50.0, 3, SplitScheme::Blend(-1.0)),
        compute_splits(0.5, 50.0, 3, SplitScheme::Linear),
    );
}

#[test]
fn test_splits_strictly_increase_and_end_at_far() {
    for scheme in [SplitScheme::Linear, SplitScheme::Logarithmic, SplitScheme::Blend(0.75)] {
        for count in 1..=4 {
            let splits = compute_splits(0.0, 250.0, count, scheme);
            assert_eq!(splits.len(), count);
            assert_eq!(*splits.last().unwrap(), 250.0);
            assert!(splits[0] > 0.0);
            for pair in splits.windows(2) {
                assert!(pair[0] < pair[1], "{:?} {:?}", scheme, splits);
            }
        }
    }
}

#[test]
fn test_splits_empty_cases() {
    assert!(compute_splits(1.0, 100.0, 0, SplitScheme::Linear).is_empty());
    assert!(compute_splits(10.0, 10.0, 2, SplitScheme::Linear).is_empty());
    assert!(compute_splits(10.0, 1.0, 2, SplitScheme::Linear).is_empty());
}

// ============================================================================
// Fitting
// ============================================================================

#[test]
fn test_fit_contains_scene_depth() {
    let cam = camera();
    let bounds = scene();
    let m = fit_frustum_to_scene(&cam, 1.0, 30.0, Vec3::new(-0.3, -1.0, -0.2), &bounds, 1024).unwrap();

    // Every scene corner is in front of the near plane and behind the far plane
    for corner in bounds.corners() {
        let p = project(&m, corner);
        assert!(p.z >= -1.0 && p.z <= 1.0, "corner {:?} -> {:?}", corner, p);
    }
}

#[test]
fn test_fit_xy_covers_slice_inside_scene() {
    let cam = camera();
    let bounds = scene();
    let m = fit_frustum_to_scene(&cam, 1.0, 10.0, Vec3::NEG_Y, &bounds, 2048).unwrap();

    // Slice corners that lie inside the scene box land in the map
    let slice = cam.slice_corners(1.0, 10.0).unwrap();
    for corner in slice.iter().filter(|c| bounds.contains(**c)) {
        let p = project(&m, *corner);
        assert!(p.x.abs() <= 1.0 + 1e-4 && p.y.abs() <= 1.0 + 1e-4, "{:?}", p);
    }
}

/// Light-space width of an orthographic fit; the view rotation keeps rows
/// unit length, so row 0 carries 2 / width
fn fit_width(m: &Mat4) -> f32 {
    2.0 / m.row(0).truncate().length()
}

#[test]
fn test_fit_snapping_grows_extent() {
    let cam = camera();
    let bounds = scene();
    let coarse = fit_frustum_to_scene(&cam, 1.0, 20.0, Vec3::NEG_Y, &bounds, 1).unwrap();
    let medium = fit_frustum_to_scene(&cam, 1.0, 20.0, Vec3::NEG_Y, &bounds, 7).unwrap();
    let fine = fit_frustum_to_scene(&cam, 1.0, 20.0, Vec3::NEG_Y, &bounds, 4096).unwrap();

    let (coarse, medium, fine) = (fit_width(&coarse), fit_width(&medium), fit_width(&fine));
    assert!(coarse.is_finite() && medium.is_finite() && fine.is_finite());
    assert!(coarse >= medium - 1e-3, "{} < {}", coarse, medium);
    assert!(medium >= fine - 1e-3, "{} < {}", medium, fine);
}

#[test]
fn test_fit_extent_is_whole_cells_as_camera_moves() {
    let bounds = scene();
    let resolution = 64;
    for offset in [0.0, 0.37, 1.91, -2.45] {
        let cam = CameraData::perspective(60f32.to_radians(), UVec2::new(1280, 720), 1.0, 100.0)
            .looking_at(Vec3::new(offset, 5.0, 20.0 + offset), Vec3::new(offset, 0.0, 0.0), Vec3::Y);
        let m = fit_frustum_to_scene(&cam, 1.0, 20.0, Vec3::NEG_Y, &bounds, resolution).unwrap();

        // Cell size depends on the slice shape only, not on where it is
        let cell = 2.0 * bounding_radius(&cam.slice_corners(1.0, 20.0).unwrap()) / resolution as f32;
        let cells = fit_width(&m) / cell;
        assert!((cells - cells.round()).abs() < 1e-2, "offset {}: {} cells", offset, cells);
    }
}

#[test]
fn test_bounding_radius_is_camera_invariant() {
    let near = camera().slice_corners(1.0, 20.0).unwrap();
    let moved = CameraData::perspective(60f32.to_radians(), UVec2::new(1280, 720), 1.0, 100.0)
        .looking_at(Vec3::new(13.0, -4.0, 2.0), Vec3::new(-7.0, 1.0, 9.0), Vec3::Y)
        .slice_corners(1.0, 20.0)
        .unwrap();
    assert!((bounding_radius(&near) - bounding_radius(&moved)).abs() < 1e-3);
    for corner in near {
        let center = near.iter().copied().sum::<Vec3>() / 8.0;
        assert!(corner.distance(center) <= bounding_radius(&near) + 1e-4);
    }
}

#[test]
fn test_fit_rejects_degenerate_scene() {
    let cam = camera();
    let flat = Bounds3D::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 0.0, 1.0));
    assert!(fit_frustum_to_scene(&cam, 1.0, 10.0, Vec3::NEG_Y, &flat, 1024).is_none());
    assert!(fit_frustum_to_scene(&cam, 1.0, 10.0, Vec3::NEG_Y, &Bounds3D::empty(), 1024).is_none());
}

#[test]
fn test_fit_rejects_zero_light_direction() {
    let cam = camera();
    assert!(fit_frustum_to_scene(&cam, 1.0, 10.0, Vec3::ZERO, &scene(), 1024).is_none());
}

#[test]
fn test_fit_rejects_disjoint_scene() {
    let cam = camera();
    // Far behind the camera, outside the slice in light space
    let elsewhere = Bounds3D::new(Vec3::new(500.0, 0.0, 500.0), Vec3::new(510.0, 10.0, 510.0));
    assert!(fit_frustum_to_scene(&cam, 1.0, 10.0, Vec3::NEG_Y, &elsewhere, 1024).is_none());
}
