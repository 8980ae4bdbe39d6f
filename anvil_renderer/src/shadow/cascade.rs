/// Cascade math: split distances and light-space fitting.
///
/// Both functions are pure. The engine calls them once per frame; tests call
/// them directly.

use glam::{Mat4, Vec2, Vec3};
use crate::camera::CameraData;
use crate::geometry::Bounds3D;

/// Near distance used by the logarithmic term when the camera near is 0
const MIN_LOG_NEAR: f32 = 1.0e-3;

/// How the camera depth range is divided between cascades
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplitScheme {
    /// Equal depth per cascade
    Linear,
    /// Equal depth ratio per cascade
    Logarithmic,
    /// `lerp(linear, logarithmic, lambda)`, lambda clamped to [0, 1]
    Blend(f32),
}

impl Default for SplitScheme {
    fn default() -> Self {
        SplitScheme::Blend(0.5)
    }
}

/// Far split distance of every cascade.
///
/// The result has `count` entries, strictly increasing, and the last one is
/// exactly `far`. Empty when `count` is 0 or the range is empty.
pub fn compute_splits(near: f32, far: f32, count: usize, scheme: SplitScheme) -> Vec<f32> {
    if count == 0 || !(far > near) {
        return Vec::new();
    }

    let lambda = match scheme {
        SplitScheme::Linear => 0.0,
        SplitScheme::Logarithmic => 1.0,
        SplitScheme::Blend(lambda) => lambda.clamp(0.0, 1.0),
    };
    let log_near = near.max(MIN_LOG_NEAR);

    let mut splits = Vec::with_capacity(count);
    let mut prev = near;
    for i in 1..=count {
        let p = i as f32 / count as f32;
        let linear = near + (far - near) * p;
        let log = log_near * (far / log_near).powf(p);
        let mut split = linear + (log - linear) * lambda;

        if split <= prev {
            split = prev + (far - near) * 1.0e-6;
        }
        splits.push(split.min(far));
        prev = split;
    }
    if let Some(last) = splits.last_mut() {
        *last = far;
    }
    splits
}

/// Orthographic light view-projection for one cascade.
///
/// The XY extent is the overlap of the camera slice `[split_near,
/// split_far]` and the scene bounds, both seen from the light. The depth
/// range covers the whole scene so casters outside the slice still land in
/// the map. The XY extent is snapped outward to a grid of
/// `slice diameter / resolution` cells, anchored at the scene center. The
/// diameter of the slice's bounding sphere does not change when the camera
/// moves or turns, so the edges only ever jump by whole cells.
///
/// `None` when the light direction is zero, the scene bounds have no volume,
/// the slice cannot be computed, or slice and scene do not overlap.
pub fn fit_frustum_to_scene(
    camera: &CameraData,
    split_near: f32,
    split_far: f32,
    light_direction: Vec3,
    scene_bounds: &Bounds3D,
    resolution: u32,
) -> Option<Mat4> {
    let direction = light_direction.try_normalize()?;
    if scene_bounds.is_degenerate() {
        return None;
    }
    let slice = camera.slice_corners(split_near, split_far)?;

    let center = scene_bounds.center();
    let up = if direction.dot(Vec3::Y).abs() > 0.95 { Vec3::X } else { Vec3::Y };
    let view = Mat4::look_at_rh(center, center + direction, up);

    let slice_box = Bounds3D::from_points(&slice.map(|c| view.transform_point3(c)))?;
    let scene_box = Bounds3D::from_points(&scene_bounds.corners().map(|c| view.transform_point3(c)))?;

    let mut min = slice_box.min.truncate().max(scene_box.min.truncate());
    let mut max = slice_box.max.truncate().min(scene_box.max.truncate());
    if min.x >= max.x || min.y >= max.y {
        return None;
    }

    let texel = Vec2::splat(2.0 * bounding_radius(&slice) / resolution.max(1) as f32);
    if texel.x <= f32::EPSILON {
        return None;
    }
    min = snap_down(min, texel);
    max = snap_up(max, texel);

    // View looks down -Z: distances are negated view-space z
    let depth = scene_box.max.z - scene_box.min.z;
    let pad = depth.max(1.0) * 0.01;
    let z_near = -scene_box.max.z - pad;
    let z_far = -scene_box.min.z + pad;

    let projection = Mat4::orthographic_rh_gl(min.x, max.x, min.y, max.y, z_near, z_far);
    Some(projection * view)
}

/// Radius of the sphere around the centroid of `points` that holds them all
pub(crate) fn bounding_radius(points: &[Vec3; 8]) -> f32 {
    let center = points.iter().copied().sum::<Vec3>() / points.len() as f32;
    points.iter().map(|p| p.distance(center)).fold(0.0, f32::max)
}

fn snap_down(v: Vec2, texel: Vec2) -> Vec2 {
    (v / texel).floor() * texel
}

fn snap_up(v: Vec2, texel: Vec2) -> Vec2 {
    (v / texel).ceil() * texel
}

#[cfg(test)]
#[path = "cascade_tests.rs"]
mod tests;
