/// Frustum culling.
///
/// Side-effect free: the same frustum and volume always give the same
/// classification. `Partial` and `Inside` are both drawn; nothing is
/// sub-clipped.

use glam::Mat4;
use crate::geometry::{Bounds3D, Frustum, Sphere, Visibility};
use crate::scene::Drawable;

/// A volume the culler can classify
pub trait BoundingVolume {
    fn classify_against(&self, frustum: &Frustum) -> Visibility;
}

impl BoundingVolume for Bounds3D {
    fn classify_against(&self, frustum: &Frustum) -> Visibility {
        frustum.classify_bounds(self)
    }
}

impl BoundingVolume for Sphere {
    fn classify_against(&self, frustum: &Frustum) -> Visibility {
        frustum.classify_sphere(self)
    }
}

/// Outcome of culling one render set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CullResult {
    /// Indices into the input slice, in input order
    pub visible: Vec<usize>,
    pub inside: usize,
    pub partial: usize,
    pub culled: usize,
}

impl CullResult {
    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }
}

/// Frustum culler. Stateless; every method is an associated function.
pub struct FrustumCuller;

impl FrustumCuller {
    /// Extract the six normalized planes of a view-projection matrix
    pub fn build(view_projection: &Mat4) -> Frustum {
        Frustum::from_view_projection(view_projection)
    }

    pub fn classify(frustum: &Frustum, volume: &impl BoundingVolume) -> Visibility {
        volume.classify_against(frustum)
    }

    /// Classify every drawable. Drawables with empty bounds are never
    /// culled and count as partial.
    pub fn cull(frustum: &Frustum, drawables: &[&dyn Drawable]) -> CullResult {
        let mut result = CullResult {
            visible: Vec::with_capacity(drawables.len()),
            ..CullResult::default()
        };

        for (index, drawable) in drawables.iter().enumerate() {
            let bounds = drawable.bounds();
            let visibility = if bounds.is_empty() {
                Visibility::Partial
            } else {
                Self::classify(frustum, &bounds)
            };

            match visibility {
                Visibility::Inside => result.inside += 1,
                Visibility::Partial => result.partial += 1,
                Visibility::Outside => {
                    result.culled += 1;
                    continue;
                }
            }
            result.visible.push(index);
        }

        result
    }
}

#[cfg(test)]
#[path = "culler_tests.rs"]
mod tests;
