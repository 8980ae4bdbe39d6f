/// Camera data - a passive description of one view.
///
/// The renderer never animates or stores cameras across frames. The scene
/// collaborator computes view and projection and hands them in with
/// `FrameSubmission::add_camera`.
///
/// Projection helpers follow the GL clip convention (NDC depth in [-1, 1]),
/// which is what `Frustum::from_view_projection` expects.

use glam::{Mat4, UVec2, Vec2, Vec3, Vec4};
use crate::geometry::{Frustum, Ray};
use crate::graphics_device::Viewport;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraData {
    /// World-space eye position
    pub eye: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
    pub near_clip: f32,
    pub far_clip: f32,
    pub viewport: Viewport,
}

impl CameraData {
    pub fn new(
        eye: Vec3,
        view: Mat4,
        projection: Mat4,
        near_clip: f32,
        far_clip: f32,
        viewport: Viewport,
    ) -> Self {
        Self { eye, view, projection, near_clip, far_clip, viewport }
    }

    /// Perspective camera at the origin looking down -Z.
    ///
    /// `fov_y` is the vertical field of view in radians. The aspect ratio
    /// comes from `size`, which also sets the viewport.
    pub fn perspective(fov_y: f32, size: UVec2, near_clip: f32, far_clip: f32) -> Self {
        let aspect = size.x.max(1) as f32 / size.y.max(1) as f32;
        Self {
            eye: Vec3::ZERO,
            view: Mat4::IDENTITY,
            projection: Mat4::perspective_rh_gl(fov_y, aspect, near_clip, far_clip),
            near_clip,
            far_clip,
            viewport: Viewport::full(size.x, size.y),
        }
    }

    /// Same projection, placed at `eye` and aimed at `target`
    pub fn looking_at(mut self, eye: Vec3, target: Vec3, up: Vec3) -> Self {
        self.eye = eye;
        self.view = Mat4::look_at_rh(eye, target, up);
        self
    }

    // ===== GETTERS =====

    /// Combined view-projection matrix (projection * view)
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    pub fn aspect(&self) -> f32 {
        if self.viewport.height > 0.0 {
            self.viewport.width / self.viewport.height
        } else {
            1.0
        }
    }

    /// Culling frustum for this frame
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection())
    }

    /// World-space corners of the slice of the view frustum between two
    /// view depths (distances along the view axis).
    ///
    /// Near-plane corners first, then far-plane corners, each in the order
    /// bottom-left, bottom-right, top-right, top-left. `None` when the
    /// matrices are singular or the clip range is empty.
    pub fn slice_corners(&self, near_depth: f32, far_depth: f32) -> Option<[Vec3; 8]> {
        let range = self.far_clip - self.near_clip;
        if range <= f32::EPSILON {
            return None;
        }
        let inverse = self.inverse_view_projection()?;

        const NDC_XY: [Vec2; 4] = [
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(-1.0, 1.0),
        ];

        let t0 = (near_depth - self.near_clip) / range;
        let t1 = (far_depth - self.near_clip) / range;

        let mut corners = [Vec3::ZERO; 8];
        for (i, xy) in NDC_XY.iter().enumerate() {
            let near = unproject(&inverse, xy.extend(-1.0))?;
            let far = unproject(&inverse, xy.extend(1.0))?;
            corners[i] = near.lerp(far, t0);
            corners[i + 4] = near.lerp(far, t1);
        }
        Some(corners)
    }

    /// World-space ray through a point in normalized device coordinates.
    ///
    /// `None` for singular matrices or a zero-length ray.
    pub fn ray_through(&self, ndc: Vec2) -> Option<Ray> {
        let inverse = self.inverse_view_projection()?;
        let near = unproject(&inverse, ndc.extend(-1.0))?;
        let far = unproject(&inverse, ndc.extend(1.0))?;
        Ray::new(near, far - near)
    }

    fn inverse_view_projection(&self) -> Option<Mat4> {
        let vp = self.view_projection();
        if vp.determinant().abs() <= f32::EPSILON * f32::EPSILON {
            return None;
        }
        Some(vp.inverse())
    }
}

fn unproject(inverse: &Mat4, ndc: Vec3) -> Option<Vec3> {
    let p = *inverse * Vec4::new(ndc.x, ndc.y, ndc.z, 1.0);
    if p.w.abs() <= f32::EPSILON {
        return None;
    }
    Some(p.truncate() / p.w)
}

#[cfg(test)]
#[path = "camera_data_tests.rs"]
mod tests;
