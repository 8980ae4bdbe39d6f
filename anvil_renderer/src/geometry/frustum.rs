/// Frustum: six inward-facing planes for visibility queries.
///
/// Planes are normalized as soon as they are extracted, so signed
/// distances are in world units. A frustum is rebuilt every frame from the
/// current view-projection matrix and never kept across frames.

use glam::{Mat4, Vec3};
use super::bounds::Bounds3D;
use super::plane::{Plane, PLANE_EPSILON, intersect_planes};
use super::sphere::Sphere;

/// Index of each plane inside `Frustum::planes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrustumPlane {
    Right = 0,
    Left = 1,
    Bottom = 2,
    Top = 3,
    Near = 4,
    Far = 5,
}

impl FrustumPlane {
    pub const ALL: [FrustumPlane; 6] = [
        FrustumPlane::Right,
        FrustumPlane::Left,
        FrustumPlane::Bottom,
        FrustumPlane::Top,
        FrustumPlane::Near,
        FrustumPlane::Far,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Three-way classification of a volume against a frustum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Entirely inside every plane
    Inside,
    /// Straddles at least one plane
    Partial,
    /// Entirely outside at least one plane
    Outside,
}

impl Visibility {
    /// `Inside` and `Partial` are both drawn.
    pub fn is_visible(self) -> bool {
        self != Visibility::Outside
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Ordered by `FrustumPlane`
    pub planes: [Plane; 6],
}

impl Default for Frustum {
    /// The NDC cube `[-1, 1]^3`.
    fn default() -> Self {
        Self {
            planes: [
                Plane::from_normal_distance(Vec3::NEG_X, 1.0),
                Plane::from_normal_distance(Vec3::X, 1.0),
                Plane::from_normal_distance(Vec3::Y, 1.0),
                Plane::from_normal_distance(Vec3::NEG_Y, 1.0),
                Plane::from_normal_distance(Vec3::Z, 1.0),
                Plane::from_normal_distance(Vec3::NEG_Z, 1.0),
            ],
        }
    }
}

impl Frustum {
    /// Extract the planes of a view-projection matrix (Gribb & Hartmann).
    ///
    /// Expects the GL clip convention (`-w <= z <= w`), which is what
    /// `Mat4::perspective_rh_gl` and `Mat4::orthographic_rh_gl` produce.
    /// The sign of each row combination decides which side is "inside";
    /// swapping any of them inverts culling for that plane.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let m = vp.to_cols_array_2d();

        let combine = |axis: usize, sign: f32| {
            Plane::from_equation(glam::Vec4::new(
                m[0][3] + sign * m[0][axis],
                m[1][3] + sign * m[1][axis],
                m[2][3] + sign * m[2][axis],
                m[3][3] + sign * m[3][axis],
            ))
            .normalized()
        };

        Self {
            planes: [
                combine(0, -1.0), // right:  row3 - row0
                combine(0, 1.0),  // left:   row3 + row0
                combine(1, 1.0),  // bottom: row3 + row1
                combine(1, -1.0), // top:    row3 - row1
                combine(2, 1.0),  // near:   row3 + row2
                combine(2, -1.0), // far:    row3 - row2
            ],
        }
    }

    pub fn plane(&self, which: FrustumPlane) -> &Plane {
        &self.planes[which.index()]
    }

    /// Strictly in front of all six planes (by more than `PLANE_EPSILON`).
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| p.distance_to(point) > PLANE_EPSILON)
    }

    pub fn contains_sphere(&self, sphere: &Sphere) -> bool {
        self.planes.iter().all(|p| p.distance_to(sphere.center) >= sphere.radius)
    }

    pub fn contains_bounds(&self, bounds: &Bounds3D) -> bool {
        self.planes.iter().all(|p| {
            let n = p.normal();
            p.distance_to(bounds.get_positive(n)) >= 0.0
                && p.distance_to(bounds.get_negative(n)) >= 0.0
        })
    }

    /// Fully or partially inside. Touching a plane from outside counts.
    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        self.planes.iter().all(|p| p.distance_to(sphere.center) >= -sphere.radius)
    }

    /// Fully or partially inside. Conservative: boxes near a frustum edge
    /// may report `true` while lying outside.
    pub fn intersects_bounds(&self, bounds: &Bounds3D) -> bool {
        self.planes.iter().all(|p| p.distance_to(bounds.get_positive(p.normal())) >= 0.0)
    }

    pub fn classify_bounds(&self, bounds: &Bounds3D) -> Visibility {
        if !self.intersects_bounds(bounds) {
            Visibility::Outside
        } else if self.contains_bounds(bounds) {
            Visibility::Inside
        } else {
            Visibility::Partial
        }
    }

    pub fn classify_sphere(&self, sphere: &Sphere) -> Visibility {
        if !self.intersects_sphere(sphere) {
            Visibility::Outside
        } else if self.contains_sphere(sphere) {
            Visibility::Inside
        } else {
            Visibility::Partial
        }
    }

    /// The 8 corners: far plane first (TL, BR, BL, TR), then near plane in
    /// the same order. `None` if two planes are parallel.
    pub fn corners(&self) -> Option<[Vec3; 8]> {
        use FrustumPlane::*;
        let p = |a: FrustumPlane, b: FrustumPlane, c: FrustumPlane| {
            intersect_planes(self.plane(a), self.plane(b), self.plane(c))
        };

        Some([
            p(Far, Top, Left)?,
            p(Far, Bottom, Right)?,
            p(Far, Bottom, Left)?,
            p(Far, Top, Right)?,
            p(Near, Top, Left)?,
            p(Near, Bottom, Right)?,
            p(Near, Bottom, Left)?,
            p(Near, Top, Right)?,
        ])
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
