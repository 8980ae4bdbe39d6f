/// Plane in `ax + by + cz + d = 0` form.
///
/// The normal `(a, b, c)` points toward the inside half-space. Raw planes
/// are not guaranteed normalized; call `normalize()` before comparing
/// signed distances against `PLANE_EPSILON`.

use glam::{Mat4, Vec3, Vec4};
use super::line::Line;

/// Tolerance for on-plane tests and frustum point containment.
pub const PLANE_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Plane {
    /// xyz = normal, w = distance
    pub equation: Vec4,
}

impl Plane {
    pub fn from_equation(equation: Vec4) -> Self {
        Self { equation }
    }

    pub fn from_normal_distance(normal: Vec3, distance: f32) -> Self {
        Self { equation: normal.extend(distance) }
    }

    /// Plane through `point` with the given normal.
    pub fn from_normal_point(normal: Vec3, point: Vec3) -> Self {
        Self { equation: normal.extend(-normal.dot(point)) }
    }

    pub fn normal(&self) -> Vec3 {
        self.equation.truncate()
    }

    pub fn distance(&self) -> f32 {
        self.equation.w
    }

    /// Scales the equation so the normal is unit length.
    /// Planes with a zero normal are left unchanged.
    pub fn normalize(&mut self) {
        let len = self.normal().length();
        if len > 0.0 {
            self.equation /= len;
        }
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// Signed distance, positive on the side the normal points to.
    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.normal().dot(point) + self.equation.w
    }

    pub fn contains(&self, point: Vec3) -> bool {
        self.distance_to(point).abs() < PLANE_EPSILON
    }

    pub fn is_positive_half_space(&self, point: Vec3) -> bool {
        self.distance_to(point) > 0.0
    }

    pub fn is_negative_half_space(&self, point: Vec3) -> bool {
        self.distance_to(point) < 0.0
    }

    /// Point on the plane closest to the origin.
    pub fn point(&self) -> Vec3 {
        -self.equation.w * self.normal()
    }

    /// Mirror of a position across the plane.
    pub fn reflect_coord(&self, coord: Vec3) -> Vec3 {
        coord - self.normal() * (2.0 * self.distance_to(coord))
    }

    /// Mirror of a direction across the plane.
    pub fn reflect_vector(&self, vector: Vec3) -> Vec3 {
        self.normal() * (2.0 * self.normal().dot(vector)) - vector
    }

    /// Plane transformed by an affine matrix (inverse-transpose rule).
    pub fn transform(&self, matrix: &Mat4) -> Plane {
        Plane { equation: matrix.inverse().transpose() * self.equation }
    }
}

/// Point shared by three planes, `None` when two of them are parallel.
pub fn intersect_planes(a: &Plane, b: &Plane, c: &Plane) -> Option<Vec3> {
    let (n1, n2, n3) = (a.normal(), b.normal(), c.normal());
    let n2xn3 = n2.cross(n3);
    let det = n1.dot(n2xn3);
    if det.abs() < f32::EPSILON {
        return None;
    }

    let p = -a.distance() * n2xn3 - b.distance() * n3.cross(n1) - c.distance() * n1.cross(n2);
    Some(p / det)
}

/// Line shared by two planes, `None` when they are parallel.
pub fn plane_line_intersection(a: &Plane, b: &Plane) -> Option<Line> {
    let (a, b) = (a.normalized(), b.normalized());
    let direction = a.normal().cross(b.normal());
    if direction.length_squared() < f32::EPSILON {
        return None;
    }

    let ndn = a.normal().dot(b.normal());
    let inv_det = 1.0 / (1.0 - ndn * ndn);
    let c1 = (-a.distance() + b.distance() * ndn) * inv_det;
    let c2 = (-b.distance() + a.distance() * ndn) * inv_det;

    Some(Line {
        origin: c1 * a.normal() + c2 * b.normal(),
        direction: direction.normalize(),
    })
}

#[cfg(test)]
#[path = "plane_tests.rs"]
mod tests;
