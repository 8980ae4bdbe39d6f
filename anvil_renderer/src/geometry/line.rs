/// Segments, infinite lines and rays.

use glam::Vec3;
use super::bounds::Bounds3D;
use super::plane::Plane;
use super::sphere::Sphere;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub a: Vec3,
    pub b: Vec3,
}

impl Segment {
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self { a, b }
    }

    /// Unit direction from `a` to `b` (zero for a degenerate segment).
    pub fn direction(&self) -> Vec3 {
        (self.b - self.a).normalize_or_zero()
    }

    pub fn length(&self) -> f32 {
        self.a.distance(self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub origin: Vec3,
    pub direction: Vec3,
}

pub fn closest_point_on_segment(point: Vec3, segment: &Segment) -> Vec3 {
    let length = segment.length();
    if length <= f32::EPSILON {
        return segment.a;
    }
    let dir = (segment.b - segment.a) / length;
    let d = (point - segment.a).dot(dir);
    if d <= 0.0 {
        segment.a
    } else if d >= length {
        segment.b
    } else {
        segment.a + dir * d
    }
}

/// `None` when the line runs parallel to the plane.
pub fn intersect_line_plane(line: &Line, plane: &Plane) -> Option<Vec3> {
    let denom = line.direction.dot(plane.normal());
    if denom.abs() < f32::EPSILON {
        return None;
    }
    let t = plane.distance_to(line.origin) / denom;
    Some(line.origin - line.direction * t)
}

/// Half-line with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// `None` for a zero-length direction.
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let direction = direction.try_normalize()?;
        Some(Self { origin, direction })
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance to the first hit against a box (slab test).
    /// Returns 0 when the origin is inside the box.
    pub fn intersect_bounds(&self, bounds: &Bounds3D) -> Option<f32> {
        let inv = self.direction.recip();
        let t0 = (bounds.min - self.origin) * inv;
        let t1 = (bounds.max - self.origin) * inv;

        let t_near = t0.min(t1).max_element();
        let t_far = t0.max(t1).min_element();

        if t_near > t_far || t_far < 0.0 {
            return None;
        }
        Some(t_near.max(0.0))
    }

    /// Distance to the first hit against a sphere.
    /// Returns 0 when the origin is inside the sphere.
    pub fn intersect_sphere(&self, sphere: &Sphere) -> Option<f32> {
        let oc = self.origin - sphere.center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - sphere.radius * sphere.radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let sqrt_disc = disc.sqrt();
        let t_near = -b - sqrt_disc;
        let t_far = -b + sqrt_disc;
        if t_far < 0.0 {
            return None;
        }
        Some(t_near.max(0.0))
    }
}

#[cfg(test)]
#[path = "line_tests.rs"]
mod tests;
