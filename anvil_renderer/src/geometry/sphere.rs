/// Bounding sphere and the incremental enclosing-sphere builder.

use glam::Vec3;

/// Smallest radius handed out by `compute_enclosing_sphere`.
pub const SPHERE_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    /// Negative radii are clamped to zero.
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius: radius.max(0.0) }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        self.center.distance_squared(point) <= self.radius * self.radius
    }

    pub fn intersects(&self, other: &Sphere) -> bool {
        let r = self.radius + other.radius;
        self.center.distance_squared(other.center) <= r * r
    }
}

/// Approximate minimal sphere around `points` ("bouncing bubble", O(n)).
///
/// Two growth passes in input order, then a repair pass that only ever
/// grows the sphere to swallow stragglers. The result is order dependent
/// and not minimal, but every input point ends up inside it.
///
/// An empty slice yields a sphere of radius `min_radius` at the origin.
pub fn compute_enclosing_sphere(points: &[Vec3], min_radius: f32) -> Sphere {
    let min_radius = min_radius.max(SPHERE_EPSILON);

    let Some(&first) = points.first() else {
        return Sphere::new(Vec3::ZERO, min_radius);
    };

    let mut center = first;
    let mut radius = min_radius;

    for _ in 0..2 {
        for &v in points {
            let dist_sq = center.distance_squared(v);
            if dist_sq > radius * radius {
                let p = dist_sq.sqrt() / radius;
                let p_inv = 1.0 / p;
                let p_inv_sq = p_inv * p_inv;
                radius = 0.5 * (p + p_inv) * radius;
                center = ((1.0 + p_inv_sq) * center + (1.0 - p_inv_sq) * v) * 0.5;
            }
        }
    }

    // Each repair step encloses the previous sphere, so points already
    // visited stay inside.
    for &v in points {
        let dist_sq = center.distance_squared(v);
        if dist_sq > radius * radius {
            let dist = dist_sq.sqrt();
            let grown = (radius + dist) * 0.5;
            center += (v - center) * ((grown - radius) / dist);
            radius = grown;
        }
    }

    Sphere::new(center, radius)
}

#[cfg(test)]
#[path = "sphere_tests.rs"]
mod tests;
