/// Axis-aligned bounding areas in 2D and 3D.
///
/// Containment conventions:
/// - `Bounds2D::contains` is closed-open (the max edge is excluded)
/// - `Bounds3D::contains` is closed (the max face is included)

use glam::{Mat4, Vec2, Vec3};

// ===== BOUNDS 2D =====

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds2D {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds2D {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_coords(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { min: Vec2::new(x0, y0), max: Vec2::new(x1, y1) }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn area(&self) -> f32 {
        let s = self.size();
        s.x * s.y
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Closed-open containment: `min <= p < max` on both axes.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.y >= self.min.y
            && point.x < self.max.x && point.y < self.max.y
    }

    /// `true` if `other` lies entirely within `self`.
    pub fn encloses(&self, other: &Bounds2D) -> bool {
        self.min.x <= other.min.x && self.max.x >= other.max.x
            && self.min.y <= other.min.y && self.max.y >= other.max.y
    }

    /// `true` if the two areas overlap or touch.
    pub fn intersects(&self, other: &Bounds2D) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
            && self.min.y <= other.max.y && self.max.y >= other.min.y
    }

    pub fn surround(&mut self, point: Vec2) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }
}

// ===== BOUNDS 3D =====

/// Axis-aligned bounding box.
///
/// `min <= max` component-wise once built through `surround` starting from
/// `Bounds3D::empty()` or from a valid box. Degenerate boxes (`min == max`
/// on some axis) are valid and have zero volume.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds3D {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds3D {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Inverted box, the identity element for `surround`.
    pub fn empty() -> Self {
        Self { min: Vec3::splat(f32::MAX), max: Vec3::splat(f32::MIN) }
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self { min: center - half, max: center + half }
    }

    /// Smallest box around a set of points; `None` when empty.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut bounds = Self::empty();
        for &p in points {
            bounds.surround(p);
        }
        Some(bounds)
    }

    /// `true` until `surround` has been called at least once on an empty box.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn volume(&self) -> f32 {
        let s = self.size();
        s.x * s.y * s.z
    }

    /// Zero (or negative) volume: empty, flat, or a single point.
    pub fn is_degenerate(&self) -> bool {
        self.is_empty() || self.volume() <= 0.0
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn depth(&self) -> f32 {
        self.max.z - self.min.z
    }

    /// Closed containment: `min <= p <= max` on all axes.
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// `true` if `other` lies entirely within `self`.
    pub fn encloses(&self, other: &Bounds3D) -> bool {
        self.min.cmple(other.min).all() && self.max.cmpge(other.max).all()
    }

    /// `true` if the two boxes overlap or touch.
    pub fn intersects(&self, other: &Bounds3D) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }

    /// Corner closest to a plane with the given normal (least along it).
    pub fn get_negative(&self, normal: Vec3) -> Vec3 {
        Vec3::new(
            if normal.x < 0.0 { self.max.x } else { self.min.x },
            if normal.y < 0.0 { self.max.y } else { self.min.y },
            if normal.z < 0.0 { self.max.z } else { self.min.z },
        )
    }

    /// Corner farthest along the given normal.
    pub fn get_positive(&self, normal: Vec3) -> Vec3 {
        Vec3::new(
            if normal.x > 0.0 { self.max.x } else { self.min.x },
            if normal.y > 0.0 { self.max.y } else { self.min.y },
            if normal.z > 0.0 { self.max.z } else { self.min.z },
        )
    }

    pub fn surround(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn surround_bounds(&mut self, other: &Bounds3D) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn union(&self, other: &Bounds3D) -> Bounds3D {
        Bounds3D { min: self.min.min(other.min), max: self.max.max(other.max) }
    }

    /// Axis with the largest extent: 0 = x, 1 = y, 2 = z.
    pub fn maximum_extent(&self) -> usize {
        let d = self.size();
        if d.x > d.y && d.x > d.z {
            0
        } else if d.y > d.z {
            1
        } else {
            2
        }
    }

    /// The 8 corners, x varying fastest.
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Box enclosing this box after an affine transform.
    ///
    /// Arvo's method: accumulates each matrix axis scaled by the extents
    /// instead of transforming all 8 corners.
    pub fn transformed(&self, matrix: &Mat4) -> Bounds3D {
        let translation = matrix.col(3).truncate();
        let mut min = translation;
        let mut max = translation;

        for i in 0..3 {
            let axis = matrix.col(i).truncate();
            let a = axis * self.min[i];
            let b = axis * self.max[i];
            min += a.min(b);
            max += a.max(b);
        }

        Bounds3D { min, max }
    }
}

#[cfg(test)]
#[path = "bounds_tests.rs"]
mod tests;
