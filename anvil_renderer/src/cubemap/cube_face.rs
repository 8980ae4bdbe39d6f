/// Cube map faces and their capture orientation.

use glam::{Mat4, Vec3};

/// One face of a cube map, in GL layer order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Texture layer of this face
    pub fn layer(self) -> u32 {
        self as u32
    }

    /// Direction the face camera looks
    pub fn direction(self) -> Vec3 {
        match self {
            CubeFace::PositiveX => Vec3::X,
            CubeFace::NegativeX => Vec3::NEG_X,
            CubeFace::PositiveY => Vec3::Y,
            CubeFace::NegativeY => Vec3::NEG_Y,
            CubeFace::PositiveZ => Vec3::Z,
            CubeFace::NegativeZ => Vec3::NEG_Z,
        }
    }

    /// Up vector of the face camera.
    ///
    /// Cube map sampling puts texel row 0 at the top of the face as seen
    /// from inside the cube, with +t pointing down. These vectors match
    /// that layout, so exported rows are not mirrored.
    pub fn up(self) -> Vec3 {
        match self {
            CubeFace::PositiveX | CubeFace::NegativeX => Vec3::NEG_Y,
            CubeFace::PositiveY => Vec3::Z,
            CubeFace::NegativeY => Vec3::NEG_Z,
            CubeFace::PositiveZ | CubeFace::NegativeZ => Vec3::NEG_Y,
        }
    }

    /// File-name friendly name
    pub fn name(self) -> &'static str {
        match self {
            CubeFace::PositiveX => "positive_x",
            CubeFace::NegativeX => "negative_x",
            CubeFace::PositiveY => "positive_y",
            CubeFace::NegativeY => "negative_y",
            CubeFace::PositiveZ => "positive_z",
            CubeFace::NegativeZ => "negative_z",
        }
    }

    /// View matrix of the face camera placed at `eye`
    pub fn view_matrix(self, eye: Vec3) -> Mat4 {
        Mat4::look_at_rh(eye, eye + self.direction(), self.up())
    }
}

#[cfg(test)]
#[path = "cube_face_tests.rs"]
mod tests;
