/// GPU uniform blocks.
///
/// Every block is `#[repr(C)]` + `Pod` and laid out in 16-byte rows so the
/// same bytes match std140 on the shader side. Upload with
/// `bytemuck::bytes_of`.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use crate::engine_warn;
use crate::camera::CameraData;
use super::light::LightSet;

const SOURCE: &str = "anvil::LightingUniforms";

pub const MAX_POINT_LIGHTS: usize = 16;
pub const MAX_SPOT_LIGHTS: usize = 8;
pub const MAX_CASCADES: usize = 4;

fn row(v: Vec3, w: f32) -> [f32; 4] {
    [v.x, v.y, v.z, w]
}

/// Per-scene values, binding 0
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PerScene {
    /// Seconds since the renderer was created
    pub time: f32,
    pub frame_index: u32,
    pub _padding: [u32; 2],
}

impl PerScene {
    pub const BINDING: u32 = 0;

    pub fn new(time: f32, frame_index: u64) -> Self {
        Self { time, frame_index: frame_index as u32, _padding: [0; 2] }
    }
}

/// Per-camera values, binding 1
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PerView {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    /// Eye position (xyz), far clip (w)
    pub eye: [f32; 4],
}

impl PerView {
    pub const BINDING: u32 = 1;

    pub fn new(view: &Mat4, projection: &Mat4, eye: Vec3, far_clip: f32) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            view_proj: (*projection * *view).to_cols_array_2d(),
            eye: row(eye, far_clip),
        }
    }

    pub fn from_camera(camera: &CameraData) -> Self {
        Self::new(&camera.view, &camera.projection, camera.eye, camera.far_clip)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointLightUniform {
    /// Position (xyz), range (w)
    pub position: [f32; 4],
    /// Color (rgb), intensity (w)
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SpotLightUniform {
    /// Position (xyz), range (w)
    pub position: [f32; 4],
    /// Normalized direction (xyz), cos of the inner angle (w)
    pub direction: [f32; 4],
    /// Color (rgb), intensity (w)
    pub color: [f32; 4],
    /// x = cos of the outer angle
    pub params: [f32; 4],
}

/// Light block, binding 2
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightingUniforms {
    /// Normalized direction (xyz), 1.0 in w when the light is present
    pub directional_direction: [f32; 4],
    /// Color (rgb), intensity (w)
    pub directional_color: [f32; 4],
    pub point_lights: [PointLightUniform; MAX_POINT_LIGHTS],
    pub spot_lights: [SpotLightUniform; MAX_SPOT_LIGHTS],
    pub num_point_lights: u32,
    pub num_spot_lights: u32,
    pub _padding: [u32; 2],
}

impl LightingUniforms {
    pub const BINDING: u32 = 2;

    /// Pack a light set. Lights past the fixed capacity are dropped with a
    /// warning.
    pub fn from_lights(lights: &LightSet<'_>) -> Self {
        let mut block = Self::zeroed();

        if let Some(light) = lights.directional {
            let dir = light.direction.normalize_or_zero();
            block.directional_direction = row(dir, 1.0);
            block.directional_color = row(light.color, light.intensity);
        }

        if lights.points.len() > MAX_POINT_LIGHTS {
            engine_warn!(
                SOURCE, "{} point lights submitted, only {} are shaded",
                lights.points.len(), MAX_POINT_LIGHTS
            );
        }
        for (slot, light) in block.point_lights.iter_mut().zip(lights.points) {
            *slot = PointLightUniform {
                position: row(light.position, light.range),
                color: row(light.color, light.intensity),
            };
        }
        block.num_point_lights = lights.points.len().min(MAX_POINT_LIGHTS) as u32;

        if lights.spots.len() > MAX_SPOT_LIGHTS {
            engine_warn!(
                SOURCE, "{} spot lights submitted, only {} are shaded",
                lights.spots.len(), MAX_SPOT_LIGHTS
            );
        }
        for (slot, light) in block.spot_lights.iter_mut().zip(lights.spots) {
            *slot = SpotLightUniform {
                position: row(light.position, light.range),
                direction: row(light.direction.normalize_or_zero(), light.inner_angle.cos()),
                color: row(light.color, light.intensity),
                params: [light.outer_angle.cos(), 0.0, 0.0, 0.0],
            };
        }
        block.num_spot_lights = lights.spots.len().min(MAX_SPOT_LIGHTS) as u32;

        block
    }

    pub fn has_directional(&self) -> bool {
        self.directional_direction[3] > 0.0
    }
}

/// Cascade block, binding 3
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShadowUniforms {
    pub light_view_proj: [[[f32; 4]; 4]; MAX_CASCADES],
    /// View-space far split of each cascade
    pub split_depths: [f32; 4],
    /// 0 disables shadow lookups for the frame
    pub cascade_count: u32,
    /// Texture unit of cascade 0; cascade i is at `first_unit + i`
    pub first_unit: u32,
    pub _padding: [u32; 2],
}

impl ShadowUniforms {
    pub const BINDING: u32 = 3;

    /// No active cascade
    pub fn disabled() -> Self {
        Self::zeroed()
    }
}

/// Engine push constants: MVP at offset 0, model at offset 64
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectConstants {
    pub mvp: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
}

impl ObjectConstants {
    pub fn new(view_proj: &Mat4, model: &Mat4) -> Self {
        Self {
            mvp: (*view_proj * *model).to_cols_array_2d(),
            model: model.to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
#[path = "uniforms_tests.rs"]
mod tests;
