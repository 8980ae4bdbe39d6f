/// Drawable and Material capabilities.
///
/// Drawables are already resolved to GPU primitives by the scene
/// collaborator. The renderer binds their material, pushes their matrices
/// and calls `draw()`; it never mutates them.

use glam::Mat4;
use crate::error::Result;
use crate::geometry::{Bounds3D, Ray};
use crate::graphics_device::GraphicsDevice;
use crate::resource::ResourceId;

/// Texture a material wants bound to a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureBinding {
    pub unit: u32,
    pub texture: ResourceId,
}

impl TextureBinding {
    pub fn new(unit: u32, texture: impl Into<ResourceId>) -> Self {
        Self { unit, texture: texture.into() }
    }
}

/// Program and texture set used to shade a drawable.
///
/// Handles are resolved through the `ResourceTable`, so the program behind
/// an id may change between frames without notice.
pub trait Material {
    /// Program to draw with
    fn program(&self) -> ResourceId;

    /// Textures to bind before drawing
    fn textures(&self) -> &[TextureBinding] {
        &[]
    }

    /// Upload material-specific state (uniforms, push constants past the
    /// engine block). Called after the program and textures are bound.
    fn bind(&self, _device: &mut dyn GraphicsDevice) -> Result<()> {
        Ok(())
    }
}

/// Something the forward and shadow passes can draw.
pub trait Drawable {
    /// Issue the draw calls. Program, textures and engine constants are
    /// already bound.
    fn draw(&self, device: &mut dyn GraphicsDevice) -> Result<()>;

    /// World-space bounds. Empty bounds mean "never cull".
    fn bounds(&self) -> Bounds3D;

    /// Distance along `ray` to the first hit, if any
    fn raycast(&self, ray: &Ray) -> Option<f32> {
        let bounds = self.bounds();
        if bounds.is_empty() {
            return None;
        }
        ray.intersect_bounds(&bounds)
    }

    fn world_matrix(&self) -> Mat4 {
        Mat4::IDENTITY
    }

    /// `None` draws with the renderer's default forward program
    fn material(&self) -> Option<&dyn Material> {
        None
    }

    fn casts_shadow(&self) -> bool {
        true
    }
}

/// Drawables borrowed for one frame
pub type RenderSet<'a> = &'a [&'a dyn Drawable];
