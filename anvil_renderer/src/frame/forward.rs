/// Forward scene drawing.
///
/// `ForwardScene` draws a borrowed drawable set from one eye: sky first,
/// then every drawable that survives frustum culling, grouped by program.
/// It is used for the main camera views and, through `SceneRenderer`, for
/// cube map capture.
///
/// Engine constants follow a fixed layout: `PerView`, `LightingUniforms`
/// and `ShadowUniforms` at their bindings, `ObjectConstants` (MVP then
/// model) at push constant offset 0. Cascade depth maps are bound from
/// `SHADOW_TEXTURE_UNIT` upward.

use glam::{Mat3, Mat4, Vec3};
use crate::error::Result;
use crate::engine_warn;
use crate::camera::{CameraData, FrustumCuller};
use crate::cubemap::SceneRenderer;
use crate::graphics_device::{GraphicsDevice, PolygonMode};
use crate::resource::{ProgramResolver, ResourceId, ResourceTable};
use crate::scene::{
    Drawable, LightSet, LightingUniforms, ObjectConstants, PerView, ShadowUniforms, MAX_CASCADES,
};
use crate::shadow::ShadowFrame;
use super::config::{RendererPrograms, SkyConfig};

const SOURCE: &str = "anvil::ForwardScene";

/// First texture unit holding a cascade depth map
pub const SHADOW_TEXTURE_UNIT: u32 = 8;

/// Procedural unit cube, generated in the vertex shader
const SKYBOX_VERTICES: u32 = 36;

/// Counters of one or more `render_view` calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardStats {
    pub submitted: usize,
    pub inside: usize,
    pub partial: usize,
    pub culled: usize,
    /// Drawables drawn by the opaque pass
    pub draws: usize,
    pub views: usize,
}

pub struct ForwardScene<'a> {
    resolver: &'a mut ProgramResolver,
    resources: &'a ResourceTable,
    programs: &'a RendererPrograms,
    drawables: &'a [&'a dyn Drawable],
    sky: Option<&'a SkyConfig>,
    shadows: Option<&'a ShadowFrame>,
    lighting: LightingUniforms,
    /// Far clip used when rendering through `SceneRenderer`
    far_clip: f32,
    /// Visible drawable indices of the last view
    visible: Vec<usize>,
    stats: ForwardStats,
}

impl<'a> ForwardScene<'a> {
    pub fn new(
        resolver: &'a mut ProgramResolver,
        resources: &'a ResourceTable,
        programs: &'a RendererPrograms,
        drawables: &'a [&'a dyn Drawable],
        lights: &LightSet<'_>,
    ) -> Self {
        Self {
            resolver,
            resources,
            programs,
            drawables,
            sky: None,
            shadows: None,
            lighting: LightingUniforms::from_lights(lights),
            far_clip: 1000.0,
            visible: Vec::new(),
            stats: ForwardStats::default(),
        }
    }

    /// Draw `sky` before the drawables
    pub fn with_sky(mut self, sky: &'a SkyConfig) -> Self {
        self.sky = Some(sky);
        self
    }

    /// Sample these cascades in the opaque pass
    pub fn with_shadows(mut self, shadows: &'a ShadowFrame) -> Self {
        self.shadows = Some(shadows);
        self
    }

    pub fn with_far_clip(mut self, far_clip: f32) -> Self {
        self.far_clip = far_clip;
        self
    }

    /// Draw the sky and the opaque drawables seen by `camera` into the
    /// bound framebuffer
    pub fn render_camera(&mut self, device: &mut dyn GraphicsDevice, camera: &CameraData) -> Result<()> {
        self.render_view(device, camera.eye, &camera.view, &camera.projection, camera.far_clip)
    }

    pub fn render_view(
        &mut self,
        device: &mut dyn GraphicsDevice,
        eye: Vec3,
        view: &Mat4,
        projection: &Mat4,
        far_clip: f32,
    ) -> Result<()> {
        let per_view = PerView::new(view, projection, eye, far_clip);
        device.write_uniforms(PerView::BINDING, bytemuck::bytes_of(&per_view))?;
        device.write_uniforms(LightingUniforms::BINDING, bytemuck::bytes_of(&self.lighting))?;
        let shadow_block = match self.shadows {
            Some(frame) => frame.uniforms(SHADOW_TEXTURE_UNIT),
            None => ShadowUniforms::disabled(),
        };
        device.write_uniforms(ShadowUniforms::BINDING, bytemuck::bytes_of(&shadow_block))?;

        if let Some(sky) = self.sky {
            self.draw_sky(device, view, projection, sky)?;
        }
        self.draw_opaque(device, &(*projection * *view))?;
        self.stats.views += 1;
        Ok(())
    }

    /// Draw the drawables visible in the last view as lines with the
    /// wireframe program. Polygon mode is back to fill on return.
    pub fn render_wireframe(&mut self, device: &mut dyn GraphicsDevice, camera: &CameraData) -> Result<()> {
        let view_proj = camera.view_projection();
        let program = self.resolver.resolve(device, self.resources, self.programs.wireframe)?.program;

        device.set_polygon_mode(PolygonMode::Line);
        let result = (|| -> Result<()> {
            device.bind_program(&program)?;
            for &index in &self.visible {
                let drawable = self.drawables[index];
                let constants = ObjectConstants::new(&view_proj, &drawable.world_matrix());
                device.push_constants(0, bytemuck::bytes_of(&constants))?;
                drawable.draw(device)?;
            }
            Ok(())
        })();
        device.set_polygon_mode(PolygonMode::Fill);
        result
    }

    fn draw_sky(
        &mut self,
        device: &mut dyn GraphicsDevice,
        view: &Mat4,
        projection: &Mat4,
        sky: &SkyConfig,
    ) -> Result<()> {
        let program = self.resolver.resolve(device, self.resources, self.programs.skybox)?.program;
        device.bind_program(&program)?;
        if let Some(environment) = sky.environment {
            if let Some(texture) = self.resolver.resolve_texture(self.resources, environment) {
                device.bind_texture(0, texture)?;
            }
        }

        // Rotation only, so the sky stays at infinity
        let rotation = Mat4::from_mat3(Mat3::from_mat4(*view));
        let constants = ObjectConstants::new(&(*projection * rotation), &Mat4::IDENTITY);
        device.push_constants(0, bytemuck::bytes_of(&constants))?;
        let colors = [sky.zenith_color, sky.horizon_color];
        device.push_constants(
            std::mem::size_of::<ObjectConstants>() as u32,
            bytemuck::cast_slice(&colors),
        )?;
        device.draw(SKYBOX_VERTICES, 0)
    }

    fn draw_opaque(&mut self, device: &mut dyn GraphicsDevice, view_proj: &Mat4) -> Result<()> {
        let frustum = FrustumCuller::build(view_proj);
        let cull = FrustumCuller::cull(&frustum, self.drawables);
        self.stats.submitted += self.drawables.len();
        self.stats.inside += cull.inside;
        self.stats.partial += cull.partial;
        self.stats.culled += cull.culled;

        // Group by program; ties keep submission order
        let mut order: Vec<(ResourceId, usize)> = cull.visible
            .iter()
            .map(|&index| (self.program_of(self.drawables[index]), index))
            .collect();
        order.sort();

        if let Some(frame) = self.shadows {
            for (slot, cascade) in frame.cascades.iter().take(MAX_CASCADES).enumerate() {
                device.bind_texture(SHADOW_TEXTURE_UNIT + slot as u32, cascade.texture)?;
            }
        }

        let mut bound: Option<ResourceId> = None;
        for &(program_id, index) in &order {
            let drawable = self.drawables[index];
            if bound != Some(program_id) {
                let program = self.resolver.resolve(device, self.resources, program_id)?.program;
                device.bind_program(&program)?;
                bound = Some(program_id);
            }

            if let Some(material) = drawable.material() {
                for binding in material.textures() {
                    if is_shadow_unit(binding.unit) {
                        engine_warn!(
                            SOURCE, "texture {} on unit {} collides with shadow maps, skipped",
                            binding.texture, binding.unit
                        );
                        continue;
                    }
                    if let Some(texture) = self.resolver.resolve_texture(self.resources, binding.texture) {
                        device.bind_texture(binding.unit, texture)?;
                    }
                }
                material.bind(device)?;
            }

            let constants = ObjectConstants::new(view_proj, &drawable.world_matrix());
            device.push_constants(0, bytemuck::bytes_of(&constants))?;
            drawable.draw(device)?;
            self.stats.draws += 1;
        }

        self.visible = cull.visible;
        Ok(())
    }

    fn program_of(&self, drawable: &dyn Drawable) -> ResourceId {
        drawable.material().map_or(self.programs.forward, |m| m.program())
    }

    // ===== ACCESSORS =====

    pub fn stats(&self) -> ForwardStats {
        self.stats
    }

    /// Indices into the drawable set visible in the last view
    pub fn visible(&self) -> &[usize] {
        &self.visible
    }
}

impl SceneRenderer for ForwardScene<'_> {
    fn render(
        &mut self,
        device: &mut dyn GraphicsDevice,
        eye: Vec3,
        view: &Mat4,
        projection: &Mat4,
    ) -> Result<()> {
        self.render_view(device, eye, view, projection, self.far_clip)
    }
}

fn is_shadow_unit(unit: u32) -> bool {
    (SHADOW_TEXTURE_UNIT..SHADOW_TEXTURE_UNIT + MAX_CASCADES as u32).contains(&unit)
}

#[cfg(test)]
#[path = "forward_tests.rs"]
mod tests;
