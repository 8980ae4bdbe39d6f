/// Cascaded shadow maps.
///
/// One depth-only render target per cascade, allocated once from the
/// `RenderTargetPool`. Every frame `update()` recomputes the splits, fits
/// each cascade to the camera slice and the scene, and renders the casters'
/// depth. Cascades render strictly before the forward pass, which samples
/// their textures.
///
/// A frame where shadows cannot be computed (no casters, degenerate scene
/// bounds, no overlap) is not an error: the affected cascades are skipped
/// and the frame renders unshadowed. A skipped frame warns once per outage
/// and logs at debug level while the cause lasts.

use std::fmt;
use std::sync::Arc;
use glam::{Mat4, UVec2, Vec3};
use crate::error::{Error, Result};
use crate::{engine_debug, engine_error, engine_warn};
use crate::camera::CameraData;
use crate::geometry::Bounds3D;
use crate::graphics_device::{
    ClearFlags, FramebufferTarget, GraphicsDevice, Program, ScopedFramebufferBinding,
    TextureFormat, TextureKey, Viewport,
};
use crate::resource::{ProgramResolver, ResourceId, ResourceTable};
use crate::scene::{Drawable, ObjectConstants, ShadowUniforms, MAX_CASCADES};
use crate::target::{RenderTargetDesc, RenderTargetHandle, RenderTargetPool};
use super::cascade::{compute_splits, fit_frustum_to_scene, SplitScheme};

const SOURCE: &str = "anvil::ShadowCascadeEngine";

/// Shadow configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowConfig {
    /// Number of cascades, 1 to `MAX_CASCADES`
    pub cascade_count: usize,
    pub split_scheme: SplitScheme,
    /// Width and height of each cascade map
    pub resolution: u32,
    pub depth_format: TextureFormat,
    /// Depth-only program used for casters
    pub program: ResourceId,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            cascade_count: 2,
            split_scheme: SplitScheme::default(),
            resolution: 2048,
            depth_format: TextureFormat::Depth32Float,
            program: ResourceId::new("shadow_depth"),
        }
    }
}

/// Position in the per-frame state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowPhase {
    Idle,
    SplitsComputed,
    /// Rendering the depth of cascade `i`
    Rendering(usize),
}

/// Per-frame state of one cascade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowCascade {
    pub light_view_proj: Mat4,
    pub split_near: f32,
    pub split_far: f32,
    pub target: RenderTargetHandle,
    /// Rendered this frame
    pub active: bool,
}

/// Cascade ready for sampling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveCascade {
    pub index: usize,
    pub light_view_proj: Mat4,
    pub split_far: f32,
    pub texture: TextureKey,
}

/// Why a whole frame rendered without shadows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowSkip {
    NoCasters,
    DegenerateBounds,
    EmptyDepthRange,
}

impl fmt::Display for ShadowSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShadowSkip::NoCasters => write!(f, "no shadow casters"),
            ShadowSkip::DegenerateBounds => write!(f, "degenerate scene bounds"),
            ShadowSkip::EmptyDepthRange => write!(f, "empty camera depth range"),
        }
    }
}

/// Result of one shadow update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShadowFrame {
    pub cascades: Vec<ActiveCascade>,
    /// Casters drawn, summed over cascades
    pub draws: usize,
}

impl ShadowFrame {
    pub fn is_empty(&self) -> bool {
        self.cascades.is_empty()
    }

    /// Uniform block for the forward pass. Cascade `i` of the block is the
    /// i-th active cascade, bound at `first_unit + i`.
    pub fn uniforms(&self, first_unit: u32) -> ShadowUniforms {
        let mut block = ShadowUniforms::disabled();
        for (slot, cascade) in self.cascades.iter().take(MAX_CASCADES).enumerate() {
            block.light_view_proj[slot] = cascade.light_view_proj.to_cols_array_2d();
            block.split_depths[slot] = cascade.split_far;
        }
        block.cascade_count = self.cascades.len().min(MAX_CASCADES) as u32;
        block.first_unit = first_unit;
        block
    }
}

/// Inputs of one shadow update
#[derive(Clone, Copy)]
pub struct ShadowPassParams<'a> {
    pub camera: &'a CameraData,
    /// Direction the light travels
    pub light_direction: Vec3,
    pub scene_bounds: Bounds3D,
    pub drawables: &'a [&'a dyn Drawable],
}

pub struct ShadowCascadeEngine {
    config: ShadowConfig,
    cascades: Vec<ShadowCascade>,
    splits: Vec<f32>,
    phase: ShadowPhase,
    /// Cause of the current outage, already reported
    skipped: Option<ShadowSkip>,
}

impl ShadowCascadeEngine {
    /// Allocate one depth target per cascade.
    ///
    /// # Errors
    ///
    /// `InitializationFailed` for a cascade count outside
    /// `1..=MAX_CASCADES` or a zero resolution; pool errors otherwise.
    /// Targets acquired before a failure are released again.
    pub fn new(
        device: &mut dyn GraphicsDevice,
        pool: &mut RenderTargetPool,
        config: ShadowConfig,
    ) -> Result<Self> {
        if config.cascade_count == 0 || config.cascade_count > MAX_CASCADES {
            let err = Error::InitializationFailed(format!(
                "shadow cascade count {} outside 1..={}", config.cascade_count, MAX_CASCADES
            ));
            engine_error!(SOURCE, "{}", err);
            return Err(err);
        }
        if config.resolution == 0 {
            let err = Error::InitializationFailed("shadow resolution is 0".to_string());
            engine_error!(SOURCE, "{}", err);
            return Err(err);
        }

        let mut cascades = Vec::with_capacity(config.cascade_count);
        for i in 0..config.cascade_count {
            let desc = RenderTargetDesc::depth_only(
                UVec2::splat(config.resolution),
                config.depth_format,
                &format!("shadow.cascade{}", i),
            );
            match pool.acquire(device, desc) {
                Ok(target) => cascades.push(ShadowCascade {
                    light_view_proj: Mat4::IDENTITY,
                    split_near: 0.0,
                    split_far: 0.0,
                    target,
                    active: false,
                }),
                Err(err) => {
                    for cascade in &cascades {
                        let _ = pool.release(device, cascade.target);
                    }
                    return Err(err);
                }
            }
        }

        engine_debug!(
            SOURCE, "{} cascades at {}x{}",
            config.cascade_count, config.resolution, config.resolution
        );

        Ok(Self { config, cascades, splits: Vec::new(), phase: ShadowPhase::Idle, skipped: None })
    }

    /// Compute, fit and render every cascade for this frame.
    ///
    /// Framebuffer bindings are restored before returning. Device errors
    /// while drawing are returned; degraded inputs are not.
    pub fn update(
        &mut self,
        device: &mut dyn GraphicsDevice,
        pool: &RenderTargetPool,
        resolver: &mut ProgramResolver,
        resources: &ResourceTable,
        params: ShadowPassParams<'_>,
    ) -> Result<ShadowFrame> {
        self.phase = ShadowPhase::Idle;
        for cascade in &mut self.cascades {
            cascade.active = false;
        }

        let casters: Vec<&dyn Drawable> = params.drawables
            .iter()
            .copied()
            .filter(|d| d.casts_shadow())
            .collect();
        if casters.is_empty() {
            return Ok(self.skip(ShadowSkip::NoCasters));
        }
        if params.scene_bounds.is_degenerate() {
            return Ok(self.skip(ShadowSkip::DegenerateBounds));
        }

        let camera = params.camera;
        self.splits = compute_splits(
            camera.near_clip,
            camera.far_clip,
            self.config.cascade_count,
            self.config.split_scheme,
        );
        if self.splits.is_empty() {
            engine_debug!(SOURCE, "camera depth range [{}, {}]", camera.near_clip, camera.far_clip);
            return Ok(self.skip(ShadowSkip::EmptyDepthRange));
        }
        self.phase = ShadowPhase::SplitsComputed;
        if let Some(reason) = self.skipped.take() {
            engine_debug!(SOURCE, "shadows back after outage ({})", reason);
        }

        let program = resolver.resolve(device, resources, self.config.program)?.program;

        let result = self.render_cascades(device, pool, &program, camera, &params, &casters);
        self.phase = ShadowPhase::Idle;
        result
    }

    /// Warn on the first skipped frame of an outage, debug afterwards
    fn skip(&mut self, reason: ShadowSkip) -> ShadowFrame {
        if self.skipped == Some(reason) {
            engine_debug!(SOURCE, "{}, cascades skipped", reason);
        } else {
            engine_warn!(SOURCE, "{}, cascades skipped", reason);
            self.skipped = Some(reason);
        }
        ShadowFrame::default()
    }

    fn render_cascades(
        &mut self,
        device: &mut dyn GraphicsDevice,
        pool: &RenderTargetPool,
        program: &Arc<dyn Program>,
        camera: &CameraData,
        params: &ShadowPassParams<'_>,
        casters: &[&dyn Drawable],
    ) -> Result<ShadowFrame> {
        let mut frame = ShadowFrame::default();
        let mut split_near = camera.near_clip;

        for i in 0..self.cascades.len() {
            let split_far = self.splits[i];
            let fitted = fit_frustum_to_scene(
                camera,
                split_near,
                split_far,
                params.light_direction,
                &params.scene_bounds,
                self.config.resolution,
            );

            let cascade = &mut self.cascades[i];
            cascade.split_near = split_near;
            cascade.split_far = split_far;
            split_near = split_far;

            let Some(light_view_proj) = fitted else {
                engine_debug!(SOURCE, "cascade {} does not overlap the scene, skipped", i);
                continue;
            };
            cascade.light_view_proj = light_view_proj;

            self.phase = ShadowPhase::Rendering(i);
            frame.draws += self.render_depth(device, pool, i, program, casters)?;

            let cascade = &mut self.cascades[i];
            cascade.active = true;
            if let Some(texture) = pool.depth_texture(cascade.target) {
                frame.cascades.push(ActiveCascade {
                    index: i,
                    light_view_proj,
                    split_far,
                    texture,
                });
            }
        }

        Ok(frame)
    }

    /// Render the casters' depth into one cascade. Returns the number of
    /// casters drawn.
    pub fn render_depth(
        &self,
        device: &mut dyn GraphicsDevice,
        pool: &RenderTargetPool,
        index: usize,
        program: &Arc<dyn Program>,
        casters: &[&dyn Drawable],
    ) -> Result<usize> {
        let Some(cascade) = self.cascades.get(index) else {
            return Err(Error::InvalidResource(format!("shadow cascade {} does not exist", index)));
        };
        let Some(framebuffer) = pool.framebuffer(cascade.target) else {
            return Err(Error::InvalidResource(format!("shadow cascade {} has no target", index)));
        };

        let mut scoped = ScopedFramebufferBinding::new(device);
        scoped.bind_framebuffer(FramebufferTarget::Draw, Some(framebuffer));
        scoped.set_viewport(Viewport::full(self.config.resolution, self.config.resolution));
        scoped.clear(ClearFlags::DEPTH, [0.0; 4], 1.0)?;
        scoped.bind_program(program)?;

        for caster in casters {
            let constants = ObjectConstants::new(&cascade.light_view_proj, &caster.world_matrix());
            scoped.push_constants(0, bytemuck::bytes_of(&constants))?;
            caster.draw(&mut *scoped)?;
        }

        Ok(casters.len())
    }

    /// Free the cascade targets
    pub fn release(&mut self, device: &mut dyn GraphicsDevice, pool: &mut RenderTargetPool) {
        for cascade in self.cascades.drain(..) {
            let _ = pool.release(device, cascade.target);
        }
        self.splits.clear();
        self.phase = ShadowPhase::Idle;
    }

    // ===== ACCESSORS =====

    pub fn phase(&self) -> ShadowPhase {
        self.phase
    }

    pub fn config(&self) -> &ShadowConfig {
        &self.config
    }

    pub fn cascades(&self) -> &[ShadowCascade] {
        &self.cascades
    }

    /// Split distances of the last update
    /// Cause of the outage in progress, `None` while shadows render
    pub fn skipped(&self) -> Option<ShadowSkip> {
        self.skipped
    }

    pub fn splits(&self) -> &[f32] {
        &self.splits
    }

    pub fn cascade_texture(&self, pool: &RenderTargetPool, index: usize) -> Option<TextureKey> {
        pool.depth_texture(self.cascades.get(index)?.target)
    }
}

#[cfg(test)]
#[path = "shadow_engine_tests.rs"]
mod tests;
