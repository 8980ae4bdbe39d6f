/// Frame renderer.
///
/// Owns the device, the render target pool and every pass subsystem, and
/// schedules them in a fixed order for each submitted camera slot:
///
/// 1. shadow cascades (directional light with shadows enabled)
/// 2. skybox
/// 3. opaque forward
/// 4. wireframe overlay
/// 5. post chain
/// 6. composite into the slot's output target
///
/// Scene data is never stored. A `FrameSubmission` borrows the cameras,
/// lights and drawables for exactly one `render_frame` call.

use glam::{UVec2, Vec3};
use crate::error::{Error, Result};
use crate::{engine_debug, engine_error, engine_trace, engine_warn};
use crate::camera::CameraData;
use crate::cubemap::{CubeCapture, CubemapCaptureEngine};
use crate::geometry::Bounds3D;
use crate::graphics_device::{
    ClearFlags, FramebufferTarget, GraphicsDevice, ScopedFramebufferBinding, TextureKey, Viewport,
};
use crate::post::{PostFeature, PostPass, PostProcessChain};
use crate::resource::{ProgramResolver, ResourceTable};
use crate::scene::{Drawable, LightSet, PerScene};
use crate::shadow::{ShadowCascadeEngine, ShadowFrame, ShadowPassParams};
use crate::target::{RenderTargetDesc, RenderTargetHandle, RenderTargetPool};
use super::config::RendererConfig;
use super::forward::ForwardScene;

const SOURCE: &str = "anvil::FrameRenderer";

const FULLSCREEN_VERTICES: u32 = 3;

// ============================================================================
// Frame description
// ============================================================================

/// View a camera renders for. Slots render in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CameraSlot {
    LeftEye,
    RightEye,
    Center,
}

impl CameraSlot {
    pub const ALL: [CameraSlot; 3] = [CameraSlot::LeftEye, CameraSlot::RightEye, CameraSlot::Center];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            CameraSlot::LeftEye => "left_eye",
            CameraSlot::RightEye => "right_eye",
            CameraSlot::Center => "center",
        }
    }
}

/// Pass run for a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    Shadow,
    Skybox,
    Forward,
    Wireframe,
    Post,
    Composite,
}

/// What one frame did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    /// Passes in execution order
    pub passes: Vec<(CameraSlot, PassKind)>,
    /// Drawables submitted, counted once per slot
    pub submitted: usize,
    pub inside: usize,
    pub partial: usize,
    pub culled: usize,
    pub draws: usize,
    /// Cascades rendered, summed over slots
    pub cascades: usize,
    pub post_passes: usize,
}

impl FrameStats {
    pub fn passes_for(&self, slot: CameraSlot) -> Vec<PassKind> {
        self.passes.iter().filter(|(s, _)| *s == slot).map(|(_, p)| *p).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    pub frame_index: u64,
    /// Output texture of each rendered slot, in slot order
    pub outputs: Vec<(CameraSlot, TextureKey)>,
    pub stats: FrameStats,
}

impl FrameOutput {
    pub fn texture(&self, slot: CameraSlot) -> Option<TextureKey> {
        self.outputs.iter().find(|(s, _)| *s == slot).map(|(_, t)| *t)
    }
}

// ============================================================================
// FrameSubmission
// ============================================================================

/// Scene data for one frame. Consumed by `render_frame`.
pub struct FrameSubmission<'r, 'a, D: GraphicsDevice> {
    renderer: &'r mut FrameRenderer<D>,
    cameras: Vec<(CameraSlot, CameraData)>,
    lights: LightSet<'a>,
    objects: Vec<&'a dyn Drawable>,
    time: f32,
}

impl<'r, 'a, D: GraphicsDevice> FrameSubmission<'r, 'a, D> {
    /// Render `camera` into `slot`. A second camera for the same slot
    /// replaces the first.
    pub fn add_camera(&mut self, slot: CameraSlot, camera: CameraData) -> &mut Self {
        if let Some(entry) = self.cameras.iter_mut().find(|(s, _)| *s == slot) {
            engine_warn!(SOURCE, "camera slot {} submitted twice, keeping the last", slot.name());
            entry.1 = camera;
        } else {
            self.cameras.push((slot, camera));
        }
        self
    }

    /// Lights of this frame; replaces any earlier set
    pub fn add_lights(&mut self, lights: LightSet<'a>) -> &mut Self {
        self.lights = lights;
        self
    }

    /// Append drawables. May be called once per render set.
    pub fn add_objects(&mut self, objects: &'a [&'a dyn Drawable]) -> &mut Self {
        self.objects.extend_from_slice(objects);
        self
    }

    /// Scene time in seconds, uploaded with `PerScene`
    pub fn set_time(&mut self, seconds: f32) -> &mut Self {
        self.time = seconds;
        self
    }

    /// Render every submitted slot.
    ///
    /// # Errors
    ///
    /// `InvalidFrame` if no camera was added; device errors otherwise.
    pub fn render_frame(self) -> Result<FrameOutput> {
        let Self { renderer, cameras, lights, objects, time } = self;
        renderer.render_submission(cameras, &lights, &objects, time)
    }
}

// ============================================================================
// FrameRenderer
// ============================================================================

pub struct FrameRenderer<D: GraphicsDevice> {
    device: D,
    config: RendererConfig,
    resources: ResourceTable,
    resolver: ProgramResolver,
    pool: RenderTargetPool,
    scene_target: RenderTargetHandle,
    /// Output target per camera slot, acquired on first use
    outputs: [Option<RenderTargetHandle>; 3],
    shadows: Option<ShadowCascadeEngine>,
    post: PostProcessChain,
    frame_index: u64,
}

impl<D: GraphicsDevice> FrameRenderer<D> {
    /// Create the scene target, the shadow cascades and the post chain.
    ///
    /// # Errors
    ///
    /// Any setup failure is returned and logged; targets acquired before
    /// the failure are released.
    pub fn new(mut device: D, config: RendererConfig, resources: ResourceTable) -> Result<Self> {
        let size = config.render_size;
        if size.x == 0 || size.y == 0 {
            let err = Error::InitializationFailed(format!("render size {}x{}", size.x, size.y));
            engine_error!(SOURCE, "{}", err);
            return Err(err);
        }

        let mut pool = RenderTargetPool::new();
        let (scene_target, shadows, post) = match setup(&mut device, &mut pool, &config) {
            Ok(parts) => parts,
            Err(err) => {
                pool.release_all(&mut device);
                engine_error!(SOURCE, "renderer setup failed: {}", err);
                return Err(err);
            }
        };

        engine_debug!(
            SOURCE, "renderer {}x{} ready (shadows: {}, post passes: {})",
            size.x, size.y, shadows.is_some(), post.len()
        );

        Ok(Self {
            device,
            config,
            resources,
            resolver: ProgramResolver::new(),
            pool,
            scene_target,
            outputs: [None; 3],
            shadows,
            post,
            frame_index: 0,
        })
    }

    /// Start a frame submission
    pub fn frame<'a>(&mut self) -> FrameSubmission<'_, 'a, D> {
        FrameSubmission {
            renderer: self,
            cameras: Vec::new(),
            lights: LightSet::default(),
            objects: Vec::new(),
            time: 0.0,
        }
    }

    /// Resize the scene target, every slot output and the post chain.
    ///
    /// On failure every target keeps its old size and the render size is
    /// unchanged.
    pub fn resize(&mut self, size: UVec2) -> Result<()> {
        if size.x == 0 || size.y == 0 {
            return Err(Error::InvalidResource(format!("resize to {}x{}", size.x, size.y)));
        }
        if size == self.config.render_size {
            return Ok(());
        }

        let mut requests = vec![(self.scene_target, size)];
        requests.extend(self.outputs.iter().flatten().map(|&output| (output, size)));
        requests.extend(self.post.target_sizes(size));
        if let Err(err) = self.pool.resize_all(&mut self.device, &requests) {
            engine_error!(SOURCE, "resize to {}x{} failed, targets kept: {}", size.x, size.y, err);
            return Err(err);
        }

        engine_debug!(
            SOURCE, "resized {}x{} -> {}x{}",
            self.config.render_size.x, self.config.render_size.y, size.x, size.y
        );
        self.config.render_size = size;
        Ok(())
    }

    /// Capture a cube map of `objects` from `position` with the forward
    /// scene, sky included when enabled
    pub fn capture_environment(
        &mut self,
        engine: &mut CubemapCaptureEngine,
        position: Vec3,
        objects: &[&dyn Drawable],
        lights: &LightSet<'_>,
    ) -> Result<CubeCapture> {
        let far_clip = engine.config().far;
        let mut scene = ForwardScene::new(
            &mut self.resolver,
            &self.resources,
            &self.config.programs,
            objects,
            lights,
        )
        .with_far_clip(far_clip);
        if self.config.enable_skybox {
            scene = scene.with_sky(&self.config.sky);
        }
        engine.capture(&mut self.device, position, &mut scene)
    }

    /// Acquire an extra target from the renderer pool, e.g. the output of
    /// a custom post pass
    pub fn acquire_target(&mut self, desc: RenderTargetDesc) -> Result<RenderTargetHandle> {
        self.pool.acquire(&mut self.device, desc)
    }

    /// Append a pass to the post chain
    pub fn add_post_pass(&mut self, pass: PostPass) -> Result<usize> {
        self.post.add_pass(pass)
    }

    /// Switch a post feature on or off for the next frames. Returns false
    /// when the post chain was not built.
    pub fn set_post_feature(&mut self, feature: PostFeature, enabled: bool) -> bool {
        if !self.post.set_feature(feature, enabled) {
            return false;
        }
        self.config.post.set_feature(feature, enabled);
        true
    }

    /// Release every GPU object and hand the device back
    pub fn shutdown(mut self) -> D {
        self.pool.release_all(&mut self.device);
        self.device
    }

    // ===== ACCESSORS =====

    pub fn output_texture(&self, slot: CameraSlot) -> Option<TextureKey> {
        self.pool.color_texture(self.outputs[slot.index()]?)
    }

    pub fn scene_texture(&self) -> Option<TextureKey> {
        self.pool.color_texture(self.scene_target)
    }

    pub fn resources(&self) -> &ResourceTable {
        &self.resources
    }

    /// Programs and textures may be swapped between frames
    pub fn resources_mut(&mut self) -> &mut ResourceTable {
        &mut self.resources
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Frames rendered so far
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn pool(&self) -> &RenderTargetPool {
        &self.pool
    }

    pub fn shadow_engine(&self) -> Option<&ShadowCascadeEngine> {
        self.shadows.as_ref()
    }

    pub fn post_chain(&self) -> &PostProcessChain {
        &self.post
    }

    pub fn post_chain_mut(&mut self) -> &mut PostProcessChain {
        &mut self.post
    }

    // ===== FRAME =====

    fn render_submission(
        &mut self,
        mut cameras: Vec<(CameraSlot, CameraData)>,
        lights: &LightSet<'_>,
        objects: &[&dyn Drawable],
        time: f32,
    ) -> Result<FrameOutput> {
        if cameras.is_empty() {
            return Err(Error::InvalidFrame("no camera submitted".to_string()));
        }
        cameras.sort_by_key(|(slot, _)| *slot);

        self.frame_index += 1;
        let per_scene = PerScene::new(time, self.frame_index);
        self.device.write_uniforms(PerScene::BINDING, bytemuck::bytes_of(&per_scene))?;

        let scene_bounds = objects
            .iter()
            .map(|d| d.bounds())
            .filter(|b| !b.is_empty())
            .fold(Bounds3D::empty(), |acc, b| acc.union(&b));

        let mut stats = FrameStats::default();
        let mut outputs = Vec::with_capacity(cameras.len());
        for (slot, camera) in &cameras {
            let texture = self.render_slot(*slot, camera, lights, objects, scene_bounds, &mut stats)?;
            outputs.push((*slot, texture));
        }

        engine_trace!(
            SOURCE, "frame {}: {} slot(s), {} draws, {} culled",
            self.frame_index, outputs.len(), stats.draws, stats.culled
        );
        Ok(FrameOutput { frame_index: self.frame_index, outputs, stats })
    }

    fn render_slot(
        &mut self,
        slot: CameraSlot,
        camera: &CameraData,
        lights: &LightSet<'_>,
        objects: &[&dyn Drawable],
        scene_bounds: Bounds3D,
        stats: &mut FrameStats,
    ) -> Result<TextureKey> {
        let shadow_frame = self.shadow_pass(camera, lights, objects, scene_bounds)?;
        if let Some(frame) = &shadow_frame {
            stats.passes.push((slot, PassKind::Shadow));
            stats.cascades += frame.cascades.len();
        }

        let (Some(framebuffer), Some(scene_color)) = (
            self.pool.framebuffer(self.scene_target),
            self.pool.color_texture(self.scene_target),
        ) else {
            return Err(Error::InvalidResource("scene target released".to_string()));
        };

        let mut scene = ForwardScene::new(
            &mut self.resolver,
            &self.resources,
            &self.config.programs,
            objects,
            lights,
        )
        .with_far_clip(camera.far_clip);
        if self.config.enable_skybox {
            scene = scene.with_sky(&self.config.sky);
            stats.passes.push((slot, PassKind::Skybox));
        }
        if let Some(frame) = &shadow_frame {
            scene = scene.with_shadows(frame);
        }
        stats.passes.push((slot, PassKind::Forward));

        {
            let mut scoped = ScopedFramebufferBinding::new(&mut self.device);
            scoped.bind_framebuffer(FramebufferTarget::Draw, Some(framebuffer));
            scoped.set_viewport(camera.viewport);
            scoped.clear(ClearFlags::COLOR | ClearFlags::DEPTH, self.config.clear_color, 1.0)?;
            scene.render_camera(&mut *scoped, camera)?;
            if self.config.enable_wireframe {
                scene.render_wireframe(&mut *scoped, camera)?;
                stats.passes.push((slot, PassKind::Wireframe));
            }
        }

        let forward = scene.stats();
        stats.submitted += forward.submitted;
        stats.inside += forward.inside;
        stats.partial += forward.partial;
        stats.culled += forward.culled;
        stats.draws += forward.draws;

        let mut final_texture = scene_color;
        if self.config.enable_post && !self.post.is_empty() {
            let report = self.post.execute(
                &mut self.device,
                &self.pool,
                &mut self.resolver,
                &self.resources,
                scene_color,
                self.pool.depth_texture(self.scene_target),
            )?;
            stats.passes.push((slot, PassKind::Post));
            stats.post_passes += report.executed.len();
            final_texture = report.final_texture;
        }

        let output = self.output_target(slot)?;
        self.composite(output, final_texture)?;
        stats.passes.push((slot, PassKind::Composite));

        self.pool
            .color_texture(output)
            .ok_or_else(|| Error::InvalidResource(format!("output target of {} released", slot.name())))
    }

    fn shadow_pass(
        &mut self,
        camera: &CameraData,
        lights: &LightSet<'_>,
        objects: &[&dyn Drawable],
        scene_bounds: Bounds3D,
    ) -> Result<Option<ShadowFrame>> {
        if !self.config.enable_shadows {
            return Ok(None);
        }
        let (Some(shadows), Some(light)) = (self.shadows.as_mut(), lights.shadow_light()) else {
            return Ok(None);
        };

        let params = ShadowPassParams {
            camera,
            light_direction: light.direction,
            scene_bounds,
            drawables: objects,
        };
        let frame = shadows.update(&mut self.device, &self.pool, &mut self.resolver, &self.resources, params)?;
        Ok(Some(frame))
    }

    fn output_target(&mut self, slot: CameraSlot) -> Result<RenderTargetHandle> {
        if let Some(handle) = self.outputs[slot.index()] {
            return Ok(handle);
        }
        let desc = RenderTargetDesc::color_only(
            self.config.render_size,
            self.config.output_format,
            &format!("output.{}", slot.name()),
        );
        let handle = self.pool.acquire(&mut self.device, desc)?;
        self.outputs[slot.index()] = Some(handle);
        Ok(handle)
    }

    /// Copy `source` into `output` with the composite program
    fn composite(&mut self, output: RenderTargetHandle, source: TextureKey) -> Result<()> {
        let (Some(framebuffer), Some(size)) = (self.pool.framebuffer(output), self.pool.size(output)) else {
            return Err(Error::InvalidResource("composite target released".to_string()));
        };
        let program = self.resolver
            .resolve(&mut self.device, &self.resources, self.config.programs.composite)?
            .program;

        let mut scoped = ScopedFramebufferBinding::new(&mut self.device);
        scoped.bind_framebuffer(FramebufferTarget::Draw, Some(framebuffer));
        scoped.set_viewport(Viewport::full(size.x, size.y));
        scoped.bind_program(&program)?;
        scoped.bind_texture(0, source)?;
        scoped.draw(FULLSCREEN_VERTICES, 0)
    }
}

// ===== SETUP =====

type Subsystems = (RenderTargetHandle, Option<ShadowCascadeEngine>, PostProcessChain);

fn setup(
    device: &mut dyn GraphicsDevice,
    pool: &mut RenderTargetPool,
    config: &RendererConfig,
) -> Result<Subsystems> {
    let scene_target = pool.acquire(
        device,
        RenderTargetDesc::color_depth(config.render_size, config.color_format, config.depth_format, "scene"),
    )?;
    let shadows = if config.enable_shadows {
        Some(ShadowCascadeEngine::new(device, pool, config.shadows.clone())?)
    } else {
        None
    };
    let post = if config.enable_post {
        PostProcessChain::from_config(device, pool, config.render_size, &config.post)?
    } else {
        PostProcessChain::new()
    };
    Ok((scene_target, shadows, post))
}

#[cfg(test)]
#[path = "frame_renderer_tests.rs"]
mod tests;
