/// GraphicsDevice trait - the renderer's only route to the GPU

use std::fmt;
use std::sync::Arc;
use bitflags::bitflags;
use crate::error::Result;
use crate::graphics_device::{
    TextureDesc, TextureInfo, TextureKey,
    FramebufferKey, FramebufferTarget, FramebufferStatus,
    AttachmentPoint, AttachmentView,
};

/// Viewport rectangle and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Whole surface of the given size, depth range [0, 1]
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

bitflags! {
    /// Attachments affected by `GraphicsDevice::clear`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

/// Rasterizer fill mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolygonMode {
    #[default]
    Fill,
    Line,
}

/// Opaque bindable shader program.
///
/// Programs are compiled by an external collaborator and handed in through
/// the resource table; the renderer only binds them.
pub trait Program: Send + Sync + fmt::Debug {
    fn label(&self) -> &str;
}

/// Program identified by its label only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedProgram {
    label: String,
}

impl NamedProgram {
    pub fn new(label: &str) -> Self {
        Self { label: label.to_string() }
    }

    pub fn shared(label: &str) -> Arc<dyn Program> {
        Arc::new(Self::new(label))
    }
}

impl Program for NamedProgram {
    fn label(&self) -> &str {
        &self.label
    }
}

/// GPU access for the frame pipeline.
///
/// Bound state (framebuffers, program, texture units, polygon mode) persists
/// across calls, the way a GL context does. Code that changes framebuffer
/// bindings temporarily should go through `ScopedFramebufferBinding`.
pub trait GraphicsDevice {
    // ===== RESOURCES =====

    /// Create a texture
    ///
    /// Fails with `UnsupportedFormat` if the backend cannot allocate the
    /// format, `InvalidResource` for a zero size.
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureKey>;

    /// Destroy a texture (unknown keys are ignored)
    fn destroy_texture(&mut self, texture: TextureKey);

    /// Properties of a live texture
    fn texture_info(&self, texture: TextureKey) -> Option<&TextureInfo>;

    /// Create an empty framebuffer
    fn create_framebuffer(&mut self, label: &str) -> Result<FramebufferKey>;

    /// Destroy a framebuffer, unbinding it if bound (unknown keys are ignored)
    fn destroy_framebuffer(&mut self, framebuffer: FramebufferKey);

    /// Attach a texture layer, or detach with `None`
    fn attach(
        &mut self,
        framebuffer: FramebufferKey,
        point: AttachmentPoint,
        view: Option<AttachmentView>,
    ) -> Result<()>;

    /// Completeness check of the current attachments
    fn framebuffer_status(&self, framebuffer: FramebufferKey) -> FramebufferStatus;

    // ===== BOUND STATE =====

    /// Currently bound framebuffer (`None` = default surface)
    fn bound_framebuffer(&self, target: FramebufferTarget) -> Option<FramebufferKey>;

    fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: Option<FramebufferKey>);

    fn set_viewport(&mut self, viewport: Viewport);

    fn set_polygon_mode(&mut self, mode: PolygonMode);

    // ===== COMMANDS =====

    /// Clear the attachments of the bound draw framebuffer
    fn clear(&mut self, flags: ClearFlags, color: [f32; 4], depth: f32) -> Result<()>;

    fn bind_program(&mut self, program: &Arc<dyn Program>) -> Result<()>;

    fn bind_texture(&mut self, unit: u32, texture: TextureKey) -> Result<()>;

    /// Upload a uniform block to a binding slot
    fn write_uniforms(&mut self, binding: u32, data: &[u8]) -> Result<()>;

    /// Push constants for the bound program
    fn push_constants(&mut self, offset: u32, data: &[u8]) -> Result<()>;

    /// Draw non-indexed vertices with the bound program
    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()>;

    /// Read one layer of a texture back as tightly packed RGBA8 rows.
    /// Depth layers come back as grey levels.
    fn read_pixels(&self, texture: TextureKey, layer: u32) -> Result<Vec<u8>>;

    /// Program used when a requested one is unavailable
    fn placeholder_program(&mut self) -> Result<Arc<dyn Program>>;
}
