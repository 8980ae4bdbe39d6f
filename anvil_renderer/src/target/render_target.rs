/// Render target: an off-screen color and/or depth destination.
///
/// Render targets are created only through `RenderTargetPool::acquire()`.
/// The pool owns the attachment textures and the framebuffer; everyone else
/// sees read-only texture keys.

use glam::UVec2;
use slotmap::new_key_type;
use crate::graphics_device::{FramebufferKey, TextureFormat, TextureKey};

new_key_type! {
    /// Stable handle to a pooled render target.
    ///
    /// Stays valid across resizes. Invalid once released.
    pub struct RenderTargetHandle;
}

/// Descriptor for acquiring a render target
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetDesc {
    pub size: UVec2,
    /// Color attachment format, or `None` for depth-only targets
    pub color_format: Option<TextureFormat>,
    /// Depth attachment format, or `None` for color-only targets
    pub depth_format: Option<TextureFormat>,
    /// Debug label, also used for the attachment textures
    pub label: String,
}

impl RenderTargetDesc {
    /// Color + depth
    pub fn color_depth(size: UVec2, color: TextureFormat, depth: TextureFormat, label: &str) -> Self {
        Self { size, color_format: Some(color), depth_format: Some(depth), label: label.to_string() }
    }

    pub fn color_only(size: UVec2, color: TextureFormat, label: &str) -> Self {
        Self { size, color_format: Some(color), depth_format: None, label: label.to_string() }
    }

    pub fn depth_only(size: UVec2, depth: TextureFormat, label: &str) -> Self {
        Self { size, color_format: None, depth_format: Some(depth), label: label.to_string() }
    }
}

/// One attachment texture and its format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    pub texture: TextureKey,
    pub format: TextureFormat,
}

#[derive(Debug)]
pub struct RenderTarget {
    pub(crate) label: String,
    pub(crate) size: UVec2,
    pub(crate) color: Option<Attachment>,
    pub(crate) depth: Option<Attachment>,
    pub(crate) framebuffer: FramebufferKey,
}

impl RenderTarget {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn color(&self) -> Option<Attachment> {
        self.color
    }

    pub fn depth(&self) -> Option<Attachment> {
        self.depth
    }

    pub fn color_texture(&self) -> Option<TextureKey> {
        self.color.map(|a| a.texture)
    }

    pub fn depth_texture(&self) -> Option<TextureKey> {
        self.depth.map(|a| a.texture)
    }

    pub fn framebuffer(&self) -> FramebufferKey {
        self.framebuffer
    }
}
