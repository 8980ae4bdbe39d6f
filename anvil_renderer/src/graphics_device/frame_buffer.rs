/// Framebuffer keys, attachment description, and the scoped binding guard

use std::ops::{Deref, DerefMut};
use slotmap::new_key_type;
use crate::graphics_device::{GraphicsDevice, TextureKey};

new_key_type! {
    /// Device-owned framebuffer handle.
    pub struct FramebufferKey;
}

/// Where a texture is attached on a framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentPoint {
    Color,
    Depth,
}

/// One layer/mip of a texture used as an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentView {
    pub texture: TextureKey,
    /// Array or cube-face layer
    pub layer: u32,
    pub mip: u32,
}

impl AttachmentView {
    /// Layer 0, mip 0
    pub fn whole(texture: TextureKey) -> Self {
        Self { texture, layer: 0, mip: 0 }
    }

    pub fn layer(texture: TextureKey, layer: u32) -> Self {
        Self { texture, layer, mip: 0 }
    }
}

/// Framebuffer binding points.
///
/// Bindings are device-wide state: whatever is bound stays bound until
/// someone rebinds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferTarget {
    Draw,
    Read,
}

/// Result of a framebuffer completeness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferStatus {
    Complete,
    /// Neither a color nor a depth attachment
    MissingAttachment,
    /// Attachment texture was destroyed or never existed
    MissingTexture,
    /// Attachments differ in size
    SizeMismatch,
    /// Color format on the depth point (or the reverse), or the texture
    /// lacks the matching attachment usage
    FormatMismatch,
    /// Layer or mip outside the texture
    LayerOutOfRange,
    /// Rejected by the backend for another reason
    Unsupported,
}

impl FramebufferStatus {
    pub fn is_complete(self) -> bool {
        self == FramebufferStatus::Complete
    }
}

// ===== SCOPED BINDING =====

/// Saves the draw and read framebuffer bindings and restores them on drop.
///
/// Every path out of the scope restores the bindings, including `?` returns
/// and unwinding panics. While alive, the guard is the only way to reach
/// the device.
///
/// ```no_run
/// # use anvil_renderer::anvil::device::*;
/// # fn f(device: &mut dyn GraphicsDevice, fb: FramebufferKey) {
/// {
///     let mut scoped = ScopedFramebufferBinding::new(device);
///     scoped.bind_framebuffer(FramebufferTarget::Draw, Some(fb));
///     // draw...
/// } // previous bindings are back
/// # }
/// ```
pub struct ScopedFramebufferBinding<'d> {
    device: &'d mut dyn GraphicsDevice,
    saved_draw: Option<FramebufferKey>,
    saved_read: Option<FramebufferKey>,
}

impl<'d> ScopedFramebufferBinding<'d> {
    pub fn new(device: &'d mut dyn GraphicsDevice) -> Self {
        let saved_draw = device.bound_framebuffer(FramebufferTarget::Draw);
        let saved_read = device.bound_framebuffer(FramebufferTarget::Read);
        Self { device, saved_draw, saved_read }
    }

    /// Bindings that will be restored
    pub fn saved(&self) -> (Option<FramebufferKey>, Option<FramebufferKey>) {
        (self.saved_draw, self.saved_read)
    }
}

impl<'d> Deref for ScopedFramebufferBinding<'d> {
    type Target = dyn GraphicsDevice + 'd;

    fn deref(&self) -> &Self::Target {
        &*self.device
    }
}

impl<'d> DerefMut for ScopedFramebufferBinding<'d> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.device
    }
}

impl Drop for ScopedFramebufferBinding<'_> {
    fn drop(&mut self) {
        self.device.bind_framebuffer(FramebufferTarget::Draw, self.saved_draw);
        self.device.bind_framebuffer(FramebufferTarget::Read, self.saved_read);
    }
}
