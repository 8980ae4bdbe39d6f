/// Render target pool.
///
/// Owns every off-screen attachment the pipeline renders into. Creation and
/// resize validate framebuffer completeness; a failure there is a
/// configuration error and is reported as fatal.

use glam::UVec2;
use slotmap::SlotMap;
use crate::error::{Error, Result};
use crate::{engine_debug, engine_error};
use crate::graphics_device::{
    GraphicsDevice, TextureDesc, TextureFormat,
    AttachmentPoint, AttachmentView, FramebufferKey,
};
use super::render_target::{Attachment, RenderTarget, RenderTargetDesc, RenderTargetHandle};

const SOURCE: &str = "anvil::RenderTargetPool";

/// GPU objects backing one render target
struct Built {
    color: Option<Attachment>,
    depth: Option<Attachment>,
    framebuffer: FramebufferKey,
}

#[derive(Debug, Default)]
pub struct RenderTargetPool {
    targets: SlotMap<RenderTargetHandle, RenderTarget>,
}

impl RenderTargetPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a render target
    ///
    /// # Errors
    ///
    /// - `InvalidResource` for a zero size or no attachment at all
    /// - `UnsupportedFormat` for a depth format on the color slot (or the
    ///   reverse), or a format the device cannot allocate
    /// - `IncompleteFramebuffer` if the device rejects the combination
    ///
    /// Nothing is leaked on failure.
    pub fn acquire(
        &mut self,
        device: &mut dyn GraphicsDevice,
        desc: RenderTargetDesc,
    ) -> Result<RenderTargetHandle> {
        let built = build(device, &desc, desc.size)?;
        let handle = self.targets.insert(RenderTarget {
            label: desc.label,
            size: desc.size,
            color: built.color,
            depth: built.depth,
            framebuffer: built.framebuffer,
        });

        let target = &self.targets[handle];
        engine_debug!(SOURCE, "acquired '{}' {}x{}", target.label, target.size.x, target.size.y);
        Ok(handle)
    }

    /// Resize a render target
    ///
    /// Same size is a no-op. Otherwise every attachment is recreated at the
    /// new size and pixel contents are lost. The handle stays valid; the
    /// texture and framebuffer keys change. If recreation fails the target
    /// keeps its old attachments.
    pub fn resize(
        &mut self,
        device: &mut dyn GraphicsDevice,
        handle: RenderTargetHandle,
        size: UVec2,
    ) -> Result<()> {
        let Some(target) = self.targets.get(handle) else {
            return Err(Error::InvalidResource(format!("resize: unknown render target {:?}", handle)));
        };
        if target.size == size {
            return Ok(());
        }

        let desc = RenderTargetDesc {
            size,
            color_format: target.color.map(|a| a.format),
            depth_format: target.depth.map(|a| a.format),
            label: target.label.clone(),
        };
        let built = build(device, &desc, size)?;

        let target = &mut self.targets[handle];
        destroy(device, target.color, target.depth, target.framebuffer);
        engine_debug!(
            SOURCE, "resized '{}' {}x{} -> {}x{}",
            target.label, target.size.x, target.size.y, size.x, size.y
        );
        target.size = size;
        target.color = built.color;
        target.depth = built.depth;
        target.framebuffer = built.framebuffer;
        Ok(())
    }

    /// Resize several targets as one step.
    ///
    /// Either every target ends at its requested size or every target keeps
    /// the size it had: when one resize fails, the targets already resized
    /// are put back at their old size and the first error is returned.
    pub fn resize_all(
        &mut self,
        device: &mut dyn GraphicsDevice,
        requests: &[(RenderTargetHandle, UVec2)],
    ) -> Result<()> {
        let mut done: Vec<(RenderTargetHandle, UVec2)> = Vec::with_capacity(requests.len());
        for &(handle, size) in requests {
            let old = self.size(handle);
            if let Err(err) = self.resize(device, handle, size) {
                for (handle, old) in done.into_iter().rev() {
                    if let Err(rollback) = self.resize(device, handle, old) {
                        engine_error!(SOURCE, "rollback of {:?} to {}x{} failed: {}", handle, old.x, old.y, rollback);
                    }
                }
                return Err(err);
            }
            if let Some(old) = old {
                done.push((handle, old));
            }
        }
        Ok(())
    }

    /// Free a render target and its GPU objects
    pub fn release(&mut self, device: &mut dyn GraphicsDevice, handle: RenderTargetHandle) -> Result<()> {
        let Some(target) = self.targets.remove(handle) else {
            return Err(Error::InvalidResource(format!("release: unknown render target {:?}", handle)));
        };
        destroy(device, target.color, target.depth, target.framebuffer);
        engine_debug!(SOURCE, "released '{}'", target.label);
        Ok(())
    }

    /// Free every render target
    pub fn release_all(&mut self, device: &mut dyn GraphicsDevice) {
        for (_, target) in self.targets.drain() {
            destroy(device, target.color, target.depth, target.framebuffer);
        }
    }

    // ===== ACCESSORS =====

    pub fn get(&self, handle: RenderTargetHandle) -> Option<&RenderTarget> {
        self.targets.get(handle)
    }

    pub fn contains(&self, handle: RenderTargetHandle) -> bool {
        self.targets.contains_key(handle)
    }

    pub fn color_texture(&self, handle: RenderTargetHandle) -> Option<crate::graphics_device::TextureKey> {
        self.targets.get(handle)?.color_texture()
    }

    pub fn depth_texture(&self, handle: RenderTargetHandle) -> Option<crate::graphics_device::TextureKey> {
        self.targets.get(handle)?.depth_texture()
    }

    pub fn framebuffer(&self, handle: RenderTargetHandle) -> Option<FramebufferKey> {
        self.targets.get(handle).map(|t| t.framebuffer)
    }

    pub fn size(&self, handle: RenderTargetHandle) -> Option<UVec2> {
        self.targets.get(handle).map(|t| t.size)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn handles(&self) -> Vec<RenderTargetHandle> {
        self.targets.keys().collect()
    }
}

// ===== INTERNAL =====

fn fatal(err: Error) -> Error {
    engine_error!(SOURCE, "{}", err);
    err
}

fn check_format(format: Option<TextureFormat>, want_depth: bool, label: &str) -> Result<()> {
    match format {
        Some(f) if f.is_depth() != want_depth => {
            let slot = if want_depth { "depth" } else { "color" };
            Err(fatal(Error::UnsupportedFormat(format!("{:?} on the {} slot of '{}'", f, slot, label))))
        }
        _ => Ok(()),
    }
}

/// Create textures + framebuffer and validate them, cleaning up on failure
fn build(device: &mut dyn GraphicsDevice, desc: &RenderTargetDesc, size: UVec2) -> Result<Built> {
    if size.x == 0 || size.y == 0 {
        return Err(Error::InvalidResource(format!("render target '{}' has zero size", desc.label)));
    }
    if desc.color_format.is_none() && desc.depth_format.is_none() {
        return Err(Error::InvalidResource(format!("render target '{}' has no attachment", desc.label)));
    }
    check_format(desc.color_format, false, &desc.label)?;
    check_format(desc.depth_format, true, &desc.label)?;

    let mut built = Built { color: None, depth: None, framebuffer: FramebufferKey::default() };
    let mut framebuffer = None;

    let result = (|| -> Result<()> {
        if let Some(format) = desc.color_format {
            let texture = device.create_texture(&TextureDesc::color(
                size.x, size.y, format, &format!("{}.color", desc.label),
            ))?;
            built.color = Some(Attachment { texture, format });
        }
        if let Some(format) = desc.depth_format {
            let texture = device.create_texture(&TextureDesc::depth(
                size.x, size.y, format, &format!("{}.depth", desc.label),
            ))?;
            built.depth = Some(Attachment { texture, format });
        }

        let fb = device.create_framebuffer(&desc.label)?;
        framebuffer = Some(fb);
        if let Some(a) = built.color {
            device.attach(fb, AttachmentPoint::Color, Some(AttachmentView::whole(a.texture)))?;
        }
        if let Some(a) = built.depth {
            device.attach(fb, AttachmentPoint::Depth, Some(AttachmentView::whole(a.texture)))?;
        }

        let status = device.framebuffer_status(fb);
        if !status.is_complete() {
            return Err(Error::IncompleteFramebuffer(format!("'{}': {:?}", desc.label, status)));
        }
        Ok(())
    })();

    match result {
        Ok(()) => {
            built.framebuffer = framebuffer.unwrap_or_default();
            Ok(built)
        }
        Err(err) => {
            if let Some(a) = built.color {
                device.destroy_texture(a.texture);
            }
            if let Some(a) = built.depth {
                device.destroy_texture(a.texture);
            }
            if let Some(fb) = framebuffer {
                device.destroy_framebuffer(fb);
            }
            Err(if err.is_fatal() { fatal(err) } else { err })
        }
    }
}

fn destroy(
    device: &mut dyn GraphicsDevice,
    color: Option<Attachment>,
    depth: Option<Attachment>,
    framebuffer: FramebufferKey,
) {
    device.destroy_framebuffer(framebuffer);
    if let Some(a) = color {
        device.destroy_texture(a.texture);
    }
    if let Some(a) = depth {
        device.destroy_texture(a.texture);
    }
}

#[cfg(test)]
#[path = "render_target_pool_tests.rs"]
mod tests;
