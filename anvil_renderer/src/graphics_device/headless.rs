/// Headless device - CPU implementation of `GraphicsDevice`
///
/// Tracks textures and framebuffers, validates framebuffer completeness and
/// resolves clears into per-layer contents, so `read_pixels` returns real
/// bytes without a GPU. Every call is appended to a command log that tests
/// inspect afterwards. Draw calls are recorded but do not rasterize.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use crate::error::{Error, Result};
use crate::engine_bail;
use crate::engine_trace;
use crate::graphics_device::{
    GraphicsDevice, Program, NamedProgram, Viewport, ClearFlags, PolygonMode,
    TextureDesc, TextureInfo, TextureKey, TextureFormat, TextureKind, TextureUsage,
    FramebufferKey, FramebufferTarget, FramebufferStatus, AttachmentPoint, AttachmentView,
};

const SOURCE: &str = "anvil::HeadlessDevice";

// ============================================================================
// Stored state
// ============================================================================

/// Last value written to a texture layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerContents {
    /// Never cleared; reads back as zeros
    Undefined,
    Color([f32; 4]),
    Depth(f32),
}

impl LayerContents {
    fn rgba8(self) -> [u8; 4] {
        fn unorm(v: f32) -> u8 {
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        match self {
            LayerContents::Undefined => [0, 0, 0, 0],
            LayerContents::Color(c) => [unorm(c[0]), unorm(c[1]), unorm(c[2]), unorm(c[3])],
            LayerContents::Depth(d) => {
                let g = unorm(d);
                [g, g, g, 255]
            }
        }
    }
}

#[derive(Debug)]
struct HeadlessTexture {
    info: TextureInfo,
    layers: Vec<LayerContents>,
}

#[derive(Debug, Default)]
struct HeadlessFramebuffer {
    label: String,
    color: Option<AttachmentView>,
    depth: Option<AttachmentView>,
}

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    CreateTexture { texture: TextureKey, label: String },
    DestroyTexture(TextureKey),
    CreateFramebuffer { framebuffer: FramebufferKey, label: String },
    DestroyFramebuffer(FramebufferKey),
    Attach { framebuffer: FramebufferKey, point: AttachmentPoint, view: Option<AttachmentView> },
    BindFramebuffer { target: FramebufferTarget, framebuffer: Option<FramebufferKey> },
    SetViewport(Viewport),
    SetPolygonMode(PolygonMode),
    Clear { framebuffer: Option<FramebufferKey>, flags: ClearFlags, color: [f32; 4], depth: f32 },
    BindProgram(String),
    BindTexture { unit: u32, texture: TextureKey },
    WriteUniforms { binding: u32, size: usize },
    PushConstants { offset: u32, size: usize },
    Draw {
        framebuffer: Option<FramebufferKey>,
        program: String,
        polygon_mode: PolygonMode,
        vertex_count: u32,
    },
}

// ============================================================================
// HeadlessDevice
// ============================================================================

#[derive(Debug, Default)]
pub struct HeadlessDevice {
    textures: SlotMap<TextureKey, HeadlessTexture>,
    framebuffers: SlotMap<FramebufferKey, HeadlessFramebuffer>,
    draw_binding: Option<FramebufferKey>,
    read_binding: Option<FramebufferKey>,
    viewport: Option<Viewport>,
    polygon_mode: PolygonMode,
    program: Option<Arc<dyn Program>>,
    texture_units: FxHashMap<u32, TextureKey>,
    uniforms: FxHashMap<u32, Vec<u8>>,
    push_constant_data: Vec<u8>,
    placeholder: Option<Arc<dyn Program>>,
    commands: Vec<DeviceCommand>,
    rejected_formats: Vec<TextureFormat>,
    force_incomplete: bool,
    /// Texture memory limit in bytes
    memory_budget: Option<usize>,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== FAILURE INJECTION =====

    /// Make `create_texture` fail with `UnsupportedFormat` for `format`
    pub fn reject_format(&mut self, format: TextureFormat) {
        if !self.rejected_formats.contains(&format) {
            self.rejected_formats.push(format);
        }
    }

    /// Report every framebuffer as incomplete while `enabled`
    pub fn fail_completeness(&mut self, enabled: bool) {
        self.force_incomplete = enabled;
    }

    /// Fail `create_texture` with `OutOfMemory` once live textures would
    /// exceed `bytes`. `None` removes the limit.
    pub fn set_memory_budget(&mut self, bytes: Option<usize>) {
        self.memory_budget = bytes;
    }

    // ===== INSPECTION =====

    /// Bytes held by every live texture, all layers included
    pub fn allocated_bytes(&self) -> usize {
        self.textures.values().map(|t| texture_bytes(&t.info)).sum()
    }

    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Drain the command log
    pub fn take_commands(&mut self) -> Vec<DeviceCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn draw_count(&self) -> usize {
        self.commands.iter().filter(|c| matches!(c, DeviceCommand::Draw { .. })).count()
    }

    /// Labels of the programs bound at each draw, in order
    pub fn draw_programs(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DeviceCommand::Draw { program, .. } => Some(program.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn live_framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn framebuffer_label(&self, framebuffer: FramebufferKey) -> Option<&str> {
        self.framebuffers.get(framebuffer).map(|fb| fb.label.as_str())
    }

    pub fn layer_contents(&self, texture: TextureKey, layer: u32) -> Option<LayerContents> {
        self.textures.get(texture)?.layers.get(layer as usize).copied()
    }

    pub fn bound_program(&self) -> Option<&Arc<dyn Program>> {
        self.program.as_ref()
    }

    pub fn texture_unit(&self, unit: u32) -> Option<TextureKey> {
        self.texture_units.get(&unit).copied()
    }

    pub fn uniform_data(&self, binding: u32) -> Option<&[u8]> {
        self.uniforms.get(&binding).map(Vec::as_slice)
    }

    /// Push constant block; each `push_constants` call writes at its offset
    pub fn push_constant_data(&self) -> &[u8] {
        &self.push_constant_data
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn polygon_mode(&self) -> PolygonMode {
        self.polygon_mode
    }

    fn write_attachment(&mut self, view: Option<AttachmentView>, contents: LayerContents) {
        if let Some(view) = view {
            if let Some(texture) = self.textures.get_mut(view.texture) {
                if let Some(layer) = texture.layers.get_mut(view.layer as usize) {
                    *layer = contents;
                }
            }
        }
    }

    fn check_view(&self, point: AttachmentPoint, view: &AttachmentView) -> std::result::Result<(u32, u32), FramebufferStatus> {
        let texture = self.textures.get(view.texture).ok_or(FramebufferStatus::MissingTexture)?;
        let info = &texture.info;

        let compatible = match point {
            AttachmentPoint::Color => {
                info.format.is_color() && info.usage.contains(TextureUsage::COLOR_ATTACHMENT)
            }
            AttachmentPoint::Depth => {
                info.format.is_depth() && info.usage.contains(TextureUsage::DEPTH_ATTACHMENT)
            }
        };
        if !compatible {
            return Err(FramebufferStatus::FormatMismatch);
        }
        if view.layer >= info.layers() || view.mip != 0 {
            return Err(FramebufferStatus::LayerOutOfRange);
        }
        Ok((info.width, info.height))
    }
}

fn texture_bytes(info: &TextureInfo) -> usize {
    info.layer_size() * info.layers() as usize
}

impl GraphicsDevice for HeadlessDevice {
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureKey> {
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::InvalidResource(format!(
                "texture '{}' has zero size {}x{}", desc.label, desc.width, desc.height
            )));
        }
        if desc.kind == TextureKind::Cube && desc.width != desc.height {
            return Err(Error::InvalidResource(format!(
                "cube texture '{}' must be square, got {}x{}", desc.label, desc.width, desc.height
            )));
        }
        if self.rejected_formats.contains(&desc.format) {
            return Err(Error::UnsupportedFormat(format!(
                "{:?} rejected for texture '{}'", desc.format, desc.label
            )));
        }
        if desc.format.is_depth() && desc.usage.contains(TextureUsage::COLOR_ATTACHMENT) {
            return Err(Error::UnsupportedFormat(format!(
                "depth format {:?} cannot be a color attachment ('{}')", desc.format, desc.label
            )));
        }
        if desc.format.is_color() && desc.usage.contains(TextureUsage::DEPTH_ATTACHMENT) {
            return Err(Error::UnsupportedFormat(format!(
                "color format {:?} cannot be a depth attachment ('{}')", desc.format, desc.label
            )));
        }

        let info = TextureInfo::from(desc);
        if let Some(budget) = self.memory_budget {
            let needed = self.allocated_bytes() + texture_bytes(&info);
            if needed > budget {
                engine_trace!(SOURCE, "texture '{}' needs {} bytes of {} budget", desc.label, needed, budget);
                return Err(Error::OutOfMemory);
            }
        }
        let layers = vec![LayerContents::Undefined; info.layers() as usize];
        let key = self.textures.insert(HeadlessTexture { info, layers });

        engine_trace!(SOURCE, "create texture '{}' {}x{} {:?}", desc.label, desc.width, desc.height, desc.format);
        self.commands.push(DeviceCommand::CreateTexture { texture: key, label: desc.label.clone() });
        Ok(key)
    }

    fn destroy_texture(&mut self, texture: TextureKey) {
        if self.textures.remove(texture).is_some() {
            self.texture_units.retain(|_, bound| *bound != texture);
            self.commands.push(DeviceCommand::DestroyTexture(texture));
        }
    }

    fn texture_info(&self, texture: TextureKey) -> Option<&TextureInfo> {
        self.textures.get(texture).map(|t| &t.info)
    }

    fn create_framebuffer(&mut self, label: &str) -> Result<FramebufferKey> {
        let key = self.framebuffers.insert(HeadlessFramebuffer {
            label: label.to_string(),
            ..Default::default()
        });
        self.commands.push(DeviceCommand::CreateFramebuffer { framebuffer: key, label: label.to_string() });
        Ok(key)
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferKey) {
        if self.framebuffers.remove(framebuffer).is_some() {
            if self.draw_binding == Some(framebuffer) {
                self.draw_binding = None;
            }
            if self.read_binding == Some(framebuffer) {
                self.read_binding = None;
            }
            self.commands.push(DeviceCommand::DestroyFramebuffer(framebuffer));
        }
    }

    fn attach(
        &mut self,
        framebuffer: FramebufferKey,
        point: AttachmentPoint,
        view: Option<AttachmentView>,
    ) -> Result<()> {
        if let Some(v) = &view {
            if !self.textures.contains_key(v.texture) {
                return Err(Error::InvalidResource(format!("attach: unknown texture {:?}", v.texture)));
            }
        }
        let Some(fb) = self.framebuffers.get_mut(framebuffer) else {
            return Err(Error::InvalidResource(format!("attach: unknown framebuffer {:?}", framebuffer)));
        };
        match point {
            AttachmentPoint::Color => fb.color = view,
            AttachmentPoint::Depth => fb.depth = view,
        }
        self.commands.push(DeviceCommand::Attach { framebuffer, point, view });
        Ok(())
    }

    fn framebuffer_status(&self, framebuffer: FramebufferKey) -> FramebufferStatus {
        let Some(fb) = self.framebuffers.get(framebuffer) else {
            return FramebufferStatus::Unsupported;
        };
        if self.force_incomplete {
            return FramebufferStatus::Unsupported;
        }

        let views = [
            fb.color.map(|v| (AttachmentPoint::Color, v)),
            fb.depth.map(|v| (AttachmentPoint::Depth, v)),
        ];

        let mut size: Option<(u32, u32)> = None;
        let mut attached = 0;
        for (point, view) in views.into_iter().flatten() {
            attached += 1;
            let view_size = match self.check_view(point, &view) {
                Ok(s) => s,
                Err(status) => return status,
            };
            match size {
                Some(s) if s != view_size => return FramebufferStatus::SizeMismatch,
                _ => size = Some(view_size),
            }
        }

        if attached == 0 {
            FramebufferStatus::MissingAttachment
        } else {
            FramebufferStatus::Complete
        }
    }

    fn bound_framebuffer(&self, target: FramebufferTarget) -> Option<FramebufferKey> {
        match target {
            FramebufferTarget::Draw => self.draw_binding,
            FramebufferTarget::Read => self.read_binding,
        }
    }

    fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: Option<FramebufferKey>) {
        match target {
            FramebufferTarget::Draw => self.draw_binding = framebuffer,
            FramebufferTarget::Read => self.read_binding = framebuffer,
        }
        self.commands.push(DeviceCommand::BindFramebuffer { target, framebuffer });
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
        self.commands.push(DeviceCommand::SetViewport(viewport));
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.polygon_mode = mode;
        self.commands.push(DeviceCommand::SetPolygonMode(mode));
    }

    fn clear(&mut self, flags: ClearFlags, color: [f32; 4], depth: f32) -> Result<()> {
        let framebuffer = self.draw_binding;

        if let Some(key) = framebuffer {
            let status = self.framebuffer_status(key);
            if !status.is_complete() {
                return Err(Error::IncompleteFramebuffer(format!(
                    "clear on framebuffer {:?}: {:?}", key, status
                )));
            }
            let (color_view, depth_view) = match self.framebuffers.get(key) {
                Some(fb) => (fb.color, fb.depth),
                None => (None, None),
            };
            if flags.contains(ClearFlags::COLOR) {
                self.write_attachment(color_view, LayerContents::Color(color));
            }
            if flags.contains(ClearFlags::DEPTH) {
                self.write_attachment(depth_view, LayerContents::Depth(depth));
            }
        }

        self.commands.push(DeviceCommand::Clear { framebuffer, flags, color, depth });
        Ok(())
    }

    fn bind_program(&mut self, program: &Arc<dyn Program>) -> Result<()> {
        self.program = Some(Arc::clone(program));
        self.commands.push(DeviceCommand::BindProgram(program.label().to_string()));
        Ok(())
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureKey) -> Result<()> {
        let Some(t) = self.textures.get(texture) else {
            return Err(Error::InvalidResource(format!("bind_texture: unknown texture {:?}", texture)));
        };
        if !t.info.usage.contains(TextureUsage::SAMPLED) {
            return Err(Error::InvalidResource(format!(
                "bind_texture: '{}' is not sampled", t.info.label
            )));
        }
        self.texture_units.insert(unit, texture);
        self.commands.push(DeviceCommand::BindTexture { unit, texture });
        Ok(())
    }

    fn write_uniforms(&mut self, binding: u32, data: &[u8]) -> Result<()> {
        self.uniforms.insert(binding, data.to_vec());
        self.commands.push(DeviceCommand::WriteUniforms { binding, size: data.len() });
        Ok(())
    }

    fn push_constants(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        if self.program.is_none() {
            engine_bail!(SOURCE, "push_constants without a bound program");
        }
        let start = offset as usize;
        let end = start + data.len();
        if self.push_constant_data.len() < end {
            self.push_constant_data.resize(end, 0);
        }
        self.push_constant_data[start..end].copy_from_slice(data);
        self.commands.push(DeviceCommand::PushConstants { offset, size: data.len() });
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, _first_vertex: u32) -> Result<()> {
        let Some(program) = &self.program else {
            engine_bail!(SOURCE, "draw without a bound program");
        };
        self.commands.push(DeviceCommand::Draw {
            framebuffer: self.draw_binding,
            program: program.label().to_string(),
            polygon_mode: self.polygon_mode,
            vertex_count,
        });
        Ok(())
    }

    fn read_pixels(&self, texture: TextureKey, layer: u32) -> Result<Vec<u8>> {
        let Some(t) = self.textures.get(texture) else {
            return Err(Error::InvalidResource(format!("read_pixels: unknown texture {:?}", texture)));
        };
        let Some(contents) = t.layers.get(layer as usize) else {
            return Err(Error::InvalidResource(format!(
                "read_pixels: layer {} out of range for '{}'", layer, t.info.label
            )));
        };

        let pixel = contents.rgba8();
        let count = t.info.width as usize * t.info.height as usize;
        let mut pixels = Vec::with_capacity(count * 4);
        for _ in 0..count {
            pixels.extend_from_slice(&pixel);
        }
        Ok(pixels)
    }

    fn placeholder_program(&mut self) -> Result<Arc<dyn Program>> {
        let program = self
            .placeholder
            .get_or_insert_with(|| NamedProgram::shared("placeholder"));
        Ok(Arc::clone(program))
    }
}

#[cfg(test)]
#[path = "headless_tests.rs"]
mod tests;
