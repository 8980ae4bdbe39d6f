/// Environment capture into a cube map.
///
/// The engine owns one color cube, one depth cube and one framebuffer that
/// is re-pointed at each face in turn. It does not know what is drawn: a
/// `SceneRenderer` borrowed for the duration of `capture()` issues the draw
/// calls for each face.
///
/// Capture and export are decoupled. `capture()` can run every frame;
/// pixels are only read back when `export()` is called, or through
/// `take_export()` after `request_export()`.

use std::f32::consts::FRAC_PI_2;
use glam::{Mat4, Vec3};
use crate::error::{Error, Result};
use crate::{engine_debug, engine_error, engine_info};
use crate::graphics_device::{
    AttachmentPoint, AttachmentView, ClearFlags, FramebufferKey, FramebufferTarget,
    GraphicsDevice, ScopedFramebufferBinding, TextureDesc, TextureFormat, TextureKey,
    TextureKind, Viewport,
};
use super::cube_face::CubeFace;

const SOURCE: &str = "anvil::CubemapCaptureEngine";

/// Capture configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CubemapConfig {
    /// Width and height of each face
    pub resolution: u32,
    pub near: f32,
    pub far: f32,
    pub clear_color: [f32; 4],
    pub color_format: TextureFormat,
    pub depth_format: TextureFormat,
}

impl Default for CubemapConfig {
    fn default() -> Self {
        Self {
            resolution: 1024,
            near: 0.1,
            far: 128.0,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            color_format: TextureFormat::Rgba8Unorm,
            depth_format: TextureFormat::Depth24Stencil8,
        }
    }
}

/// Draws a scene from a given eye. Borrowed for one capture only.
pub trait SceneRenderer {
    fn render(
        &mut self,
        device: &mut dyn GraphicsDevice,
        eye: Vec3,
        view: &Mat4,
        projection: &Mat4,
    ) -> Result<()>;
}

impl<F> SceneRenderer for F
where
    F: FnMut(&mut dyn GraphicsDevice, Vec3, &Mat4, &Mat4) -> Result<()>,
{
    fn render(
        &mut self,
        device: &mut dyn GraphicsDevice,
        eye: Vec3,
        view: &Mat4,
        projection: &Mat4,
    ) -> Result<()> {
        self(device, eye, view, projection)
    }
}

/// Result of one capture
#[derive(Debug, Clone, PartialEq)]
pub struct CubeCapture {
    pub position: Vec3,
    /// Color cube holding the six faces
    pub texture: TextureKey,
    pub projection: Mat4,
    /// View matrix used for each face, in `CubeFace::ALL` order
    pub views: [Mat4; 6],
}

/// Raw pixels of one face, tightly packed rows, top row first
#[derive(Debug, Clone, PartialEq)]
pub struct FaceImage {
    pub face: CubeFace,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub pixels: Vec<u8>,
}

/// GPU objects of the capture target
struct CubeTarget {
    color: TextureKey,
    depth: TextureKey,
    framebuffer: FramebufferKey,
}

pub struct CubemapCaptureEngine {
    config: CubemapConfig,
    target: CubeTarget,
    export_requested: bool,
    capture_count: u64,
}

impl CubemapCaptureEngine {
    /// Create the cube textures and framebuffer and validate them.
    ///
    /// # Errors
    ///
    /// `InitializationFailed` for a zero resolution or an empty depth range,
    /// `UnsupportedFormat` or `IncompleteFramebuffer` when the device rejects
    /// the attachments. These are fatal configuration errors.
    pub fn new(device: &mut dyn GraphicsDevice, config: CubemapConfig) -> Result<Self> {
        if !(config.far > config.near) || config.near <= 0.0 {
            let err = Error::InitializationFailed(format!(
                "cubemap depth range [{}, {}] is empty", config.near, config.far
            ));
            engine_error!(SOURCE, "{}", err);
            return Err(err);
        }
        let target = create_target(device, &config, config.resolution)?;
        engine_debug!(SOURCE, "cube target {}x{} created", config.resolution, config.resolution);
        Ok(Self { config, target, export_requested: false, capture_count: 0 })
    }

    /// Change the face resolution. Recreates the target only when the
    /// resolution changes; on failure the old target is kept.
    pub fn set_resolution(&mut self, device: &mut dyn GraphicsDevice, resolution: u32) -> Result<()> {
        if resolution == self.config.resolution {
            return Ok(());
        }
        let target = create_target(device, &self.config, resolution)?;
        destroy_target(device, &self.target);
        self.target = target;
        engine_debug!(
            SOURCE, "cube target resized {} -> {}",
            self.config.resolution, resolution
        );
        self.config.resolution = resolution;
        Ok(())
    }

    /// Render the six faces seen from `position`.
    ///
    /// Draw and read framebuffer bindings are restored on every exit path,
    /// including an error or a panic inside `scene`.
    pub fn capture(
        &mut self,
        device: &mut dyn GraphicsDevice,
        position: Vec3,
        scene: &mut dyn SceneRenderer,
    ) -> Result<CubeCapture> {
        let projection = self.projection();
        let resolution = self.config.resolution;
        let framebuffer = self.target.framebuffer;
        let mut views = [Mat4::IDENTITY; 6];

        let mut scoped = ScopedFramebufferBinding::new(device);
        for face in CubeFace::ALL {
            let layer = face.layer();
            scoped.attach(framebuffer, AttachmentPoint::Color, Some(AttachmentView::layer(self.target.color, layer)))?;
            scoped.attach(framebuffer, AttachmentPoint::Depth, Some(AttachmentView::layer(self.target.depth, layer)))?;

            // The scene may rebind or change the viewport; reset per face
            scoped.bind_framebuffer(FramebufferTarget::Draw, Some(framebuffer));
            scoped.set_viewport(Viewport::full(resolution, resolution));
            scoped.clear(ClearFlags::COLOR | ClearFlags::DEPTH, self.config.clear_color, 1.0)?;

            let view = face.view_matrix(position);
            views[layer as usize] = view;
            scene.render(&mut *scoped, position, &view, &projection)?;
        }
        drop(scoped);

        self.capture_count += 1;
        Ok(CubeCapture { position, texture: self.target.color, projection, views })
    }

    /// Mark the next `take_export()` as wanted
    pub fn request_export(&mut self) {
        self.export_requested = true;
    }

    pub fn is_export_requested(&self) -> bool {
        self.export_requested
    }

    /// Read back the faces if an export was requested, clearing the
    /// request. `Ok(None)` otherwise.
    pub fn take_export(&mut self, device: &dyn GraphicsDevice) -> Result<Option<Vec<FaceImage>>> {
        if !self.export_requested {
            return Ok(None);
        }
        let images = self.export(device)?;
        self.export_requested = false;
        Ok(Some(images))
    }

    /// Read back all six faces of the last capture as RGBA8.
    /// Encoding is left to the caller.
    pub fn export(&self, device: &dyn GraphicsDevice) -> Result<Vec<FaceImage>> {
        let resolution = self.config.resolution;
        let mut images = Vec::with_capacity(6);
        for face in CubeFace::ALL {
            let pixels = device.read_pixels(self.target.color, face.layer())?;
            images.push(FaceImage {
                face,
                width: resolution,
                height: resolution,
                format: TextureFormat::Rgba8Unorm,
                pixels,
            });
        }
        engine_info!(
            SOURCE, "exported 6 faces {}x{} (capture #{})",
            resolution, resolution, self.capture_count
        );
        Ok(images)
    }

    /// Free the cube textures and framebuffer
    pub fn release(self, device: &mut dyn GraphicsDevice) {
        destroy_target(device, &self.target);
    }

    // ===== ACCESSORS =====

    /// 90 degree, aspect 1 projection shared by all faces
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(FRAC_PI_2, 1.0, self.config.near, self.config.far)
    }

    pub fn config(&self) -> &CubemapConfig {
        &self.config
    }

    pub fn resolution(&self) -> u32 {
        self.config.resolution
    }

    pub fn color_texture(&self) -> TextureKey {
        self.target.color
    }

    pub fn depth_texture(&self) -> TextureKey {
        self.target.depth
    }

    pub fn capture_count(&self) -> u64 {
        self.capture_count
    }
}

// ===== INTERNAL =====

fn create_target(device: &mut dyn GraphicsDevice, config: &CubemapConfig, resolution: u32) -> Result<CubeTarget> {
    build_target(device, config, resolution).map_err(|err| {
        engine_error!(SOURCE, "{}", err);
        err
    })
}

fn build_target(device: &mut dyn GraphicsDevice, config: &CubemapConfig, resolution: u32) -> Result<CubeTarget> {
    if resolution == 0 {
        return Err(Error::InitializationFailed("cubemap resolution is 0".to_string()));
    }
    if config.color_format.is_depth() || config.depth_format.is_color() {
        return Err(Error::UnsupportedFormat(format!(
            "cubemap formats color={:?} depth={:?}", config.color_format, config.depth_format
        )));
    }

    let color = device.create_texture(
        &TextureDesc::color(resolution, resolution, config.color_format, "cubemap.color")
            .with_kind(TextureKind::Cube),
    )?;
    let depth = match device.create_texture(
        &TextureDesc::depth(resolution, resolution, config.depth_format, "cubemap.depth")
            .with_kind(TextureKind::Cube),
    ) {
        Ok(depth) => depth,
        Err(err) => {
            device.destroy_texture(color);
            return Err(err);
        }
    };
    let framebuffer = match device.create_framebuffer("cubemap") {
        Ok(fb) => fb,
        Err(err) => {
            device.destroy_texture(color);
            device.destroy_texture(depth);
            return Err(err);
        }
    };
    let target = CubeTarget { color, depth, framebuffer };

    // Validate with the first face attached
    let validated = (|| -> Result<()> {
        device.attach(framebuffer, AttachmentPoint::Color, Some(AttachmentView::layer(color, 0)))?;
        device.attach(framebuffer, AttachmentPoint::Depth, Some(AttachmentView::layer(depth, 0)))?;
        let status = device.framebuffer_status(framebuffer);
        if !status.is_complete() {
            return Err(Error::IncompleteFramebuffer(format!("cubemap: {:?}", status)));
        }
        Ok(())
    })();

    if let Err(err) = validated {
        destroy_target(device, &target);
        return Err(err);
    }
    Ok(target)
}

fn destroy_target(device: &mut dyn GraphicsDevice, target: &CubeTarget) {
    device.destroy_framebuffer(target.framebuffer);
    device.destroy_texture(target.color);
    device.destroy_texture(target.depth);
}

#[cfg(test)]
#[path = "capture_engine_tests.rs"]
mod tests;
