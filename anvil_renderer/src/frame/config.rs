/// Renderer configuration

use glam::UVec2;
use crate::graphics_device::TextureFormat;
use crate::post::PostConfig;
use crate::resource::ResourceId;
use crate::shadow::ShadowConfig;

/// Programs the renderer binds itself. Drawables without a material use
/// `forward`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererPrograms {
    pub forward: ResourceId,
    pub skybox: ResourceId,
    pub wireframe: ResourceId,
    /// Copies the final image into a slot output
    pub composite: ResourceId,
}

impl Default for RendererPrograms {
    fn default() -> Self {
        Self {
            forward: ResourceId::new("forward"),
            skybox: ResourceId::new("skybox"),
            wireframe: ResourceId::new("wireframe"),
            composite: ResourceId::new("composite"),
        }
    }
}

/// Sky drawn behind the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyConfig {
    pub zenith_color: [f32; 4],
    pub horizon_color: [f32; 4],
    /// Cube texture sampled at unit 0, gradient only if `None`
    pub environment: Option<ResourceId>,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            zenith_color: [0.18, 0.32, 0.62, 1.0],
            horizon_color: [0.72, 0.80, 0.88, 1.0],
            environment: None,
        }
    }
}

/// Frame renderer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Size of the scene and output targets
    pub render_size: UVec2,
    pub clear_color: [f32; 4],
    /// Scene color target; post passes read it
    pub color_format: TextureFormat,
    pub depth_format: TextureFormat,
    /// Per-slot output targets
    pub output_format: TextureFormat,
    pub enable_shadows: bool,
    pub enable_skybox: bool,
    pub enable_wireframe: bool,
    pub enable_post: bool,
    pub shadows: ShadowConfig,
    pub post: PostConfig,
    pub sky: SkyConfig,
    pub programs: RendererPrograms,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            render_size: UVec2::new(1280, 720),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            color_format: TextureFormat::Rgba16Float,
            depth_format: TextureFormat::Depth24Stencil8,
            output_format: TextureFormat::Rgba8Unorm,
            enable_shadows: true,
            enable_skybox: true,
            enable_wireframe: false,
            enable_post: false,
            shadows: ShadowConfig::default(),
            post: PostConfig::default(),
            sky: SkyConfig::default(),
            programs: RendererPrograms::default(),
        }
    }
}
