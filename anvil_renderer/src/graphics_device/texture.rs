/// Texture keys, formats and descriptors

use bitflags::bitflags;
use slotmap::new_key_type;

new_key_type! {
    /// Device-owned texture handle.
    ///
    /// Stays valid until `GraphicsDevice::destroy_texture` is called on it.
    pub struct TextureKey;
}

/// Attachment and sampling formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba16Float,
    Rgb8Unorm,
    Depth32Float,
    Depth24Stencil8,
}

impl TextureFormat {
    pub fn is_depth(self) -> bool {
        matches!(self, TextureFormat::Depth32Float | TextureFormat::Depth24Stencil8)
    }

    pub fn is_color(self) -> bool {
        !self.is_depth()
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            TextureFormat::Rgba8Unorm => 4,
            TextureFormat::Rgba16Float => 8,
            TextureFormat::Rgb8Unorm => 3,
            TextureFormat::Depth32Float => 4,
            TextureFormat::Depth24Stencil8 => 4,
        }
    }
}

/// Texture shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Texture2D,
    /// Six square layers in +X, -X, +Y, -Y, +Z, -Z order
    Cube,
}

impl TextureKind {
    pub fn layer_count(self) -> u32 {
        match self {
            TextureKind::Texture2D => 1,
            TextureKind::Cube => 6,
        }
    }
}

bitflags! {
    /// Allowed uses of a texture
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Can be bound to a texture unit
        const SAMPLED = 1 << 0;
        /// Can be a framebuffer color attachment
        const COLOR_ATTACHMENT = 1 << 1;
        /// Can be a framebuffer depth attachment
        const DEPTH_ATTACHMENT = 1 << 2;
        /// Can be read back with `read_pixels`
        const COPY_SRC = 1 << 3;
    }
}

/// Descriptor for creating a texture
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub kind: TextureKind,
    pub usage: TextureUsage,
    /// Debug label
    pub label: String,
}

impl TextureDesc {
    /// Sampled color attachment
    pub fn color(width: u32, height: u32, format: TextureFormat, label: &str) -> Self {
        Self {
            width,
            height,
            format,
            kind: TextureKind::Texture2D,
            usage: TextureUsage::COLOR_ATTACHMENT | TextureUsage::SAMPLED | TextureUsage::COPY_SRC,
            label: label.to_string(),
        }
    }

    /// Sampled depth attachment
    pub fn depth(width: u32, height: u32, format: TextureFormat, label: &str) -> Self {
        Self {
            width,
            height,
            format,
            kind: TextureKind::Texture2D,
            usage: TextureUsage::DEPTH_ATTACHMENT | TextureUsage::SAMPLED,
            label: label.to_string(),
        }
    }

    pub fn with_kind(mut self, kind: TextureKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Read-only properties of a created texture
#[derive(Debug, Clone, PartialEq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub kind: TextureKind,
    pub usage: TextureUsage,
    pub label: String,
}

impl TextureInfo {
    pub fn layers(&self) -> u32 {
        self.kind.layer_count()
    }

    /// Size in bytes of a single layer
    pub fn layer_size(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

impl From<&TextureDesc> for TextureInfo {
    fn from(desc: &TextureDesc) -> Self {
        Self {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            kind: desc.kind,
            usage: desc.usage,
            label: desc.label.clone(),
        }
    }
}
