//! Texture formats, usage flags, and descriptors.

use super::Extent3d;
use bitflags::bitflags;

/// Texture format enumeration.
///
/// A deliberately small set; the scheduler only needs formats with known
/// per-texel sizes so transient allocations can be measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum TextureFormat {
    /// 8-bit red channel, unsigned normalized.
    R8Unorm,
    /// 16-bit red channel, float.
    R16Float,
    /// 32-bit red channel, float.
    R32Float,
    /// 8-bit RGBA channels, unsigned normalized.
    #[default]
    Rgba8Unorm,
    /// 8-bit RGBA channels, sRGB.
    Rgba8UnormSrgb,
    /// 8-bit BGRA channels, unsigned normalized.
    Bgra8Unorm,
    /// 16-bit RG channels, float.
    Rg16Float,
    /// 16-bit RGBA channels, float.
    Rgba16Float,
    /// 32-bit RGBA channels, float.
    Rgba32Float,
    /// 16-bit depth.
    Depth16Unorm,
    /// 24-bit depth with 8-bit stencil.
    Depth24PlusStencil8,
    /// 32-bit depth, float.
    Depth32Float,
}

impl TextureFormat {
    /// Returns true if this is a depth or stencil format.
    pub fn is_depth_stencil(&self) -> bool {
        matches!(
            self,
            Self::Depth16Unorm | Self::Depth24PlusStencil8 | Self::Depth32Float
        )
    }

    /// Size in bytes per texel.
    pub fn block_size(&self) -> u32 {
        match self {
            Self::R8Unorm => 1,
            Self::R16Float | Self::Depth16Unorm => 2,
            Self::R32Float
            | Self::Rgba8Unorm
            | Self::Rgba8UnormSrgb
            | Self::Bgra8Unorm
            | Self::Rg16Float
            | Self::Depth24PlusStencil8
            | Self::Depth32Float => 4,
            Self::Rgba16Float => 8,
            Self::Rgba32Float => 16,
        }
    }
}

bitflags! {
    /// Capability flags a texture must be created with.
    ///
    /// The registry accumulates these from every pass access that references
    /// the texture, so a texture that is sampled in one pass and written as
    /// storage in another ends up with both bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Texture can be the source of a copy.
        const COPY_SRC = 1 << 0;
        /// Texture can be the destination of a copy.
        const COPY_DST = 1 << 1;
        /// Texture can be sampled in a shader.
        const SAMPLED = 1 << 2;
        /// Texture can be read/written as a storage image.
        const STORAGE = 1 << 3;
        /// Texture can be used as a render attachment.
        const RENDER_ATTACHMENT = 1 << 4;
    }
}

impl Default for TextureUsage {
    fn default() -> Self {
        Self::empty()
    }
}

/// Descriptor for creating a texture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    /// Debug label for the texture.
    pub label: Option<String>,
    /// Size of the texture.
    pub size: Extent3d,
    /// Mip level count.
    pub mip_level_count: u32,
    /// Sample count for multisampling.
    pub sample_count: u32,
    /// Texture format.
    pub format: TextureFormat,
    /// Usage flags. For transient textures these may be left empty; the
    /// registry derives the final mask from declared pass accesses.
    pub usage: TextureUsage,
}

impl TextureDescriptor {
    /// Create a new 2D texture descriptor.
    pub fn new_2d(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            label: None,
            size: Extent3d::new_2d(width, height),
            mip_level_count: 1,
            sample_count: 1,
            format,
            usage: TextureUsage::empty(),
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set explicit usage flags.
    pub fn with_usage(mut self, usage: TextureUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Set the mip level count.
    pub fn with_mip_levels(mut self, count: u32) -> Self {
        self.mip_level_count = count;
        self
    }

    /// Conservative byte size of the texture's backing memory.
    ///
    /// Mip chains are approximated by 4/3 of the base level, which is an
    /// upper bound for 2D mip pyramids.
    pub fn byte_size(&self) -> u64 {
        let base = self.size.texel_count()
            * self.format.block_size() as u64
            * self.sample_count.max(1) as u64;
        if self.mip_level_count > 1 {
            base + base / 3
        } else {
            base
        }
    }

    /// Check descriptor validity. Zero-sized textures are programmer errors.
    pub fn is_valid(&self) -> bool {
        self.size.width > 0 && self.size.height > 0 && self.size.depth > 0 && self.sample_count > 0
    }
}

impl Default for TextureDescriptor {
    fn default() -> Self {
        Self::new_2d(1, 1, TextureFormat::default())
    }
}
