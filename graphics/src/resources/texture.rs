use crate::types::{Extent3d, TextureDescriptor, TextureFormat, TextureUsage};

/// A device-owned texture.
///
/// Created through [`crate::GraphicsDevice::create_texture`] and shared via
/// `Arc`. Importing one into a render graph never transfers ownership; the
/// graph only orders accesses to it.
#[derive(Debug)]
pub struct Texture {
    id: u64,
    desc: TextureDescriptor,
}

impl Texture {
    pub(crate) fn new(id: u64, desc: TextureDescriptor) -> Self {
        Self { id, desc }
    }

    /// Device-unique identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The descriptor this texture was created with.
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.desc
    }

    /// Debug label, if one was set.
    pub fn label(&self) -> Option<&str> {
        self.desc.label.as_deref()
    }

    /// Texture dimensions.
    pub fn size(&self) -> Extent3d {
        self.desc.size
    }

    /// Pixel format.
    pub fn format(&self) -> TextureFormat {
        self.desc.format
    }

    /// Usage flags declared at creation.
    pub fn usage(&self) -> TextureUsage {
        self.desc.usage
    }
}
