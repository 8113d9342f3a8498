use crate::types::{BufferDescriptor, BufferUsage};

/// A device-owned buffer.
///
/// Created through [`crate::GraphicsDevice::create_buffer`] and shared via
/// `Arc`. Like textures, buffers are imported into graphs by reference.
#[derive(Debug)]
pub struct Buffer {
    id: u64,
    desc: BufferDescriptor,
}

impl Buffer {
    pub(crate) fn new(id: u64, desc: BufferDescriptor) -> Self {
        Self { id, desc }
    }

    /// Device-unique identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The descriptor this buffer was created with.
    pub fn descriptor(&self) -> &BufferDescriptor {
        &self.desc
    }

    /// Debug label, if one was set.
    pub fn label(&self) -> Option<&str> {
        self.desc.label.as_deref()
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.desc.size
    }

    /// Usage flags declared at creation.
    pub fn usage(&self) -> BufferUsage {
        self.desc.usage
    }
}
