//! Buffer usage flags and descriptors.

use bitflags::bitflags;

bitflags! {
    /// Capability flags a buffer must be created with.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Buffer can be the source of a copy.
        const COPY_SRC = 1 << 0;
        /// Buffer can be the destination of a copy.
        const COPY_DST = 1 << 1;
        /// Buffer can be bound as a vertex buffer.
        const VERTEX = 1 << 2;
        /// Buffer can be bound as an index buffer.
        const INDEX = 1 << 3;
        /// Buffer can be bound as a uniform buffer.
        const UNIFORM = 1 << 4;
        /// Buffer can be read/written as a storage buffer.
        const STORAGE = 1 << 5;
        /// Buffer can supply indirect draw/dispatch arguments.
        const INDIRECT = 1 << 6;
    }
}

impl Default for BufferUsage {
    fn default() -> Self {
        Self::empty()
    }
}

/// Descriptor for creating a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BufferDescriptor {
    /// Debug label for the buffer.
    pub label: Option<String>,
    /// Size in bytes.
    pub size: u64,
    /// Usage flags. May be empty for transient buffers; the registry derives
    /// the final mask from declared pass accesses.
    pub usage: BufferUsage,
}

impl BufferDescriptor {
    /// Create a new buffer descriptor.
    pub fn new(size: u64) -> Self {
        Self {
            label: None,
            size,
            usage: BufferUsage::empty(),
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set explicit usage flags.
    pub fn with_usage(mut self, usage: BufferUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Check descriptor validity. Zero-sized buffers are programmer errors.
    pub fn is_valid(&self) -> bool {
        self.size > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let desc = BufferDescriptor::new(1024)
            .with_label("staging")
            .with_usage(BufferUsage::COPY_SRC | BufferUsage::COPY_DST);
        assert_eq!(desc.size, 1024);
        assert_eq!(desc.label.as_deref(), Some("staging"));
        assert!(desc.usage.contains(BufferUsage::COPY_SRC));
    }

    #[test]
    fn test_validity() {
        assert!(BufferDescriptor::new(1).is_valid());
        assert!(!BufferDescriptor::new(0).is_valid());
    }
}
