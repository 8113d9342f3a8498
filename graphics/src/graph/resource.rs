//! Resource handles and access declarations.
//!
//! Passes never touch physical memory directly. They declare accesses against
//! [`ResourceHandle`]s, and the rest of the pipeline (registry, compiler,
//! scheduler) works entirely in terms of those declarations.

use bitflags::bitflags;

use crate::types::{BufferUsage, TextureUsage};

/// Handle to a resource declared in a render graph.
///
/// `ResourceHandle` is `Copy` and cheap to pass around. It is only valid
/// within the `RenderGraph` that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle(u32);

impl ResourceHandle {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw index, for debug display.
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// How a pass accesses a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// The pass only reads the resource. Pure reads may run concurrently.
    Read,
    /// The pass only writes the resource.
    Write,
    /// The pass reads and writes the resource (read-modify-write).
    ReadWrite,
}

impl AccessKind {
    /// Check if this access reads the resource.
    pub fn is_read(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    /// Check if this access writes the resource.
    pub fn is_write(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }

    /// Combine two accesses by the same pass into one.
    pub(crate) fn merge(self, other: Self) -> Self {
        if self == other {
            self
        } else {
            Self::ReadWrite
        }
    }
}

bitflags! {
    /// Pipeline stages an access participates in.
    ///
    /// Barrier stage masks are formed from the union of the two accesses'
    /// declared stages only, never "all stages", to avoid over-synchronizing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PipelineStages: u32 {
        /// Vertex input (vertex/index buffer fetch).
        const VERTEX_INPUT = 1 << 0;
        /// Vertex shader execution.
        const VERTEX_SHADER = 1 << 1;
        /// Fragment shader execution.
        const FRAGMENT_SHADER = 1 << 2;
        /// Compute shader execution.
        const COMPUTE_SHADER = 1 << 3;
        /// Color attachment output.
        const COLOR_ATTACHMENT = 1 << 4;
        /// Depth/stencil attachment access.
        const DEPTH_STENCIL = 1 << 5;
        /// Transfer (copy) operations.
        const TRANSFER = 1 << 6;
    }
}

impl PipelineStages {
    /// True if any shader-execution stage is set.
    pub fn has_shader_stage(self) -> bool {
        self.intersects(Self::VERTEX_SHADER | Self::FRAGMENT_SHADER | Self::COMPUTE_SHADER)
    }
}

/// A single resource access declared by a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceAccess {
    /// The resource being accessed.
    pub resource: ResourceHandle,
    /// Read, write, or read-modify-write.
    pub kind: AccessKind,
    /// Pipeline stages the access happens in.
    pub stages: PipelineStages,
}

/// Derive the texture capability bits implied by one access.
///
/// Accumulated across all passes by the registry so the allocator can pick
/// creation flags that cover every declared use.
pub(crate) fn texture_usage_for_access(kind: AccessKind, stages: PipelineStages) -> TextureUsage {
    let mut usage = TextureUsage::empty();
    if stages.contains(PipelineStages::TRANSFER) {
        if kind.is_read() {
            usage |= TextureUsage::COPY_SRC;
        }
        if kind.is_write() {
            usage |= TextureUsage::COPY_DST;
        }
    }
    if stages.intersects(PipelineStages::COLOR_ATTACHMENT | PipelineStages::DEPTH_STENCIL) {
        usage |= TextureUsage::RENDER_ATTACHMENT;
    }
    if stages.has_shader_stage() {
        if kind.is_write() {
            usage |= TextureUsage::STORAGE;
        } else {
            usage |= TextureUsage::SAMPLED;
        }
    }
    usage
}

/// Derive the buffer capability bits implied by one access.
pub(crate) fn buffer_usage_for_access(kind: AccessKind, stages: PipelineStages) -> BufferUsage {
    let mut usage = BufferUsage::empty();
    if stages.contains(PipelineStages::TRANSFER) {
        if kind.is_read() {
            usage |= BufferUsage::COPY_SRC;
        }
        if kind.is_write() {
            usage |= BufferUsage::COPY_DST;
        }
    }
    if stages.contains(PipelineStages::VERTEX_INPUT) {
        usage |= BufferUsage::VERTEX | BufferUsage::INDEX;
    }
    if stages.has_shader_stage() {
        usage |= BufferUsage::STORAGE;
    }
    usage
}
