//! GPU backend abstraction.
//!
//! The execution layer talks to hardware through [`GpuBackend`] and
//! [`CommandEncoder`]. A real implementation would wrap Vulkan or Metal
//! queues; [`DummyBackend`] records command streams for tests and headless
//! runs.

mod dummy;

pub use dummy::{DummyBackend, DummyCommand, Submission};

use std::any::Any;

use crate::error::GraphicsError;
use crate::scheduler::{Barrier, Fence, QueueSet, Semaphore};

/// A graph resource resolved to its physical backing at execution time.
#[derive(Debug, Clone)]
pub enum PhysicalResource {
    /// Transient resource placed in the frame's pool.
    Transient(crate::graph::registry::PoolRange),
    /// Application-owned texture.
    ImportedTexture(std::sync::Arc<crate::resources::Texture>),
    /// Application-owned buffer.
    ImportedBuffer(std::sync::Arc<crate::resources::Buffer>),
}

// Imported resources compare by identity, not contents.
impl PartialEq for PhysicalResource {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Transient(a), Self::Transient(b)) => a == b,
            (Self::ImportedTexture(a), Self::ImportedTexture(b)) => std::sync::Arc::ptr_eq(a, b),
            (Self::ImportedBuffer(a), Self::ImportedBuffer(b)) => std::sync::Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for PhysicalResource {}

/// Records the commands of one batch on one queue.
///
/// Encoders are created per batch, filled by pass callbacks through the
/// record context, and consumed by [`GpuBackend::submit`].
pub trait CommandEncoder: Send {
    /// Mark the start of a pass's commands.
    fn begin_pass(&mut self, name: &str);

    /// Bind a pipeline by name.
    fn bind_pipeline(&mut self, pipeline: &str);

    /// Bind a resource to a shader slot.
    fn bind_resource(&mut self, slot: u32, resource: PhysicalResource);

    /// Record a draw.
    fn draw(&mut self, vertex_count: u32, instance_count: u32);

    /// Record a compute dispatch.
    fn dispatch(&mut self, groups_x: u32, groups_y: u32, groups_z: u32);

    /// Record a copy between two resources.
    fn copy(&mut self, src: PhysicalResource, dst: PhysicalResource, bytes: u64);

    /// Record a memory/execution barrier.
    fn insert_barrier(&mut self, barrier: &Barrier);

    /// Downcast support for backend-specific inspection.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// A GPU backend: encoder factory plus queue submission.
///
/// Implementations must be callable from multiple recording threads at
/// once; the executor records per-queue streams concurrently.
pub trait GpuBackend: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Queue families the hardware exposes.
    fn supported_queues(&self) -> QueueSet;

    /// Create an encoder targeting the given queue index.
    fn create_encoder(&self, queue: usize) -> Box<dyn CommandEncoder>;

    /// Submit a recorded batch.
    ///
    /// The batch waits on `waits` before executing, signals `signals` when
    /// done, and signals `fence` once the whole batch has retired. On error
    /// the batch is dropped; the caller treats the frame as lost.
    fn submit(
        &self,
        queue: usize,
        encoder: Box<dyn CommandEncoder>,
        waits: &[Semaphore],
        signals: &[Semaphore],
        fence: Option<&Fence>,
    ) -> Result<(), GraphicsError>;
}
