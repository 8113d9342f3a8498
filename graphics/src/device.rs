//! Graphics device: resource creation and graph execution.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use static_assertions::assert_impl_all;

use crate::backend::GpuBackend;
use crate::error::{FrameError, GraphicsError};
use crate::graph::registry::TransientMemoryPool;
use crate::graph::RenderGraph;
use crate::instance::GraphicsInstance;
use crate::resources::{Buffer, Texture};
use crate::scheduler::{Fence, QueueSet};
use crate::types::{BufferDescriptor, TextureDescriptor};

/// Default transient pool capacity: 256 MiB.
pub const DEFAULT_TRANSIENT_POOL_SIZE: u64 = 256 << 20;

/// Requested device capabilities.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    /// Queues the device should schedule across.
    pub queues: QueueSet,
    /// Capacity of the transient memory pool in bytes.
    pub transient_pool_size: u64,
}

impl Default for DeviceDescriptor {
    fn default() -> Self {
        Self {
            queues: QueueSet::single(),
            transient_pool_size: DEFAULT_TRANSIENT_POOL_SIZE,
        }
    }
}

/// A logical GPU device.
///
/// Owns the transient pool shared by every frame's graph and hands out
/// long-lived resources.
pub struct GraphicsDevice {
    #[allow(dead_code)]
    instance: Weak<GraphicsInstance>,
    backend: Arc<dyn GpuBackend>,
    queues: QueueSet,
    pool: TransientMemoryPool,
    next_resource_id: AtomicU64,
}

assert_impl_all!(GraphicsDevice: Send, Sync);

impl std::fmt::Debug for GraphicsDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("backend", &self.backend.name())
            .field("queues", &self.queues)
            .field("pool", &self.pool)
            .field("next_resource_id", &self.next_resource_id)
            .finish_non_exhaustive()
    }
}

impl GraphicsDevice {
    pub(crate) fn new(
        instance: Weak<GraphicsInstance>,
        backend: Arc<dyn GpuBackend>,
        desc: DeviceDescriptor,
    ) -> Result<Arc<Self>, GraphicsError> {
        let supported = backend.supported_queues();
        for kind in desc.queues.queues() {
            if !supported.queues().contains(kind) {
                return Err(GraphicsError::InitializationFailed(format!(
                    "backend '{}' has no {:?} queue",
                    backend.name(),
                    kind
                )));
            }
        }
        if desc.transient_pool_size == 0 {
            return Err(GraphicsError::InvalidParameter(
                "transient pool size must be non-zero".to_string(),
            ));
        }

        log::info!(
            "device created: {} queues, {} MiB transient pool",
            desc.queues.len(),
            desc.transient_pool_size >> 20
        );
        Ok(Arc::new(Self {
            instance,
            backend,
            pool: TransientMemoryPool::new(desc.transient_pool_size),
            queues: desc.queues,
            next_resource_id: AtomicU64::new(0),
        }))
    }

    /// Queues this device schedules across.
    pub fn queues(&self) -> &QueueSet {
        &self.queues
    }

    /// The transient pool shared by this device's graphs.
    pub fn transient_pool(&self) -> &TransientMemoryPool {
        &self.pool
    }

    /// The backend this device submits to.
    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }

    /// Create a long-lived texture.
    pub fn create_texture(&self, desc: TextureDescriptor) -> Result<Arc<Texture>, GraphicsError> {
        if !desc.is_valid() {
            return Err(GraphicsError::InvalidParameter(format!(
                "invalid texture descriptor: {:?}",
                desc
            )));
        }
        let id = self.next_resource_id.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(Texture::new(id, desc)))
    }

    /// Create a long-lived buffer.
    pub fn create_buffer(&self, desc: BufferDescriptor) -> Result<Arc<Buffer>, GraphicsError> {
        if !desc.is_valid() {
            return Err(GraphicsError::InvalidParameter(format!(
                "invalid buffer descriptor: {:?}",
                desc
            )));
        }
        let id = self.next_resource_id.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(Buffer::new(id, desc)))
    }

    /// Compile, execute and retire a graph in one call.
    ///
    /// Convenience for applications that do not interleave graph building
    /// with other work; returns the frame fence. A submission failure loses
    /// the frame but still retires it, so transient memory is reclaimed.
    pub fn execute_graph(&self, graph: &mut RenderGraph) -> Result<Fence, FrameError> {
        graph.compile(&self.queues, &self.pool)?;
        match graph.execute(self.backend.as_ref()) {
            Ok(fence) => {
                graph.retire(&self.pool);
                Ok(fence)
            }
            Err(err) => {
                graph.retire(&self.pool);
                Err(err.into())
            }
        }
    }
}
