//! GPU render-graph scheduling.
//!
//! Applications describe a frame as a graph of passes with declared
//! resource accesses. The library derives execution dependencies, allocates
//! and aliases transient memory from a pool, assigns passes to hardware
//! queues, plans semaphores and barriers, and submits the frame through a
//! pluggable backend.
//!
//! ```
//! use std::sync::Arc;
//! use marigold_graphics::{
//!     DeviceDescriptor, DummyBackend, GraphicsInstance, GraphicsPass, PipelineStages,
//!     QueueSet, RenderGraph, TextureDescriptor, TextureFormat,
//! };
//!
//! let instance = GraphicsInstance::new(Arc::new(DummyBackend::new()));
//! let device = instance
//!     .create_device(DeviceDescriptor {
//!         queues: QueueSet::full(),
//!         ..DeviceDescriptor::default()
//!     })
//!     .unwrap();
//!
//! let mut graph = RenderGraph::new();
//! let target = graph.create_texture(TextureDescriptor::new_2d(
//!     1920,
//!     1080,
//!     TextureFormat::Rgba8Unorm,
//! ));
//! graph.add_graphics_pass(
//!     GraphicsPass::new("forward")
//!         .write_texture(target, PipelineStages::COLOR_ATTACHMENT)
//!         .with_callback(|ctx| {
//!             ctx.bind_pipeline("opaque");
//!             ctx.draw(3, 1);
//!         }),
//! );
//! let fence = device.execute_graph(&mut graph).unwrap();
//! fence.wait();
//! ```

pub mod backend;
pub mod compiler;
pub mod device;
pub mod error;
pub mod executor;
pub mod graph;
pub mod instance;
pub mod pipeline;
pub mod resources;
pub mod scheduler;
pub mod types;

pub use backend::{DummyBackend, GpuBackend, PhysicalResource};
pub use compiler::{CompileError, CompiledGraph, DependencyEdge, EdgeCause, HazardKind};
pub use device::{DeviceDescriptor, GraphicsDevice, DEFAULT_TRANSIENT_POOL_SIZE};
pub use error::{FrameError, GraphicsError};
pub use executor::RecordContext;
pub use graph::registry::{ResourceRegistry, TransientMemoryPool};
pub use graph::{
    AccessKind, ComputePass, FrameState, GraphicsPass, Pass, PassKind, PipelineStages,
    RenderGraph, ResourceAccess, ResourceHandle, TransferPass,
};
pub use instance::GraphicsInstance;
pub use pipeline::FramePipeline;
pub use resources::{Buffer, Texture};
pub use scheduler::{
    Barrier, Fence, FenceStatus, QueueKind, QueueSet, Schedule, ScheduleEntry, Semaphore,
};
pub use types::{
    BufferDescriptor, BufferUsage, Extent3d, TextureDescriptor, TextureFormat, TextureUsage,
};
