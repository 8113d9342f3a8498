//! Render graph construction and the frame lifecycle.
//!
//! A [`RenderGraph`] is rebuilt every frame: declare resources, add passes
//! with their accesses, compile against a transient pool and queue set,
//! execute on a backend, retire. The lifecycle only moves forward; misuse
//! (adding a pass after compiling, executing twice) is a programmer error
//! and asserts.

mod pass;
pub mod registry;
mod resource;

pub use pass::{ComputePass, GraphicsPass, Pass, PassCallback, PassKind, TransferPass};
pub use resource::{AccessKind, PipelineStages, ResourceAccess, ResourceHandle};

use std::sync::Arc;

use marigold_core::pool::Pooled;

use crate::backend::GpuBackend;
use crate::compiler::{self, CompileError, CompiledGraph};
use crate::error::GraphicsError;
use crate::executor;
use crate::resources::{Buffer, Texture};
use crate::scheduler::{self, Fence, QueueSet, Schedule};
use crate::types::{BufferDescriptor, TextureDescriptor};

use registry::{ResourceRegistry, TransientMemoryPool};

/// Where a graph is in its per-frame lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Accepting resources, passes and dependencies.
    Building,
    /// Dependencies resolved, memory allocated.
    Resolved,
    /// Passes assigned to queues, synchronization planned.
    Scheduled,
    /// Submitted to the backend.
    Executing,
    /// Frame complete, transient memory queued for reuse.
    Retired,
}

/// A frame's render graph.
#[derive(Default)]
pub struct RenderGraph {
    passes: Vec<Pass>,
    registry: ResourceRegistry,
    explicit_deps: Vec<(u32, u32)>,
    state: FrameState,
    /// Compiled graph; released rather than dropped between frames so its
    /// edge and order buffers are reused.
    compiled: Pooled<CompiledGraph>,
    schedule: Option<Schedule>,
    fence: Option<Fence>,
}

impl Default for FrameState {
    fn default() -> Self {
        Self::Building
    }
}

impl RenderGraph {
    /// Create an empty graph in the [`FrameState::Building`] state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Number of passes added so far.
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// The resource registry for this frame.
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// The resolved dependency graph, available once compiled.
    pub fn compiled(&self) -> Option<&CompiledGraph> {
        self.compiled.get()
    }

    /// The queue schedule, available once compiled.
    pub fn schedule(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }

    fn assert_building(&self) {
        assert_eq!(
            self.state,
            FrameState::Building,
            "graph can only be modified while building"
        );
    }

    /// Declare a transient texture for this frame.
    pub fn create_texture(&mut self, desc: TextureDescriptor) -> ResourceHandle {
        self.assert_building();
        self.registry.create_texture(desc)
    }

    /// Declare a transient buffer for this frame.
    pub fn create_buffer(&mut self, desc: BufferDescriptor) -> ResourceHandle {
        self.assert_building();
        self.registry.create_buffer(desc)
    }

    /// Import an application-owned texture.
    pub fn import_texture(&mut self, texture: Arc<Texture>) -> ResourceHandle {
        self.assert_building();
        self.registry.import_texture(texture)
    }

    /// Import an application-owned buffer.
    pub fn import_buffer(&mut self, buffer: Arc<Buffer>) -> ResourceHandle {
        self.assert_building();
        self.registry.import_buffer(buffer)
    }

    /// Add a graphics pass. Returns the pass index.
    pub fn add_graphics_pass(&mut self, pass: GraphicsPass) -> u32 {
        self.add_pass(Pass::Graphics(pass))
    }

    /// Add a compute pass. Returns the pass index.
    pub fn add_compute_pass(&mut self, pass: ComputePass) -> u32 {
        self.add_pass(Pass::Compute(pass))
    }

    /// Add a transfer pass. Returns the pass index.
    pub fn add_transfer_pass(&mut self, pass: TransferPass) -> u32 {
        self.add_pass(Pass::Transfer(pass))
    }

    fn add_pass(&mut self, pass: Pass) -> u32 {
        self.assert_building();
        let index = self.passes.len() as u32;
        for access in pass.accesses() {
            self.registry
                .record_access(access.resource, index, access.kind, access.stages);
        }
        log::trace!("graph: added pass '{}' at index {}", pass.name(), index);
        self.passes.push(pass);
        index
    }

    /// Add an explicit ordering: `before` completes before `after` starts.
    ///
    /// For orderings the access declarations cannot express, such as timing
    /// requirements on side effects outside graph resources.
    pub fn add_dependency(&mut self, before: u32, after: u32) {
        self.assert_building();
        assert!(
            (before as usize) < self.passes.len() && (after as usize) < self.passes.len(),
            "dependency references an unknown pass"
        );
        assert_ne!(before, after, "pass cannot depend on itself");
        self.explicit_deps.push((before, after));
    }

    /// Compile the graph: allocate transient memory, resolve dependencies,
    /// plan queues and synchronization.
    ///
    /// On error the graph returns to [`FrameState::Building`] with all pool
    /// allocations rolled back, so the application can amend and retry.
    pub fn compile(
        &mut self,
        queues: &QueueSet,
        pool: &TransientMemoryPool,
    ) -> Result<(), CompileError> {
        self.assert_building();

        // Allocation first: aliasing decisions feed ordering edges into the
        // resolver.
        self.registry.finalize(pool)?;

        let compiled = self.compiled.activate();
        if let Err(err) = compiler::resolve_into(
            compiled,
            &self.passes,
            &self.explicit_deps,
            self.registry.alias_dependencies(),
            &self.registry,
        ) {
            self.compiled.release();
            self.registry.rollback(pool);
            return Err(err);
        }
        self.state = FrameState::Resolved;

        let compiled = self.compiled.get().expect("compiled graph is active");
        let schedule = scheduler::schedule(compiled, &self.passes, queues, &self.registry);
        log::trace!("graph: {}", schedule.queue_layout(&self.passes));
        self.schedule = Some(schedule);
        self.state = FrameState::Scheduled;
        Ok(())
    }

    /// Submit the compiled graph to a backend.
    ///
    /// Returns the frame fence. The graph moves to
    /// [`FrameState::Executing`]; call [`RenderGraph::retire`] afterwards to
    /// queue transient memory for reuse.
    ///
    /// On a submission error the frame is lost and already submitted batches
    /// are not rolled back. The graph still moves to
    /// [`FrameState::Executing`] with an already-signaled fence, so retiring
    /// releases the frame's transient memory immediately.
    pub fn execute(&mut self, backend: &dyn GpuBackend) -> Result<Fence, GraphicsError> {
        assert_eq!(
            self.state,
            FrameState::Scheduled,
            "graph must be compiled before executing"
        );
        let schedule = self.schedule.as_ref().expect("scheduled graph");
        match executor::execute(&mut self.passes, schedule, &self.registry, backend) {
            Ok(fence) => {
                self.fence = Some(fence.clone());
                self.state = FrameState::Executing;
                Ok(fence)
            }
            Err(err) => {
                log::error!("graph: frame lost, {}", err);
                self.fence = Some(Fence::new_signaled());
                self.state = FrameState::Executing;
                Err(err)
            }
        }
    }

    /// Retire the frame: release transient memory back to the pool, gated
    /// on the frame fence.
    pub fn retire(&mut self, pool: &TransientMemoryPool) {
        assert_eq!(
            self.state,
            FrameState::Executing,
            "only an executing graph can retire"
        );
        let fence = self.fence.clone().expect("executing graph has a fence");
        self.registry.release(pool, fence);
        self.state = FrameState::Retired;
    }

    /// Reset for the next frame, keeping allocations of the containers.
    ///
    /// Valid from [`FrameState::Building`] (drop a half-built frame) or
    /// [`FrameState::Retired`]; an executing frame must retire first.
    pub fn clear(&mut self, pool: &TransientMemoryPool) {
        match self.state {
            FrameState::Building | FrameState::Retired => {}
            FrameState::Resolved | FrameState::Scheduled => {
                // Compiled but never submitted: hand allocations straight back.
                self.registry.rollback(pool);
            }
            FrameState::Executing => panic!("cannot clear an executing graph"),
        }
        self.passes.clear();
        self.explicit_deps.clear();
        self.registry.reset();
        self.compiled.release();
        self.schedule = None;
        self.fence = None;
        self.state = FrameState::Building;
    }
}
