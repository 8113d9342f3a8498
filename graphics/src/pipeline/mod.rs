//! Frames-in-flight management.
//!
//! [`FramePipeline`] rotates a fixed set of render graphs so the CPU can
//! build frame N+1 while the GPU consumes frame N. Each slot keeps the
//! fence of its last submission; reusing the slot waits on that fence
//! first, which also bounds how far the CPU can run ahead.

use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::error::FrameError;
use crate::graph::RenderGraph;
use crate::scheduler::Fence;

struct FrameSlot {
    graph: RenderGraph,
    fence: Option<Fence>,
}

/// Rotating per-frame graphs over one device.
pub struct FramePipeline {
    device: Arc<GraphicsDevice>,
    slots: Vec<FrameSlot>,
    current: usize,
    frame_index: u64,
}

impl FramePipeline {
    /// Create a pipeline with the given number of frames in flight.
    ///
    /// # Panics
    ///
    /// Panics when `frames_in_flight` is zero.
    pub fn new(device: Arc<GraphicsDevice>, frames_in_flight: usize) -> Self {
        assert!(frames_in_flight > 0, "need at least one frame in flight");
        let slots = (0..frames_in_flight)
            .map(|_| FrameSlot {
                graph: RenderGraph::new(),
                fence: None,
            })
            .collect();
        Self {
            device,
            slots,
            current: 0,
            frame_index: 0,
        }
    }

    /// Number of frames that can be in flight at once.
    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }

    /// Frames submitted so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// The device frames are submitted to.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Start building the next frame.
    ///
    /// Blocks until the slot's previous submission has retired, then hands
    /// out a cleared graph.
    pub fn begin_frame(&mut self) -> &mut RenderGraph {
        let slot = &mut self.slots[self.current];
        if let Some(fence) = slot.fence.take() {
            log::trace!("pipeline: waiting on frame slot {}", self.current);
            fence.wait();
        }
        slot.graph.clear(self.device.transient_pool());
        &mut slot.graph
    }

    /// Like [`begin_frame`](Self::begin_frame), but gives up after `timeout`.
    ///
    /// Returns `None` when the slot's previous submission is still pending,
    /// leaving the slot untouched so a later call can try again. Useful when
    /// frame building shares a thread with other work.
    pub fn begin_frame_timeout(
        &mut self,
        timeout: std::time::Duration,
    ) -> Option<&mut RenderGraph> {
        let slot = &mut self.slots[self.current];
        if let Some(fence) = &slot.fence {
            if !fence.wait_timeout(timeout) {
                log::trace!("pipeline: frame slot {} still in flight", self.current);
                return None;
            }
            slot.fence = None;
        }
        slot.graph.clear(self.device.transient_pool());
        Some(&mut slot.graph)
    }

    /// Block until every in-flight frame has retired.
    pub fn wait_idle(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(fence) = slot.fence.take() {
                log::trace!("pipeline: draining frame slot {}", index);
                fence.wait();
            }
        }
    }

    /// Compile, submit and retire the current frame, then advance.
    ///
    /// On a compile error the slot stays current so the application can fix
    /// the graph and try again. A submission error also keeps the slot
    /// current; that frame is lost but its slot is immediately reusable.
    pub fn end_frame(&mut self) -> Result<Fence, FrameError> {
        let slot = &mut self.slots[self.current];
        let fence = self.device.execute_graph(&mut slot.graph)?;
        slot.fence = Some(fence.clone());

        self.current = (self.current + 1) % self.slots.len();
        self.frame_index += 1;
        Ok(fence)
    }
}
