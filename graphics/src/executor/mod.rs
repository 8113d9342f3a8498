//! Frame execution.
//!
//! Turns a [`Schedule`] into backend submissions. Each queue's entries are
//! grouped into batches: a batch ends after an entry that signals semaphores
//! and a new one starts before an entry that waits, so semaphore operations
//! sit exactly at submission boundaries. Queues record concurrently, one
//! thread per queue with work.

use crate::backend::{CommandEncoder, GpuBackend, PhysicalResource};
use crate::error::GraphicsError;
use crate::graph::registry::ResourceRegistry;
use crate::graph::{Pass, PassCallback, ResourceHandle};
use crate::scheduler::{Fence, Schedule, Semaphore};

/// Command-recording context handed to pass callbacks.
///
/// Exposes the encoder plus resolution of graph handles to physical
/// resources. Deliberately has no resource-creation surface: by the time a
/// callback runs, the frame's memory plan is fixed.
pub struct RecordContext<'a> {
    encoder: &'a mut dyn CommandEncoder,
    registry: &'a ResourceRegistry,
}

impl<'a> RecordContext<'a> {
    /// Bind a pipeline by name.
    pub fn bind_pipeline(&mut self, pipeline: &str) {
        self.encoder.bind_pipeline(pipeline);
    }

    /// Bind a graph resource to a shader slot.
    ///
    /// # Panics
    ///
    /// Panics if the handle does not resolve; a callback touching a
    /// resource its pass never declared is a programmer error.
    pub fn bind_resource(&mut self, slot: u32, resource: ResourceHandle) {
        let physical = self
            .resolve(resource)
            .expect("resource not resolved for this frame");
        self.encoder.bind_resource(slot, physical);
    }

    /// Record a draw.
    pub fn draw(&mut self, vertex_count: u32, instance_count: u32) {
        self.encoder.draw(vertex_count, instance_count);
    }

    /// Record a compute dispatch.
    pub fn dispatch(&mut self, groups_x: u32, groups_y: u32, groups_z: u32) {
        self.encoder.dispatch(groups_x, groups_y, groups_z);
    }

    /// Record a copy between two graph resources.
    pub fn copy(&mut self, src: ResourceHandle, dst: ResourceHandle, bytes: u64) {
        let src = self.resolve(src).expect("copy source not resolved");
        let dst = self.resolve(dst).expect("copy destination not resolved");
        self.encoder.copy(src, dst, bytes);
    }

    /// Resolve a graph handle to its physical backing.
    pub fn resolve(&self, resource: ResourceHandle) -> Option<PhysicalResource> {
        if let Some(range) = self.registry.physical_range(resource) {
            return Some(PhysicalResource::Transient(range));
        }
        if let Some(texture) = self.registry.imported_texture(resource) {
            return Some(PhysicalResource::ImportedTexture(texture.clone()));
        }
        if let Some(buffer) = self.registry.imported_buffer(resource) {
            return Some(PhysicalResource::ImportedBuffer(buffer.clone()));
        }
        None
    }
}

// Pass itself is not Sync (its callback is Send only), so worker threads
// get just the name and the already-extracted callback.
struct QueueWork<'p> {
    queue: usize,
    /// (schedule entry position, pass name, callback) in submission order.
    items: Vec<(usize, &'p str, Option<PassCallback>)>,
}

/// Record and submit one frame.
///
/// Returns the frame fence, signaled once all of the frame's GPU work has
/// retired. Callbacks are consumed; executing the same graph again requires
/// rebuilding it. On a submission error the frame is lost: batches already
/// handed to the backend are not rolled back.
pub fn execute(
    passes: &mut [Pass],
    schedule: &Schedule,
    registry: &ResourceRegistry,
    backend: &dyn GpuBackend,
) -> Result<Fence, GraphicsError> {
    let mut callbacks: Vec<Option<PassCallback>> =
        passes.iter_mut().map(Pass::take_callback).collect();

    // Split the schedule into per-queue work lists.
    let mut work: Vec<QueueWork<'_>> = Vec::new();
    let passes = &*passes;
    for queue in 0..schedule.queue_set().len() {
        let items: Vec<_> = schedule
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.queue == queue)
            .map(|(pos, e)| {
                let pass = e.pass as usize;
                (pos, passes[pass].name(), callbacks[pass].take())
            })
            .collect();
        if !items.is_empty() {
            work.push(QueueWork { queue, items });
        }
    }

    let frame_fence = Fence::new_unsignaled();
    // Extra semaphores so the frame-end submission can wait for every queue
    // that did work; IDs continue past the schedule's own.
    let mut frame_end_semaphores: Vec<Semaphore> = Vec::new();
    let mut next_semaphore = schedule.semaphore_count();
    for _ in &work {
        frame_end_semaphores.push(Semaphore::new(next_semaphore));
        next_semaphore += 1;
    }

    std::thread::scope(|scope| {
        let handles: Vec<_> = work
            .into_iter()
            .zip(frame_end_semaphores.iter())
            .map(|(work, frame_end)| {
                scope.spawn(move || record_queue(work, schedule, registry, backend, frame_end))
            })
            .collect();
        for handle in handles {
            handle.join().expect("recording thread panicked")?;
        }
        Ok::<(), GraphicsError>(())
    })?;

    // Frame-end submission: empty batch on the graphics queue waiting on
    // every queue's last batch and carrying the frame fence.
    let graphics = schedule.queue_set().graphics_index();
    let encoder = backend.create_encoder(graphics);
    backend.submit(
        graphics,
        encoder,
        &frame_end_semaphores,
        &[],
        Some(&frame_fence),
    )?;

    log::trace!("executor: frame submitted");
    Ok(frame_fence)
}

fn record_queue(
    work: QueueWork<'_>,
    schedule: &Schedule,
    registry: &ResourceRegistry,
    backend: &dyn GpuBackend,
    frame_end: &Semaphore,
) -> Result<(), GraphicsError> {
    let mut encoder: Option<Box<dyn CommandEncoder>> = None;
    let mut batch_waits: Vec<Semaphore> = Vec::new();

    let last = work.items.len() - 1;
    for (index, (pos, name, callback)) in work.items.into_iter().enumerate() {
        let entry = &schedule.entries[pos];

        // A wait can only take effect at a submission boundary.
        if !entry.waits.is_empty() {
            if let Some(encoder) = encoder.take() {
                backend.submit(work.queue, encoder, &batch_waits, &[], None)?;
                batch_waits.clear();
            }
            batch_waits.extend(entry.waits.iter().cloned());
        }

        let enc = encoder.get_or_insert_with(|| backend.create_encoder(work.queue));
        enc.begin_pass(name);
        for barrier in &entry.barriers {
            enc.insert_barrier(barrier);
        }
        if let Some(mut callback) = callback {
            let mut ctx = RecordContext {
                encoder: enc.as_mut(),
                registry,
            };
            callback(&mut ctx);
        }

        // Signals end the batch; the queue's last batch also signals
        // frame-end so the fence submission can wait for it.
        let is_last = index == last;
        if !entry.signals.is_empty() || is_last {
            let mut signals: Vec<Semaphore> = entry.signals.clone();
            if is_last {
                signals.push(frame_end.clone());
            }
            let encoder = encoder.take().expect("batch has an open encoder");
            backend.submit(work.queue, encoder, &batch_waits, &signals, None)?;
            batch_waits.clear();
        }
    }
    Ok(())
}
