//! Recording backend for tests and headless runs.

use std::any::Any;

use parking_lot::Mutex;
use static_assertions::assert_impl_all;

use crate::error::GraphicsError;
use crate::scheduler::{Barrier, Fence, QueueSet, Semaphore};

use super::{CommandEncoder, GpuBackend, PhysicalResource};

/// One recorded command.
#[derive(Debug, Clone, PartialEq)]
pub enum DummyCommand {
    BeginPass(String),
    BindPipeline(String),
    BindResource {
        slot: u32,
        resource: PhysicalResource,
    },
    Draw {
        vertex_count: u32,
        instance_count: u32,
    },
    Dispatch {
        groups: (u32, u32, u32),
    },
    Copy {
        src: PhysicalResource,
        dst: PhysicalResource,
        bytes: u64,
    },
    Barrier(Barrier),
}

/// One submitted batch, as seen by the dummy backend.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Queue index the batch was submitted to.
    pub queue: usize,
    pub commands: Vec<DummyCommand>,
    /// Semaphore IDs waited on.
    pub waits: Vec<u64>,
    /// Semaphore IDs signaled.
    pub signals: Vec<u64>,
    /// Whether the submission carried a fence.
    pub fenced: bool,
}

struct DummyEncoder {
    commands: Vec<DummyCommand>,
}

impl CommandEncoder for DummyEncoder {
    fn begin_pass(&mut self, name: &str) {
        self.commands.push(DummyCommand::BeginPass(name.to_string()));
    }

    fn bind_pipeline(&mut self, pipeline: &str) {
        self.commands
            .push(DummyCommand::BindPipeline(pipeline.to_string()));
    }

    fn bind_resource(&mut self, slot: u32, resource: PhysicalResource) {
        self.commands
            .push(DummyCommand::BindResource { slot, resource });
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32) {
        self.commands.push(DummyCommand::Draw {
            vertex_count,
            instance_count,
        });
    }

    fn dispatch(&mut self, groups_x: u32, groups_y: u32, groups_z: u32) {
        self.commands.push(DummyCommand::Dispatch {
            groups: (groups_x, groups_y, groups_z),
        });
    }

    fn copy(&mut self, src: PhysicalResource, dst: PhysicalResource, bytes: u64) {
        self.commands.push(DummyCommand::Copy { src, dst, bytes });
    }

    fn insert_barrier(&mut self, barrier: &Barrier) {
        self.commands.push(DummyCommand::Barrier(*barrier));
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Backend that executes nothing and remembers everything.
///
/// Submissions signal their semaphores and fences immediately, so frames
/// "complete" as soon as they are submitted. Tests inspect the recorded
/// [`Submission`] log to check ordering, barriers and semaphore pairing.
pub struct DummyBackend {
    queues: QueueSet,
    submissions: Mutex<Vec<Submission>>,
}

assert_impl_all!(DummyBackend: Send, Sync);

impl DummyBackend {
    /// Dummy backend exposing the full queue set.
    pub fn new() -> Self {
        Self::with_queues(QueueSet::full())
    }

    /// Dummy backend exposing only the given queues.
    pub fn with_queues(queues: QueueSet) -> Self {
        Self {
            queues,
            submissions: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of every submission so far, in submission order.
    ///
    /// Order across queues depends on recording-thread interleaving; only
    /// per-queue order is meaningful.
    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().clone()
    }

    /// Submissions to one queue, in order.
    pub fn submissions_for_queue(&self, queue: usize) -> Vec<Submission> {
        self.submissions
            .lock()
            .iter()
            .filter(|s| s.queue == queue)
            .cloned()
            .collect()
    }

    /// Drop the recorded log.
    pub fn clear(&self) {
        self.submissions.lock().clear();
    }
}

impl Default for DummyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &str {
        "dummy"
    }

    fn supported_queues(&self) -> QueueSet {
        self.queues.clone()
    }

    fn create_encoder(&self, _queue: usize) -> Box<dyn CommandEncoder> {
        Box::new(DummyEncoder {
            commands: Vec::new(),
        })
    }

    fn submit(
        &self,
        queue: usize,
        encoder: Box<dyn CommandEncoder>,
        waits: &[Semaphore],
        signals: &[Semaphore],
        fence: Option<&Fence>,
    ) -> Result<(), GraphicsError> {
        let encoder = encoder
            .into_any()
            .downcast::<DummyEncoder>()
            .expect("dummy backend got a foreign encoder");

        log::trace!(
            "dummy: submit queue={} commands={} waits={} signals={}",
            queue,
            encoder.commands.len(),
            waits.len(),
            signals.len()
        );
        self.submissions.lock().push(Submission {
            queue,
            commands: encoder.commands,
            waits: waits.iter().map(Semaphore::id).collect(),
            signals: signals.iter().map(Semaphore::id).collect(),
            fenced: fence.is_some(),
        });

        // No GPU: work retires the moment it is submitted.
        if let Some(fence) = fence {
            fence.signal();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_commands_in_order() {
        let backend = DummyBackend::new();
        let mut encoder = backend.create_encoder(0);
        encoder.begin_pass("main");
        encoder.bind_pipeline("opaque");
        encoder.draw(3, 1);
        backend.submit(0, encoder, &[], &[], None).unwrap();

        let submissions = backend.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(
            submissions[0].commands,
            vec![
                DummyCommand::BeginPass("main".into()),
                DummyCommand::BindPipeline("opaque".into()),
                DummyCommand::Draw {
                    vertex_count: 3,
                    instance_count: 1
                },
            ]
        );
    }

    #[test]
    fn test_fence_signaled_at_submit() {
        let backend = DummyBackend::new();
        let fence = Fence::new_unsignaled();
        let encoder = backend.create_encoder(0);
        backend.submit(0, encoder, &[], &[], Some(&fence)).unwrap();
        assert!(fence.is_signaled());
    }

    #[test]
    fn test_semaphore_ids_recorded() {
        let backend = DummyBackend::new();
        let sem = Semaphore::new(7);
        let encoder = backend.create_encoder(1);
        backend
            .submit(1, encoder, &[sem.clone()], &[sem], None)
            .unwrap();

        let submissions = backend.submissions_for_queue(1);
        assert_eq!(submissions[0].waits, vec![7]);
        assert_eq!(submissions[0].signals, vec![7]);
    }
}
