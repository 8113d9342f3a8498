//! Queue assignment and synchronization planning.
//!
//! The scheduler maps a compiled graph onto the hardware queues a device
//! exposes. Assignment is greedy list scheduling over the topological order:
//! each pass goes to the eligible queue that can start it earliest, with
//! ties broken toward specialized queues so async compute and transfer
//! actually offload work. Every cross-queue edge gets its own semaphore;
//! same-queue edges become pipeline barriers.

mod sync;

pub use sync::{Fence, FenceStatus, Semaphore};

use crate::compiler::{CompiledGraph, EdgeCause, HazardKind};
use crate::graph::registry::ResourceRegistry;
use crate::graph::{Pass, PassKind, PipelineStages, ResourceHandle};

/// A hardware queue family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    /// Accepts graphics, compute and transfer work.
    Graphics,
    /// Accepts compute and transfer work, runs concurrently with graphics.
    AsyncCompute,
    /// Accepts transfer work only.
    Transfer,
}

impl QueueKind {
    /// Check whether this queue can run a pass of the given kind.
    pub fn accepts(&self, kind: PassKind) -> bool {
        match self {
            Self::Graphics => true,
            Self::AsyncCompute => matches!(kind, PassKind::Compute | PassKind::Transfer),
            Self::Transfer => matches!(kind, PassKind::Transfer),
        }
    }

    /// Check whether this queue is the dedicated home for a pass kind.
    fn specialized_for(&self, kind: PassKind) -> bool {
        matches!(
            (self, kind),
            (Self::Graphics, PassKind::Graphics)
                | (Self::AsyncCompute, PassKind::Compute)
                | (Self::Transfer, PassKind::Transfer)
        )
    }
}

/// The set of queues available for scheduling.
///
/// Queue indices in a [`Schedule`] refer to positions in this set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSet {
    queues: Vec<QueueKind>,
}

impl QueueSet {
    /// Build a queue set from explicit queue kinds.
    ///
    /// # Panics
    ///
    /// Panics if no graphics queue is present; every device has one and the
    /// fallback path relies on it.
    pub fn new(queues: Vec<QueueKind>) -> Self {
        assert!(
            queues.contains(&QueueKind::Graphics),
            "queue set must contain a graphics queue"
        );
        Self { queues }
    }

    /// A single graphics queue. All work serializes onto it.
    pub fn single() -> Self {
        Self::new(vec![QueueKind::Graphics])
    }

    /// Graphics + async compute + dedicated transfer.
    pub fn full() -> Self {
        Self::new(vec![
            QueueKind::Graphics,
            QueueKind::AsyncCompute,
            QueueKind::Transfer,
        ])
    }

    /// Queue kinds in index order.
    pub fn queues(&self) -> &[QueueKind] {
        &self.queues
    }

    /// Number of queues.
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    /// False; a queue set always holds at least the graphics queue.
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Kind of the queue at `index`.
    pub fn kind(&self, index: usize) -> QueueKind {
        self.queues[index]
    }

    /// Index of the graphics queue.
    ///
    /// The constructor guarantees one exists; it is not necessarily at
    /// index 0.
    pub fn graphics_index(&self) -> usize {
        self.queues
            .iter()
            .position(|k| *k == QueueKind::Graphics)
            .expect("queue set always holds a graphics queue")
    }
}

impl Default for QueueSet {
    fn default() -> Self {
        Self::single()
    }
}

/// A memory/execution barrier recorded before a pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Barrier {
    /// Resource the barrier covers; `None` for a pure execution barrier.
    pub resource: Option<ResourceHandle>,
    /// Stages that must drain before the barrier.
    pub src_stages: PipelineStages,
    /// Stages blocked until the barrier completes.
    pub dst_stages: PipelineStages,
    /// The hazard being fenced, when known.
    pub hazard: Option<HazardKind>,
    /// Whether the barrier performs an image layout transition.
    pub layout_transition: bool,
}

/// One pass placed on a queue, with its synchronization.
#[derive(Debug)]
pub struct ScheduleEntry {
    /// Pass declaration index.
    pub pass: u32,
    /// Index into the [`QueueSet`].
    pub queue: usize,
    /// Semaphores this entry waits on before starting.
    pub waits: Vec<Semaphore>,
    /// Semaphores this entry signals on completion.
    pub signals: Vec<Semaphore>,
    /// Barriers recorded immediately before the pass's commands.
    pub barriers: Vec<Barrier>,
}

/// A complete execution plan: entries in submission order plus the queue
/// assignment they follow.
#[derive(Debug)]
pub struct Schedule {
    /// Entries ordered by the deterministic topological order. Per-queue
    /// submission order is this order filtered to one queue.
    pub entries: Vec<ScheduleEntry>,
    queue_set: QueueSet,
    semaphore_count: u64,
}

impl Schedule {
    /// The queue set this schedule targets.
    pub fn queue_set(&self) -> &QueueSet {
        &self.queue_set
    }

    /// Number of semaphores the schedule uses.
    pub fn semaphore_count(&self) -> u64 {
        self.semaphore_count
    }

    /// Queue index assigned to a pass.
    pub fn queue_of(&self, pass: u32) -> Option<usize> {
        self.entries.iter().find(|e| e.pass == pass).map(|e| e.queue)
    }

    /// Entries assigned to one queue, in submission order.
    pub fn entries_for_queue(&self, queue: usize) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries.iter().filter(move |e| e.queue == queue)
    }

    /// Human-readable per-queue pass listing, for trace logging.
    pub fn queue_layout(&self, passes: &[Pass]) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        for (queue, kind) in self.queue_set.queues().iter().enumerate() {
            if queue > 0 {
                out.push_str(" | ");
            }
            let _ = write!(out, "{:?}:", kind);
            for entry in self.entries_for_queue(queue) {
                let _ = write!(out, " {}", passes[entry.pass as usize].name());
            }
        }
        out
    }
}

/// Assign passes to queues and plan semaphores and barriers.
///
/// With a single-queue set every cross-queue mechanism degenerates away and
/// the schedule is the topological order with barriers only, which is
/// correct if slower.
pub fn schedule(
    compiled: &CompiledGraph,
    passes: &[Pass],
    queues: &QueueSet,
    registry: &ResourceRegistry,
) -> Schedule {
    let mut queue_free = vec![0u64; queues.len()];
    let mut finish_time = vec![0u64; passes.len()];
    let mut queue_of = vec![usize::MAX; passes.len()];

    // Queue assignment, greedy over the topological order. Unit cost per
    // pass; good enough to spread independent work without pass timing data.
    for &pass_index in &compiled.order {
        let kind = passes[pass_index as usize].kind();
        let ready = compiled
            .edges_into(pass_index)
            .map(|e| finish_time[e.from as usize])
            .max()
            .unwrap_or(0);

        let mut best: Option<usize> = None;
        let mut best_start = u64::MAX;
        for (q, queue_kind) in queues.queues().iter().enumerate() {
            if !queue_kind.accepts(kind) {
                continue;
            }
            let start = queue_free[q].max(ready);
            let better = match best {
                None => true,
                Some(b) => {
                    start < best_start
                        || (start == best_start
                            && queue_kind.specialized_for(kind)
                            && !queues.kind(b).specialized_for(kind))
                }
            };
            if better {
                best = Some(q);
                best_start = start;
            }
        }
        let q = best.expect("graphics queue accepts every pass kind");
        queue_of[pass_index as usize] = q;
        finish_time[pass_index as usize] = best_start + 1;
        queue_free[q] = best_start + 1;
    }

    // Synchronization: a dedicated semaphore per cross-queue edge, barriers
    // for same-queue resource edges and for layout transitions.
    let mut entries: Vec<ScheduleEntry> = compiled
        .order
        .iter()
        .map(|&pass| ScheduleEntry {
            pass,
            queue: queue_of[pass as usize],
            waits: Vec::new(),
            signals: Vec::new(),
            barriers: Vec::new(),
        })
        .collect();
    let position: Vec<usize> = {
        let mut pos = vec![0usize; passes.len()];
        for (i, entry) in entries.iter().enumerate() {
            pos[entry.pass as usize] = i;
        }
        pos
    };

    let mut next_semaphore = 0u64;
    for edge in &compiled.edges {
        let from_queue = queue_of[edge.from as usize];
        let to_queue = queue_of[edge.to as usize];
        let cross_queue = from_queue != to_queue;

        if cross_queue {
            let semaphore = Semaphore::new(next_semaphore);
            next_semaphore += 1;
            entries[position[edge.from as usize]]
                .signals
                .push(semaphore.clone());
            entries[position[edge.to as usize]].waits.push(semaphore);
        }

        // A semaphore orders execution but does not transition image
        // layouts, so texture edges keep a barrier either way. Pure
        // execution edges (explicit deps) need nothing on one queue.
        let needs_barrier = match edge.cause {
            EdgeCause::Hazard(_) | EdgeCause::Alias => {
                !cross_queue || edge.resource.map_or(false, |r| registry.is_texture(r))
            }
            EdgeCause::Explicit => false,
        };
        if needs_barrier {
            let layout_transition = edge.resource.map_or(false, |r| registry.is_texture(r));
            let hazard = match edge.cause {
                EdgeCause::Hazard(h) => Some(h),
                _ => None,
            };
            entries[position[edge.to as usize]].barriers.push(Barrier {
                resource: edge.resource,
                src_stages: edge.src_stages,
                dst_stages: edge.dst_stages,
                hazard,
                layout_transition,
            });
        }
    }

    log::trace!(
        "scheduler: {} passes over {} queues, {} semaphores",
        passes.len(),
        queues.len(),
        next_semaphore
    );

    Schedule {
        entries,
        queue_set: queues.clone(),
        semaphore_count: next_semaphore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::resolve;
    use crate::graph::{ComputePass, GraphicsPass, ResourceHandle, TransferPass};

    fn handle(index: u32) -> ResourceHandle {
        ResourceHandle::new(index)
    }

    fn plan(passes: &[Pass], queues: &QueueSet) -> Schedule {
        let registry = ResourceRegistry::new();
        let compiled = resolve(passes, &[], &[], &registry).unwrap();
        schedule(&compiled, passes, queues, &registry)
    }

    #[test]
    fn test_graphics_pass_requires_graphics_queue() {
        assert!(QueueKind::Graphics.accepts(PassKind::Graphics));
        assert!(!QueueKind::AsyncCompute.accepts(PassKind::Graphics));
        assert!(!QueueKind::Transfer.accepts(PassKind::Graphics));

        assert!(QueueKind::AsyncCompute.accepts(PassKind::Compute));
        assert!(QueueKind::Transfer.accepts(PassKind::Transfer));
        assert!(!QueueKind::Transfer.accepts(PassKind::Compute));
    }

    #[test]
    fn test_independent_compute_offloads_to_async_queue() {
        let passes = vec![
            Pass::Graphics(GraphicsPass::new("scene")),
            Pass::Compute(ComputePass::new("particles")),
        ];

        let schedule = plan(&passes, &QueueSet::full());
        let graphics_queue = schedule.queue_of(0).unwrap();
        let compute_queue = schedule.queue_of(1).unwrap();
        assert_eq!(schedule.queue_set().kind(graphics_queue), QueueKind::Graphics);
        assert_eq!(
            schedule.queue_set().kind(compute_queue),
            QueueKind::AsyncCompute
        );
    }

    #[test]
    fn test_transfer_prefers_dedicated_queue() {
        let passes = vec![
            Pass::Graphics(GraphicsPass::new("scene")),
            Pass::Transfer(TransferPass::new("upload")),
        ];

        let schedule = plan(&passes, &QueueSet::full());
        let q = schedule.queue_of(1).unwrap();
        assert_eq!(schedule.queue_set().kind(q), QueueKind::Transfer);
    }

    #[test]
    fn test_cross_queue_edge_gets_semaphore_pair() {
        let data = handle(0);
        let passes = vec![
            Pass::Compute(
                ComputePass::new("simulate").write_buffer(data, PipelineStages::COMPUTE_SHADER),
            ),
            Pass::Graphics(
                GraphicsPass::new("draw").read_buffer(data, PipelineStages::VERTEX_INPUT),
            ),
        ];

        let schedule = plan(&passes, &QueueSet::full());
        assert_ne!(schedule.queue_of(0), schedule.queue_of(1));
        assert_eq!(schedule.semaphore_count(), 1);

        let producer = schedule.entries.iter().find(|e| e.pass == 0).unwrap();
        let consumer = schedule.entries.iter().find(|e| e.pass == 1).unwrap();
        assert_eq!(producer.signals.len(), 1);
        assert_eq!(consumer.waits.len(), 1);
        assert_eq!(producer.signals[0], consumer.waits[0]);
    }

    #[test]
    fn test_same_queue_edge_becomes_barrier() {
        let target = handle(0);
        let passes = vec![
            Pass::Graphics(
                GraphicsPass::new("gbuffer")
                    .write_texture(target, PipelineStages::COLOR_ATTACHMENT),
            ),
            Pass::Graphics(
                GraphicsPass::new("lighting")
                    .read_texture(target, PipelineStages::FRAGMENT_SHADER),
            ),
        ];

        let schedule = plan(&passes, &QueueSet::full());
        assert_eq!(schedule.queue_of(0), schedule.queue_of(1));
        assert_eq!(schedule.semaphore_count(), 0);

        let consumer = schedule.entries.iter().find(|e| e.pass == 1).unwrap();
        assert!(consumer.waits.is_empty());
        assert_eq!(consumer.barriers.len(), 1);
        assert_eq!(consumer.barriers[0].hazard, Some(HazardKind::ReadAfterWrite));
        assert_eq!(
            consumer.barriers[0].src_stages,
            PipelineStages::COLOR_ATTACHMENT
        );
        assert_eq!(
            consumer.barriers[0].dst_stages,
            PipelineStages::FRAGMENT_SHADER
        );
    }

    #[test]
    fn test_cross_queue_texture_edge_keeps_layout_barrier() {
        let tex = handle(0);
        let passes = vec![
            Pass::Compute(
                ComputePass::new("generate").write_texture(tex, PipelineStages::COMPUTE_SHADER),
            ),
            Pass::Graphics(
                GraphicsPass::new("composite").read_texture(tex, PipelineStages::FRAGMENT_SHADER),
            ),
        ];

        let mut registry = ResourceRegistry::new();
        let real = registry.create_texture(
            crate::types::TextureDescriptor::new_2d(4, 4, crate::types::TextureFormat::Rgba8Unorm),
        );
        assert_eq!(real, tex);

        let compiled = resolve(&passes, &[], &[], &registry).unwrap();

        let schedule = schedule(&compiled, &passes, &QueueSet::full(), &registry);
        assert_ne!(schedule.queue_of(0), schedule.queue_of(1));

        let consumer = schedule.entries.iter().find(|e| e.pass == 1).unwrap();
        assert_eq!(consumer.waits.len(), 1);
        assert_eq!(consumer.barriers.len(), 1);
        assert!(consumer.barriers[0].layout_transition);
    }

    #[test]
    fn test_single_queue_collapse() {
        let data = handle(0);
        let passes = vec![
            Pass::Compute(
                ComputePass::new("simulate").write_buffer(data, PipelineStages::COMPUTE_SHADER),
            ),
            Pass::Graphics(
                GraphicsPass::new("draw").read_buffer(data, PipelineStages::VERTEX_INPUT),
            ),
            Pass::Transfer(TransferPass::new("readback").read_buffer(data, PipelineStages::TRANSFER)),
        ];

        let schedule = plan(&passes, &QueueSet::single());
        assert!(schedule.entries.iter().all(|e| e.queue == 0));
        assert_eq!(schedule.semaphore_count(), 0);
        assert!(schedule.entries.iter().all(|e| e.waits.is_empty()));
    }

    #[test]
    fn test_schedule_preserves_topological_order_per_queue() {
        let a = handle(0);
        let passes = vec![
            Pass::Graphics(GraphicsPass::new("p0").write_texture(a, PipelineStages::COLOR_ATTACHMENT)),
            Pass::Graphics(GraphicsPass::new("p1").read_write_texture(a, PipelineStages::COLOR_ATTACHMENT)),
            Pass::Graphics(GraphicsPass::new("p2").read_texture(a, PipelineStages::FRAGMENT_SHADER)),
        ];

        let schedule = plan(&passes, &QueueSet::full());
        let order: Vec<u32> = schedule.entries_for_queue(0).map(|e| e.pass).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_queue_layout_lists_passes_per_queue() {
        let passes = vec![
            Pass::Graphics(GraphicsPass::new("shadow")),
            Pass::Graphics(GraphicsPass::new("lighting")),
        ];
        let schedule = plan(&passes, &QueueSet::single());

        let layout = schedule.queue_layout(&passes);
        assert!(layout.starts_with("Graphics:"));
        assert!(layout.contains("shadow"));
        assert!(layout.contains("lighting"));
    }

    #[test]
    #[should_panic(expected = "graphics queue")]
    fn test_queue_set_requires_graphics() {
        QueueSet::new(vec![QueueKind::AsyncCompute]);
    }

    #[test]
    fn test_graphics_index_finds_non_leading_queue() {
        let queues = QueueSet::new(vec![QueueKind::Transfer, QueueKind::Graphics]);
        assert_eq!(queues.graphics_index(), 1);
        assert_eq!(QueueSet::full().graphics_index(), 0);
    }
}
