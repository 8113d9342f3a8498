//! Transient resource registry and physical memory pool.
//!
//! The registry is two-phase: passes declare resources and accesses while the
//! graph is building, and [`ResourceRegistry::finalize`] performs the actual
//! allocation once all passes are known. Full-frame knowledge is what makes
//! aliasing possible: two transient resources whose pass live ranges never
//! overlap can share the same pool range.

use std::sync::Arc;

use marigold_core::pool::ObjectPool;
use parking_lot::Mutex;

use crate::compiler::CompileError;
use crate::resources::{Buffer, Texture};
use crate::scheduler::Fence;
use crate::types::{BufferDescriptor, BufferUsage, TextureDescriptor, TextureUsage};

use super::resource::{
    buffer_usage_for_access, texture_usage_for_access, AccessKind, PipelineStages, ResourceHandle,
};

/// Minimum alignment for transient allocations.
const TRANSIENT_ALIGNMENT: u64 = 256;

/// A byte range inside a [`TransientMemoryPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolRange {
    /// Byte offset of the range.
    pub offset: u64,
    /// Size of the range in bytes.
    pub size: u64,
}

/// Ranges released by one retired frame, reusable once its fence signals.
#[derive(Debug)]
struct PendingFree {
    fence: Fence,
    ranges: Vec<PoolRange>,
}

#[derive(Debug, Default)]
struct PoolInner {
    /// Free ranges sorted by offset, adjacent ranges coalesced.
    free: Vec<PoolRange>,
    /// Per-frame pending frees. Frames retire out of order relative to their
    /// fences, and the arena's free-list recycles a reclaimed frame's slot
    /// for the next retirement.
    pending: ObjectPool<PendingFree>,
}

/// Physical memory pool backing transient resources.
///
/// The pool is shared across frames in flight. Ranges released at frame
/// retirement stay pending until the frame's GPU fence signals, so memory is
/// never handed out while in-flight GPU work may still touch it.
#[derive(Debug)]
pub struct TransientMemoryPool {
    capacity: u64,
    inner: Mutex<PoolInner>,
}

impl TransientMemoryPool {
    /// Create a pool with the given capacity in bytes.
    pub fn new(capacity: u64) -> Self {
        assert!(capacity > 0, "pool capacity must be non-zero");
        Self {
            capacity,
            inner: Mutex::new(PoolInner {
                free: vec![PoolRange {
                    offset: 0,
                    size: capacity,
                }],
                pending: ObjectPool::new(),
            }),
        }
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Bytes currently allocated (excludes pending frees).
    pub fn used(&self) -> u64 {
        let inner = self.inner.lock();
        let free: u64 = inner.free.iter().map(|r| r.size).sum();
        let pending: u64 = inner
            .pending
            .iter()
            .flat_map(|(_, p)| p.ranges.iter())
            .map(|r| r.size)
            .sum();
        self.capacity - free - pending
    }

    /// Allocate a range, first-fit.
    ///
    /// Reclaims pending ranges whose fences have signaled before searching.
    pub fn allocate(&self, size: u64, align: u64) -> Option<PoolRange> {
        assert!(size > 0, "allocation size must be non-zero");
        let mut inner = self.inner.lock();
        Self::reclaim(&mut inner);

        for i in 0..inner.free.len() {
            let block = inner.free[i];
            let aligned = block.offset.next_multiple_of(align);
            let padding = aligned - block.offset;
            if block.size < padding + size {
                continue;
            }

            inner.free.remove(i);
            if padding > 0 {
                Self::insert_free(
                    &mut inner.free,
                    PoolRange {
                        offset: block.offset,
                        size: padding,
                    },
                );
            }
            let leftover = block.size - padding - size;
            if leftover > 0 {
                Self::insert_free(
                    &mut inner.free,
                    PoolRange {
                        offset: aligned + size,
                        size: leftover,
                    },
                );
            }
            log::trace!("pool: allocated {}B at offset {}", size, aligned);
            return Some(PoolRange {
                offset: aligned,
                size,
            });
        }
        None
    }

    /// Free a range immediately.
    ///
    /// Only valid when no GPU work referencing the range is in flight (e.g.
    /// rollback of a failed compilation that never submitted).
    pub fn free(&self, range: PoolRange) {
        let mut inner = self.inner.lock();
        Self::insert_free(&mut inner.free, range);
    }

    /// Free ranges once `fence` signals.
    pub fn free_on_fence(&self, ranges: Vec<PoolRange>, fence: Fence) {
        if ranges.is_empty() {
            return;
        }
        let mut inner = self.inner.lock();
        inner.pending.insert(PendingFree { fence, ranges });
    }

    fn reclaim(inner: &mut PoolInner) {
        let signaled: Vec<_> = inner
            .pending
            .iter()
            .filter(|(_, p)| p.fence.is_signaled())
            .map(|(handle, _)| handle)
            .collect();
        for handle in signaled {
            let freed = inner.pending.remove(handle).expect("live pending entry");
            for range in freed.ranges {
                Self::insert_free(&mut inner.free, range);
            }
        }
    }

    fn insert_free(free: &mut Vec<PoolRange>, range: PoolRange) {
        let pos = free.partition_point(|r| r.offset < range.offset);
        free.insert(pos, range);

        // Coalesce with the right neighbor, then the left.
        if pos + 1 < free.len() && free[pos].offset + free[pos].size == free[pos + 1].offset {
            free[pos].size += free[pos + 1].size;
            free.remove(pos + 1);
        }
        if pos > 0 && free[pos - 1].offset + free[pos - 1].size == free[pos].offset {
            free[pos - 1].size += free[pos].size;
            free.remove(pos);
        }
    }
}

/// What a registry entry refers to.
enum ResourceInfo {
    TransientTexture {
        desc: TextureDescriptor,
        usage: TextureUsage,
    },
    TransientBuffer {
        desc: BufferDescriptor,
        usage: BufferUsage,
    },
    ImportedTexture(Arc<Texture>),
    ImportedBuffer(Arc<Buffer>),
}

impl ResourceInfo {
    fn label(&self) -> &str {
        match self {
            Self::TransientTexture { desc, .. } => desc.label.as_deref().unwrap_or("texture"),
            Self::TransientBuffer { desc, .. } => desc.label.as_deref().unwrap_or("buffer"),
            Self::ImportedTexture(t) => t.label().unwrap_or("imported texture"),
            Self::ImportedBuffer(b) => b.label().unwrap_or("imported buffer"),
        }
    }
}

/// One per-pass access of a resource, kept for alias-barrier construction.
#[derive(Debug, Clone, Copy)]
struct BoundaryAccess {
    pass: u32,
    kind: AccessKind,
    stages: PipelineStages,
}

struct Entry {
    info: ResourceInfo,
    /// One folded access per pass, in declaration order.
    accesses: Vec<BoundaryAccess>,
    allocation: Option<PoolRange>,
}

impl Entry {
    fn first(&self) -> Option<BoundaryAccess> {
        self.accesses.first().copied()
    }

    fn last(&self) -> Option<BoundaryAccess> {
        self.accesses.last().copied()
    }

    /// The access that executes first.
    ///
    /// For a transient whose first declared access is a pure read, that read
    /// consumes the output of the resource's first write, so the write runs
    /// ahead of it.
    fn entry_access(&self) -> Option<BoundaryAccess> {
        self.accesses
            .iter()
            .find(|a| a.kind.is_write())
            .or_else(|| self.accesses.first())
            .copied()
    }
}

/// An ordering requirement introduced by memory aliasing.
///
/// Every pass touching the prior tenant of a range must complete before the
/// pass that first touches the next tenant in execution order; `finalize`
/// emits one of these per access of the prior tenant.
#[derive(Debug, Clone, Copy)]
pub struct AliasDependency {
    /// Resource whose lifetime ends first.
    pub prior: ResourceHandle,
    /// Resource taking over the memory.
    pub next: ResourceHandle,
    /// A pass using `prior`.
    pub from_pass: u32,
    /// First pass using `next` in execution order.
    pub to_pass: u32,
    /// Access kind of `prior` in `from_pass`.
    pub src_kind: AccessKind,
    /// Stage mask of `prior` in `from_pass`.
    pub src_stages: PipelineStages,
    /// Access kind of `next`'s first use.
    pub dst_kind: AccessKind,
    /// Stage mask of `next`'s first use.
    pub dst_stages: PipelineStages,
}

/// Table of transient and imported resources for one frame's graph.
#[derive(Default)]
pub struct ResourceRegistry {
    entries: Vec<Entry>,
    /// Unique pool ranges handed out during `finalize` (aliased entries
    /// share one element here).
    blocks: Vec<PoolRange>,
    alias_deps: Vec<AliasDependency>,
    finalized: bool,
}

impl ResourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new transient texture.
    ///
    /// # Panics
    ///
    /// Panics on an invalid descriptor (zero-sized); that is a programmer
    /// error, not a runtime condition.
    pub fn create_texture(&mut self, desc: TextureDescriptor) -> ResourceHandle {
        assert!(!self.finalized, "registry already finalized");
        assert!(desc.is_valid(), "invalid texture descriptor: {:?}", desc);
        let usage = desc.usage;
        self.push(ResourceInfo::TransientTexture { desc, usage })
    }

    /// Register a new transient buffer.
    ///
    /// # Panics
    ///
    /// Panics on an invalid (zero-sized) descriptor.
    pub fn create_buffer(&mut self, desc: BufferDescriptor) -> ResourceHandle {
        assert!(!self.finalized, "registry already finalized");
        assert!(desc.is_valid(), "invalid buffer descriptor: {:?}", desc);
        let usage = desc.usage;
        self.push(ResourceInfo::TransientBuffer { desc, usage })
    }

    /// Import a long-lived texture owned by the application.
    ///
    /// Imported resources are never aliased and never torn down at frame
    /// retirement.
    pub fn import_texture(&mut self, texture: Arc<Texture>) -> ResourceHandle {
        assert!(!self.finalized, "registry already finalized");
        self.push(ResourceInfo::ImportedTexture(texture))
    }

    /// Import a long-lived buffer owned by the application.
    pub fn import_buffer(&mut self, buffer: Arc<Buffer>) -> ResourceHandle {
        assert!(!self.finalized, "registry already finalized");
        self.push(ResourceInfo::ImportedBuffer(buffer))
    }

    fn push(&mut self, info: ResourceInfo) -> ResourceHandle {
        let handle = ResourceHandle::new(self.entries.len() as u32);
        self.entries.push(Entry {
            info,
            accesses: Vec::new(),
            allocation: None,
        });
        handle
    }

    /// Record one pass access, accumulating usage bits and the live range.
    ///
    /// Called by the graph when a pass is added. Multiple accesses of the
    /// same resource by one pass widen the boundary access kind, so a pass
    /// declaring read + write is treated as a single read-modify-write for
    /// hazard purposes.
    pub(crate) fn record_access(
        &mut self,
        handle: ResourceHandle,
        pass: u32,
        kind: AccessKind,
        stages: PipelineStages,
    ) {
        assert!(!self.finalized, "registry already finalized");
        let entry = self
            .entries
            .get_mut(handle.index())
            .expect("invalid resource handle");

        match &mut entry.info {
            ResourceInfo::TransientTexture { usage, .. } => {
                *usage |= texture_usage_for_access(kind, stages);
            }
            ResourceInfo::TransientBuffer { usage, .. } => {
                *usage |= buffer_usage_for_access(kind, stages);
            }
            // Imported resources were created with their own usage flags;
            // the graph only orders accesses to them.
            ResourceInfo::ImportedTexture(_) | ResourceInfo::ImportedBuffer(_) => {}
        }

        let access = BoundaryAccess { pass, kind, stages };
        match entry.accesses.last_mut() {
            Some(last) if last.pass == pass => {
                last.kind = last.kind.merge(kind);
                last.stages |= stages;
            }
            Some(last) => {
                debug_assert!(last.pass < pass, "passes recorded out of order");
                entry.accesses.push(access);
            }
            None => entry.accesses.push(access),
        }
    }

    /// Accumulated texture usage mask for a transient texture.
    pub fn texture_usage(&self, handle: ResourceHandle) -> Option<TextureUsage> {
        match &self.entries.get(handle.index())?.info {
            ResourceInfo::TransientTexture { usage, .. } => Some(*usage),
            _ => None,
        }
    }

    /// Accumulated buffer usage mask for a transient buffer.
    pub fn buffer_usage(&self, handle: ResourceHandle) -> Option<BufferUsage> {
        match &self.entries.get(handle.index())?.info {
            ResourceInfo::TransientBuffer { usage, .. } => Some(*usage),
            _ => None,
        }
    }

    /// Check if a handle refers to a texture (transient or imported).
    pub fn is_texture(&self, handle: ResourceHandle) -> bool {
        matches!(
            self.entries.get(handle.index()).map(|e| &e.info),
            Some(ResourceInfo::TransientTexture { .. }) | Some(ResourceInfo::ImportedTexture(_))
        )
    }

    /// Check if a handle refers to an imported resource.
    pub fn is_imported(&self, handle: ResourceHandle) -> bool {
        matches!(
            self.entries.get(handle.index()).map(|e| &e.info),
            Some(ResourceInfo::ImportedTexture(_)) | Some(ResourceInfo::ImportedBuffer(_))
        )
    }

    /// Pass index range `[first, last]` over which the resource is live.
    pub fn live_range(&self, handle: ResourceHandle) -> Option<(u32, u32)> {
        let entry = self.entries.get(handle.index())?;
        Some((entry.first()?.pass, entry.last()?.pass))
    }

    /// Physical range assigned to a transient resource by `finalize`.
    pub fn physical_range(&self, handle: ResourceHandle) -> Option<PoolRange> {
        self.entries.get(handle.index())?.allocation
    }

    /// Alias-ordering requirements discovered during `finalize`.
    pub fn alias_dependencies(&self) -> &[AliasDependency] {
        &self.alias_deps
    }

    /// Number of declared resources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no resources were declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Imported texture behind a handle, if it is one.
    pub(crate) fn imported_texture(&self, handle: ResourceHandle) -> Option<&Arc<Texture>> {
        match &self.entries.get(handle.index())?.info {
            ResourceInfo::ImportedTexture(t) => Some(t),
            _ => None,
        }
    }

    /// Imported buffer behind a handle, if it is one.
    pub(crate) fn imported_buffer(&self, handle: ResourceHandle) -> Option<&Arc<Buffer>> {
        match &self.entries.get(handle.index())?.info {
            ResourceInfo::ImportedBuffer(b) => Some(b),
            _ => None,
        }
    }

    /// Perform physical allocation and aliasing.
    ///
    /// Walks transient entries in declaration order, placing each either in
    /// an already-assigned range whose tenants' live ranges are all disjoint
    /// with the new entry's, or in a fresh range from the pool. Pool
    /// exhaustion is recoverable: the caller gets
    /// [`CompileError::OutOfPoolMemory`] and every range taken by this call
    /// is returned to the pool.
    pub(crate) fn finalize(&mut self, pool: &TransientMemoryPool) -> Result<(), CompileError> {
        assert!(!self.finalized, "registry already finalized");

        // (range, tenants as entry indices) for alias search.
        let mut assigned: Vec<(PoolRange, Vec<usize>)> = Vec::new();

        for index in 0..self.entries.len() {
            let size = match &self.entries[index].info {
                ResourceInfo::TransientTexture { desc, .. } => desc.byte_size(),
                ResourceInfo::TransientBuffer { desc, .. } => desc.size,
                _ => continue,
            };
            let Some((first, last)) = self.entries[index]
                .first()
                .zip(self.entries[index].last())
                .map(|(f, l)| (f.pass, l.pass))
            else {
                log::warn!(
                    "transient resource '{}' declared but never accessed; skipping allocation",
                    self.entries[index].info.label()
                );
                continue;
            };

            // Try to alias into an existing range.
            let mut placed = false;
            for (range, tenants) in assigned.iter_mut() {
                if range.size < size {
                    continue;
                }
                let disjoint = tenants.iter().all(|&t| {
                    let (tf, tl) = self.entries[t]
                        .first()
                        .zip(self.entries[t].last())
                        .map(|(f, l)| (f.pass, l.pass))
                        .expect("tenant has live range");
                    tl < first || last < tf
                });
                if !disjoint {
                    continue;
                }

                for &t in tenants.iter() {
                    self.push_alias_dep(t, index);
                }
                tenants.push(index);
                self.entries[index].allocation = Some(*range);
                log::trace!(
                    "registry: aliased '{}' into range at offset {}",
                    self.entries[index].info.label(),
                    range.offset
                );
                placed = true;
                break;
            }
            if placed {
                continue;
            }

            match pool.allocate(size, TRANSIENT_ALIGNMENT) {
                Some(range) => {
                    self.blocks.push(range);
                    assigned.push((range, vec![index]));
                    self.entries[index].allocation = Some(range);
                }
                None => {
                    log::warn!(
                        "registry: pool exhausted allocating {}B for '{}'",
                        size,
                        self.entries[index].info.label()
                    );
                    self.rollback(pool);
                    return Err(CompileError::OutOfPoolMemory {
                        required: size,
                        capacity: pool.capacity(),
                    });
                }
            }
        }

        self.finalized = true;
        Ok(())
    }

    fn push_alias_dep(&mut self, prior_index: usize, next_index: usize) {
        let (pf, pl) = self.entries[prior_index]
            .first()
            .zip(self.entries[prior_index].last())
            .expect("prior tenant has live range");
        let (nf, nl) = self.entries[next_index]
            .first()
            .zip(self.entries[next_index].last())
            .expect("next tenant has live range");

        // Orient the dependency from the earlier tenant to the later one.
        let (prior, next) = if pl.pass < nf.pass {
            (prior_index, next_index)
        } else {
            debug_assert!(nl.pass < pf.pass, "tenant live ranges overlap");
            (next_index, prior_index)
        };

        // Every access of the earlier tenant must finish before the later
        // tenant's execution-entry access. Pure readers of the earlier tenant
        // are mutually unordered, so one edge from its last access would not
        // cover them all.
        let dst = self.entries[next]
            .entry_access()
            .expect("next tenant has live range");
        for slot in 0..self.entries[prior].accesses.len() {
            let src = self.entries[prior].accesses[slot];
            self.alias_deps.push(AliasDependency {
                prior: ResourceHandle::new(prior as u32),
                next: ResourceHandle::new(next as u32),
                from_pass: src.pass,
                to_pass: dst.pass,
                src_kind: src.kind,
                src_stages: src.stages,
                dst_kind: dst.kind,
                dst_stages: dst.stages,
            });
        }
    }

    /// Return every range taken by `finalize` to the pool immediately.
    ///
    /// Used when compilation aborts after allocation; nothing was submitted,
    /// so no fence gating is needed.
    pub(crate) fn rollback(&mut self, pool: &TransientMemoryPool) {
        for range in self.blocks.drain(..) {
            pool.free(range);
        }
        for entry in &mut self.entries {
            entry.allocation = None;
        }
        self.alias_deps.clear();
        self.finalized = false;
    }

    /// Release transient ranges back to the pool, gated on the frame fence.
    ///
    /// Imported resources are untouched; the application owns them.
    pub(crate) fn release(&mut self, pool: &TransientMemoryPool, fence: Fence) {
        let blocks = std::mem::take(&mut self.blocks);
        pool.free_on_fence(blocks, fence);
        for entry in &mut self.entries {
            entry.allocation = None;
        }
    }

    /// Reset the registry for graph reuse.
    pub(crate) fn reset(&mut self) {
        assert!(
            self.blocks.is_empty(),
            "registry reset while holding pool ranges"
        );
        self.entries.clear();
        self.alias_deps.clear();
        self.finalized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TextureFormat;

    fn texture(label: &str) -> TextureDescriptor {
        TextureDescriptor::new_2d(64, 64, TextureFormat::Rgba8Unorm).with_label(label)
    }

    #[test]
    fn test_pool_first_fit_and_coalesce() {
        let pool = TransientMemoryPool::new(1024);
        let a = pool.allocate(256, 256).unwrap();
        let b = pool.allocate(256, 256).unwrap();
        assert_eq!(a.offset, 0);
        assert_eq!(b.offset, 256);
        assert_eq!(pool.used(), 512);

        pool.free(a);
        pool.free(b);
        assert_eq!(pool.used(), 0);

        // Coalesced back into one block big enough for the full capacity.
        let c = pool.allocate(1024, 256).unwrap();
        assert_eq!(c.offset, 0);
    }

    #[test]
    fn test_pool_exhaustion() {
        let pool = TransientMemoryPool::new(512);
        assert!(pool.allocate(512, 256).is_some());
        assert!(pool.allocate(1, 256).is_none());
    }

    #[test]
    fn test_pool_fence_gated_reuse() {
        let pool = TransientMemoryPool::new(256);
        let range = pool.allocate(256, 256).unwrap();

        let fence = Fence::new_unsignaled();
        pool.free_on_fence(vec![range], fence.clone());

        // Fence unsignaled: the range is not reusable yet.
        assert!(pool.allocate(256, 256).is_none());

        fence.signal();
        assert!(pool.allocate(256, 256).is_some());
    }

    #[test]
    fn test_pool_reclaims_pending_frames_out_of_order() {
        let pool = TransientMemoryPool::new(512);
        let a = pool.allocate(256, 256).unwrap();
        let b = pool.allocate(256, 256).unwrap();

        let fence_a = Fence::new_unsignaled();
        let fence_b = Fence::new_unsignaled();
        pool.free_on_fence(vec![a], fence_a.clone());
        pool.free_on_fence(vec![b], fence_b.clone());

        // The later frame retires first; only its range comes back.
        fence_b.signal();
        let reused = pool.allocate(256, 256).unwrap();
        assert_eq!(reused.offset, b.offset);
        assert!(pool.allocate(256, 256).is_none());

        fence_a.signal();
        let reused = pool.allocate(256, 256).unwrap();
        assert_eq!(reused.offset, a.offset);
    }

    #[test]
    fn test_usage_accumulation() {
        let mut registry = ResourceRegistry::new();
        let tex = registry.create_texture(texture("gbuffer"));

        registry.record_access(tex, 0, AccessKind::Write, PipelineStages::COLOR_ATTACHMENT);
        registry.record_access(tex, 1, AccessKind::Read, PipelineStages::FRAGMENT_SHADER);

        let usage = registry.texture_usage(tex).unwrap();
        assert!(usage.contains(TextureUsage::RENDER_ATTACHMENT));
        assert!(usage.contains(TextureUsage::SAMPLED));
        assert_eq!(registry.live_range(tex), Some((0, 1)));
    }

    #[test]
    fn test_same_pass_accesses_fold_to_read_write() {
        let pool = TransientMemoryPool::new(1 << 20);
        let mut registry = ResourceRegistry::new();
        let tex = registry.create_texture(texture("scratch"));
        let next = registry.create_texture(texture("next"));

        // Read and write by the same pass fold into one read-modify-write
        // access, so aliasing emits a single edge out of pass 2.
        registry.record_access(tex, 2, AccessKind::Read, PipelineStages::COMPUTE_SHADER);
        registry.record_access(tex, 2, AccessKind::Write, PipelineStages::COMPUTE_SHADER);
        registry.record_access(next, 4, AccessKind::Write, PipelineStages::COMPUTE_SHADER);

        registry.finalize(&pool).unwrap();

        let deps = registry.alias_dependencies();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].from_pass, 2);
        assert_eq!(deps[0].src_kind, AccessKind::ReadWrite);
    }

    #[test]
    fn test_finalize_aliases_disjoint_lifetimes() {
        let pool = TransientMemoryPool::new(1 << 20);
        let mut registry = ResourceRegistry::new();
        let s1 = registry.create_texture(texture("scratch1"));
        let s2 = registry.create_texture(texture("scratch2"));

        // scratch1 lives in pass 0 only, scratch2 in pass 2 only.
        registry.record_access(s1, 0, AccessKind::Write, PipelineStages::COMPUTE_SHADER);
        registry.record_access(s2, 2, AccessKind::Write, PipelineStages::COMPUTE_SHADER);

        registry.finalize(&pool).unwrap();

        let r1 = registry.physical_range(s1).unwrap();
        let r2 = registry.physical_range(s2).unwrap();
        assert_eq!(r1, r2, "disjoint lifetimes should share memory");

        let deps = registry.alias_dependencies();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].from_pass, 0);
        assert_eq!(deps[0].to_pass, 2);
    }

    #[test]
    fn test_alias_deps_cover_every_access_of_prior_tenant() {
        let pool = TransientMemoryPool::new(1 << 20);
        let mut registry = ResourceRegistry::new();
        let s1 = registry.create_texture(texture("scratch1"));
        let s2 = registry.create_texture(texture("scratch2"));

        // Two readers of scratch1 are unordered between themselves, so each
        // needs its own edge to the next tenant.
        registry.record_access(s1, 0, AccessKind::Write, PipelineStages::COLOR_ATTACHMENT);
        registry.record_access(s1, 1, AccessKind::Read, PipelineStages::FRAGMENT_SHADER);
        registry.record_access(s1, 2, AccessKind::Read, PipelineStages::FRAGMENT_SHADER);
        registry.record_access(s2, 3, AccessKind::Write, PipelineStages::COMPUTE_SHADER);

        registry.finalize(&pool).unwrap();

        let mut froms: Vec<u32> = registry
            .alias_dependencies()
            .iter()
            .map(|d| d.from_pass)
            .collect();
        froms.sort_unstable();
        assert_eq!(froms, vec![0, 1, 2]);
        assert!(registry.alias_dependencies().iter().all(|d| d.to_pass == 3));
    }

    #[test]
    fn test_alias_deps_target_next_tenants_first_write() {
        let pool = TransientMemoryPool::new(1 << 20);
        let mut registry = ResourceRegistry::new();
        let s1 = registry.create_texture(texture("scratch1"));
        let s2 = registry.create_texture(texture("scratch2"));

        registry.record_access(s1, 0, AccessKind::Write, PipelineStages::COLOR_ATTACHMENT);
        // scratch2's read is declared ahead of its producer, so pass 4 is the
        // first pass to actually touch the memory.
        registry.record_access(s2, 3, AccessKind::Read, PipelineStages::FRAGMENT_SHADER);
        registry.record_access(s2, 4, AccessKind::Write, PipelineStages::COMPUTE_SHADER);

        registry.finalize(&pool).unwrap();

        let deps = registry.alias_dependencies();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].from_pass, 0);
        assert_eq!(deps[0].to_pass, 4);
    }

    #[test]
    fn test_finalize_does_not_alias_overlapping_lifetimes() {
        let pool = TransientMemoryPool::new(1 << 20);
        let mut registry = ResourceRegistry::new();
        let a = registry.create_texture(texture("a"));
        let b = registry.create_texture(texture("b"));

        registry.record_access(a, 0, AccessKind::Write, PipelineStages::COLOR_ATTACHMENT);
        registry.record_access(a, 2, AccessKind::Read, PipelineStages::FRAGMENT_SHADER);
        registry.record_access(b, 1, AccessKind::Write, PipelineStages::COLOR_ATTACHMENT);

        registry.finalize(&pool).unwrap();

        let ra = registry.physical_range(a).unwrap();
        let rb = registry.physical_range(b).unwrap();
        assert_ne!(ra, rb);
        assert!(registry.alias_dependencies().is_empty());
    }

    #[test]
    fn test_finalize_out_of_memory_rolls_back() {
        let pool = TransientMemoryPool::new(4096);
        let mut registry = ResourceRegistry::new();
        let big = registry.create_texture(texture("huge"));
        registry.record_access(big, 0, AccessKind::Write, PipelineStages::COLOR_ATTACHMENT);

        let err = registry.finalize(&pool).unwrap_err();
        assert!(matches!(err, CompileError::OutOfPoolMemory { .. }));

        // Everything returned to the pool.
        assert_eq!(pool.used(), 0);
        assert!(registry.physical_range(big).is_none());
    }

    #[test]
    fn test_imported_resources_not_allocated() {
        let pool = TransientMemoryPool::new(4096);
        let mut registry = ResourceRegistry::new();

        let imported = Arc::new(Texture::new(0, texture("shadow_atlas")));
        let handle = registry.import_texture(imported);
        registry.record_access(handle, 0, AccessKind::Read, PipelineStages::FRAGMENT_SHADER);

        registry.finalize(&pool).unwrap();
        assert!(registry.is_imported(handle));
        assert!(registry.physical_range(handle).is_none());
        assert_eq!(pool.used(), 0);
    }

    #[test]
    fn test_release_gates_on_fence() {
        let pool = TransientMemoryPool::new(1 << 20);
        let mut registry = ResourceRegistry::new();
        let tex = registry.create_texture(texture("target"));
        registry.record_access(tex, 0, AccessKind::Write, PipelineStages::COLOR_ATTACHMENT);
        registry.finalize(&pool).unwrap();

        let used = pool.used();
        assert!(used > 0);

        let fence = Fence::new_unsignaled();
        registry.release(&pool, fence.clone());

        // Still pending until the fence signals.
        assert_eq!(pool.used(), 0);
        assert!(pool.allocate(1 << 20, 256).is_none());
        fence.signal();
        assert!(pool.allocate(1 << 20, 256).is_some());
    }
}
