//! Dependency resolution and deterministic pass ordering.
//!
//! The resolver derives an execution DAG from the accesses each pass
//! declares. Edges come from read-after-write, write-after-write and
//! write-after-read hazards, from explicit dependencies the application
//! added, and from memory aliasing decided by the registry. Passes that only
//! read the same resource are never ordered against each other.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use marigold_core::pool::Poolable;

use crate::graph::registry::{AliasDependency, ResourceRegistry};
use crate::graph::{AccessKind, Pass, PipelineStages, ResourceHandle};

/// Why compiling a graph failed.
///
/// Compilation errors are recoverable: the graph and pool are left in a
/// state where the application can rebuild and retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The derived dependency graph contains a cycle.
    CycleDetected {
        /// Names of the passes participating in (or downstream of) the cycle.
        passes: Vec<String>,
    },
    /// The transient pool cannot satisfy an allocation.
    OutOfPoolMemory {
        /// Size of the allocation that failed.
        required: u64,
        /// Total pool capacity.
        capacity: u64,
    },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CycleDetected { passes } => {
                write!(f, "dependency cycle involving passes: {}", passes.join(", "))
            }
            Self::OutOfPoolMemory { required, capacity } => write!(
                f,
                "transient pool exhausted: {} bytes required, {} bytes capacity",
                required, capacity
            ),
        }
    }
}

impl std::error::Error for CompileError {}

/// The data hazard an edge protects against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardKind {
    ReadAfterWrite,
    WriteAfterWrite,
    WriteAfterRead,
}

/// What introduced a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeCause {
    /// A data hazard on a shared resource.
    Hazard(HazardKind),
    /// An explicit ordering added by the application.
    Explicit,
    /// Two resources share pool memory with disjoint lifetimes.
    Alias,
}

/// One ordering edge of the derived DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyEdge {
    /// Pass that must run first (declaration index).
    pub from: u32,
    /// Pass that must run after.
    pub to: u32,
    pub cause: EdgeCause,
    /// The resource that induced the edge, if any.
    pub resource: Option<ResourceHandle>,
    /// Stages of `from` that must complete.
    pub src_stages: PipelineStages,
    /// Stages of `to` that must wait.
    pub dst_stages: PipelineStages,
}

/// Result of dependency resolution: a deterministic execution order plus the
/// edges that constrain it.
#[derive(Debug, Default)]
pub struct CompiledGraph {
    /// Pass declaration indices in execution order.
    pub order: Vec<u32>,
    pub edges: Vec<DependencyEdge>,
}

impl CompiledGraph {
    /// Edges arriving at `pass`.
    pub fn edges_into(&self, pass: u32) -> impl Iterator<Item = &DependencyEdge> {
        self.edges.iter().filter(move |e| e.to == pass)
    }

    /// Edges leaving `pass`.
    pub fn edges_from(&self, pass: u32) -> impl Iterator<Item = &DependencyEdge> {
        self.edges.iter().filter(move |e| e.from == pass)
    }
}

impl Poolable for CompiledGraph {
    fn new_empty() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        self.order.clear();
        self.edges.clear();
    }
}

/// Per-pass, per-resource folded access: a pass that declares both a read
/// and a write of the same resource acts as a single read-modify-write.
#[derive(Clone, Copy)]
struct FoldedAccess {
    pass: u32,
    kind: AccessKind,
    stages: PipelineStages,
}

/// Derive the dependency DAG and a deterministic topological order.
///
/// `explicit` carries application-added `(before, after)` pairs and `alias`
/// the ordering requirements from memory aliasing. Ties in the topological
/// sort break toward the lower declaration index, so resolving the same
/// graph twice yields the same order.
pub fn resolve(
    passes: &[Pass],
    explicit: &[(u32, u32)],
    alias: &[AliasDependency],
    registry: &ResourceRegistry,
) -> Result<CompiledGraph, CompileError> {
    let mut compiled = CompiledGraph::new_empty();
    resolve_into(&mut compiled, passes, explicit, alias, registry)?;
    Ok(compiled)
}

/// Like [`resolve`], but reuses the buffers of a retired compiled graph.
///
/// On error `compiled` holds no usable order and must be reset before
/// reuse.
pub fn resolve_into(
    compiled: &mut CompiledGraph,
    passes: &[Pass],
    explicit: &[(u32, u32)],
    alias: &[AliasDependency],
    registry: &ResourceRegistry,
) -> Result<(), CompileError> {
    compiled.reset();
    let mut edges: Vec<DependencyEdge> = std::mem::take(&mut compiled.edges);

    // Group accesses by resource, folding same-pass duplicates.
    let mut timelines: Vec<(ResourceHandle, Vec<FoldedAccess>)> = Vec::new();
    for (pass_index, pass) in passes.iter().enumerate() {
        for access in pass.accesses() {
            let slot = match timelines.iter().position(|(h, _)| *h == access.resource) {
                Some(slot) => slot,
                None => {
                    timelines.push((access.resource, Vec::new()));
                    timelines.len() - 1
                }
            };
            let timeline = &mut timelines[slot].1;
            match timeline.last_mut() {
                Some(folded) if folded.pass == pass_index as u32 => {
                    folded.kind = folded.kind.merge(access.kind);
                    folded.stages |= access.stages;
                }
                _ => timeline.push(FoldedAccess {
                    pass: pass_index as u32,
                    kind: access.kind,
                    stages: access.stages,
                }),
            }
        }
    }

    // Hazard scan: track the last writer and the readers seen since it.
    //
    // Transient resources hold no data before their first in-frame write, so
    // a read declared ahead of that write consumes the writer's output and
    // orders after it regardless of declaration order. That is what makes a
    // mutual write/read pair between two passes an unsatisfiable cycle.
    // Imported resources carry last frame's contents, so a pre-write read of
    // one is an ordinary reader (history buffers rely on this).
    for (resource, timeline) in &timelines {
        let first_write = if registry.is_imported(*resource) {
            None
        } else {
            timeline.iter().position(|a| a.kind.is_write())
        };

        let mut last_writer: Option<FoldedAccess> = None;
        let mut readers_since_write: Vec<FoldedAccess> = Vec::new();
        let mut producer_readers: Vec<FoldedAccess> = Vec::new();

        for (slot, access) in timeline.iter().enumerate() {
            match first_write {
                Some(fw) if slot < fw => {
                    // Bind the early read to its producer.
                    let writer = timeline[fw];
                    push_edge(
                        &mut edges,
                        DependencyEdge {
                            from: writer.pass,
                            to: access.pass,
                            cause: EdgeCause::Hazard(HazardKind::ReadAfterWrite),
                            resource: Some(*resource),
                            src_stages: writer.stages,
                            dst_stages: access.stages,
                        },
                    );
                    producer_readers.push(*access);
                    continue;
                }
                Some(fw) if slot == fw => {
                    // The producer write; early readers logically follow it,
                    // so they constrain later writes but not this one.
                    last_writer = Some(*access);
                    readers_since_write = std::mem::take(&mut producer_readers);
                    continue;
                }
                _ => {}
            }

            if access.kind.is_write() {
                for reader in readers_since_write.drain(..) {
                    push_edge(
                        &mut edges,
                        DependencyEdge {
                            from: reader.pass,
                            to: access.pass,
                            cause: EdgeCause::Hazard(HazardKind::WriteAfterRead),
                            resource: Some(*resource),
                            src_stages: reader.stages,
                            dst_stages: access.stages,
                        },
                    );
                }
                if let Some(writer) = last_writer {
                    let hazard = if access.kind.is_read() {
                        // Read-modify-write consumes the prior value.
                        HazardKind::ReadAfterWrite
                    } else {
                        HazardKind::WriteAfterWrite
                    };
                    push_edge(
                        &mut edges,
                        DependencyEdge {
                            from: writer.pass,
                            to: access.pass,
                            cause: EdgeCause::Hazard(hazard),
                            resource: Some(*resource),
                            src_stages: writer.stages,
                            dst_stages: access.stages,
                        },
                    );
                }
                last_writer = Some(*access);
            } else {
                if let Some(writer) = last_writer {
                    push_edge(
                        &mut edges,
                        DependencyEdge {
                            from: writer.pass,
                            to: access.pass,
                            cause: EdgeCause::Hazard(HazardKind::ReadAfterWrite),
                            resource: Some(*resource),
                            src_stages: writer.stages,
                            dst_stages: access.stages,
                        },
                    );
                }
                readers_since_write.push(*access);
            }
        }
    }

    for &(from, to) in explicit {
        assert!(
            (from as usize) < passes.len() && (to as usize) < passes.len(),
            "explicit dependency references an unknown pass"
        );
        push_edge(
            &mut edges,
            DependencyEdge {
                from,
                to,
                cause: EdgeCause::Explicit,
                resource: None,
                src_stages: PipelineStages::empty(),
                dst_stages: PipelineStages::empty(),
            },
        );
    }

    for dep in alias {
        push_edge(
            &mut edges,
            DependencyEdge {
                from: dep.from_pass,
                to: dep.to_pass,
                cause: EdgeCause::Alias,
                resource: Some(dep.next),
                src_stages: dep.src_stages,
                dst_stages: dep.dst_stages,
            },
        );
    }

    compiled.order = topological_order(passes, &edges)?;
    log::trace!(
        "compiler: resolved {} passes, {} edges",
        passes.len(),
        edges.len()
    );
    compiled.edges = edges;
    Ok(())
}

/// Insert an edge, merging stage masks when the `(from, to)` pair already
/// exists. Hazard causes win over explicit/alias causes so downstream
/// barriers keep resource information.
fn push_edge(edges: &mut Vec<DependencyEdge>, edge: DependencyEdge) {
    assert!(edge.from != edge.to, "pass cannot depend on itself");
    if let Some(existing) = edges
        .iter_mut()
        .find(|e| e.from == edge.from && e.to == edge.to)
    {
        existing.src_stages |= edge.src_stages;
        existing.dst_stages |= edge.dst_stages;
        if matches!(existing.cause, EdgeCause::Explicit) {
            existing.cause = edge.cause;
            existing.resource = edge.resource.or(existing.resource);
        }
        return;
    }
    edges.push(edge);
}

/// Kahn's algorithm with a min-heap over declaration indices.
fn topological_order(passes: &[Pass], edges: &[DependencyEdge]) -> Result<Vec<u32>, CompileError> {
    let count = passes.len();
    let mut indegree = vec![0u32; count];
    let mut successors: Vec<Vec<u32>> = vec![Vec::new(); count];
    for edge in edges {
        indegree[edge.to as usize] += 1;
        successors[edge.from as usize].push(edge.to);
    }

    let mut ready: BinaryHeap<Reverse<u32>> = indegree
        .iter()
        .enumerate()
        .filter(|(_, &d)| d == 0)
        .map(|(i, _)| Reverse(i as u32))
        .collect();

    let mut order = Vec::with_capacity(count);
    while let Some(Reverse(pass)) = ready.pop() {
        order.push(pass);
        for &next in &successors[pass as usize] {
            indegree[next as usize] -= 1;
            if indegree[next as usize] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() < count {
        let stuck: Vec<String> = indegree
            .iter()
            .enumerate()
            .filter(|(_, &d)| d > 0)
            .map(|(i, _)| passes[i].name().to_string())
            .collect();
        return Err(CompileError::CycleDetected { passes: stuck });
    }
    Ok(order)
}
