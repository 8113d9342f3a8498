//! Render pass types.
//!
//! Passes describe units of GPU work together with their declared resource
//! accesses. They carry an opaque callback that records the actual commands
//! at execution time; the scheduler only ever looks at the declarations.

use crate::executor::RecordContext;

use super::resource::{AccessKind, PipelineStages, ResourceAccess, ResourceHandle};

/// Callback invoked at execution time with a command-recording context.
///
/// Must only record through the context; creating or destroying transient
/// resources from inside a callback is a contract violation.
pub type PassCallback = Box<dyn FnMut(&mut RecordContext<'_>) + Send>;

/// Kind of GPU work a pass performs, which also determines which hardware
/// queues it is eligible for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Rasterization work (vertex/fragment shaders).
    Graphics,
    /// Compute shader dispatches.
    Compute,
    /// Copy operations.
    Transfer,
}

/// A pass in the render graph.
pub enum Pass {
    /// Graphics pass (vertex/fragment shaders, rasterization).
    Graphics(GraphicsPass),
    /// Compute pass (compute shaders).
    Compute(ComputePass),
    /// Transfer pass (copy operations).
    Transfer(TransferPass),
}

impl Pass {
    /// Get the pass name.
    pub fn name(&self) -> &str {
        match self {
            Pass::Graphics(p) => &p.name,
            Pass::Compute(p) => &p.name,
            Pass::Transfer(p) => &p.name,
        }
    }

    /// Get the pass kind.
    pub fn kind(&self) -> PassKind {
        match self {
            Pass::Graphics(_) => PassKind::Graphics,
            Pass::Compute(_) => PassKind::Compute,
            Pass::Transfer(_) => PassKind::Transfer,
        }
    }

    /// Declared resource accesses, in declaration order.
    pub fn accesses(&self) -> &[ResourceAccess] {
        match self {
            Pass::Graphics(p) => &p.accesses,
            Pass::Compute(p) => &p.accesses,
            Pass::Transfer(p) => &p.accesses,
        }
    }

    /// Check if this is a graphics pass.
    pub fn is_graphics(&self) -> bool {
        matches!(self, Pass::Graphics(_))
    }

    /// Check if this is a compute pass.
    pub fn is_compute(&self) -> bool {
        matches!(self, Pass::Compute(_))
    }

    /// Check if this is a transfer pass.
    pub fn is_transfer(&self) -> bool {
        matches!(self, Pass::Transfer(_))
    }

    pub(crate) fn take_callback(&mut self) -> Option<PassCallback> {
        match self {
            Pass::Graphics(p) => p.callback.take(),
            Pass::Compute(p) => p.callback.take(),
            Pass::Transfer(p) => p.callback.take(),
        }
    }
}

impl std::fmt::Debug for Pass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pass")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("accesses", &self.accesses().len())
            .finish()
    }
}

macro_rules! pass_builder_methods {
    () => {
        /// Declare a read of a texture at the given stages.
        pub fn read_texture(mut self, texture: ResourceHandle, stages: PipelineStages) -> Self {
            self.accesses.push(ResourceAccess {
                resource: texture,
                kind: AccessKind::Read,
                stages,
            });
            self
        }

        /// Declare a write of a texture at the given stages.
        pub fn write_texture(mut self, texture: ResourceHandle, stages: PipelineStages) -> Self {
            self.accesses.push(ResourceAccess {
                resource: texture,
                kind: AccessKind::Write,
                stages,
            });
            self
        }

        /// Declare a read-modify-write of a texture at the given stages.
        pub fn read_write_texture(
            mut self,
            texture: ResourceHandle,
            stages: PipelineStages,
        ) -> Self {
            self.accesses.push(ResourceAccess {
                resource: texture,
                kind: AccessKind::ReadWrite,
                stages,
            });
            self
        }

        /// Declare a read of a buffer at the given stages.
        pub fn read_buffer(mut self, buffer: ResourceHandle, stages: PipelineStages) -> Self {
            self.accesses.push(ResourceAccess {
                resource: buffer,
                kind: AccessKind::Read,
                stages,
            });
            self
        }

        /// Declare a write of a buffer at the given stages.
        pub fn write_buffer(mut self, buffer: ResourceHandle, stages: PipelineStages) -> Self {
            self.accesses.push(ResourceAccess {
                resource: buffer,
                kind: AccessKind::Write,
                stages,
            });
            self
        }

        /// Declare a read-modify-write of a buffer at the given stages.
        pub fn read_write_buffer(mut self, buffer: ResourceHandle, stages: PipelineStages) -> Self {
            self.accesses.push(ResourceAccess {
                resource: buffer,
                kind: AccessKind::ReadWrite,
                stages,
            });
            self
        }

        /// Attach the command-recording callback.
        pub fn with_callback(
            mut self,
            callback: impl FnMut(&mut RecordContext<'_>) + Send + 'static,
        ) -> Self {
            self.callback = Some(Box::new(callback));
            self
        }

        /// Get the pass name.
        pub fn name(&self) -> &str {
            &self.name
        }

        /// Declared resource accesses, in declaration order.
        pub fn accesses(&self) -> &[ResourceAccess] {
            &self.accesses
        }
    };
}

/// A rasterization pass.
pub struct GraphicsPass {
    name: String,
    accesses: Vec<ResourceAccess>,
    callback: Option<PassCallback>,
}

impl GraphicsPass {
    /// Create a new graphics pass with the given debug name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            accesses: Vec::new(),
            callback: None,
        }
    }

    pass_builder_methods!();
}

/// A compute pass.
pub struct ComputePass {
    name: String,
    accesses: Vec<ResourceAccess>,
    callback: Option<PassCallback>,
}

impl ComputePass {
    /// Create a new compute pass with the given debug name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            accesses: Vec::new(),
            callback: None,
        }
    }

    pass_builder_methods!();
}

/// A transfer (copy) pass.
pub struct TransferPass {
    name: String,
    accesses: Vec<ResourceAccess>,
    callback: Option<PassCallback>,
}

impl TransferPass {
    /// Create a new transfer pass with the given debug name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            accesses: Vec::new(),
            callback: None,
        }
    }

    pass_builder_methods!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_kinds() {
        let g = Pass::Graphics(GraphicsPass::new("g"));
        let c = Pass::Compute(ComputePass::new("c"));
        let t = Pass::Transfer(TransferPass::new("t"));

        assert!(g.is_graphics());
        assert!(c.is_compute());
        assert!(t.is_transfer());
        assert_eq!(g.kind(), PassKind::Graphics);
        assert_eq!(c.kind(), PassKind::Compute);
        assert_eq!(t.kind(), PassKind::Transfer);
    }

    #[test]
    fn test_access_declaration_order() {
        let a = ResourceHandle::new(0);
        let b = ResourceHandle::new(1);

        let pass = GraphicsPass::new("main")
            .read_texture(a, PipelineStages::FRAGMENT_SHADER)
            .write_texture(b, PipelineStages::COLOR_ATTACHMENT);

        assert_eq!(pass.accesses().len(), 2);
        assert_eq!(pass.accesses()[0].resource, a);
        assert_eq!(pass.accesses()[0].kind, AccessKind::Read);
        assert_eq!(pass.accesses()[1].resource, b);
        assert_eq!(pass.accesses()[1].kind, AccessKind::Write);
    }

    #[test]
    fn test_callback_taken_once() {
        let pass = ComputePass::new("sim").with_callback(|_ctx| {});
        let mut pass = Pass::Compute(pass);
        assert!(pass.take_callback().is_some());
        assert!(pass.take_callback().is_none());
    }
}
