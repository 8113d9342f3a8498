//! Graphics instance: backend ownership and device creation.

use std::sync::{Arc, Weak};

use static_assertions::assert_impl_all;

use crate::backend::GpuBackend;
use crate::device::{DeviceDescriptor, GraphicsDevice};
use crate::error::GraphicsError;

/// Entry point of the graphics layer.
///
/// Owns the backend and creates devices. Held in an `Arc`; devices keep a
/// `Weak` back-reference so dropping the instance is observable without a
/// reference cycle.
pub struct GraphicsInstance {
    backend: Arc<dyn GpuBackend>,
    weak_self: Weak<GraphicsInstance>,
}

assert_impl_all!(GraphicsInstance: Send, Sync);

impl GraphicsInstance {
    /// Create an instance over a backend.
    pub fn new(backend: Arc<dyn GpuBackend>) -> Arc<Self> {
        log::info!("graphics instance created, backend '{}'", backend.name());
        Arc::new_cyclic(|weak_self| Self {
            backend,
            weak_self: weak_self.clone(),
        })
    }

    /// The backend this instance drives.
    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }

    /// Create a device with the requested capabilities.
    ///
    /// Fails when the descriptor requests queues the backend does not
    /// expose.
    pub fn create_device(
        &self,
        desc: DeviceDescriptor,
    ) -> Result<Arc<GraphicsDevice>, GraphicsError> {
        GraphicsDevice::new(self.weak_self.clone(), self.backend.clone(), desc)
    }
}
