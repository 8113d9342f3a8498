//! GPU synchronization primitives.
//!
//! [`Semaphore`] orders work between queues on the GPU; [`Fence`] lets the
//! CPU wait for GPU work to retire. Real backends would wrap API objects
//! here; the scheduling core only needs their signal/wait semantics.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// GPU semaphore ordering work across queues within a frame.
///
/// One operation signals the semaphore when complete; another waits on it
/// before starting. Unlike fences, semaphores cannot be waited on from the
/// CPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Semaphore {
    /// Unique identifier within the schedule that created it.
    id: u64,
}

impl Semaphore {
    pub(crate) fn new(id: u64) -> Self {
        Self { id }
    }

    /// Get the semaphore's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Status of a fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceStatus {
    /// The fence has not yet been signaled.
    Unsignaled,
    /// The fence has been signaled (GPU work complete).
    Signaled,
}

/// CPU-GPU synchronization primitive.
///
/// Fences gate the reuse of per-frame resources: a transient memory range is
/// not handed out again until the fence of the frame that last used it has
/// signaled. Cloning a fence shares its state.
#[derive(Debug)]
pub struct Fence {
    signaled: Arc<AtomicBool>,
}

impl Fence {
    /// Create a new fence in the unsignaled state.
    pub(crate) fn new_unsignaled() -> Self {
        Self {
            signaled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a new fence in the signaled state.
    pub(crate) fn new_signaled() -> Self {
        Self {
            signaled: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Check the current status of the fence.
    pub fn status(&self) -> FenceStatus {
        if self.signaled.load(Ordering::Acquire) {
            FenceStatus::Signaled
        } else {
            FenceStatus::Unsignaled
        }
    }

    /// Check if the fence is signaled (non-blocking).
    pub fn is_signaled(&self) -> bool {
        self.status() == FenceStatus::Signaled
    }

    /// Wait for the fence to be signaled (blocking).
    ///
    /// Returns immediately if already signaled.
    pub fn wait(&self) {
        while !self.signaled.load(Ordering::Acquire) {
            std::hint::spin_loop();
        }
    }

    /// Wait for the fence with a timeout.
    ///
    /// Returns `true` if the fence was signaled, `false` if the timeout
    /// elapsed first.
    pub fn wait_timeout(&self, timeout: std::time::Duration) -> bool {
        let start = std::time::Instant::now();
        while !self.signaled.load(Ordering::Acquire) {
            if start.elapsed() >= timeout {
                return false;
            }
            std::hint::spin_loop();
        }
        true
    }

    /// Reset the fence to unsignaled state.
    ///
    /// Must only be called when no GPU work is pending on this fence.
    pub fn reset(&self) {
        self.signaled.store(false, Ordering::Release);
    }

    /// Signal the fence.
    ///
    /// Real backends signal when GPU work completes; the dummy backend
    /// signals at submission.
    pub(crate) fn signal(&self) {
        self.signaled.store(true, Ordering::Release);
    }
}

impl Clone for Fence {
    fn clone(&self) -> Self {
        Self {
            signaled: Arc::clone(&self.signaled),
        }
    }
}

impl Default for Fence {
    fn default() -> Self {
        Self::new_unsignaled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semaphore_id() {
        let sem = Semaphore::new(3);
        assert_eq!(sem.id(), 3);
    }

    #[test]
    fn test_fence_states() {
        let fence = Fence::new_unsignaled();
        assert_eq!(fence.status(), FenceStatus::Unsignaled);

        fence.signal();
        assert!(fence.is_signaled());

        fence.reset();
        assert!(!fence.is_signaled());
    }

    #[test]
    fn test_fence_signal_from_other_thread() {
        let fence = Fence::new_unsignaled();
        let remote = fence.clone();
        std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(5));
            remote.signal();
        });

        fence.wait();
        assert!(fence.is_signaled());
    }

    #[test]
    fn test_fence_wait_timeout_elapses() {
        let fence = Fence::new_unsignaled();
        assert!(!fence.wait_timeout(std::time::Duration::from_millis(5)));
    }

    #[test]
    fn test_fence_clone_shares_state() {
        let a = Fence::new_unsignaled();
        let b = a.clone();
        a.signal();
        assert!(b.is_signaled());
    }
}
