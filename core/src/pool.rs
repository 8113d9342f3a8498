//! Object pooling utilities for allocation reuse.
//!
//! Two abstractions live here:
//!
//! - [`Pooled<T>`] keeps a per-frame structure's allocation alive between
//!   frames. Frame-based code rebuilds structures like compiled graphs every
//!   frame; storing them in an `Option<T>` means `None` deallocates and the
//!   next frame reallocates. `Pooled<T>` clears the value instead, retaining
//!   capacity.
//! - [`ObjectPool<T>`] is an arena with a free-list of indices, used for
//!   small frequently recycled objects (fences, semaphores, query handles)
//!   that need stable handles for the lifetime of a frame.

/// Trait for types that can be pooled and reused.
pub trait Poolable {
    /// Create a new empty instance for pool initialization.
    fn new_empty() -> Self;

    /// Reset the value to an empty state, preserving allocated capacity.
    ///
    /// For example, call `Vec::clear()` rather than replacing with a new `Vec`.
    fn reset(&mut self);
}

/// A container that preserves allocations across active/pooled transitions.
#[derive(Debug)]
pub enum Pooled<T: Poolable> {
    /// The value is active and contains valid data.
    Active(T),
    /// The value is cleared but its allocation is preserved for reuse.
    Pooled(T),
}

impl<T: Poolable> Pooled<T> {
    /// Create a new `Pooled` in active state with the given value.
    pub fn new(value: T) -> Self {
        Self::Active(value)
    }

    /// Check if the value is active (contains valid data).
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    /// Check if the value is pooled (cleared, available for reuse).
    pub fn is_pooled(&self) -> bool {
        matches!(self, Self::Pooled(_))
    }

    /// Get a reference to the active value, or `None` if pooled.
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Active(t) => Some(t),
            Self::Pooled(_) => None,
        }
    }

    /// Get a mutable reference to the active value, or `None` if pooled.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Active(t) => Some(t),
            Self::Pooled(_) => None,
        }
    }

    /// Release the value back to the pool.
    ///
    /// Clears the value but preserves its allocation. No-op if already pooled.
    pub fn release(&mut self) {
        if matches!(self, Self::Active(_)) {
            let taken = std::mem::replace(self, Self::Pooled(T::new_empty()));
            if let Self::Active(mut t) = taken {
                t.reset();
                *self = Self::Pooled(t);
            }
        }
    }

    /// Activate the pooled value for reuse.
    ///
    /// Transitions from pooled to active state and returns a mutable reference
    /// to the cleared value for the caller to fill in. If already active,
    /// returns the existing value.
    pub fn activate(&mut self) -> &mut T {
        if matches!(self, Self::Pooled(_)) {
            let taken = std::mem::replace(self, Self::Active(T::new_empty()));
            if let Self::Pooled(t) = taken {
                *self = Self::Active(t);
            }
        }
        match self {
            Self::Active(t) => t,
            _ => unreachable!(),
        }
    }

    /// Get a reference to the inner value regardless of state.
    pub fn inner(&self) -> &T {
        match self {
            Self::Active(t) | Self::Pooled(t) => t,
        }
    }
}

impl<T: Poolable> Default for Pooled<T> {
    fn default() -> Self {
        Self::Pooled(T::new_empty())
    }
}

/// Handle into an [`ObjectPool`].
///
/// Valid only for the pool that issued it; using it after the slot was
/// removed returns `None` from the accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle(u32);

impl PoolHandle {
    fn new(index: u32) -> Self {
        Self(index)
    }

    /// Raw slot index, for debug display.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Arena with a free-list of indices.
///
/// Inserting reuses the lowest-numbered free slot before growing the arena,
/// so handle indices stay dense and deterministic for identical insertion
/// sequences.
#[derive(Debug)]
pub struct ObjectPool<T> {
    slots: Vec<Option<T>>,
    // Kept sorted descending so pop() yields the lowest free index.
    free: Vec<u32>,
}

impl<T> ObjectPool<T> {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Insert a value, returning a stable handle to it.
    pub fn insert(&mut self, value: T) -> PoolHandle {
        if let Some(index) = self.free.pop() {
            debug_assert!(self.slots[index as usize].is_none());
            self.slots[index as usize] = Some(value);
            PoolHandle::new(index)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Some(value));
            PoolHandle::new(index)
        }
    }

    /// Get a reference to the value behind a handle.
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.slots.get(handle.index()).and_then(|s| s.as_ref())
    }

    /// Get a mutable reference to the value behind a handle.
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.slots.get_mut(handle.index()).and_then(|s| s.as_mut())
    }

    /// Remove the value behind a handle, freeing its slot for reuse.
    pub fn remove(&mut self, handle: PoolHandle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index())?;
        let value = slot.take()?;
        let index = handle.0;
        // Insert keeping descending order.
        let pos = self.free.partition_point(|&i| i > index);
        self.free.insert(pos, index);
        Some(value)
    }

    /// Number of live values in the pool.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Check if the pool holds no live values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all values, keeping slot capacity.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    /// Iterate over live (handle, value) pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (PoolHandle, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|v| (PoolHandle::new(i as u32), v)))
    }
}

impl<T> Default for ObjectPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Poolable for ObjectPool<T> {
    fn new_empty() -> Self {
        Self::new()
    }
    fn reset(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Scratch {
        data: Vec<u32>,
    }

    impl Poolable for Scratch {
        fn new_empty() -> Self {
            Self::default()
        }
        fn reset(&mut self) {
            self.data.clear();
        }
    }

    #[test]
    fn test_pooled_default_is_pooled() {
        let pooled = Pooled::<Scratch>::default();
        assert!(pooled.is_pooled());
        assert!(pooled.get().is_none());
    }

    #[test]
    fn test_pooled_release_preserves_capacity() {
        let mut pooled = Pooled::new(Scratch {
            data: vec![1, 2, 3, 4, 5],
        });

        pooled.release();

        assert!(pooled.is_pooled());
        assert!(pooled.inner().data.is_empty());
        assert!(pooled.inner().data.capacity() >= 5);
    }

    #[test]
    fn test_pooled_activate_reuses_allocation() {
        let mut pooled = Pooled::new(Scratch {
            data: vec![1, 2, 3, 4, 5],
        });
        pooled.release();
        let capacity = pooled.inner().data.capacity();

        let scratch = pooled.activate();
        assert!(scratch.data.is_empty());
        assert_eq!(scratch.data.capacity(), capacity);
        scratch.data.push(7);

        assert!(pooled.is_active());
        assert_eq!(pooled.get().unwrap().data, vec![7]);
    }

    #[test]
    fn test_pooled_release_twice_is_noop() {
        let mut pooled = Pooled::<Scratch>::default();
        pooled.release();
        assert!(pooled.is_pooled());
    }

    #[test]
    fn test_object_pool_insert_get() {
        let mut pool = ObjectPool::new();
        let a = pool.insert("a");
        let b = pool.insert("b");

        assert_eq!(pool.get(a), Some(&"a"));
        assert_eq!(pool.get(b), Some(&"b"));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_object_pool_remove_frees_slot() {
        let mut pool = ObjectPool::new();
        let a = pool.insert(1u32);
        let _b = pool.insert(2u32);

        assert_eq!(pool.remove(a), Some(1));
        assert_eq!(pool.get(a), None);
        assert_eq!(pool.len(), 1);

        // Lowest free slot is reused.
        let c = pool.insert(3u32);
        assert_eq!(c.index(), a.index());
    }

    #[test]
    fn test_object_pool_remove_twice() {
        let mut pool = ObjectPool::new();
        let a = pool.insert(1u32);
        assert_eq!(pool.remove(a), Some(1));
        assert_eq!(pool.remove(a), None);
    }

    #[test]
    fn test_object_pool_reuse_is_deterministic() {
        let mut pool = ObjectPool::new();
        let handles: Vec<_> = (0..4).map(|i| pool.insert(i)).collect();
        pool.remove(handles[1]);
        pool.remove(handles[3]);

        // Free slots are handed out lowest-first.
        assert_eq!(pool.insert(10).index(), 1);
        assert_eq!(pool.insert(11).index(), 3);
        assert_eq!(pool.insert(12).index(), 4);
    }

    #[test]
    fn test_object_pool_iter() {
        let mut pool = ObjectPool::new();
        let a = pool.insert(1u32);
        let b = pool.insert(2u32);
        pool.remove(a);

        let live: Vec<_> = pool.iter().collect();
        assert_eq!(live, vec![(b, &2)]);
    }
}
