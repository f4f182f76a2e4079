/// Generational resource pool.
///
/// Typed slot storage keyed by an index+generation [`Handle`]. Every
/// reference type in the engine (scene nodes, meshes, lights) lives in a
/// `Pool` and is reached exclusively through `get`/`get_mut`, which turn
/// dangling references into a recoverable `None` instead of undefined
/// access. Freed slot indices are recycled on subsequent allocations.
///
/// # Example
///
/// ```ignore
/// let mut pool = Pool::new();
/// let h = pool.malloc(42u32);
/// assert_eq!(pool.get(h), Some(&42));
/// pool.free(h);
/// assert_eq!(pool.get(h), None); // stale handle, not UB
/// ```

/// Maximum addressable slot index (24-bit index budget).
pub const MAX_INDEX: u32 = (1 << 24) - 1;

/// Identifies a pooled resource independent of storage reshuffling.
///
/// A handle is valid only while `generation` matches the generation
/// stored at `index` in the owning pool and the slot is active. Freeing
/// a slot bumps its generation, invalidating every previously issued
/// handle to it without requiring them to be found or updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    /// Slot index into the owning pool (24-bit budget)
    index: u32,
    /// Generation the slot had when this handle was issued
    generation: u8,
}

impl Handle {
    /// Slot index into the owning pool.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation the slot had when this handle was issued.
    pub fn generation(&self) -> u8 {
        self.generation
    }

    /// Pack into a single u32: generation in the top byte, index below.
    ///
    /// Suitable for passing handles through GPU-visible data or debug
    /// output. Round-trips through [`Handle::from_packed`].
    pub fn packed(&self) -> u32 {
        ((self.generation as u32) << 24) | self.index
    }

    /// Rebuild a handle from its [`Handle::packed`] representation.
    pub fn from_packed(raw: u32) -> Self {
        Self {
            index: raw & MAX_INDEX,
            generation: (raw >> 24) as u8,
        }
    }
}

/// One pool slot: the stored item plus the liveness bookkeeping.
struct Entry<T> {
    generation: u8,
    active: bool,
    item: T,
}

/// Typed generational slot storage.
///
/// `malloc` never fails (amortized O(1), grows the backing storage);
/// `get` is O(1) and is the only sanctioned way to dereference a handle;
/// `free` is idempotent against stale handles. Callers must treat a
/// `None` from `get` as a recoverable miss (e.g. skip this node this
/// frame), never as fatal.
pub struct Pool<T> {
    entries: Vec<Entry<T>>,
    free_indices: Vec<u32>,
    len: usize,
}

impl<T> Pool<T> {
    /// Create a new empty pool
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            free_indices: Vec::new(),
            len: 0,
        }
    }

    /// Create a pool with pre-reserved slot capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free_indices: Vec::new(),
            len: 0,
        }
    }

    /// Allocate a slot for `item` and return a fresh handle.
    ///
    /// Reuses a freed index when one is available (its generation was
    /// already bumped by [`Pool::free`], so handles issued before the
    /// free keep missing); otherwise appends a new slot at generation 1.
    pub fn malloc(&mut self, item: T) -> Handle {
        self.len += 1;

        if let Some(index) = self.free_indices.pop() {
            let entry = &mut self.entries[index as usize];
            entry.active = true;
            entry.item = item;
            return Handle { index, generation: entry.generation };
        }

        let index = self.entries.len() as u32;
        debug_assert!(index <= MAX_INDEX, "pool exceeded 24-bit index budget");
        self.entries.push(Entry {
            generation: 1,
            active: true,
            item,
        });
        Handle { index, generation: 1 }
    }

    /// Resolve a handle. Returns `None` when the index is out of bounds,
    /// the slot is inactive, or the generation does not match.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        match self.entries.get(handle.index as usize) {
            Some(entry) if entry.active && entry.generation == handle.generation => {
                Some(&entry.item)
            }
            _ => None,
        }
    }

    /// Mutable variant of [`Pool::get`].
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        match self.entries.get_mut(handle.index as usize) {
            Some(entry) if entry.active && entry.generation == handle.generation => {
                Some(&mut entry.item)
            }
            _ => None,
        }
    }

    /// Whether `handle` currently resolves to a live item.
    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Release the slot referenced by `handle`.
    ///
    /// Bumps the slot generation (invalidating every outstanding handle
    /// to it), marks it inactive and returns the index to the free list.
    /// A stale or mismatched handle is a no-op; returns whether the slot
    /// was actually freed.
    pub fn free(&mut self, handle: Handle) -> bool {
        match self.entries.get_mut(handle.index as usize) {
            Some(entry) if entry.active && entry.generation == handle.generation => {
                entry.active = false;
                entry.generation = entry.generation.wrapping_add(1);
                self.free_indices.push(handle.index);
                self.len -= 1;
                true
            }
            _ => false,
        }
    }

    /// Number of currently allocated slots
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no slots are currently allocated
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total slot count ever allocated (active + free-listed).
    ///
    /// This is the minimum capacity any storage mirroring this pool
    /// (e.g. a GPU-side array indexed by handle index) must have.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over all active slots as `(Handle, &T)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.entries.iter().enumerate().filter_map(|(index, entry)| {
            entry.active.then(|| {
                (
                    Handle {
                        index: index as u32,
                        generation: entry.generation,
                    },
                    &entry.item,
                )
            })
        })
    }

    /// Iterate over the handles of all active slots.
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.iter().map(|(handle, _)| handle)
    }

    /// Free every slot, invalidating all outstanding handles.
    pub fn clear(&mut self) {
        let handles: Vec<Handle> = self.handles().collect();
        for handle in handles {
            self.free(handle);
        }
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
