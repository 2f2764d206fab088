//! Identity-keyed memory cache.
//!
//! Values are keyed by the allocation of an `Arc<[u8]>` input buffer, not by
//! its content: two buffers with identical bytes are distinct keys. Each slot
//! holds a [`Weak`] reference to its buffer. The weak reference keeps the
//! allocation reserved, so an address can never be reused for a different
//! buffer while its slot exists. Slots whose buffer has been dropped are
//! unreachable; inserts sweep them once the map has doubled since the last
//! sweep, and [`IdentityCache::prune`] sweeps on demand.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

/// Smallest map size that triggers a sweep of dead slots.
const MIN_SWEEP_LEN: usize = 64;

struct Slot<V> {
    buffer: Weak<[u8]>,
    value: V,
}

impl<V> Slot<V> {
    fn is_live(&self) -> bool {
        self.buffer.strong_count() > 0
    }
}

struct Slots<V> {
    map: HashMap<usize, Slot<V>>,
    /// Map size at which the next insert sweeps dead slots.
    sweep_at: usize,
}

impl<V> Slots<V> {
    fn sweep(&mut self) {
        self.map.retain(|_, slot| slot.is_live());
        self.sweep_at = (self.map.len() * 2).max(MIN_SWEEP_LEN);
    }
}

/// A thread-safe map from buffer identity to a cached value.
pub struct IdentityCache<V> {
    slots: RwLock<Slots<V>>,
}

fn address(buffer: &Arc<[u8]>) -> usize {
    Arc::as_ptr(buffer).cast::<u8>() as usize
}

impl<V: Clone> IdentityCache<V> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(Slots {
                map: HashMap::new(),
                sweep_at: MIN_SWEEP_LEN,
            }),
        }
    }

    /// Returns the value stored for this exact buffer, if any.
    pub fn get(&self, buffer: &Arc<[u8]>) -> Option<V> {
        let slots = self.slots.read();
        let slot = slots.map.get(&address(buffer))?;
        slot.is_live().then(|| slot.value.clone())
    }

    /// Returns `true` if a live value is stored for this exact buffer.
    pub fn contains(&self, buffer: &Arc<[u8]>) -> bool {
        self.get(buffer).is_some()
    }

    /// Stores `value` for `buffer` unless a value is already present.
    ///
    /// Returns `true` if the value was inserted.
    pub fn insert(&self, buffer: &Arc<[u8]>, value: V) -> bool {
        let mut slots = self.slots.write();
        if slots.map.len() >= slots.sweep_at {
            slots.sweep();
        }
        let key = address(buffer);
        if slots.map.contains_key(&key) {
            return false;
        }
        slots.map.insert(
            key,
            Slot {
                buffer: Arc::downgrade(buffer),
                value,
            },
        );
        true
    }

    /// Number of slots whose buffer is still alive.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .map
            .values()
            .filter(|slot| slot.is_live())
            .count()
    }

    /// Returns `true` if no live slots remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every slot.
    pub fn clear(&self) {
        let mut slots = self.slots.write();
        slots.map.clear();
        slots.sweep_at = MIN_SWEEP_LEN;
    }

    /// Drops slots whose buffer is gone. Returns how many were dropped.
    pub fn prune(&self) -> usize {
        let mut slots = self.slots.write();
        let before = slots.map.len();
        slots.sweep();
        before - slots.map.len()
    }
}

impl<V: Clone> Default for IdentityCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
