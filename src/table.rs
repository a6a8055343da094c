//! Fixed-capacity open-addressing table mapping binding keys to bindings.
//!
//! Capacity is chosen once, from the final binding count, as the smallest
//! prime at least 30% larger than that count; there is no resize or rehash
//! path. Lookup walks a deterministic pseudo-random probe sequence derived
//! from the key hash, so two inserts of the same key always land on the same
//! slot.

use std::sync::Arc;

use crate::binding::Binding;
use crate::error::GraphError;

pub(crate) struct ProbeTable<V> {
    slots: Vec<Option<Arc<dyn Binding<V>>>>,
}

impl<V> ProbeTable<V> {
    /// Allocates a table sized for `count` bindings.
    pub(crate) fn with_binding_count(count: usize) -> Self {
        let mut capacity = count + count * 3 / 10 + 1;
        while !is_prime(capacity) {
            capacity += 1;
        }
        Self {
            slots: vec![None; capacity],
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Walks the probe sequence until it hits the key's own slot or an empty
    /// one. The affine recurrence is applied once per attempt, including the
    /// first; the oversized capacity guarantees an empty slot terminates the
    /// walk for absent keys.
    fn lookup(&self, type_id: &str, tag: Option<&str>) -> usize {
        let mut hash = key_hash(type_id, tag);
        loop {
            hash = hash.wrapping_mul(57).wrapping_add(43);
            let index = hash.unsigned_abs() as usize % self.slots.len();
            match &self.slots[index] {
                Some(binding) if !binding.key().matches(type_id, tag) => continue,
                _ => return index,
            }
        }
    }

    pub(crate) fn get(&self, type_id: &str, tag: Option<&str>) -> Option<&Arc<dyn Binding<V>>> {
        self.slots[self.lookup(type_id, tag)].as_ref()
    }

    /// Inserts a binding into its key's slot. Without `overwrite`, a slot
    /// already occupied for the same key is a duplicate-binding fault; with
    /// it, the occupant is replaced unconditionally.
    pub(crate) fn put(
        &mut self,
        binding: Arc<dyn Binding<V>>,
        overwrite: bool,
    ) -> Result<(), GraphError> {
        let index = self.lookup(binding.key().type_id(), binding.key().tag());
        let slot = &mut self.slots[index];
        if slot.is_some() && !overwrite {
            return Err(GraphError::DuplicateBinding {
                key: binding.key().clone(),
            });
        }
        *slot = Some(binding);
        Ok(())
    }
}

/// Combined key hash seeding the probe sequence: a polynomial string hash of
/// the type identifier folded with the tag's (or 0 for no tag).
pub(crate) fn key_hash(type_id: &str, tag: Option<&str>) -> i32 {
    string_hash(type_id)
        .wrapping_mul(31)
        .wrapping_add(tag.map_or(0, string_hash))
}

fn string_hash(s: &str) -> i32 {
    s.bytes()
        .fold(0i32, |h, b| h.wrapping_mul(31).wrapping_add(b as i32))
}

fn is_prime(n: usize) -> bool {
    if n > 2 && n % 2 == 0 {
        return false;
    }
    let top = (n as f64).sqrt() as usize + 1;
    let mut i = 3;
    while i < top {
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}
