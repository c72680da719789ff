//! Pending writes of a deferred store.

use perdict_codec::{Map, Value};

/// Values written since the last sync.
///
/// Has no persistence of its own; [`Overlay::drain_into`] is the only way its
/// contents reach the mirror.
#[derive(Debug, Default)]
pub struct Overlay {
    pending: Map,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.pending.get(key)
    }

    pub fn put(&mut self, key: String, value: Value) {
        self.pending.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.pending.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Move every pending entry into `mirror`, replacing values already
    /// there, and leave the overlay empty.
    pub fn drain_into(&mut self, mirror: &mut Map) {
        mirror.append(&mut self.pending);
    }
}
