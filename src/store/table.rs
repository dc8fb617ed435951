//! Store implementation
//!
//! HashMap-based keyspace with RwLock for concurrency.

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::RwLock;

/// In-memory keyspace for strings and hashes
///
/// Owned by the engine and shared by reference; there is no global state, so
/// tests can run any number of independent stores side by side.
#[derive(Default)]
pub struct Store {
    /// key → value
    strings: RwLock<HashMap<Bytes, Bytes>>,

    /// hash → (field → value)
    hashes: RwLock<HashMap<Bytes, HashMap<Bytes, Bytes>>>,
}

impl Store {
    /// Create a new empty Store
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Strings
    // =========================================================================

    /// Get a value by key (read lock)
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.strings.read().get(key).cloned()
    }

    /// Set a key to a value, replacing any previous value (write lock)
    pub fn set(&self, key: Bytes, value: Bytes) {
        self.strings.write().insert(key, value);
    }

    // =========================================================================
    // Hashes
    // =========================================================================

    /// Get one field of a hash (read lock)
    pub fn hget(&self, hash: &[u8], field: &[u8]) -> Option<Bytes> {
        self.hashes.read().get(hash)?.get(field).cloned()
    }

    /// Set one field of a hash, creating the hash if needed (write lock)
    pub fn hset(&self, hash: Bytes, field: Bytes, value: Bytes) {
        self.hashes
            .write()
            .entry(hash)
            .or_default()
            .insert(field, value);
    }

    /// All field/value pairs of a hash, sorted by field
    ///
    /// Returns `None` when the hash does not exist.
    pub fn hgetall(&self, hash: &[u8]) -> Option<Vec<(Bytes, Bytes)>> {
        let mut pairs: Vec<(Bytes, Bytes)> = self
            .hashes
            .read()
            .get(hash)?
            .iter()
            .map(|(f, v)| (f.clone(), v.clone()))
            .collect();
        pairs.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        Some(pairs)
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Number of string keys
    pub fn key_count(&self) -> usize {
        self.strings.read().len()
    }

    /// Number of hashes
    pub fn hash_count(&self) -> usize {
        self.hashes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_count() == 0 && self.hash_count() == 0
    }

    /// Sorted copy of every string pair, for comparing whole stores
    pub fn strings_snapshot(&self) -> Vec<(Bytes, Bytes)> {
        let mut pairs: Vec<(Bytes, Bytes)> = self
            .strings
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        pairs.sort_unstable();
        pairs
    }

    /// Sorted copy of every hash, for comparing whole stores
    pub fn hashes_snapshot(&self) -> Vec<(Bytes, Vec<(Bytes, Bytes)>)> {
        let hashes = self.hashes.read();
        let mut names: Vec<&Bytes> = hashes.keys().collect();
        names.sort_unstable();

        names
            .into_iter()
            .map(|name| {
                let mut fields: Vec<(Bytes, Bytes)> = hashes[name]
                    .iter()
                    .map(|(f, v)| (f.clone(), v.clone()))
                    .collect();
                fields.sort_unstable();
                (name.clone(), fields)
            })
            .collect()
    }

    /// Drop everything
    pub fn clear(&self) {
        self.strings.write().clear();
        self.hashes.write().clear();
    }
}
