// Copyright 2025 the Formwork Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Key/value cache abstraction backing catalog discovery.
//!
//! - [`NoCache`]: never stores anything; every lookup misses.
//! - [`MemoryCache`]: process-local map, the default.
//!
//! Persistent stores (object caches, transients, files) implement [`Cache`]
//! at the host boundary. Methods take `&self` since such stores are usually
//! client handles with their own synchronization.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};

/// Key/value store used by [`ManifestGeneric`](crate::ManifestGeneric).
pub trait Cache: Debug {
    /// Fetch a stored value.
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value, replacing any previous one.
    fn set(&self, key: &str, value: String);

    /// Remove a value if present.
    fn delete(&self, key: &str);
}

/// Cache that stores nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCache;

impl Cache for NoCache {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }
    fn set(&self, _key: &str, _value: String) {}
    fn delete(&self, _key: &str) {}
}

/// Process-local cache.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // Entries are plain strings; a panic mid-write cannot leave them torn.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.len())
            .finish()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }
    fn set(&self, key: &str, value: String) {
        self.lock().insert(key.to_owned(), value);
    }
    fn delete(&self, key: &str) {
        self.lock().remove(key);
    }
}

impl<C: Cache + ?Sized> Cache for &C {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: String) {
        (**self).set(key, value);
    }
    fn delete(&self, key: &str) {
        (**self).delete(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_cache_round_trips_and_deletes() {
        let c = MemoryCache::new();
        assert!(c.is_empty());
        c.set("k", "v".into());
        assert_eq!(c.get("k").as_deref(), Some("v"));
        c.set("k", "w".into());
        assert_eq!(c.get("k").as_deref(), Some("w"));
        assert_eq!(c.len(), 1);
        c.delete("k");
        assert_eq!(c.get("k"), None);
    }

    #[test]
    fn no_cache_always_misses() {
        let c = NoCache;
        c.set("k", "v".into());
        assert_eq!(c.get("k"), None);
    }
}
