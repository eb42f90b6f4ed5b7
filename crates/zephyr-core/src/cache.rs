//! Process-local module cache keyed by absolute manifest path.
//!
//! No cache method ever calls back into the cache while holding its own
//! lock, so a plain `Mutex` is sufficient despite spec.md §9 describing the
//! requirement as "re-entrant": callers that nest `discover`/`get` calls
//! from different threads still can't deadlock because no call path
//! re-enters while the guard is held. Every read returns a deep clone: no
//! caller can mutate the cached value, matching the "no cross-module
//! aliasing in caches" rule.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use zephyr_schema::Module;

/// Default eviction capacity for the module cache.
pub const DEFAULT_CAPACITY: usize = 128;

struct Entry {
    module: Module,
    /// Monotonically increasing access counter, used to find the
    /// least-recently-used entry on eviction.
    last_used: u64,
}

struct Inner {
    entries: HashMap<PathBuf, Entry>,
    capacity: usize,
    clock: u64,
}

/// An LRU cache of parsed [`Module`]s, keyed by absolute manifest path.
pub struct ModuleCache(Mutex<Inner>);

impl std::fmt::Debug for ModuleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleCache").finish_non_exhaustive()
    }
}

impl Default for ModuleCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ModuleCache {
    /// Creates a cache that evicts its least-recently-used entry once more
    /// than `capacity` manifests have been inserted.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self(Mutex::new(Inner {
            entries: HashMap::new(),
            capacity,
            clock: 0,
        }))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Returns a deep clone of the cached module for `manifest_path`, if
    /// present.
    pub fn get(&self, manifest_path: &std::path::Path) -> Option<Module> {
        let mut inner = self.lock();
        inner.clock += 1;
        let clock = inner.clock;
        let module = inner.entries.get_mut(manifest_path).map(|e| {
            e.last_used = clock;
            e.module.clone()
        });
        module
    }

    /// Inserts (or replaces) the cached module for `manifest_path`,
    /// evicting the least-recently-used entry if the cache is full.
    pub fn insert(&self, manifest_path: PathBuf, module: Module) {
        let mut inner = self.lock();
        inner.clock += 1;
        let clock = inner.clock;

        if inner.entries.len() >= inner.capacity && !inner.entries.contains_key(&manifest_path) {
            if let Some(lru_key) = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone())
            {
                inner.entries.remove(&lru_key);
            }
        }

        inner.entries.insert(manifest_path, Entry { module, last_used: clock });
    }

    /// Removes every cached entry. Used by tests to isolate state between
    /// cases (spec.md §9's "global mutable state" reset operation).
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Number of entries currently cached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the cache currently holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zephyr_schema::{Hooks, ModuleName, Platforms};

    fn sample(name: &str) -> Module {
        Module {
            name: ModuleName::parse(name).unwrap(),
            version: "0.0.0".into(),
            description: None,
            author: None,
            license: None,
            required_deps: vec![],
            optional_deps: vec![],
            platforms: Platforms::default(),
            priority: 100,
            files: vec![],
            hooks: Hooks::default(),
            settings: vec![],
            path: PathBuf::from("/tmp").join(name),
        }
    }

    #[test]
    fn evicts_least_recently_used_beyond_capacity() {
        let cache = ModuleCache::new(2);
        cache.insert(PathBuf::from("a"), sample("a"));
        cache.insert(PathBuf::from("b"), sample("b"));
        assert!(cache.get(&PathBuf::from("a")).is_some());
        cache.insert(PathBuf::from("c"), sample("c"));
        assert!(cache.get(&PathBuf::from("b")).is_none());
        assert!(cache.get(&PathBuf::from("a")).is_some());
        assert!(cache.get(&PathBuf::from("c")).is_some());
    }

    #[test]
    fn get_returns_independent_clone() {
        let cache = ModuleCache::new(4);
        cache.insert(PathBuf::from("a"), sample("a"));
        let mut first = cache.get(&PathBuf::from("a")).unwrap();
        first.version = "9.9.9".to_string();
        let second = cache.get(&PathBuf::from("a")).unwrap();
        assert_eq!(second.version, "0.0.0");
    }
}
