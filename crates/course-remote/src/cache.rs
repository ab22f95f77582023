//! Read-through cache of collection listings
//!
//! Listing a collection is memoized for the rest of the run. Each collection
//! has its own slot lock, so concurrent workers asking for the same listing
//! wait for a single fetch instead of racing, while unrelated collections
//! are fetched in parallel.
//!
//! Mutating calls return a [`Mutation`] naming the listing they made stale;
//! applying it to the cache is how the caller gets at the result.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::trace;

use crate::api::Api;
use crate::error::Result;
use crate::resource::{Collection, RemoteResource};

/// Identifies one cached listing (the collection's URL path).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The result of a remote write together with the listing it invalidated.
#[derive(Debug)]
#[must_use = "the cached listing stays stale until the mutation is applied"]
pub struct Mutation<T> {
    value: T,
    stale: CacheKey,
}

impl<T> Mutation<T> {
    pub fn new(value: T, stale: CacheKey) -> Self {
        Self { value, stale }
    }

    pub fn stale(&self) -> &CacheKey {
        &self.stale
    }

    /// Invalidate the stale listing and hand back the result.
    pub fn apply(self, cache: &CollectionCache) -> T {
        cache.invalidate(&self.stale);
        self.value
    }
}

type Listing = Arc<Vec<RemoteResource>>;
type Slot = Arc<Mutex<Option<Listing>>>;

/// Memoized collection listings shared by all workers of a run.
#[derive(Debug, Default)]
pub struct CollectionCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl CollectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the memoized listing for `key`, running `fetch` on a miss.
    ///
    /// A failed fetch is not memoized.
    pub fn get_or_fetch<F>(&self, key: &CacheKey, fetch: F) -> Result<Listing>
    where
        F: FnOnce() -> Result<Vec<RemoteResource>>,
    {
        let slot = {
            let mut slots = lock(&self.slots);
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        let mut guard = lock(&slot);
        if let Some(listing) = guard.as_ref() {
            trace!(key = %key, "Cache hit");
            return Ok(Arc::clone(listing));
        }

        trace!(key = %key, "Cache miss");
        let listing = Arc::new(fetch()?);
        *guard = Some(Arc::clone(&listing));
        Ok(listing)
    }

    /// List a collection through the cache.
    pub fn list(&self, api: &Api, collection: &Collection) -> Result<Listing> {
        self.get_or_fetch(&collection.cache_key(), || api.list(collection))
    }

    /// Drop one listing.
    pub fn invalidate(&self, key: &CacheKey) {
        let slot = lock(&self.slots).remove(key);
        if slot.is_some() {
            trace!(key = %key, "Cache invalidated");
        }
    }

    /// Drop every listing at or below a path prefix (e.g. all modules of a
    /// course and their items).
    pub fn invalidate_prefix(&self, prefix: &str) {
        let mut slots = lock(&self.slots);
        slots.retain(|k, _| {
            let below = k.0 == prefix || k.0.starts_with(&format!("{prefix}/"));
            !below
        });
    }

    /// Whether a listing is currently memoized.
    pub fn contains(&self, key: &CacheKey) -> bool {
        let slot = lock(&self.slots).get(key).cloned();
        slot.is_some_and(|s| lock(&s).is_some())
    }
}

/// Lock a mutex, recovering the data if a worker panicked while holding it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ResourceKind, ResourcePath};
    use serde_json::json;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn pages() -> Collection {
        ResourcePath::course(1).collection(ResourceKind::Page)
    }

    fn listing(n: usize) -> Result<Vec<RemoteResource>> {
        (0..n)
            .map(|i| pages().resource(json!({"url": format!("p{i}"), "title": format!("P{i}")})))
            .collect()
    }

    #[test]
    fn second_lookup_is_memoized() {
        let cache = CollectionCache::new();
        let key = pages().cache_key();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let got = cache
                .get_or_fetch(&key, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    listing(2)
                })
                .unwrap();
            assert_eq!(got.len(), 2);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn applying_a_mutation_invalidates() {
        let cache = CollectionCache::new();
        let key = pages().cache_key();
        cache.get_or_fetch(&key, || listing(1)).unwrap();
        assert!(cache.contains(&key));

        let created = Mutation::new("new page", key.clone()).apply(&cache);

        assert_eq!(created, "new page");
        assert!(!cache.contains(&key));
        let refetched = cache.get_or_fetch(&key, || listing(2)).unwrap();
        assert_eq!(refetched.len(), 2);
    }

    #[test]
    fn failed_fetch_is_not_memoized() {
        let cache = CollectionCache::new();
        let key = pages().cache_key();
        let err = cache.get_or_fetch(&key, || {
            Err(crate::Error::unexpected("courses/1/pages", "boom"))
        });
        assert!(err.is_err());
        assert!(!cache.contains(&key));
    }

    #[test]
    fn prefix_invalidation_is_scoped() {
        let cache = CollectionCache::new();
        let a = CacheKey::new("courses/1/modules");
        let b = CacheKey::new("courses/1/modules/5/items");
        let c = CacheKey::new("courses/12/modules");
        for key in [&a, &b, &c] {
            cache.get_or_fetch(key, || Ok(Vec::new())).unwrap();
        }

        cache.invalidate_prefix("courses/1");

        assert!(!cache.contains(&a));
        assert!(!cache.contains(&b));
        assert!(cache.contains(&c));
    }

    #[test]
    fn concurrent_misses_fetch_once() {
        let cache = Arc::new(CollectionCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .get_or_fetch(&pages().cache_key(), || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(std::time::Duration::from_millis(20));
                            listing(3)
                        })
                        .unwrap()
                        .len()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 3);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
