use moka::sync::Cache;

use crate::{ObjectStore, ObjectStoreError};

/// Memoizes lookups per (commit, path), including "not found" answers.
/// Errors are not cached. Concurrent misses on one key share a single fetch.
pub struct CachedObjectStore<S> {
    inner: S,
    cache: Cache<(String, String), Option<String>>,
}

impl<S: ObjectStore> CachedObjectStore<S> {
    pub const DEFAULT_CAPACITY: u64 = 4_096;

    pub fn new(inner: S) -> Self {
        Self::with_capacity(inner, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: S, capacity: u64) -> Self {
        Self {
            inner,
            cache: Cache::builder().max_capacity(capacity).build(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

impl<S: ObjectStore> ObjectStore for CachedObjectStore<S> {
    fn file_at(&self, commit: &str, path: &str) -> Result<Option<String>, ObjectStoreError> {
        let key = (commit.to_string(), path.to_string());
        self.cache
            .try_get_with(key, || self.inner.file_at(commit, path))
            .map_err(|err| (*err).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStore {
        calls: AtomicUsize,
    }

    impl ObjectStore for CountingStore {
        fn file_at(&self, commit: &str, path: &str) -> Result<Option<String>, ObjectStoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match path {
                "missing.sql" => Ok(None),
                "broken.sql" => Err(ObjectStoreError::Parse("corrupt".to_string())),
                _ => Ok(Some(format!("{commit}:{path}"))),
            }
        }
    }

    fn store() -> CachedObjectStore<CountingStore> {
        CachedObjectStore::new(CountingStore {
            calls: AtomicUsize::new(0),
        })
    }

    #[test]
    fn repeated_lookups_hit_the_inner_store_once() {
        let cached = store();
        for _ in 0..3 {
            assert_eq!(
                cached.file_at("abc", "schema.sql").unwrap(),
                Some("abc:schema.sql".to_string())
            );
        }
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 1);

        cached.file_at("def", "schema.sql").unwrap();
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn not_found_is_cached_but_errors_are_not() {
        let cached = store();
        assert_eq!(cached.file_at("abc", "missing.sql").unwrap(), None);
        assert_eq!(cached.file_at("abc", "missing.sql").unwrap(), None);
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 1);

        assert!(cached.file_at("abc", "broken.sql").is_err());
        assert!(cached.file_at("abc", "broken.sql").is_err());
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 3);
    }
}
