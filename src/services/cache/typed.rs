//! In-process memoization cache used by higher-level services (token
//! verification, and whatever else needs cheap get/put/evict semantics).
use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache key is required")]
    KeyRequired,
}

/// A typed cache over string keys.
///
/// A cache without a backing store is a valid operating mode, not an error:
/// every `put` becomes a no-op, every lookup a miss. Callers only have to
/// check `enabled()` when they want to log the fact.
///
/// Concurrent `get_or_produce` calls for the same key may both invoke the
/// producer; the last write wins. That race is accepted: production must be
/// idempotent and cheap for the values kept here.
pub struct TypedCache<V> {
    store: Option<Mutex<HashMap<String, V>>>,
    key_transform: Option<Box<dyn Fn(&str) -> String + Send + Sync>>,
    should_cache: Option<Box<dyn Fn(&V) -> bool + Send + Sync>>,
}

impl<V: Clone> TypedCache<V> {
    /// A cache with an in-memory backing store.
    pub fn new() -> Self {
        Self {
            store: Some(Mutex::new(HashMap::new())),
            key_transform: None,
            should_cache: None,
        }
    }

    /// A cache without a backing store; all operations are no-ops/misses.
    pub fn disabled() -> Self {
        Self {
            store: None,
            key_transform: None,
            should_cache: None,
        }
    }

    pub fn enabled_if(enabled: bool) -> Self {
        if enabled { Self::new() } else { Self::disabled() }
    }

    /// Replace the internal key transform. The external API always uses the
    /// natural key; the transform only changes what is stored internally
    /// (e.g. hashing long or sensitive keys down to a fixed size).
    pub fn with_key_transform(
        mut self,
        transform: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.key_transform = Some(Box::new(transform));
        self
    }

    /// Replace the caching predicate. By default every produced value is
    /// cached; a predicate can restrict this (or, with an `Option` value
    /// type, permit caching explicit "no value" markers).
    pub fn with_should_cache(
        mut self,
        predicate: impl Fn(&V) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.should_cache = Some(Box::new(predicate));
        self
    }

    pub fn enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Store a value, subject to the caching predicate.
    pub fn put(&self, key: &str, value: V) -> CacheResult<()> {
        let key = self.internal_key(key)?;
        let Some(store) = &self.store else {
            return Ok(());
        };
        if self.should_cache.as_ref().is_none_or(|p| p(&value)) {
            store.lock().unwrap().insert(key, value);
        }
        Ok(())
    }

    /// Look up a cached value; `None` on miss or when disabled.
    pub fn get(&self, key: &str) -> CacheResult<Option<V>> {
        let key = self.internal_key(key)?;
        let Some(store) = &self.store else {
            return Ok(None);
        };
        Ok(store.lock().unwrap().get(&key).cloned())
    }

    /// Look up a cached value, producing (and caching) it on a miss.
    ///
    /// The producer is invoked at most once per call. It runs outside the
    /// cache lock, so concurrent callers may produce the same value twice.
    pub fn get_or_produce(
        &self,
        key: &str,
        producer: impl FnOnce(&str) -> Option<V>,
    ) -> CacheResult<Option<V>> {
        if let Some(value) = self.get(key)? {
            return Ok(Some(value));
        }
        let Some(value) = producer(key) else {
            return Ok(None);
        };
        self.put(key, value.clone())?;
        Ok(Some(value))
    }

    pub fn contains(&self, key: &str) -> CacheResult<bool> {
        let key = self.internal_key(key)?;
        let Some(store) = &self.store else {
            return Ok(false);
        };
        Ok(store.lock().unwrap().contains_key(&key))
    }

    pub fn evict(&self, key: &str) -> CacheResult<()> {
        let key = self.internal_key(key)?;
        if let Some(store) = &self.store {
            store.lock().unwrap().remove(&key);
        }
        Ok(())
    }

    pub fn clear(&self) {
        if let Some(store) = &self.store {
            store.lock().unwrap().clear();
        }
    }

    // Key validation applies regardless of cache enablement.
    fn internal_key(&self, key: &str) -> CacheResult<String> {
        if key.is_empty() {
            return Err(CacheError::KeyRequired);
        }
        Ok(match &self.key_transform {
            Some(transform) => transform(key),
            None => key.to_string(),
        })
    }
}

impl<V: Clone> Default for TypedCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_roundtrip() {
        let cache = TypedCache::new();
        cache.put("k", 42).unwrap();
        assert_eq!(cache.get("k").unwrap(), Some(42));
        assert!(cache.contains("k").unwrap());
    }

    #[test]
    fn evict_and_clear_remove_entries() {
        let cache = TypedCache::new();
        cache.put("a", 1).unwrap();
        cache.put("b", 2).unwrap();
        cache.evict("a").unwrap();
        assert!(!cache.contains("a").unwrap());
        assert!(cache.contains("b").unwrap());
        cache.clear();
        assert!(!cache.contains("b").unwrap());
    }

    #[test]
    fn disabled_cache_misses_without_raising() {
        let cache = TypedCache::disabled();
        assert!(!cache.enabled());
        cache.put("k", 42).unwrap();
        assert_eq!(cache.get("k").unwrap(), None);
        assert!(!cache.contains("k").unwrap());
        cache.evict("k").unwrap();
        cache.clear();
    }

    #[test]
    fn disabled_cache_still_produces() {
        let cache = TypedCache::disabled();
        let value = cache.get_or_produce("k", |_| Some(7)).unwrap();
        assert_eq!(value, Some(7));
        assert_eq!(cache.get("k").unwrap(), None);
    }

    #[test]
    fn get_or_produce_caches_on_miss_only() {
        let cache = TypedCache::new();
        let mut calls = 0;
        let value = cache
            .get_or_produce("k", |_| {
                calls += 1;
                Some(1)
            })
            .unwrap();
        assert_eq!(value, Some(1));
        assert_eq!(calls, 1);

        let value = cache
            .get_or_produce("k", |_| {
                calls += 1;
                Some(2)
            })
            .unwrap();
        assert_eq!(value, Some(1));
        assert_eq!(calls, 1);
    }

    #[test]
    fn should_cache_predicate_filters_values() {
        let cache = TypedCache::new().with_should_cache(|v: &i32| *v >= 0);
        cache.put("neg", -1).unwrap();
        cache.put("pos", 1).unwrap();
        assert_eq!(cache.get("neg").unwrap(), None);
        assert_eq!(cache.get("pos").unwrap(), Some(1));
    }

    #[test]
    fn key_transform_is_internal_only() {
        let cache = TypedCache::new().with_key_transform(|k| format!("t:{k}"));
        cache.put("k", 1).unwrap();
        assert_eq!(cache.get("k").unwrap(), Some(1));
        // the transformed key is not part of the external API
        assert_eq!(cache.get("t:k").unwrap(), None);
    }

    #[test]
    fn empty_key_fails_even_when_disabled() {
        let enabled: TypedCache<i32> = TypedCache::new();
        let disabled: TypedCache<i32> = TypedCache::disabled();
        assert_eq!(enabled.get("").unwrap_err(), CacheError::KeyRequired);
        assert_eq!(disabled.put("", 1).unwrap_err(), CacheError::KeyRequired);
    }
}
