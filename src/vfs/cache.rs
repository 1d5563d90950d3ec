//! Path cache: a bounded LRU from canonical absolute paths to inode ids with
//! an optional TTL. Invalidation is per-path or per-subtree, never per-inode,
//! so removing one hard link leaves the surviving siblings cached.

use moka::sync::Cache;
use tracing::{debug, trace};

use crate::config::CacheConfig;

pub(crate) struct PathCache {
    inner: Option<Cache<String, i64>>,
}

impl PathCache {
    pub(crate) fn new(config: &CacheConfig) -> Self {
        if !config.enabled {
            return Self { inner: None };
        }

        let mut builder = Cache::builder()
            .max_capacity(config.max_entries)
            .support_invalidation_closures();
        if let Some(ttl) = config.ttl.filter(|ttl| !ttl.is_zero()) {
            builder = builder.time_to_live(ttl);
        }
        Self {
            inner: Some(builder.build()),
        }
    }

    pub(crate) fn get(&self, path: &str) -> Option<i64> {
        self.inner.as_ref()?.get(path)
    }

    pub(crate) fn insert(&self, path: String, ino: i64) {
        if let Some(cache) = &self.inner {
            trace!("path cache insert: {path} -> {ino}");
            cache.insert(path, ino);
        }
    }

    pub(crate) fn invalidate(&self, path: &str) {
        if let Some(cache) = &self.inner {
            cache.invalidate(path);
        }
    }

    /// Remove the path itself and every cached descendant (`path/` prefix).
    pub(crate) fn invalidate_subtree(&self, path: &str) {
        let Some(cache) = &self.inner else {
            return;
        };
        let exact = path.to_string();
        let prefix = if path == "/" {
            "/".to_string()
        } else {
            format!("{path}/")
        };
        let result = cache.invalidate_entries_if(move |key, _| {
            key == &exact || key.starts_with(&prefix)
        });
        if let Err(err) = result {
            debug!("subtree invalidation predicate rejected ({err}); dropping all entries");
            cache.invalidate_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn enabled(max_entries: u64, ttl: Option<Duration>) -> PathCache {
        PathCache::new(&CacheConfig {
            enabled: true,
            max_entries,
            ttl,
        })
    }

    #[test]
    fn test_disabled_cache_is_inert() {
        let cache = PathCache::new(&CacheConfig::default());
        cache.insert("/a".to_string(), 2);
        assert_eq!(cache.get("/a"), None);
    }

    #[test]
    fn test_insert_get_invalidate() {
        let cache = enabled(16, None);
        cache.insert("/a".to_string(), 2);
        assert_eq!(cache.get("/a"), Some(2));
        cache.invalidate("/a");
        assert_eq!(cache.get("/a"), None);
    }

    #[test]
    fn test_subtree_invalidation_spares_siblings() {
        let cache = enabled(16, None);
        cache.insert("/d".to_string(), 2);
        cache.insert("/d/x".to_string(), 3);
        cache.insert("/d/x/y".to_string(), 4);
        cache.insert("/dx".to_string(), 5);
        cache.invalidate_subtree("/d");
        assert_eq!(cache.get("/d"), None);
        assert_eq!(cache.get("/d/x"), None);
        assert_eq!(cache.get("/d/x/y"), None);
        assert_eq!(cache.get("/dx"), Some(5));
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = enabled(16, Some(Duration::from_millis(20)));
        cache.insert("/a".to_string(), 2);
        assert_eq!(cache.get("/a"), Some(2));
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get("/a"), None);
    }
}
