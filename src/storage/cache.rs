use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use async_trait::async_trait;
use lru::LruCache;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::Result;
use crate::feed::Article;
use crate::storage::traits::CacheStore;

/// Longest lifetime an entry can be given; longer TTLs are clamped to this.
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Cache entry with expiration tracking
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub expires_at: SystemTime,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, ttl: Duration) -> Self {
        let now = SystemTime::now();
        Self {
            data,
            expires_at: now.checked_add(ttl.min(MAX_TTL)).unwrap_or(now),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(SystemTime::now())
    }

    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        now >= self.expires_at
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub total_entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 1000 }
    }
}

/// In-memory result cache with LRU eviction and per-entry TTL.
#[derive(Clone)]
pub struct ResultCache {
    cache: Arc<RwLock<LruCache<String, CacheEntry<Vec<Article>>>>>,
    stats: Arc<RwLock<CacheStats>>,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl ResultCache {
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);

        Self {
            cache: Arc::new(RwLock::new(LruCache::new(capacity))),
            stats: Arc::new(RwLock::new(CacheStats::default())),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(CacheConfig { max_entries: capacity })
    }

    pub fn get(&self, key: &str) -> Option<Vec<Article>> {
        let mut cache = self.cache.write();
        let mut stats = self.stats.write();

        if let Some(entry) = cache.get(key) {
            if entry.is_expired() {
                cache.pop(key);
                stats.expirations += 1;
                stats.misses += 1;
                stats.total_entries = cache.len();
                trace!("Cache entry {} expired", key);
                return None;
            }

            stats.hits += 1;
            Some(entry.data.clone())
        } else {
            stats.misses += 1;
            None
        }
    }

    pub fn put_with_ttl(&self, key: String, articles: Vec<Article>, ttl: Duration) {
        let entry = CacheEntry::new(articles, ttl);
        let mut cache = self.cache.write();
        let mut stats = self.stats.write();

        // push() hands back the displaced LRU entry, or the old value on key replacement
        if let Some((evicted_key, _)) = cache.push(key.clone(), entry) {
            if evicted_key != key {
                stats.evictions += 1;
            }
        }

        stats.total_entries = cache.len();
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut cache = self.cache.write();
        let mut stats = self.stats.write();
        let now = SystemTime::now();

        let expired_keys: Vec<String> = cache
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();
        for key in expired_keys {
            cache.pop(&key);
            stats.expirations += 1;
        }

        stats.total_entries = cache.len();
        count
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.read().clone()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.cache.read().contains(key)
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

#[async_trait]
impl CacheStore for ResultCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<Article>>> {
        let result = ResultCache::get(self, key);

        let stats = self.stats();
        debug!(
            "Result cache: {} hits, {} misses ({:.0}% hit rate), {} entries",
            stats.hits,
            stats.misses,
            stats.hit_rate() * 100.0,
            stats.total_entries
        );
        Ok(result)
    }

    /// Purges expired entries before inserting.
    async fn set(&self, key: &str, value: Vec<Article>, ttl: Duration) -> Result<()> {
        let purged = self.cleanup_expired();
        if purged > 0 {
            debug!("Purged {} expired cache entries", purged);
        }

        self.put_with_ttl(key.to_string(), value, ttl);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(n: usize) -> Article {
        Article::new(
            format!("Article {}", n),
            format!("https://example.com/{}", n),
            "Fri, 15 Mar 2024 10:00:00 GMT",
        )
    }

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn test_put_and_get() {
        let cache = ResultCache::with_capacity(10);
        cache.put_with_ttl("k".to_string(), vec![article(1), article(2)], MINUTE);

        let cached = cache.get("k").unwrap();
        assert_eq!(cached, vec![article(1), article(2)]);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_empty_result_is_distinct_from_absent() {
        let cache = ResultCache::with_capacity(10);
        cache.put_with_ttl("empty".to_string(), Vec::new(), MINUTE);

        assert_eq!(cache.get("empty"), Some(Vec::new()));
        assert_eq!(cache.get("missing"), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_expired_entries_are_misses() {
        let cache = ResultCache::with_capacity(10);
        cache.put_with_ttl("k".to_string(), vec![article(1)], Duration::ZERO);

        assert!(cache.get("k").is_none());
        assert!(!cache.contains("k"));

        let stats = cache.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_lru_eviction() {
        let cache = ResultCache::with_capacity(2);
        cache.put_with_ttl("a".to_string(), vec![article(1)], MINUTE);
        cache.put_with_ttl("b".to_string(), vec![article(2)], MINUTE);

        // touch "a" so "b" is least recently used
        assert!(cache.get("a").is_some());
        cache.put_with_ttl("c".to_string(), vec![article(3)], MINUTE);

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_overwrite_is_not_an_eviction() {
        let cache = ResultCache::with_capacity(2);
        cache.put_with_ttl("a".to_string(), vec![article(1)], MINUTE);
        cache.put_with_ttl("a".to_string(), vec![article(2)], MINUTE);

        assert_eq!(cache.get("a"), Some(vec![article(2)]));
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cleanup_expired() {
        let cache = ResultCache::with_capacity(10);
        cache.put_with_ttl("stale".to_string(), vec![article(1)], Duration::ZERO);
        cache.put_with_ttl("fresh".to_string(), vec![article(2)], MINUTE);

        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("fresh"));
    }

    #[test]
    fn test_huge_ttl_is_clamped() {
        let cache = ResultCache::with_capacity(10);
        cache.put_with_ttl("k".to_string(), vec![article(1)], Duration::from_secs(u64::MAX));

        assert_eq!(cache.get("k"), Some(vec![article(1)]));

        let entry = CacheEntry::new((), Duration::MAX);
        assert!(!entry.is_expired());
        assert!(entry.expires_at <= SystemTime::now() + MAX_TTL);
    }

    #[tokio::test]
    async fn test_cache_store_impl() {
        let cache = ResultCache::with_capacity(10);
        let store: &dyn CacheStore = &cache;

        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", vec![article(7)], MINUTE).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(vec![article(7)]));
    }

    #[tokio::test]
    async fn test_store_write_purges_expired_entries() {
        let cache = ResultCache::with_capacity(10);
        cache.put_with_ttl("stale".to_string(), vec![article(1)], Duration::ZERO);
        assert_eq!(cache.len(), 1);

        let store: &dyn CacheStore = &cache;
        store.set("fresh", vec![article(2)], MINUTE).await.unwrap();

        assert!(!cache.contains("stale"));
        assert!(cache.contains("fresh"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_hit_rate() {
        let cache = ResultCache::with_capacity(10);
        cache.put_with_ttl("k".to_string(), vec![], MINUTE);
        let _ = cache.get("k");
        let _ = cache.get("other");

        assert!((cache.stats().hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
