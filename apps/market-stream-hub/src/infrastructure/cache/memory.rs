//! In-process cache backend with per-key expiry.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::time::Instant;

use crate::application::ports::{CacheError, CachePort};

use super::glob;

/// Entry count above which a write sweeps expired entries first.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-memory cache backend.
///
/// Expired entries are invisible to every operation and reclaimed lazily.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.read().values().filter(|e| e.is_live(now)).count()
    }

    /// Whether no live entries remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| e.is_live(now));
        before - entries.len()
    }
}

#[async_trait]
impl CachePort for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let entries = self.entries.read();
        Ok(entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl(ttl));
        }
        let now = Instant::now();
        let mut entries = self.entries.write();
        if entries.len() >= SWEEP_THRESHOLD {
            entries.retain(|_, e| e.is_live(now));
        }
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().remove(key);
        Ok(())
    }

    async fn del_by_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let matcher = glob::compile(pattern)?;
        let now = Instant::now();
        let mut removed = 0u64;
        self.entries.write().retain(|key, entry| {
            if !matcher.is_match(key) {
                return true;
            }
            if entry.is_live(now) {
                removed += 1;
            }
            false
        });
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let now = Instant::now();
        Ok(self.entries.read().get(key).is_some_and(|e| e.is_live(now)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let cache = MemoryCache::new();

        cache
            .set("stock:TCS.NS", "{\"price\":1}".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            cache.get("stock:TCS.NS").await.unwrap().as_deref(),
            Some("{\"price\":1}")
        );
        assert!(cache.exists("stock:TCS.NS").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = MemoryCache::new();
        cache
            .set("market:status", "x".to_string(), Duration::from_secs(30))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(cache.exists("market:status").await.unwrap());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("market:status").await.unwrap().is_none());
        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn zero_ttl_is_rejected() {
        let cache = MemoryCache::new();

        let err = cache.set("k", "v".to_string(), Duration::ZERO).await;

        assert!(matches!(err, Err(CacheError::InvalidTtl(_))));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn pattern_delete_removes_matching_keys() {
        let cache = MemoryCache::new();
        for key in ["tick:TCS.NS", "tick:INFY.NS", "stock:TCS.NS"] {
            cache
                .set(key, "1".to_string(), Duration::from_secs(60))
                .await
                .unwrap();
        }

        assert_eq!(cache.del_by_pattern("tick:*").await.unwrap(), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.exists("stock:TCS.NS").await.unwrap());
    }

    #[tokio::test]
    async fn del_removes_single_key() {
        let cache = MemoryCache::new();
        cache
            .set("k", "v".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        cache.del("k").await.unwrap();
        cache.del("missing").await.unwrap();

        assert!(!cache.exists("k").await.unwrap());
    }
}
