//! In-memory cache backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::cache::CacheBackend;
use crate::error::{CacheError, CacheResult};
use crate::types::metadata::MetadataRecord;

#[derive(Debug, Clone)]
struct CachedEntry {
    record: MetadataRecord,
    expires_at: Option<DateTime<Utc>>,
}

impl CachedEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// In-memory metadata cache with optional per-entry expiry.
///
/// Clones share the same storage, so one instance can be handed to several
/// facades. Data is lost when the last clone is dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, CachedEntry>>>,
}

impl MemoryCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries. Expired ones count until the next read of
    /// their key or the next write.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a live entry exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .map(|e| e.get(key).is_some_and(|entry| entry.is_live(Utc::now())))
            .unwrap_or(false)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<MetadataRecord>> {
        let now = Utc::now();
        let (found, expired) = {
            let entries = self.entries.read().map_err(|_| CacheError::Poisoned)?;
            match entries.get(key) {
                Some(entry) if entry.is_live(now) => (Some(entry.record.clone()), false),
                Some(_) => (None, true),
                None => (None, false),
            }
        };

        if expired {
            self.entries
                .write()
                .map_err(|_| CacheError::Poisoned)?
                .remove(key);
        }
        Ok(found)
    }

    async fn set(
        &self,
        key: &str,
        record: &MetadataRecord,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let now = Utc::now();
        let expires_at = ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .and_then(|ttl| now.checked_add_signed(ttl));

        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        // Sweep so keys that are never read again do not pile up
        entries.retain(|_, entry| entry.is_live(now));
        entries.insert(
            key.to_string(),
            CachedEntry {
                record: record.clone(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> CacheResult<()> {
        self.entries
            .write()
            .map_err(|_| CacheError::Poisoned)?
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> MetadataRecord {
        MetadataRecord::new().with_property("title", "Cached")
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = MemoryCache::new();
        cache.set("k", &record(), None).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), Some(record()));
        assert!(cache.contains("k"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("nope").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_expired_entries_miss_and_are_evicted() {
        let cache = MemoryCache::new();
        cache.set("k", &record(), Some(Duration::ZERO)).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_writes_sweep_unread_expired_entries() {
        let cache = MemoryCache::new();
        for i in 0..10 {
            cache
                .set(&format!("old-{i}"), &record(), Some(Duration::ZERO))
                .await
                .unwrap();
        }
        cache.set("fresh", &record(), None).await.unwrap();

        assert_eq!(cache.len(), 1);
        assert!(cache.contains("fresh"));
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache = MemoryCache::new();
        cache.set("a", &record(), None).await.unwrap();
        cache.set("b", &record(), None).await.unwrap();

        cache.invalidate("a").await.unwrap();
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let cache = MemoryCache::new();
        let other = cache.clone();
        cache.set("k", &record(), None).await.unwrap();
        assert!(other.contains("k"));
    }
}
