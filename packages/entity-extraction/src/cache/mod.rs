//! Cache backends and the tolerant adapter the fetcher talks to.
//!
//! Callers pick a [`CacheHandle`]: no cache, the bundled [`MemoryCache`], or
//! their own [`CacheBackend`]. The fetcher never sees a backend directly; it
//! goes through [`CacheAdapter`], which turns every backend failure into a
//! miss (for reads) or a no-op (for writes).

pub mod memory;

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::CacheResult;
use crate::types::{config::CacheOptions, metadata::MetadataRecord};

pub use memory::MemoryCache;

/// Storage for fetched metadata records.
///
/// Implementations must tolerate concurrent `get`/`set` calls; batch
/// enrichment may issue them from several in-flight fetches.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Look up a record.
    async fn get(&self, key: &str) -> CacheResult<Option<MetadataRecord>>;

    /// Store a record, optionally expiring after `ttl`.
    async fn set(
        &self,
        key: &str,
        record: &MetadataRecord,
        ttl: Option<Duration>,
    ) -> CacheResult<()>;

    /// Remove a record.
    async fn invalidate(&self, key: &str) -> CacheResult<()>;
}

/// The cache a caller hands to the fetch pipeline.
#[derive(Clone, Default)]
pub enum CacheHandle {
    /// Every read misses, every write is dropped.
    #[default]
    NoCache,
    /// The bundled in-memory cache.
    InMemory(MemoryCache),
    /// A caller-provided backend.
    External(Arc<dyn CacheBackend>),
}

impl CacheHandle {
    /// A handle to a fresh in-memory cache.
    pub fn memory() -> Self {
        CacheHandle::InMemory(MemoryCache::new())
    }

    /// Wrap a caller-provided backend.
    pub fn external(backend: impl CacheBackend + 'static) -> Self {
        CacheHandle::External(Arc::new(backend))
    }

    /// Whether reads and writes reach a backend at all.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, CacheHandle::NoCache)
    }

    fn backend(&self) -> Option<&dyn CacheBackend> {
        match self {
            CacheHandle::NoCache => None,
            CacheHandle::InMemory(cache) => Some(cache as &dyn CacheBackend),
            CacheHandle::External(backend) => Some(backend.as_ref()),
        }
    }
}

impl fmt::Debug for CacheHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheHandle::NoCache => f.write_str("NoCache"),
            CacheHandle::InMemory(cache) => f.debug_tuple("InMemory").field(&cache.len()).finish(),
            CacheHandle::External(_) => f.write_str("External(..)"),
        }
    }
}

impl From<MemoryCache> for CacheHandle {
    fn from(cache: MemoryCache) -> Self {
        CacheHandle::InMemory(cache)
    }
}

/// Caller-owned mapping from cache names to handles.
///
/// Lets configuration refer to caches by name ("memory", "redis", ...).
/// Resolving a name nobody registered yields [`CacheHandle::NoCache`]: an
/// unknown or unavailable integration disables caching instead of failing.
#[derive(Debug, Clone, Default)]
pub struct CacheRegistry {
    handles: HashMap<String, CacheHandle>,
}

impl CacheRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle under `name` (builder pattern).
    pub fn with(mut self, name: impl Into<String>, handle: CacheHandle) -> Self {
        self.register(name, handle);
        self
    }

    /// Register a handle under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, handle: CacheHandle) {
        self.handles.insert(name.into(), handle);
    }

    /// The handle registered under `name`, or `NoCache`.
    pub fn resolve(&self, name: &str) -> CacheHandle {
        self.handles.get(name).cloned().unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handles.contains_key(name)
    }
}

/// Non-failing view of an optional cache, with key and TTL policy applied.
#[derive(Clone, Copy)]
pub struct CacheAdapter<'a> {
    backend: Option<&'a dyn CacheBackend>,
    options: &'a CacheOptions,
}

impl<'a> CacheAdapter<'a> {
    /// Wrap an optional handle. `None` behaves like `NoCache`.
    pub fn new(handle: Option<&'a CacheHandle>, options: &'a CacheOptions) -> Self {
        Self {
            backend: handle.and_then(CacheHandle::backend),
            options,
        }
    }

    /// An adapter that never caches.
    pub fn disabled(options: &'a CacheOptions) -> Self {
        Self {
            backend: None,
            options,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Read a record. Backend failures read as a miss.
    pub async fn get(&self, key: &str) -> Option<MetadataRecord> {
        let backend = self.backend?;
        backend
            .get(&self.options.prefixed(key))
            .await
            .ok()
            .flatten()
    }

    /// Store a record according to the cache options.
    ///
    /// Failed records are stored only when `negative_ttl` is set. Backend
    /// failures are ignored.
    pub async fn store(&self, key: &str, record: &MetadataRecord) {
        let Some(backend) = self.backend else {
            return;
        };
        let ttl = if record.is_error() {
            match self.options.negative_ttl {
                Some(ttl) => Some(ttl),
                None => return,
            }
        } else {
            self.options.ttl
        };

        let _ = backend.set(&self.options.prefixed(key), record, ttl).await;
    }

    /// Drop a record. Backend failures are ignored.
    pub async fn invalidate(&self, key: &str) {
        if let Some(backend) = self.backend {
            let _ = backend.invalidate(&self.options.prefixed(key)).await;
        }
    }
}
