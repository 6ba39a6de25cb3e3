//! Configuration types for fetching, caching and enrichment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a single metadata fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOptions {
    /// Request timeout covering connect, headers and body.
    ///
    /// Default: 10 seconds.
    pub timeout: Duration,

    /// User agent sent with every request.
    pub user_agent: String,

    /// Maximum number of redirects followed. Default: 5.
    pub max_redirects: usize,

    /// Maximum number of body bytes read; the rest is discarded.
    ///
    /// Default: 1 MiB.
    pub max_body_bytes: usize,

    /// Reject URLs whose host is loopback, private or link-local.
    ///
    /// Default: false.
    pub block_private_hosts: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: format!("entity-extraction/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: 5,
            max_body_bytes: 1024 * 1024,
            block_private_hosts: false,
        }
    }
}

impl FetchOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the redirect limit.
    pub fn with_max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// Set the body size cap.
    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }

    /// Enable or disable private host blocking.
    pub fn with_block_private_hosts(mut self, block: bool) -> Self {
        self.block_private_hosts = block;
        self
    }
}

/// How fetched records are stored in the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheOptions {
    /// Lifetime of successful records. `None` keeps them until invalidated.
    pub ttl: Option<Duration>,

    /// Prefix prepended to every cache key, for shared external caches.
    pub key_prefix: Option<String>,

    /// Lifetime of failed records. `None` (the default) never caches
    /// failures, so the next call retries the network.
    pub negative_ttl: Option<Duration>,
}

impl CacheOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expire successful records after `ttl`.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Prefix every key.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Cache failed fetches for `ttl`.
    pub fn with_negative_ttl(mut self, ttl: Duration) -> Self {
        self.negative_ttl = Some(ttl);
        self
    }

    /// Apply the key prefix.
    pub fn prefixed(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{prefix}{key}"),
            None => key.to_string(),
        }
    }
}

/// Configuration for enriching a batch of links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichOptions {
    /// Maximum fetches in flight. Default: 1 (sequential).
    ///
    /// Values above 1 require a cache backend that tolerates concurrent
    /// `get`/`set`, which every [`CacheBackend`](crate::CacheBackend) must.
    pub concurrency: usize,

    /// Overall deadline for the batch. Links still pending when it elapses
    /// get a `timeout` error. Default: none.
    pub deadline: Option<Duration>,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            deadline: None,
        }
    }
}

impl EnrichOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of concurrent fetches (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the overall batch deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}
