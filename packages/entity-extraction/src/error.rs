//! Typed errors for the entity extraction library.
//!
//! Only [`ExtractionError`] ever reaches a caller as an `Err`. Fetch errors
//! become the `error` entry of a [`MetadataRecord`](crate::MetadataRecord)
//! and cache errors degrade to a cache miss.

use thiserror::Error;

/// Errors surfaced to callers of the extraction API.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    /// An extraction kind name that is not part of the closed set
    #[error("unknown extraction kind: {name}")]
    UnknownKind { name: String },

    /// Invalid configuration value
    #[error("config error: {0}")]
    Config(String),
}

/// Errors that can occur while fetching page metadata.
///
/// The `Display` output is the value stored under the `error` key of a
/// failed record, so keep it short and stable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// URL has no scheme or host, or the scheme is not fetchable
    #[error("invalid_url")]
    InvalidUrl,

    /// Host resolves to a loopback, private or link-local address
    #[error("blocked_host")]
    BlockedHost(String),

    /// Server answered with a non-success status
    #[error("http_{0}")]
    Status(u16),

    /// Request or batch deadline elapsed
    #[error("timeout")]
    Timeout,

    /// Transport failure (DNS, connection refused, reset, ...)
    #[error("request_failed: {0}")]
    Request(String),

    /// HTTP client could not be constructed
    #[error("client_error: {0}")]
    Client(String),
}

impl FetchError {
    /// Whether this failure may be stored by negative caching.
    ///
    /// Validation failures never reach the cache at all.
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, FetchError::InvalidUrl | FetchError::BlockedHost(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        // A redirect policy refusal carries our own error as its source
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            if let Some(fetch) = inner.downcast_ref::<FetchError>() {
                return fetch.clone();
            }
            source = inner.source();
        }

        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

/// Errors reported by cache backends.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Backend operation failed
    #[error("cache backend error: {0}")]
    Backend(String),

    /// A lock guarding the cache was poisoned
    #[error("cache lock poisoned")]
    Poisoned,
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display_is_record_value() {
        assert_eq!(FetchError::InvalidUrl.to_string(), "invalid_url");
        assert_eq!(FetchError::Status(404).to_string(), "http_404");
        assert_eq!(FetchError::Timeout.to_string(), "timeout");
        assert_eq!(
            FetchError::Request("connection refused".into()).to_string(),
            "request_failed: connection refused"
        );
    }

    #[test]
    fn test_validation_failures_are_not_cacheable() {
        assert!(!FetchError::InvalidUrl.is_cacheable());
        assert!(!FetchError::BlockedHost("127.0.0.1".into()).is_cacheable());
        assert!(FetchError::Status(500).is_cacheable());
        assert!(FetchError::Timeout.is_cacheable());
    }
}
