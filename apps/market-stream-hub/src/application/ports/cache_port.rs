//! Cache Port (Driven Port)
//!
//! Key/value store with per-key TTL and glob multi-delete. Values are
//! opaque JSON strings at this level; typed access lives in the fail-open
//! adapter that every service goes through.

use std::time::Duration;

use async_trait::async_trait;

/// Cache backend error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// Backend unreachable or the connection dropped.
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// Backend did not answer in time.
    #[error("cache operation timed out")]
    Timeout,

    /// TTL of zero or out of range for the backend.
    #[error("invalid ttl: {0:?}")]
    InvalidTtl(Duration),

    /// Glob pattern could not be compiled.
    #[error("invalid key pattern {pattern}: {message}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// Compiler message.
        message: String,
    },

    /// Value could not be encoded or decoded.
    #[error("cache serialization error: {0}")]
    Serialization(String),
}

/// Port for the shared key/value cache.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CachePort: Send + Sync {
    /// Fetch a value, `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a value for `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Delete one key.
    async fn del(&self, key: &str) -> Result<(), CacheError>;

    /// Delete every key matching a glob (`*`, `?`, `[...]`, `\` escapes).
    ///
    /// Returns the number of keys removed.
    async fn del_by_pattern(&self, pattern: &str) -> Result<u64, CacheError>;

    /// Whether a live key exists.
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;
}
