//! Fail-Open Cache Adapter
//!
//! Wraps any [`CachePort`] backend so that backend failures degrade to a
//! miss on read and a no-op on write. Cache trouble can slow a response
//! down but never change it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::application::ports::{CacheError, CachePort};
use crate::infrastructure::metrics;

/// Default per-operation deadline.
const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(2);

/// Fail-open front for a cache backend.
///
/// Implements [`CachePort`] itself and never returns `Err`.
pub struct FailOpenCache {
    backend: Arc<dyn CachePort>,
    op_timeout: Duration,
}

impl FailOpenCache {
    /// Wrap a backend with the default operation timeout.
    #[must_use]
    pub fn new(backend: Arc<dyn CachePort>) -> Self {
        Self::with_timeout(backend, DEFAULT_OP_TIMEOUT)
    }

    /// Wrap a backend with a custom operation timeout.
    #[must_use]
    pub fn with_timeout(backend: Arc<dyn CachePort>, op_timeout: Duration) -> Self {
        Self {
            backend,
            op_timeout,
        }
    }

    /// Read and deserialize a JSON value. Undecodable values are misses.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.guard("get", key, self.backend.get(key)).await??;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding undecodable cache value");
                None
            }
        }
    }

    /// Serialize and store a JSON value.
    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_string(value) {
            Ok(raw) => {
                let _ = CachePort::set(self, key, raw, ttl).await;
            }
            Err(e) => {
                metrics::record_cache_error("serialize");
                tracing::warn!(key, error = %e, "Failed to serialize cache value");
            }
        }
    }

    async fn guard<T>(
        &self,
        op: &'static str,
        key: &str,
        fut: impl Future<Output = Result<T, CacheError>> + Send,
    ) -> Option<T> {
        let error = match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => return Some(value),
            Ok(Err(e)) => e,
            Err(_) => CacheError::Timeout,
        };
        metrics::record_cache_error(op);
        tracing::warn!(op, key, error = %error, "Cache operation failed, continuing without cache");
        None
    }
}

#[async_trait]
impl CachePort for FailOpenCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.guard("get", key, self.backend.get(key)).await.flatten())
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        if ttl.is_zero() {
            tracing::debug!(key, "Ignoring cache write with zero ttl");
            return Ok(());
        }
        self.guard("set", key, self.backend.set(key, value, ttl))
            .await;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.guard("del", key, self.backend.del(key)).await;
        Ok(())
    }

    async fn del_by_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        Ok(self
            .guard("del_by_pattern", pattern, self.backend.del_by_pattern(pattern))
            .await
            .unwrap_or(0))
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self
            .guard("exists", key, self.backend.exists(key))
            .await
            .unwrap_or(false))
    }
}
