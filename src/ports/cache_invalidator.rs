//! Cache invalidation port.
//!
//! This subsystem only produces invalidations; it never reads the cache.
//! Invalidation is advisory: failures are logged, not surfaced, and the
//! staleness window is bounded by the cache TTL.

use async_trait::async_trait;

/// Port for dropping stale read caches after a mutation.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    /// Invalidate a single key.
    async fn invalidate(&self, key: &str);

    /// Invalidate every key matching a pattern (e.g. `tenant:{id}:*`).
    async fn invalidate_pattern(&self, pattern: &str);
}
