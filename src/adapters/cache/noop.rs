//! No-op cache invalidator for tests and cacheless deployments.

use async_trait::async_trait;

use crate::ports::CacheInvalidator;

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCacheInvalidator;

#[async_trait]
impl CacheInvalidator for NoopCacheInvalidator {
    async fn invalidate(&self, _key: &str) {}

    async fn invalidate_pattern(&self, _pattern: &str) {}
}
