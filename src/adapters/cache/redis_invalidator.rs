//! Redis-backed cache invalidator.
//!
//! Fire-and-forget: invalidation never blocks or fails the mutation that
//! triggered it. A Redis outage means readers see stale entries until their
//! TTL runs out, nothing worse.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::ports::CacheInvalidator;

/// Cache invalidator over a multiplexed Redis connection.
#[derive(Clone)]
pub struct RedisCacheInvalidator {
    conn: MultiplexedConnection,
}

impl RedisCacheInvalidator {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl CacheInvalidator for RedisCacheInvalidator {
    async fn invalidate(&self, key: &str) {
        let mut conn = self.conn.clone();
        if let Err(e) = conn.del::<_, ()>(key).await {
            tracing::warn!(key, error = %e, "Cache invalidation failed");
        }
    }

    async fn invalidate_pattern(&self, pattern: &str) {
        let mut conn = self.conn.clone();
        // SCAN rather than KEYS: no full keyspace block on a shared instance.
        let keys: Vec<String> = {
            let mut found = Vec::new();
            let mut iter = match conn.scan_match::<_, String>(pattern).await {
                Ok(iter) => iter,
                Err(e) => {
                    tracing::warn!(pattern, error = %e, "Cache scan failed");
                    return;
                }
            };
            while let Some(key) = iter.next_item().await {
                found.push(key);
            }
            found
        };

        if keys.is_empty() {
            return;
        }
        if let Err(e) = conn.del::<_, ()>(keys).await {
            tracing::warn!(pattern, error = %e, "Cache invalidation failed");
        }
    }
}
