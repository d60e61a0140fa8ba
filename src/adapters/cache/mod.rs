//! Cache invalidation adapters.

mod noop;
mod redis_invalidator;

pub use noop::NoopCacheInvalidator;
pub use redis_invalidator::RedisCacheInvalidator;
