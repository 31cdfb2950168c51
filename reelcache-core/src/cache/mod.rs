//! Key-value cache client.
//!
//! Every failure here is survivable: callers treat read errors as misses and
//! write errors as log lines. [`CacheError::is_connection`] tells a caller to
//! stop reading altogether for the rest of the batch.

mod redis_store;

pub use self::redis_store::RedisCache;

use async_trait::async_trait;
use tracing::warn;

use crate::config::RedisConfig;
use crate::error::CacheError;

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
}

/// Connect the cache for one batch. `None` when caching is not configured or
/// the store cannot be reached; the batch then treats every key as a miss.
pub async fn open(config: Option<&RedisConfig>) -> Option<RedisCache> {
    let config = config?;
    match RedisCache::connect(config).await {
        Ok(cache) => Some(cache),
        Err(err) => {
            warn!(error = %err, "Unable to connect to cache, continuing without it");
            None
        }
    }
}
