use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use tracing::{debug, info};

use super::CacheStore;
use crate::config::{ConfigLoadError, RedisConfig};
use crate::error::CacheError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Redis-backed [`CacheStore`] holding one connection for the lifetime of a
/// batch. Dropping it closes the connection.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("connection", &"ConnectionManager")
            .finish()
    }
}

impl RedisCache {
    pub async fn connect(config: &RedisConfig) -> Result<Self, CacheError> {
        info!("Connecting to Redis cache at {}", config.redacted());

        let url = config.connection_url().map_err(|e: ConfigLoadError| {
            CacheError::Unavailable(e.to_string())
        })?;
        let client = redis::Client::open(url).map_err(|e| {
            CacheError::Unavailable(format!("failed to create Redis client: {e}"))
        })?;

        let manager_config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(Some(CONNECT_TIMEOUT));
        let conn = ConnectionManager::new_with_config(client, manager_config)
            .await
            .map_err(|e| {
                CacheError::Unavailable(format!("failed to connect to Redis: {e}"))
            })?;

        info!("Connected to Redis cache");
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        debug!("Cache GET: {}", key);
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        debug!("Cache SET: {}", key);
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }
}
