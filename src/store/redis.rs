//! Redis implementation of the key-value store.
//!
//! This module provides the [`RedisStore`] struct backed by a
//! [`redis::aio::ConnectionManager`], which transparently reconnects on
//! connection loss. The manager is cheap to clone, so each operation works on
//! its own handle and the store can be shared freely across tasks.

use log::debug;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::store::{KvStore, StoreError};

impl From<redis::RedisError> for StoreError {
    fn from(error: redis::RedisError) -> Self {
        StoreError::Unavailable(error.to_string())
    }
}

/// Redis-backed [`KvStore`].
///
/// # Examples
///
/// ```no_run
/// # use shoutbot::store::RedisStore;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = RedisStore::connect("redis://127.0.0.1/").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisStore {
    /// Shared connection manager, reconnects on failure
    manager: ConnectionManager,
}

impl RedisStore {
    /// Connects to the Redis instance at `url` and initializes the connection
    /// manager.
    ///
    /// # Arguments
    ///
    /// * `url` - Redis connection string, e.g. `redis://127.0.0.1/`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the URL cannot be parsed or the
    /// initial connection fails.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(RedisStore { manager })
    }
}

impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut connection = self.manager.clone();
        let value: Option<String> = connection.get(key).await?;
        debug!("GET {} -> {:?}", key, value);
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut connection = self.manager.clone();
        debug!("SET {} -> {}", key, value);
        let _: () = connection.set(key, value).await?;
        Ok(())
    }

    async fn list_push_tail(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut connection = self.manager.clone();
        debug!("RPUSH {} -> {}", key, value);
        let _: i64 = connection.rpush(key, value).await?;
        Ok(())
    }

    async fn list_push_head(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut connection = self.manager.clone();
        debug!("LPUSH {} -> {}", key, value);
        let _: i64 = connection.lpush(key, value).await?;
        Ok(())
    }

    async fn list_pop_head(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut connection = self.manager.clone();
        let value: Option<String> = connection.lpop(key, None).await?;
        debug!("LPOP {} -> {:?}", key, value);
        Ok(value)
    }

    async fn list_range(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let mut connection = self.manager.clone();
        let values: Vec<String> = connection.lrange(key, 0, -1).await?;
        debug!("LRANGE {} -> {} entries", key, values.len());
        Ok(values)
    }
}
