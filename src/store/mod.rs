//! Shared key-value store abstraction.
//!
//! Every piece of mutable state in the bot (OAuth tokens, cooldown timestamps,
//! the shoutout queue) lives in an external key-value store so that concurrent
//! request handlers and the queue-drain task all see the same values. This
//! module defines the [`KvStore`] trait covering the handful of primitives the
//! bot relies on, and re-exports the Redis-backed implementation.
//!
//! # Modules
//!
//! - `redis` - Redis implementation of [`KvStore`] over a shared connection manager
//!
//! # Concurrency
//!
//! The store offers no transactions. Callers must restrict themselves to the
//! atomic single-element list operations exposed here for queue manipulation;
//! reading a whole list, filtering it and writing it back is not safe when
//! several invocations race on the same key.

use std::fmt;

use mockall::automock;

#[cfg(test)]
mod memory;
mod redis;

#[cfg(test)]
pub use crate::store::memory::MemoryStore;
pub use crate::store::redis::RedisStore;

/// Errors that can occur when talking to the key-value store.
///
/// A store failure is fatal for the current operation: without the store the
/// bot cannot determine cooldown state, so callers propagate this error
/// instead of guessing.
///
/// # Variants
///
/// * `Unavailable` - The store could not be reached or rejected the command.
#[derive(Debug)]
pub enum StoreError {
    /// The store could not be reached or the command failed.
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(reason) => {
                write!(f, "key-value store unavailable: {}", reason)
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Minimal key-value store interface shared by all bot components.
///
/// This trait abstracts the store operations for easier testing with mocks.
/// Values are plain strings; callers are responsible for encoding timestamps
/// and other scalars.
#[automock]
pub trait KvStore {
    /// Reads the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Writes `value` under `key`, overwriting any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Appends `value` at the tail of the list stored under `key`.
    async fn list_push_tail(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Inserts `value` at the head of the list stored under `key`.
    async fn list_push_head(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Removes and returns the head of the list stored under `key`.
    async fn list_pop_head(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Returns the full content of the list stored under `key`.
    async fn list_range(&self, key: &str) -> Result<Vec<String>, StoreError>;
}
