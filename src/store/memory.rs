//! In-memory implementation of the key-value store, for tests.
//!
//! Backs the [`KvStore`] trait with a plain map guarded by a mutex. Unlike
//! the mock generated from the trait, this fake keeps real state between
//! calls, which makes queue-ordering and token round-trip tests readable.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::store::{KvStore, StoreError};

/// In-memory [`KvStore`] sharing its state across clones.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    values: HashMap<String, String>,
    lists: HashMap<String, VecDeque<String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn list_push_tail(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .lists
            .entry(key.to_string())
            .or_default()
            .push_back(value.to_string());
        Ok(())
    }

    async fn list_push_head(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .lists
            .entry(key.to_string())
            .or_default()
            .push_front(value.to_string());
        Ok(())
    }

    async fn list_pop_head(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner.lists.get_mut(key).and_then(|list| list.pop_front()))
    }

    async fn list_range(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .lists
            .get(key)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set() {
        let store = MemoryStore::new();
        assert_eq!(store.get("key").await.unwrap(), None);

        store.set("key", "value").await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), Some("value".to_string()));
    }

    #[tokio::test]
    async fn test_list_fifo_order() {
        let store = MemoryStore::new();
        store.list_push_tail("queue", "a").await.unwrap();
        store.list_push_tail("queue", "b").await.unwrap();
        store.list_push_head("queue", "front").await.unwrap();

        assert_eq!(
            store.list_range("queue").await.unwrap(),
            vec!["front", "a", "b"]
        );
        assert_eq!(
            store.list_pop_head("queue").await.unwrap(),
            Some("front".to_string())
        );
        assert_eq!(store.list_range("queue").await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStore::new();
        let clone = store.clone();

        store.set("key", "value").await.unwrap();
        assert_eq!(clone.get("key").await.unwrap(), Some("value".to_string()));
    }
}
