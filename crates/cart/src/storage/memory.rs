//! In-memory key-value store.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::KeyValueStore;
use crate::error::StorageError;

/// A key-value store held in process memory.
///
/// Cheaply cloneable; clones share the same map, so a test can keep one
/// handle to inspect what the cart wrote through another.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    values: RwLock<HashMap<String, String>>,
    failing_writes: AtomicUsize,
    writes: AtomicUsize,
    write_delay_ms: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` calls to `set` fail with
    /// [`StorageError::Unavailable`].
    pub fn fail_next_writes(&self, count: usize) {
        self.inner.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Delay every `set` by `delay` before it takes effect.
    pub fn set_write_delay(&self, delay: Duration) {
        let millis = usize::try_from(delay.as_millis()).unwrap_or(usize::MAX);
        self.inner.write_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Number of `set` calls that succeeded.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Read a value without going through the async trait.
    pub async fn snapshot(&self, key: &str) -> Option<String> {
        self.inner.values.read().await.get(key).cloned()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("writes", &self.write_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let delay = self.inner.write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            let delay = Duration::from_millis(u64::try_from(delay).unwrap_or(u64::MAX));
            tokio::time::sleep(delay).await;
        }

        let should_fail = self
            .inner
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(StorageError::Unavailable(format!(
                "simulated write failure for {key}"
            )));
        }

        self.inner
            .values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.values.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = MemoryStore::new();
        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemoryStore::new();
        store.set("k", "v1").await.unwrap();
        store.set("k", "v2").await.unwrap();

        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_clones_share_values() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.set("k", "v").await.unwrap();

        assert_eq!(other.snapshot("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_fail_next_writes() {
        let store = MemoryStore::new();
        store.fail_next_writes(2);

        assert!(store.set("k", "a").await.is_err());
        assert!(store.set("k", "b").await.is_err());
        store.set("k", "c").await.unwrap();

        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("c"));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = MemoryStore::new();
        store.set("k", "v").await.unwrap();
        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();

        assert!(store.get("k").await.unwrap().is_none());
    }
}
