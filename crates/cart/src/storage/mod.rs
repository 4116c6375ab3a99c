//! Key-value storage backends for the persisted cart.
//!
//! The cart is stored as a single string blob under a fixed key. Backends
//! only need to get and set strings; they know nothing about carts.
//!
//! # Backends
//!
//! - [`MemoryStore`] - In-process map, used in tests and ephemeral sessions
//! - [`FileStore`] - One file per key under a directory, with atomic writes

mod file;
mod memory;

use async_trait::async_trait;

use crate::error::StorageError;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Abstraction over the device's asynchronous key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if nothing is stored.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value stored under `key`.
    ///
    /// Succeeds even if nothing is stored (idempotent).
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
