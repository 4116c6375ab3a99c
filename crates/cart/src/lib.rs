//! GoMarketplace cart store.
//!
//! Holds the session's shopping cart in memory and keeps a copy in a
//! key-value store so it survives restarts.
//!
//! # Usage
//!
//! ```rust,no_run
//! use gomarketplace_cart::{CartConfig, CartStore, storage::MemoryStore};
//! use gomarketplace_core::{NewLineItem, UnitPrice};
//!
//! # async fn demo() -> Result<(), gomarketplace_cart::CartError> {
//! let cart = CartStore::new(MemoryStore::new(), &CartConfig::default());
//! cart.restore().await?;
//!
//! let shirt = NewLineItem::new("p1", "Shirt", "https://img/p1", UnitPrice::from_cents(1000));
//! cart.add_to_cart(shirt);
//! cart.increment("p1");
//! cart.flush().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`store`] - `CartStore`, the shared cart handle
//! - [`provider`] - Scoped lookup of the session's cart
//! - [`storage`] - Key-value backends (memory, file)
//! - [`persist`] - Background write-through worker
//! - [`config`] - Environment configuration
//! - [`error`] - Error types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod persist;
pub mod provider;
pub mod storage;
pub mod store;

pub use config::{CartConfig, ConfigError, DEFAULT_STORAGE_KEY, RetryPolicy};
pub use error::{CartError, StorageError};
pub use persist::PersistStatus;
pub use provider::{CartProvider, use_cart};
pub use store::{CartPhase, CartSnapshot, CartStore};
