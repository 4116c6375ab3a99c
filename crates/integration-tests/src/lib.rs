//! Integration tests for GoMarketplace.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p gomarketplace-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_store` - Mutation rules observed through the shared store
//! - `cart_persistence` - Write-through, restore and failure handling
//! - `cart_provider` - Scoped cart lookup
//!
//! Shared fixtures live in this crate so every test file builds carts the
//! same way.

use std::time::Duration;

use gomarketplace_cart::{CartConfig, CartStore, RetryPolicy, storage::MemoryStore};
use gomarketplace_core::{NewLineItem, UnitPrice};

/// Configuration with a fast retry schedule suitable for tests.
#[must_use]
pub fn test_config() -> CartConfig {
    CartConfig {
        retry: RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
        },
        ..CartConfig::default()
    }
}

/// A cart over a fresh in-memory store, plus a handle to that store.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
#[must_use]
pub fn memory_cart() -> (CartStore, MemoryStore) {
    let backend = MemoryStore::new();
    let store = CartStore::new(backend.clone(), &test_config());
    (store, backend)
}

/// A product input with a price in cents.
#[must_use]
pub fn product(id: &str, title: &str, cents: i64) -> NewLineItem {
    NewLineItem::new(
        id,
        title,
        format!("https://images.example/{id}.png"),
        UnitPrice::from_cents(cents),
    )
}
