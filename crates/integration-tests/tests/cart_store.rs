//! Integration tests for cart mutation rules.
//!
//! These tests drive a `CartStore` over an in-memory backend and check the
//! behaviour consumers observe, independent of persistence.

#![allow(clippy::unwrap_used)]

use gomarketplace_cart::CartConfig;
use gomarketplace_cart::CartStore;
use gomarketplace_cart::storage::MemoryStore;
use gomarketplace_core::{DecrementPolicy, UnitPrice};
use gomarketplace_integration_tests::{memory_cart, product, test_config};

// =============================================================================
// Add
// =============================================================================

#[tokio::test]
async fn test_distinct_adds_count_each_id() {
    let (cart, _) = memory_cart();
    let adds = ["a", "b", "a", "c", "a", "b"];
    for id in adds {
        cart.add_to_cart(product(id, "Item", 100));
    }

    let snapshot = cart.current_snapshot();
    assert_eq!(snapshot.len(), 3);
    for id in ["a", "b", "c"] {
        let expected = i64::try_from(adds.iter().filter(|x| **x == id).count()).unwrap();
        assert_eq!(snapshot.get(id).unwrap().quantity, expected, "quantity of {id}");
    }
}

#[tokio::test]
async fn test_readd_only_changes_quantity() {
    let (cart, _) = memory_cart();
    cart.add_to_cart(product("p1", "Shirt", 1000));
    let before = cart.current_snapshot().get("p1").cloned().unwrap();

    cart.add_to_cart(product("p1", "Different title", 1));
    let after = cart.current_snapshot().get("p1").cloned().unwrap();

    assert_eq!(after.title, before.title);
    assert_eq!(after.image_url, before.image_url);
    assert_eq!(after.price, before.price);
    assert_eq!(after.quantity, before.quantity + 1);
}

#[tokio::test]
async fn test_scenario_same_product_twice() {
    let (cart, _) = memory_cart();
    let shirt =
        gomarketplace_core::NewLineItem::new("p1", "Shirt", "u", UnitPrice::from_cents(1000));
    cart.add_to_cart(shirt.clone());
    cart.add_to_cart(shirt);

    let snapshot = cart.current_snapshot();
    assert_eq!(snapshot.len(), 1);
    let line = snapshot.get("p1").unwrap();
    assert_eq!(line.title, "Shirt");
    assert_eq!(line.image_url, "u");
    assert_eq!(line.quantity, 2);
}

// =============================================================================
// Increment / Decrement
// =============================================================================

#[tokio::test]
async fn test_increment_absent_changes_nothing() {
    let (cart, _) = memory_cart();
    cart.increment("missing");
    assert!(cart.current_snapshot().is_empty());

    cart.add_to_cart(product("p1", "Shirt", 1000));
    let before = cart.current_snapshot();
    cart.increment("missing");
    assert_eq!(cart.current_snapshot(), before);
}

#[tokio::test]
async fn test_decrement_present_only_touches_target() {
    let (cart, _) = memory_cart();
    cart.add_to_cart(product("p1", "Shirt", 1000));
    cart.add_to_cart(product("p1", "Shirt", 1000));
    cart.add_to_cart(product("p2", "Mug", 550));
    let before = cart.current_snapshot();

    cart.decrement("p1");
    let after = cart.current_snapshot();

    assert_eq!(
        after.get("p1").unwrap().quantity,
        before.get("p1").unwrap().quantity - 1
    );
    assert_eq!(after.get("p2"), before.get("p2"));
}

#[tokio::test]
async fn test_decrement_to_zero_is_kept_by_default() {
    let (cart, _) = memory_cart();
    cart.add_to_cart(product("p1", "Shirt", 1000));
    cart.decrement("p1");

    let snapshot = cart.current_snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.get("p1").unwrap().quantity, 0);
}

#[tokio::test]
async fn test_decrement_policies() {
    for (policy, expected) in [
        (DecrementPolicy::Keep, Some(-1)),
        (DecrementPolicy::Clamp, Some(0)),
        (DecrementPolicy::Remove, None),
    ] {
        let config = CartConfig {
            decrement_policy: policy,
            ..test_config()
        };
        let cart = CartStore::new(MemoryStore::new(), &config);
        cart.add_to_cart(product("p1", "Shirt", 1000));
        cart.decrement("p1");
        cart.decrement("p1");

        let quantity = cart.current_snapshot().get("p1").map(|line| line.quantity);
        assert_eq!(quantity, expected, "policy {policy}");
    }
}

// =============================================================================
// Sharing
// =============================================================================

#[tokio::test]
async fn test_clones_share_one_cart() {
    let (cart, _) = memory_cart();
    let other = cart.clone();

    cart.add_to_cart(product("p1", "Shirt", 1000));
    other.increment("p1");

    assert_eq!(cart.current_snapshot().get("p1").unwrap().quantity, 2);
    assert_eq!(cart.versioned_snapshot().version, 2);
}

#[tokio::test]
async fn test_concurrent_mutations_are_not_lost() {
    let (cart, backend) = memory_cart();
    cart.add_to_cart(product("p1", "Shirt", 1000));

    let mut handles = Vec::new();
    for _ in 0..50 {
        let cart = cart.clone();
        handles.push(tokio::spawn(async move { cart.increment("p1") }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    cart.flush().await.unwrap();

    assert_eq!(cart.current_snapshot().get("p1").unwrap().quantity, 51);
    let raw = backend.snapshot(cart.storage_key()).await.unwrap();
    assert!(raw.contains("\"quantity\":51"));
}
