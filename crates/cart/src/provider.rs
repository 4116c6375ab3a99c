//! Scoped access to the session's cart.
//!
//! Most code should receive a [`CartStore`] explicitly. For deeply nested
//! consumers, [`CartProvider`] installs a store for the duration of a future
//! or closure, and [`use_cart`] fetches it from inside that scope. Looking
//! the cart up anywhere else is a programming error and fails immediately.

use std::future::Future;

use crate::error::{CartError, Result};
use crate::store::CartStore;

tokio::task_local! {
    static CURRENT_CART: CartStore;
}

/// Installs a [`CartStore`] for code running inside its scope.
pub struct CartProvider;

impl CartProvider {
    /// Run `future` with `store` available through [`use_cart`].
    ///
    /// Scopes nest: the innermost provider wins.
    pub async fn scope<F>(store: CartStore, future: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_CART.scope(store, future).await
    }

    /// Run the synchronous closure `f` with `store` available through
    /// [`use_cart`].
    pub fn sync_scope<R>(store: CartStore, f: impl FnOnce() -> R) -> R {
        CURRENT_CART.sync_scope(store, f)
    }
}

/// Fetch the cart installed by the enclosing [`CartProvider`].
///
/// # Errors
///
/// Returns [`CartError::OutsideProvider`] when called outside any provider
/// scope, including from tasks spawned inside one (task-locals are not
/// inherited by `tokio::spawn`).
pub fn use_cart() -> Result<CartStore> {
    CURRENT_CART
        .try_with(CartStore::clone)
        .map_err(|_| CartError::OutsideProvider)
}
