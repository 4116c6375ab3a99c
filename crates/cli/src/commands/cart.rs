//! Cart commands.
//!
//! Each command opens the file-backed cart, restores it, applies at most one
//! change, and waits for the write-through to finish before returning the
//! resulting cart.
//!
//! # Environment Variables
//!
//! See [`CartConfig::from_env`] for the variables controlling the storage
//! location, key, retry schedule and decrement policy.

use gomarketplace_cart::storage::FileStore;
use gomarketplace_cart::{CartConfig, CartError, CartStore};
use gomarketplace_core::{CartState, NewLineItem, UnitPrice};
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can occur while running a cart command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The cart store failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The `--price` argument is not a decimal number.
    #[error("Invalid price {0:?}: {1}")]
    InvalidPrice(String, String),
}

/// Open the cart described by `config` and restore its persisted state.
///
/// With `tolerate_corrupt`, a malformed cart file is logged and treated as
/// empty instead of aborting the command.
async fn open(config: &CartConfig, tolerate_corrupt: bool) -> Result<CartStore, CommandError> {
    let store = CartStore::new(FileStore::new(config.storage_dir.clone()), config);
    info!(
        dir = %config.storage_dir.display(),
        key = %config.storage_key,
        "Opening cart"
    );

    match store.restore().await {
        Ok(()) => Ok(store),
        Err(CartError::Decode(e)) if tolerate_corrupt => {
            warn!(error = %e, "Ignoring malformed cart file");
            Ok(store)
        }
        Err(e) => Err(e.into()),
    }
}

/// Wait for pending writes, then return the cart.
async fn finish(store: &CartStore) -> Result<CartState, CommandError> {
    store.flush().await?;
    Ok(store.current_snapshot())
}

/// Load the stored cart without changing it.
///
/// # Errors
///
/// Returns an error if the cart file cannot be read or decoded.
pub async fn show(config: &CartConfig) -> Result<CartState, CommandError> {
    let store = open(config, false).await?;
    Ok(store.current_snapshot())
}

/// Add one unit of a product.
///
/// # Errors
///
/// Returns an error if `price` is not a decimal, the cart cannot be
/// restored, or the change cannot be persisted.
pub async fn add(
    config: &CartConfig,
    id: String,
    title: String,
    image_url: String,
    price: &str,
) -> Result<CartState, CommandError> {
    let unit_price = price
        .parse::<UnitPrice>()
        .map_err(|e| CommandError::InvalidPrice(price.to_string(), e.to_string()))?;

    let store = open(config, false).await?;
    store.add_to_cart(NewLineItem::new(id, title, image_url, unit_price));
    finish(&store).await
}

/// Add one unit to an existing line.
///
/// # Errors
///
/// Returns an error if the cart cannot be restored or the change cannot be
/// persisted.
pub async fn increment(config: &CartConfig, id: &str) -> Result<CartState, CommandError> {
    let store = open(config, false).await?;
    store.increment(id);
    finish(&store).await
}

/// Remove one unit from an existing line.
///
/// # Errors
///
/// Returns an error if the cart cannot be restored or the change cannot be
/// persisted.
pub async fn decrement(config: &CartConfig, id: &str) -> Result<CartState, CommandError> {
    let store = open(config, false).await?;
    store.decrement(id);
    finish(&store).await
}

/// Remove every line item. A malformed cart file is overwritten.
///
/// # Errors
///
/// Returns an error if the cart file cannot be read or the change cannot be
/// persisted.
pub async fn clear(config: &CartConfig) -> Result<CartState, CommandError> {
    let store = open(config, true).await?;
    store.clear();
    finish(&store).await
}

/// Log every line and the cart totals.
pub fn log_cart(cart: &CartState) {
    if cart.is_empty() {
        info!("Cart is empty");
        return;
    }

    for item in cart {
        info!(
            id = %item.id,
            title = %item.title,
            image_url = %item.image_url,
            price = %item.price,
            quantity = item.quantity,
            "Line item"
        );
    }
    info!(
        lines = cart.len(),
        quantity = cart.total_quantity(),
        subtotal = %cart.subtotal().round_dp(2),
        "Cart totals"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn config_in(dir: &tempfile::TempDir) -> CartConfig {
        CartConfig {
            storage_dir: dir.path().to_path_buf(),
            ..CartConfig::default()
        }
    }

    #[tokio::test]
    async fn test_commands_share_cart_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        add(&config, "p1".into(), "Shirt".into(), "u".into(), "10")
            .await
            .unwrap();
        add(&config, "p1".into(), "Shirt".into(), "u".into(), "10")
            .await
            .unwrap();
        let cart = decrement(&config, "p1").await.unwrap();
        assert_eq!(cart.items()[0].quantity, 1);

        let cart = show(&config).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_add_rejects_bad_price() {
        let dir = tempfile::tempdir().unwrap();
        let err = add(&config_in(&dir), "p1".into(), "Shirt".into(), "u".into(), "ten")
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::InvalidPrice(_, _)));
    }

    #[tokio::test]
    async fn test_clear_recovers_from_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let path = FileStore::new(dir.path()).path_for(&config.storage_key);
        std::fs::write(&path, "{broken").unwrap();

        assert!(matches!(
            show(&config).await.unwrap_err(),
            CommandError::Cart(CartError::Decode(_))
        ));

        let cart = clear(&config).await.unwrap();
        assert!(cart.is_empty());
        assert!(show(&config).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_show_logs_cart_with_huge_totals() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let path = FileStore::new(dir.path()).path_for(&config.storage_key);
        std::fs::write(
            &path,
            r#"[{"id":"p1","title":"Gold","image_url":"g","price":1e20,"quantity":10000000000}]"#,
        )
        .unwrap();

        let cart = show(&config).await.unwrap();
        assert_eq!(cart.subtotal().to_string(), "79228162514264337593543950335");
        log_cart(&cart);
    }

    #[tokio::test]
    async fn test_added_price_matches_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        let added = add(
            &config,
            "p1".into(),
            "Shirt".into(),
            "u".into(),
            "19.999999999999999999",
        )
        .await
        .unwrap();
        let reopened = show(&config).await.unwrap();

        assert_eq!(reopened, added);
        assert_eq!(reopened.items()[0].price.to_string(), "20.00");
    }
}
