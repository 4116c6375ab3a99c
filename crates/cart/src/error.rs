//! Error types for the cart store and its storage backends.

use thiserror::Error;

/// Errors raised by a [`KeyValueStore`](crate::storage::KeyValueStore).
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend refused or could not service the request.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Cart store error type.
#[derive(Debug, Error)]
pub enum CartError {
    /// `use_cart` was called outside any `CartProvider` scope.
    #[error("use_cart must be used within a CartProvider")]
    OutsideProvider,

    /// `restore` was called more than once.
    #[error("Cart has already been restored")]
    AlreadyRestored,

    /// Reading the persisted cart failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The persisted cart could not be decoded.
    #[error("Malformed persisted cart: {0}")]
    Decode(#[from] serde_json::Error),

    /// The most recent write-through failed after all retries.
    #[error("Persist error: {0}")]
    Persist(String),

    /// The persistence worker has stopped.
    #[error("Persistence worker stopped")]
    WorkerStopped,
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_display() {
        assert_eq!(
            CartError::OutsideProvider.to_string(),
            "use_cart must be used within a CartProvider"
        );

        let err = CartError::Persist("disk full".to_string());
        assert_eq!(err.to_string(), "Persist error: disk full");

        assert_eq!(CartError::WorkerStopped.to_string(), "Persistence worker stopped");
    }

    #[test]
    fn test_storage_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = CartError::from(StorageError::from(io));
        assert!(matches!(err, CartError::Storage(StorageError::Io(_))));
        assert!(err.to_string().contains("denied"));
    }
}
