//! The cart store: in-memory state plus write-through persistence.
//!
//! [`CartStore`] is created once per session and shared by cloning. Every
//! mutation runs synchronously under the state lock, bumps the snapshot
//! version, and queues the full cart for the persistence worker before the
//! lock is released. Callers never wait on storage; use
//! [`CartStore::flush`] when the durable copy must be up to date.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use gomarketplace_core::{CartState, DecrementPolicy, NewLineItem};
use rust_decimal::Decimal;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, instrument, warn};

use crate::config::CartConfig;
use crate::error::{CartError, Result};
use crate::persist::{self, PendingWrite, PersistStatus};
use crate::storage::KeyValueStore;

/// Lifecycle of a cart store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartPhase {
    /// Created; `restore` has not been called.
    Uninitialized,
    /// `restore` is reading the durable slot.
    Restoring,
    /// `restore` has finished (successfully or not).
    Ready,
}

impl CartPhase {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Uninitialized => 0,
            Self::Restoring => 1,
            Self::Ready => 2,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Uninitialized,
            1 => Self::Restoring,
            _ => Self::Ready,
        }
    }
}

/// A versioned view of the cart, as seen by subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
    /// Number of mutations applied so far; 0 for a fresh or restored cart.
    pub version: u64,
    /// The cart contents.
    pub cart: CartState,
}

/// Shared handle to the session's cart.
///
/// Cheaply cloneable via `Arc`; all clones observe and mutate the same cart.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    state: watch::Sender<CartSnapshot>,
    writes: mpsc::UnboundedSender<PendingWrite>,
    persist_status: watch::Receiver<PersistStatus>,
    storage: Arc<dyn KeyValueStore>,
    key: String,
    decrement_policy: DecrementPolicy,
    phase: AtomicU8,
}

impl CartStore {
    /// Create an empty cart backed by `storage`.
    ///
    /// Spawns the persistence worker on the current Tokio runtime. The cart
    /// starts empty; call [`restore`](Self::restore) to load the persisted
    /// copy.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new<S>(storage: S, config: &CartConfig) -> Self
    where
        S: KeyValueStore + 'static,
    {
        Self::with_shared_storage(Arc::new(storage), config)
    }

    /// Create an empty cart over an already shared storage backend.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn with_shared_storage(storage: Arc<dyn KeyValueStore>, config: &CartConfig) -> Self {
        let (writes, persist_status) =
            persist::spawn_worker(Arc::clone(&storage), config.storage_key.clone(), config.retry);
        let (state, _) = watch::channel(CartSnapshot::default());

        Self {
            inner: Arc::new(CartStoreInner {
                state,
                writes,
                persist_status,
                storage,
                key: config.storage_key.clone(),
                decrement_policy: config.decrement_policy,
                phase: AtomicU8::new(CartPhase::Uninitialized.as_u8()),
            }),
        }
    }

    /// Load the persisted cart into memory.
    ///
    /// An absent or blank slot leaves the cart as it is. A persisted cart
    /// replaces the in-memory one, including any mutations made before the
    /// restore finished. Restoring does not trigger a write-through.
    ///
    /// # Errors
    ///
    /// - [`CartError::AlreadyRestored`] if called more than once.
    /// - [`CartError::Storage`] if the slot cannot be read.
    /// - [`CartError::Decode`] if the slot holds malformed data; the
    ///   in-memory cart is left untouched.
    #[instrument(skip(self), fields(key = %self.inner.key))]
    pub async fn restore(&self) -> Result<()> {
        self.inner
            .phase
            .compare_exchange(
                CartPhase::Uninitialized.as_u8(),
                CartPhase::Restoring.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .map_err(|_| CartError::AlreadyRestored)?;

        let loaded = self.load().await;
        self.inner
            .phase
            .store(CartPhase::Ready.as_u8(), Ordering::SeqCst);

        let Some(cart) = loaded? else {
            debug!("No persisted cart");
            return Ok(());
        };

        let items = cart.len();
        self.inner.state.send_modify(|snapshot| {
            if snapshot.version > 0 {
                warn!(
                    overwritten_mutations = snapshot.version,
                    "Restored cart replaces changes made before restore finished"
                );
            }
            snapshot.cart = cart;
        });
        info!(items, "Cart restored");
        Ok(())
    }

    async fn load(&self) -> Result<Option<CartState>> {
        let raw = self.inner.storage.get(&self.inner.key).await?;
        match raw {
            Some(raw) if !raw.trim().is_empty() => {
                let cart = serde_json::from_str::<CartState>(&raw).map_err(|e| {
                    error!(error = %e, "Persisted cart is malformed");
                    CartError::Decode(e)
                })?;
                Ok(Some(cart))
            }
            _ => Ok(None),
        }
    }

    /// Add one unit of a product, appending it if it is not in the cart.
    pub fn add_to_cart(&self, item: NewLineItem) {
        let id = item.id.clone();
        self.mutate(|cart| {
            let quantity = cart.add(item);
            debug!(%id, quantity, "Added to cart");
        });
    }

    /// Add one unit to the line for `id`. Unknown IDs are ignored.
    pub fn increment(&self, id: &str) {
        self.mutate(|cart| {
            if !cart.increment(id) {
                debug!(id, "Increment ignored, product not in cart");
            }
        });
    }

    /// Remove one unit from the line for `id`. Unknown IDs are ignored.
    ///
    /// Whether the line may reach zero, go negative or be dropped depends on
    /// the configured [`DecrementPolicy`].
    pub fn decrement(&self, id: &str) {
        let policy = self.inner.decrement_policy;
        self.mutate(|cart| {
            if !cart.decrement(id, policy) {
                debug!(id, "Decrement ignored, product not in cart");
            }
        });
    }

    /// Remove every line from the cart.
    pub fn clear(&self) {
        self.mutate(CartState::clear);
    }

    /// Apply `f` to the cart, bump the version and queue a write-through.
    fn mutate(&self, f: impl FnOnce(&mut CartState)) {
        self.inner.state.send_modify(|snapshot| {
            f(&mut snapshot.cart);
            snapshot.version += 1;

            let write = PendingWrite {
                version: snapshot.version,
                cart: snapshot.cart.clone(),
            };
            if self.inner.writes.send(write).is_err() {
                error!(
                    version = snapshot.version,
                    "Persistence worker stopped, cart change not saved"
                );
            }
        });
    }

    /// The current cart contents.
    #[must_use]
    pub fn current_snapshot(&self) -> CartState {
        self.inner.state.borrow().cart.clone()
    }

    /// The current cart contents together with their version.
    #[must_use]
    pub fn versioned_snapshot(&self) -> CartSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Watch the cart for changes.
    ///
    /// The receiver is notified after every mutation and after a restore
    /// that loaded data.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.inner.state.subscribe()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.inner.state.borrow().cart.total_quantity()
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.inner.state.borrow().cart.subtotal()
    }

    /// Where the store is in its lifecycle.
    #[must_use]
    pub fn phase(&self) -> CartPhase {
        CartPhase::from_u8(self.inner.phase.load(Ordering::SeqCst))
    }

    /// Outcome of the write-throughs handled so far.
    #[must_use]
    pub fn persist_status(&self) -> PersistStatus {
        self.inner.persist_status.borrow().clone()
    }

    /// The storage key of the durable slot.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.inner.key
    }

    /// Wait until every change made so far has been handled by the
    /// persistence worker.
    ///
    /// # Errors
    ///
    /// - [`CartError::Persist`] if the newest change could not be written
    ///   after all retries.
    /// - [`CartError::WorkerStopped`] if the worker is no longer running.
    #[instrument(skip(self), fields(key = %self.inner.key))]
    pub async fn flush(&self) -> Result<()> {
        let target = self.inner.state.borrow().version;
        let mut status = self.inner.persist_status.clone();

        let settled = status
            .wait_for(|s| s.is_settled(target))
            .await
            .map_err(|_| CartError::WorkerStopped)?
            .clone();

        match settled.last_error {
            Some(e) if settled.persisted_version < target => Err(CartError::Persist(e)),
            _ => {
                debug!(version = target, "Cart flushed");
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.inner.state.borrow();
        f.debug_struct("CartStore")
            .field("key", &self.inner.key)
            .field("phase", &self.phase())
            .field("version", &snapshot.version)
            .field("items", &snapshot.cart.len())
            .finish_non_exhaustive()
    }
}
