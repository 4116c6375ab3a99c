//! Background write-through of cart snapshots.
//!
//! Mutations hand every new snapshot to a single worker task over an
//! unbounded channel, in mutation order. The worker writes one snapshot at a
//! time, always the newest one queued, and publishes the outcome on a
//! `watch` channel that [`CartStore::flush`](crate::CartStore::flush) waits on.
//!
//! A snapshot whose version is not newer than the last one written is
//! skipped, so the durable slot never moves backwards.

use std::sync::Arc;

use gomarketplace_core::CartState;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, instrument, warn};

use crate::config::RetryPolicy;
use crate::storage::KeyValueStore;

/// A cart snapshot waiting to be written.
#[derive(Debug)]
pub(crate) struct PendingWrite {
    pub version: u64,
    pub cart: CartState,
}

/// Outcome of the write-throughs handled so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistStatus {
    /// Highest snapshot version the worker has finished with, whether it was
    /// written, superseded by a newer snapshot, or failed.
    pub settled_version: u64,
    /// Highest snapshot version successfully written.
    pub persisted_version: u64,
    /// Error from the most recent failed write; cleared by the next success.
    pub last_error: Option<String>,
}

impl PersistStatus {
    /// Whether every snapshot up to `version` has been dealt with.
    #[must_use]
    pub const fn is_settled(&self, version: u64) -> bool {
        self.settled_version >= version
    }
}

/// Spawn the persistence worker for one cart slot.
///
/// The worker exits once every sender has been dropped and the queue is
/// drained.
pub(crate) fn spawn_worker(
    storage: Arc<dyn KeyValueStore>,
    key: String,
    retry: RetryPolicy,
) -> (
    mpsc::UnboundedSender<PendingWrite>,
    watch::Receiver<PersistStatus>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(PersistStatus::default());

    let worker = PersistWorker {
        storage,
        key,
        retry,
        rx,
        status: status_tx,
    };
    tokio::spawn(worker.run());

    (tx, status_rx)
}

struct PersistWorker {
    storage: Arc<dyn KeyValueStore>,
    key: String,
    retry: RetryPolicy,
    rx: mpsc::UnboundedReceiver<PendingWrite>,
    status: watch::Sender<PersistStatus>,
}

impl PersistWorker {
    async fn run(mut self) {
        debug!(key = %self.key, "Cart persistence worker started");

        while let Some(mut next) = self.rx.recv().await {
            let mut superseded = 0_usize;
            while let Ok(newer) = self.rx.try_recv() {
                next = newer;
                superseded += 1;
            }
            if superseded > 0 {
                debug!(superseded, version = next.version, "Coalesced queued snapshots");
            }

            let persisted = self.status.borrow().persisted_version;
            if next.version <= persisted {
                debug!(version = next.version, persisted, "Skipping stale snapshot");
                self.settle(next.version, Ok(()));
                continue;
            }

            let result = self.write_with_retry(&next).await;
            self.settle(next.version, result);
        }

        debug!(key = %self.key, "Cart persistence worker stopped");
    }

    /// Encode and write one snapshot, retrying with exponential backoff.
    #[instrument(skip(self, write), fields(key = %self.key, version = write.version))]
    async fn write_with_retry(&self, write: &PendingWrite) -> Result<(), String> {
        let payload = serde_json::to_string(&write.cart).map_err(|e| {
            error!(error = %e, "Failed to encode cart snapshot");
            e.to_string()
        })?;

        let mut attempt = 0_u32;
        loop {
            match self.storage.set(&self.key, &payload).await {
                Ok(()) => {
                    debug!(attempt, items = write.cart.len(), "Cart persisted");
                    return Ok(());
                }
                Err(e) if attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(error = %e, attempt, ?delay, "Cart write failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(error = %e, attempts = attempt + 1, "Cart write failed, giving up");
                    return Err(e.to_string());
                }
            }
        }
    }

    fn settle(&self, version: u64, result: Result<(), String>) {
        self.status.send_modify(|status| {
            status.settled_version = status.settled_version.max(version);
            match result {
                Ok(()) => {
                    status.persisted_version = status.persisted_version.max(version);
                    status.last_error = None;
                }
                Err(e) => status.last_error = Some(e),
            }
        });
    }
}
