//! Transaction lifecycle tracking
//!
//! The tracker drives one cross-chain transaction from creation to a
//! terminal state: it creates (or adopts) a transaction, polls the store for
//! status on a fixed interval, fires lifecycle callbacks exactly once per
//! observed transition, and mirrors the latest store state for the UI.
//!
//! Status is never derived locally. Intermediate statuses between two polls
//! are not individually observed; only the latest fetched status matters.

use crate::error::{ErrorKind, TransactionError};
use crate::metrics;
use crate::store::TransactionStore;
use crate::transaction::{NewTransaction, Transaction, TransactionId, TransactionStatus};

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::AbortHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, warn};

/// Lifecycle callbacks supplied by the embedding application.
///
/// Each callback is independently optional and runs synchronously within the
/// turn that observed the triggering event, so none of them should block.
#[derive(Default)]
pub struct TrackerCallbacks {
    /// Tracking started for a transaction
    pub on_submit_start: Option<Box<dyn Fn() + Send + Sync>>,
    /// First observation of source_confirmed; receives the source tx hash
    pub on_source_confirmed: Option<Box<dyn Fn(&str) + Send + Sync>>,
    /// First observation of destination_confirmed; receives the destination
    /// tx hash, or an empty string when the store has not supplied one
    pub on_destination_confirmed: Option<Box<dyn Fn(&str) + Send + Sync>>,
    /// Transaction reached completed
    pub on_complete: Option<Box<dyn Fn(&Transaction) + Send + Sync>>,
    /// An observable error was recorded (create/retry failure, or the
    /// transaction itself reported failed)
    pub on_error: Option<Box<dyn Fn(&TransactionError) + Send + Sync>>,
    /// The store was mutated by a successful create or retry
    pub on_store_mutated: Option<Box<dyn Fn() + Send + Sync>>,
}

/// Observable tracker state mirrored from the store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrackerSnapshot {
    pub transaction: Option<Transaction>,
    pub status: TransactionStatus,
    pub modal_open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TransactionError>,
}

/// Cancellation handle for a polling loop.
///
/// Dropping the handle does not stop the loop; the tracker also aborts the
/// loop itself when a new transaction supersedes it or on reset.
#[derive(Debug, Clone)]
pub struct TrackingHandle {
    inner: AbortHandle,
}

impl TrackingHandle {
    pub fn cancel(&self) {
        self.inner.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

/// Drives one in-flight cross-chain transaction to a terminal state.
pub struct TransactionTracker {
    store: Arc<dyn TransactionStore>,
    callbacks: Arc<TrackerCallbacks>,
    state: Arc<RwLock<TrackerSnapshot>>,
    poll_interval: Duration,
    /// Active polling loop, aborted on supersession or reset
    active_poll: Mutex<Option<AbortHandle>>,
}

impl TransactionTracker {
    pub fn new(
        store: Arc<dyn TransactionStore>,
        callbacks: TrackerCallbacks,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            callbacks: Arc::new(callbacks),
            state: Arc::new(RwLock::new(TrackerSnapshot::default())),
            poll_interval,
            active_poll: Mutex::new(None),
        }
    }

    /// Current observable state.
    pub async fn snapshot(&self) -> TrackerSnapshot {
        self.state.read().await.clone()
    }

    /// Create a transaction at the store and begin tracking it.
    ///
    /// Store failures are converted into observable error state; this never
    /// propagates them to the caller.
    pub async fn create_transaction(&self, new: &NewTransaction) -> Option<Transaction> {
        match self.store.create(new).await {
            Ok(transaction) => {
                metrics::record_created();
                if let Some(cb) = &self.callbacks.on_store_mutated {
                    cb();
                }
                self.track_transaction(transaction.clone()).await;
                Some(transaction)
            }
            Err(e) => {
                error!(error = %e, "failed to create transaction");
                metrics::record_store_error("create");
                self.record_error(TransactionError::network("Failed to create transaction"))
                    .await;
                None
            }
        }
    }

    /// Begin tracking a transaction, superseding any active polling loop.
    ///
    /// Fires `on_submit_start` synchronously, then polls the store on the
    /// configured interval until a terminal status is observed. The returned
    /// handle cancels the loop on caller teardown.
    pub async fn track_transaction(&self, transaction: Transaction) -> TrackingHandle {
        {
            let mut state = self.state.write().await;
            state.status = transaction.status;
            state.transaction = Some(transaction.clone());
            state.modal_open = true;
            state.error = None;
        }

        if let Some(cb) = &self.callbacks.on_submit_start {
            cb();
        }
        info!(tx_id = %transaction.id, status = %transaction.status, "tracking transaction");
        metrics::set_tracking_active(true);

        let mut active = self.active_poll.lock().await;
        if let Some(previous) = active.take() {
            previous.abort();
        }

        let task = tokio::spawn(Self::poll_loop(
            self.store.clone(),
            self.callbacks.clone(),
            self.state.clone(),
            self.poll_interval,
            transaction,
        ));
        let handle = task.abort_handle();
        *active = Some(handle.clone());

        TrackingHandle { inner: handle }
    }

    /// Ask the store to retry a transaction and track the store's answer,
    /// which may be a different transaction than the one retried.
    pub async fn retry_transaction(&self, id: &TransactionId) -> Option<Transaction> {
        match self.store.retry(id).await {
            Ok(transaction) => {
                metrics::record_retried();
                if let Some(cb) = &self.callbacks.on_store_mutated {
                    cb();
                }
                self.track_transaction(transaction.clone()).await;
                Some(transaction)
            }
            Err(e) => {
                error!(tx_id = %id, error = %e, "failed to retry transaction");
                metrics::record_store_error("retry");
                self.record_error(TransactionError::network("Failed to retry transaction"))
                    .await;
                None
            }
        }
    }

    /// Close the modal surface. Polling and state are untouched; the
    /// transaction keeps being tracked in the background.
    pub async fn close_modal(&self) {
        self.state.write().await.modal_open = false;
    }

    /// Clear all tracker state and cancel any in-flight polling loop.
    pub async fn reset(&self) {
        if let Some(handle) = self.active_poll.lock().await.take() {
            handle.abort();
        }
        metrics::set_tracking_active(false);

        let mut state = self.state.write().await;
        state.transaction = None;
        state.status = TransactionStatus::Pending;
        state.modal_open = false;
        state.error = None;
    }

    async fn record_error(&self, err: TransactionError) {
        self.state.write().await.error = Some(err.clone());
        if let Some(cb) = &self.callbacks.on_error {
            cb(&err);
        }
    }

    /// Poll the store until a terminal status is observed.
    ///
    /// Fetch failures are logged and swallowed; the loop continues on the
    /// next tick without mutating state.
    async fn poll_loop(
        store: Arc<dyn TransactionStore>,
        callbacks: Arc<TrackerCallbacks>,
        state: Arc<RwLock<TrackerSnapshot>>,
        poll_interval: Duration,
        transaction: Transaction,
    ) {
        let tx_id = transaction.id.clone();
        let mut last_status = transaction.status;

        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of an interval completes immediately; the
        // transaction state was just fetched, so wait a full period.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let fresh = match store.status(&tx_id).await {
                Ok(tx) => tx,
                Err(e) => {
                    warn!(tx_id = %tx_id, error = %e, "status poll failed");
                    metrics::record_poll_failure();
                    continue;
                }
            };
            metrics::record_poll();

            let status = fresh.status;
            if status != last_status {
                if status.rank() < last_status.rank() {
                    // The store contract says status only moves forward.
                    warn!(
                        tx_id = %tx_id,
                        from = %last_status,
                        to = %status,
                        "store reported a backwards status transition"
                    );
                }
                metrics::record_transition(status);

                match status {
                    TransactionStatus::SourceConfirmed => {
                        info!(tx_id = %tx_id, "source chain confirmed");
                        if let Some(cb) = &callbacks.on_source_confirmed {
                            cb(fresh.source_tx_hash.as_deref().unwrap_or_default());
                        }
                    }
                    TransactionStatus::DestinationConfirmed => {
                        info!(tx_id = %tx_id, "destination chain confirmed");
                        if let Some(cb) = &callbacks.on_destination_confirmed {
                            cb(fresh.destination_tx_hash.as_deref().unwrap_or_default());
                        }
                    }
                    _ => {}
                }
            }

            match status {
                TransactionStatus::Completed => {
                    {
                        let mut s = state.write().await;
                        s.status = status;
                        s.transaction = Some(fresh.clone());
                    }
                    info!(tx_id = %tx_id, "transaction completed");
                    metrics::record_completed();
                    metrics::set_tracking_active(false);
                    if let Some(cb) = &callbacks.on_complete {
                        cb(&fresh);
                    }
                    return;
                }
                TransactionStatus::Failed => {
                    let err = TransactionError {
                        message: fresh
                            .error
                            .clone()
                            .unwrap_or_else(|| "Transaction failed".to_string()),
                        kind: ErrorKind::Unknown,
                        details: fresh.data.clone(),
                    };
                    {
                        let mut s = state.write().await;
                        s.status = status;
                        s.transaction = Some(fresh.clone());
                        s.error = Some(err.clone());
                    }
                    warn!(tx_id = %tx_id, message = %err.message, "transaction failed");
                    metrics::record_failed();
                    metrics::set_tracking_active(false);
                    if let Some(cb) = &callbacks.on_error {
                        cb(&err);
                    }
                    return;
                }
                _ => {
                    let mut s = state.write().await;
                    s.status = status;
                    s.transaction = Some(fresh.clone());
                }
            }

            last_status = status;
        }
    }
}
