//! Local read model fed by full-snapshot feeds

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use shared::models::{Sale, Table, TableId};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::observer::{FeedKind, FeedObserver, LoggingObserver};
use super::subscription::Subscription;
use crate::store::{FeedEvent, FeedReceiver, SaleStore, StoreError, TableStore};

/// Owner of the local table and sale collections
///
/// One instance per process. Each feed bumps its own revision counter on
/// every applied snapshot so readers can wait for an echo.
pub struct SyncReconciler {
    tables: RwLock<Vec<Table>>,
    sales: RwLock<Vec<Sale>>,
    tables_rev: watch::Sender<u64>,
    sales_rev: watch::Sender<u64>,
    tables_fault: Mutex<Option<StoreError>>,
    sales_fault: Mutex<Option<StoreError>>,
    observer: Arc<dyn FeedObserver>,
}

impl std::fmt::Debug for SyncReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncReconciler")
            .field("tables", &self.tables.read().len())
            .field("sales", &self.sales.read().len())
            .field("tables_rev", &*self.tables_rev.borrow())
            .field("sales_rev", &*self.sales_rev.borrow())
            .finish()
    }
}

impl SyncReconciler {
    pub fn new() -> Self {
        Self::with_observer(Arc::new(LoggingObserver))
    }

    pub fn with_observer(observer: Arc<dyn FeedObserver>) -> Self {
        let (tables_rev, _) = watch::channel(0);
        let (sales_rev, _) = watch::channel(0);
        Self {
            tables: RwLock::new(Vec::new()),
            sales: RwLock::new(Vec::new()),
            tables_rev,
            sales_rev,
            tables_fault: Mutex::new(None),
            sales_fault: Mutex::new(None),
            observer,
        }
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Start listening to the tables feed
    pub fn subscribe_tables(self: &Arc<Self>, store: &dyn TableStore) -> Subscription {
        let rx = store.subscribe();
        self.spawn_listener(FeedKind::Tables, rx, Self::apply_tables_snapshot)
    }

    /// Start listening to the sales feed
    pub fn subscribe_sales(self: &Arc<Self>, store: &dyn SaleStore) -> Subscription {
        let rx = store.subscribe();
        self.spawn_listener(FeedKind::Sales, rx, Self::apply_sales_snapshot)
    }

    fn spawn_listener<T: Send + 'static>(
        self: &Arc<Self>,
        feed: FeedKind,
        mut rx: FeedReceiver<T>,
        apply: fn(&Self, Vec<T>),
    ) -> Subscription {
        let token = CancellationToken::new();
        let this = Arc::clone(self);
        let cancel = token.clone();
        let handle = tokio::spawn(async move {
            tracing::debug!(feed = %feed, "Feed listener started");
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    event = rx.recv() => match event {
                        Some(FeedEvent::Snapshot(snapshot)) => apply(&*this, snapshot),
                        Some(FeedEvent::Error(e)) => this.report_error(feed, e),
                        None => {
                            this.observer.on_closed(feed);
                            break;
                        }
                    },
                }
            }
            tracing::debug!(feed = %feed, "Feed listener stopped");
        });
        Subscription::new(feed, token, handle)
    }

    // ========================================================================
    // Snapshot application
    // ========================================================================

    /// Replace the local tables wholesale, sorted ascending by id
    pub fn apply_tables_snapshot(&self, mut snapshot: Vec<Table>) {
        snapshot.sort_by_key(|t| t.table_id);
        let count = snapshot.len();
        *self.tables.write() = snapshot;
        *self.tables_fault.lock() = None;
        self.tables_rev.send_modify(|rev| *rev += 1);
        tracing::debug!(tables = count, revision = *self.tables_rev.borrow(), "Applied tables snapshot");
    }

    /// Replace the local sales wholesale, keeping delivery order
    pub fn apply_sales_snapshot(&self, snapshot: Vec<Sale>) {
        let count = snapshot.len();
        *self.sales.write() = snapshot;
        *self.sales_fault.lock() = None;
        self.sales_rev.send_modify(|rev| *rev += 1);
        tracing::debug!(sales = count, revision = *self.sales_rev.borrow(), "Applied sales snapshot");
    }

    /// Record a transport failure; local data stays as it was
    pub fn report_error(&self, feed: FeedKind, error: StoreError) {
        self.observer.on_error(feed, &error);
        *self.fault_slot(feed).lock() = Some(error);
    }

    fn fault_slot(&self, feed: FeedKind) -> &Mutex<Option<StoreError>> {
        match feed {
            FeedKind::Tables => &self.tables_fault,
            FeedKind::Sales => &self.sales_fault,
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Current tables, ascending by id
    pub fn tables(&self) -> Vec<Table> {
        self.tables.read().clone()
    }

    pub fn table(&self, table_id: TableId) -> Option<Table> {
        self.tables
            .read()
            .iter()
            .find(|t| t.table_id == table_id)
            .cloned()
    }

    /// Current sales, in delivery order
    pub fn sales(&self) -> Vec<Sale> {
        self.sales.read().clone()
    }

    /// Number of tables snapshots applied so far (0 = nothing received yet)
    pub fn tables_revision(&self) -> u64 {
        *self.tables_rev.borrow()
    }

    /// Number of sales snapshots applied so far
    pub fn sales_revision(&self) -> u64 {
        *self.sales_rev.borrow()
    }

    /// Change notifications for the tables collection
    pub fn watch_tables(&self) -> watch::Receiver<u64> {
        self.tables_rev.subscribe()
    }

    /// Change notifications for the sales collection
    pub fn watch_sales(&self) -> watch::Receiver<u64> {
        self.sales_rev.subscribe()
    }

    /// Resolve once the tables revision reaches `revision`
    pub async fn wait_for_tables(&self, revision: u64) {
        let mut rx = self.tables_rev.subscribe();
        let _ = rx.wait_for(|rev| *rev >= revision).await;
    }

    /// Resolve once the sales revision reaches `revision`
    pub async fn wait_for_sales(&self, revision: u64) {
        let mut rx = self.sales_rev.subscribe();
        let _ = rx.wait_for(|rev| *rev >= revision).await;
    }

    /// Last transport error since the last good snapshot
    pub fn last_error(&self, feed: FeedKind) -> Option<StoreError> {
        self.fault_slot(feed).lock().clone()
    }

    /// Data shown for `feed` may be out of date
    pub fn is_stale(&self, feed: FeedKind) -> bool {
        self.fault_slot(feed).lock().is_some()
    }
}

impl Default for SyncReconciler {
    fn default() -> Self {
        Self::new()
    }
}
