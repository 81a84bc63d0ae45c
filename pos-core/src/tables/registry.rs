use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::future::join_all;
use shared::models::{Table, TableId, TablePatch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::error::{RegistryError, RegistryResult};
use crate::core::SessionContext;
use crate::orders::{OrderCart, OrderError, validate_order};
use crate::sync::SyncReconciler;

/// Result of an initialization check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// Seed writes were issued for this many tables
    Initialized(usize),
    /// Every pool id is already present
    AlreadyPopulated,
    /// No tables snapshot delivered yet, emptiness is unknown
    NoSnapshot,
    /// Another caller in this process is seeding right now
    InProgress,
}

const INIT_RETRY_BASE: Duration = Duration::from_millis(100);
const INIT_RETRY_MAX: Duration = Duration::from_secs(5);

/// Clears the in-flight flag when a seeding pass ends, even on error
struct SeedingGuard<'a>(&'a AtomicBool);

impl Drop for SeedingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Authoritative projection of the table pool (桌台注册表)
pub struct TableRegistry {
    ctx: SessionContext,
    sync: Arc<SyncReconciler>,
    seeding: AtomicBool,
}

impl std::fmt::Debug for TableRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableRegistry")
            .field("table_count", &self.ctx.table_count)
            .field("seeding", &self.seeding.load(Ordering::Relaxed))
            .finish()
    }
}

impl TableRegistry {
    pub fn new(ctx: SessionContext, sync: Arc<SyncReconciler>) -> Self {
        Self {
            ctx,
            sync,
            seeding: AtomicBool::new(false),
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    // ========== Reads ==========

    /// All tables known locally, ascending by id
    pub fn tables(&self) -> Vec<Table> {
        self.sync.tables()
    }

    /// Never fails: unknown ids read as a closed, empty table
    pub fn find_table(&self, table_id: TableId) -> Table {
        self.sync
            .table(table_id)
            .unwrap_or_else(|| Table::closed(table_id))
    }

    /// Start an editing session from the table's current order
    pub fn open_cart(&self, table_id: TableId) -> OrderCart {
        OrderCart::from_table(&self.find_table(table_id))
    }

    // ========== Initialization ==========

    /// Merge-write a closed seed for every id in the pool.
    ///
    /// Seeds never overwrite an existing table, so this is safe to run any
    /// number of times, from any number of clients, concurrently.
    pub async fn initialize(&self) -> RegistryResult<usize> {
        self.seed(self.ctx.table_ids().collect()).await
    }

    async fn seed(&self, table_ids: Vec<TableId>) -> RegistryResult<usize> {
        let actor = self.ctx.actor_id.clone();
        let writes = table_ids.into_iter().map(|table_id| {
            let store = Arc::clone(&self.ctx.tables);
            let patch = TablePatch::seed().by(actor.clone());
            async move { (table_id, store.upsert_merge(table_id, patch).await) }
        });

        let mut seeded = 0;
        let mut first_error = None;
        for (table_id, result) in join_all(writes).await {
            match result {
                Ok(()) => seeded += 1,
                Err(e) => {
                    tracing::warn!(table_id = table_id, error = %e, "Table seed write failed");
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            return Err(RegistryError::Store(e));
        }
        tracing::info!(tables = seeded, "Table pool seeded");
        Ok(seeded)
    }

    /// Pool ids absent from the local snapshot
    fn missing_table_ids(&self) -> Vec<TableId> {
        let known: HashSet<TableId> = self.sync.tables().iter().map(|t| t.table_id).collect();
        self.ctx
            .table_ids()
            .filter(|table_id| !known.contains(table_id))
            .collect()
    }

    /// Seed whichever pool ids a delivered snapshot does not contain.
    ///
    /// Compares against the pool rather than checking for an empty set, so a
    /// partially seeded pool (one write failed, the rest echoed back) is
    /// completed on the next call.
    pub async fn ensure_initialized(&self) -> RegistryResult<InitOutcome> {
        if self.sync.tables_revision() == 0 {
            return Ok(InitOutcome::NoSnapshot);
        }
        let missing = self.missing_table_ids();
        if missing.is_empty() {
            return Ok(InitOutcome::AlreadyPopulated);
        }
        if self.seeding.swap(true, Ordering::SeqCst) {
            return Ok(InitOutcome::InProgress);
        }
        let _seeding = SeedingGuard(&self.seeding);
        let seeded = self.seed(missing).await?;
        Ok(InitOutcome::Initialized(seeded))
    }

    /// Run [`Self::ensure_initialized`] on every tables delivery until the
    /// pool is complete. Failed seeds are retried with capped backoff even
    /// when no further delivery arrives.
    pub fn spawn_initializer(self: &Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mut revisions = this.sync.watch_tables();
            let mut backoff = INIT_RETRY_BASE;
            loop {
                revisions.borrow_and_update();
                let retry_after = match this.ensure_initialized().await {
                    Ok(InitOutcome::NoSnapshot | InitOutcome::InProgress) => None,
                    Ok(outcome) => {
                        tracing::debug!(?outcome, "Table initializer finished");
                        break;
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            retry_in_ms = backoff.as_millis() as u64,
                            "Table initialization failed, retrying"
                        );
                        let delay = backoff;
                        backoff = (backoff * 2).min(INIT_RETRY_MAX);
                        Some(delay)
                    }
                };
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    changed = revisions.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = tokio::time::sleep(retry_after.unwrap_or(INIT_RETRY_BASE)), if retry_after.is_some() => {}
                }
            }
        })
    }

    // ========== Save ==========

    /// Persist the cart as the table's full order.
    ///
    /// Full overwrite: concurrent editors of one table are not arbitrated and
    /// the last Save wins. Status and total are derived from the order.
    pub async fn save_order(&self, cart: &OrderCart) -> RegistryResult<()> {
        let table_id = cart.table_id();
        if !self.ctx.is_known_table(table_id) {
            return Err(OrderError::UnknownTable(table_id).into());
        }
        let order = cart.to_order();
        validate_order(&order, cart.total())?;

        let mut table = Table::with_order(table_id, order);
        table.updated_by = Some(self.ctx.actor_id.clone());
        let (status, total) = (table.status, table.total);
        self.ctx.tables.replace(table).await?;

        tracing::info!(
            table_id = table_id,
            status = ?status,
            total = %total,
            actor = %self.ctx.actor_id,
            "Table order saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemorySaleStore, MemoryTableStore, TableStore};
    use rust_decimal::dec;
    use shared::models::{MenuItem, TableStatus};

    struct Fixture {
        store: Arc<MemoryTableStore>,
        sync: Arc<SyncReconciler>,
        registry: Arc<TableRegistry>,
    }

    fn fixture(table_count: i64) -> Fixture {
        let store = Arc::new(MemoryTableStore::new());
        let ctx = SessionContext::new("staff-1", store.clone(), Arc::new(MemorySaleStore::new()))
            .with_table_count(table_count);
        let sync = Arc::new(SyncReconciler::new());
        let registry = Arc::new(TableRegistry::new(ctx, sync.clone()));
        Fixture {
            store,
            sync,
            registry,
        }
    }

    fn burger() -> MenuItem {
        MenuItem::new("burger", "Burger", dec!(12.50))
    }

    #[test]
    fn test_find_table_defaults_to_closed() {
        let f = fixture(10);
        let table = f.registry.find_table(42);
        assert_eq!(table.table_id, 42);
        assert_eq!(table.status, TableStatus::Closed);
        assert_eq!(table.total, dec!(0));
        assert!(table.order.is_empty());
    }

    #[test]
    fn test_find_table_reads_local_snapshot() {
        let f = fixture(10);
        let mut cart = OrderCart::new(4);
        cart.increment(&burger());
        f.sync
            .apply_tables_snapshot(vec![Table::with_order(4, cart.to_order())]);

        let table = f.registry.find_table(4);
        assert!(table.is_open());
        assert_eq!(table.total, dec!(12.50));
        assert_eq!(f.registry.open_cart(4).quantity_of("burger"), 1);
    }

    #[tokio::test]
    async fn test_initialize_creates_closed_pool() {
        let f = fixture(10);
        assert_eq!(f.registry.initialize().await.unwrap(), 10);

        let tables = f.store.snapshot();
        assert_eq!(tables.len(), 10);
        assert_eq!(tables.first().map(|t| t.table_id), Some(1));
        assert_eq!(tables.last().map(|t| t.table_id), Some(10));
        assert!(tables.iter().all(|t| t.is_consistent() && !t.is_open()));
    }

    #[tokio::test]
    async fn test_initialize_twice_keeps_live_orders() {
        let f = fixture(10);
        f.registry.initialize().await.unwrap();

        let mut cart = OrderCart::new(3);
        cart.adjust_quantity(&burger(), 1);
        f.registry.save_order(&cart).await.unwrap();

        f.registry.initialize().await.unwrap();
        let table = f.store.get(3).unwrap();
        assert_eq!(table.status, TableStatus::Open);
        assert_eq!(table.total, dec!(12.50));
        assert_eq!(f.store.snapshot().len(), 10);
    }

    #[tokio::test]
    async fn test_ensure_initialized_waits_for_snapshot() {
        let f = fixture(3);
        assert_eq!(
            f.registry.ensure_initialized().await.unwrap(),
            InitOutcome::NoSnapshot
        );
        assert!(f.store.snapshot().is_empty());

        f.sync.apply_tables_snapshot(vec![]);
        assert_eq!(
            f.registry.ensure_initialized().await.unwrap(),
            InitOutcome::Initialized(3)
        );
        // without the feed the local view is still empty, seeds repeat harmlessly
        assert_eq!(
            f.registry.ensure_initialized().await.unwrap(),
            InitOutcome::Initialized(3)
        );
        assert_eq!(f.store.snapshot().len(), 3);

        f.sync.apply_tables_snapshot(f.store.snapshot());
        assert_eq!(
            f.registry.ensure_initialized().await.unwrap(),
            InitOutcome::AlreadyPopulated
        );
    }

    #[tokio::test]
    async fn test_failed_initialization_can_retry() {
        let f = fixture(2);
        f.sync.apply_tables_snapshot(vec![]);
        f.store.fail_next_writes(1);

        let err = f.registry.ensure_initialized().await.unwrap_err();
        assert!(!err.is_validation());
        assert_eq!(
            f.registry.ensure_initialized().await.unwrap(),
            InitOutcome::Initialized(2)
        );
        assert_eq!(f.store.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn test_ensure_initialized_seeds_only_missing_ids() {
        let f = fixture(3);
        let mut cart = OrderCart::new(1);
        cart.increment(&burger());
        f.registry.save_order(&cart).await.unwrap();
        f.store
            .upsert_merge(3, TablePatch::seed().by("other"))
            .await
            .unwrap();
        f.sync.apply_tables_snapshot(f.store.snapshot());

        assert_eq!(
            f.registry.ensure_initialized().await.unwrap(),
            InitOutcome::Initialized(1)
        );
        let ids: Vec<_> = f.store.snapshot().iter().map(|t| t.table_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(f.store.get(1).unwrap().is_open());
    }

    #[tokio::test]
    async fn test_initializer_completes_pool_after_failed_seed() {
        let f = fixture(10);
        let sub = f.sync.subscribe_tables(f.store.as_ref());
        f.store.fail_next_writes(1);

        let handle = f.registry.spawn_initializer(CancellationToken::new());
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("initializer should finish")
            .unwrap();

        let ids: Vec<_> = f.store.snapshot().iter().map(|t| t.table_id).collect();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
        sub.unsubscribe().await;
    }

    #[tokio::test]
    async fn test_initializer_stops_on_cancel() {
        let f = fixture(2);
        let token = CancellationToken::new();
        // no feed attached: no snapshot ever arrives
        let handle = f.registry.spawn_initializer(token.clone());
        token.cancel();
        handle.await.unwrap();
        assert!(f.store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_spawned_initializer_seeds_after_first_snapshot() {
        let f = fixture(4);
        let sub = f.sync.subscribe_tables(f.store.as_ref());
        let token = CancellationToken::new();
        let handle = f.registry.spawn_initializer(token.clone());

        handle.await.unwrap();
        // empty snapshot, then one echo per seeded table
        f.sync.wait_for_tables(5).await;
        let ids: Vec<_> = f.registry.tables().iter().map(|t| t.table_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        sub.unsubscribe().await;
    }

    #[tokio::test]
    async fn test_save_replaces_whole_table() {
        let f = fixture(10);
        let mut cart = OrderCart::new(2);
        cart.adjust_quantity(&burger(), 1);
        cart.adjust_quantity(&burger(), 2);
        f.registry.save_order(&cart).await.unwrap();

        let stored = f.store.get(2).unwrap();
        assert_eq!(stored.total, dec!(37.50));
        assert_eq!(stored.updated_by.as_deref(), Some("staff-1"));
        assert!(stored.is_consistent());

        // Second editor saves an emptied cart: last Save wins
        let mut other = OrderCart::new(2);
        other.clear();
        f.registry.save_order(&other).await.unwrap();
        let stored = f.store.get(2).unwrap();
        assert_eq!(stored.status, TableStatus::Closed);
        assert_eq!(stored.total, dec!(0));
    }

    #[tokio::test]
    async fn test_save_is_not_applied_optimistically() {
        let f = fixture(10);
        let sub = f.sync.subscribe_tables(f.store.as_ref());
        f.sync.wait_for_tables(1).await;
        f.store.hold_feed();

        let mut cart = OrderCart::new(5);
        cart.increment(&burger());
        f.registry.save_order(&cart).await.unwrap();
        assert!(!f.registry.find_table(5).is_open());

        f.store.release_feed();
        f.sync.wait_for_tables(2).await;
        assert!(f.registry.find_table(5).is_open());
        sub.unsubscribe().await;
    }

    #[tokio::test]
    async fn test_save_rejects_unknown_table() {
        let f = fixture(10);
        let err = f.registry.save_order(&OrderCart::new(11)).await.unwrap_err();
        assert_eq!(err, RegistryError::Validation(OrderError::UnknownTable(11)));
        assert!(f.store.get(11).is_none());
    }

    #[tokio::test]
    async fn test_save_store_failure_surfaces() {
        let f = fixture(10);
        f.store.fail_next_writes(1);
        let mut cart = OrderCart::new(1);
        cart.increment(&burger());
        let err = f.registry.save_order(&cart).await.unwrap_err();
        assert!(matches!(err, RegistryError::Store(_)));
        assert!(f.store.get(1).is_none());
    }
}
