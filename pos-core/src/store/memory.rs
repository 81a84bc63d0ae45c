//! In-process stores (同进程通信)
//!
//! Reference implementations of [`TableStore`] and [`SaleStore`] used by
//! tests, demos and single-terminal setups. They mimic a remote document
//! store: server-side write stamps, snapshot echo after every write, merge
//! upserts, and idempotent appends. Fault injection hooks let callers
//! simulate transport failures.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use chrono_tz::Tz;
use shared::models::{NewSale, Sale, Table, TableId, TablePatch};

use super::clock::{Clock, SystemClock};
use super::error::{StoreError, StoreResult};
use super::feed::{FeedHub, FeedReceiver};
use super::{SaleStore, TableStore};
use crate::utils::time;

/// Countdown of writes that should fail
#[derive(Debug, Default)]
struct FaultPlan {
    remaining: AtomicUsize,
}

impl FaultPlan {
    fn arm(&self, count: usize) {
        self.remaining.store(count, Ordering::SeqCst);
    }

    fn check(&self, op: &str) -> StoreResult<()> {
        let tripped = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if tripped {
            tracing::debug!(op = op, "Injected store failure");
            return Err(StoreError::unavailable(format!("injected failure on {}", op)));
        }
        Ok(())
    }
}

// ============================================================================
// Tables
// ============================================================================

/// In-memory table collection keyed by table id
pub struct MemoryTableStore {
    tables: RwLock<BTreeMap<TableId, Table>>,
    hub: FeedHub<Table>,
    clock: Arc<dyn Clock>,
    faults: FaultPlan,
}

impl std::fmt::Debug for MemoryTableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTableStore")
            .field("tables", &self.tables.read().len())
            .field("subscribers", &self.hub.subscriber_count())
            .finish()
    }
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: RwLock::new(BTreeMap::new()),
            hub: FeedHub::new(),
            clock,
            faults: FaultPlan::default(),
        }
    }

    /// Current stored listing, ascending by table id
    pub fn snapshot(&self) -> Vec<Table> {
        listing(&self.tables.read())
    }

    pub fn get(&self, table_id: TableId) -> Option<Table> {
        self.tables.read().get(&table_id).cloned()
    }

    /// Make the next `count` writes fail with [`StoreError::Unavailable`]
    pub fn fail_next_writes(&self, count: usize) {
        self.faults.arm(count);
    }

    /// Push a transport error down every open feed
    pub fn push_error(&self, error: StoreError) {
        self.hub.publish_error(error);
    }

    /// Keep accepting writes but stop echoing them to subscribers
    pub fn hold_feed(&self) {
        self.hub.hold();
    }

    /// Resume echoes and deliver the current listing if anything was held
    pub fn release_feed(&self) {
        let tables = self.tables.read();
        if self.hub.release() {
            self.hub.publish(listing(&tables));
        }
    }

    /// Re-deliver the current listing (at-least-once delivery)
    pub fn redeliver(&self) {
        let tables = self.tables.read();
        self.hub.publish(listing(&tables));
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count()
    }

    /// Non-decreasing per document
    fn stamp(&self, previous: Option<i64>) -> i64 {
        let now = self.clock.now_millis();
        previous.map_or(now, |prev| prev.max(now))
    }
}

impl Default for MemoryTableStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    fn subscribe(&self) -> FeedReceiver<Table> {
        // Registered under the lock so no write can slip between the
        // initial listing and the first echo
        let tables = self.tables.read();
        self.hub.subscribe(listing(&tables))
    }

    async fn upsert_merge(&self, table_id: TableId, patch: TablePatch) -> StoreResult<()> {
        self.faults.check("upsert_merge")?;
        let mut tables = self.tables.write();
        match tables.get_mut(&table_id) {
            Some(_) if patch.is_seed() => return Ok(()),
            Some(existing) => {
                patch.apply_to(existing);
                existing.last_update = Some(self.stamp(existing.last_update));
            }
            None => {
                let mut table = Table::closed(table_id);
                patch.apply_to(&mut table);
                table.last_update = Some(self.stamp(None));
                tables.insert(table_id, table);
            }
        }
        // Published before the lock drops: echoes leave in write order
        self.hub.publish(listing(&tables));
        Ok(())
    }

    async fn replace(&self, mut table: Table) -> StoreResult<()> {
        self.faults.check("replace")?;
        let mut tables = self.tables.write();
        let previous = tables.get(&table.table_id).and_then(|t| t.last_update);
        table.last_update = Some(self.stamp(previous));
        tables.insert(table.table_id, table);
        self.hub.publish(listing(&tables));
        Ok(())
    }
}

fn listing(tables: &BTreeMap<TableId, Table>) -> Vec<Table> {
    tables.values().cloned().collect()
}

// ============================================================================
// Sales
// ============================================================================

/// In-memory append-only sale collection
pub struct MemorySaleStore {
    sales: RwLock<Vec<Sale>>,
    hub: FeedHub<Sale>,
    clock: Arc<dyn Clock>,
    /// Zone the write-time `date` is derived in
    timezone: Tz,
    faults: FaultPlan,
}

impl std::fmt::Debug for MemorySaleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySaleStore")
            .field("sales", &self.sales.read().len())
            .field("timezone", &self.timezone)
            .field("subscribers", &self.hub.subscriber_count())
            .finish()
    }
}

impl MemorySaleStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            sales: RwLock::new(Vec::new()),
            hub: FeedHub::new(),
            clock,
            timezone: chrono_tz::UTC,
            faults: FaultPlan::default(),
        }
    }

    /// Business timezone for `Sale.date` (UTC by default)
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Seed historical records without going through a checkout
    pub fn with_sales(self, sales: Vec<Sale>) -> Self {
        *self.sales.write() = sales;
        self
    }

    /// Current stored listing, in append order
    pub fn snapshot(&self) -> Vec<Sale> {
        self.sales.read().clone()
    }

    pub fn len(&self) -> usize {
        self.sales.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sales.read().is_empty()
    }

    /// Make the next `count` appends fail with [`StoreError::Unavailable`]
    pub fn fail_next_writes(&self, count: usize) {
        self.faults.arm(count);
    }

    /// Push a transport error down every open feed
    pub fn push_error(&self, error: StoreError) {
        self.hub.publish_error(error);
    }

    pub fn hold_feed(&self) {
        self.hub.hold();
    }

    pub fn release_feed(&self) {
        let sales = self.sales.read();
        if self.hub.release() {
            self.hub.publish(sales.clone());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count()
    }
}

impl Default for MemorySaleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SaleStore for MemorySaleStore {
    fn subscribe(&self) -> FeedReceiver<Sale> {
        let sales = self.sales.read();
        self.hub.subscribe(sales.clone())
    }

    async fn append(&self, sale: NewSale) -> StoreResult<Sale> {
        self.faults.check("append")?;
        let mut sales = self.sales.write();
        let duplicate = sales
            .iter()
            .find(|s| s.checkout_id.as_deref() == Some(sale.checkout_id.as_str()));
        if let Some(existing) = duplicate {
            tracing::debug!(
                checkout_id = %sale.checkout_id,
                sale_id = %existing.id,
                "Duplicate append ignored"
            );
            return Ok(existing.clone());
        }

        let timestamp = self.clock.now_millis();
        let date = time::date_string(timestamp, self.timezone);
        let stored = sale.into_sale(uuid::Uuid::new_v4().to_string(), timestamp, date);
        sales.push(stored.clone());
        self.hub.publish(sales.clone());
        Ok(stored)
    }
}
