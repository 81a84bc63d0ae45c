//! Remote store seams
//!
//! The core never talks to a concrete database. Tables and sales live behind
//! [`TableStore`] and [`SaleStore`]; both expose a live feed that delivers
//! full snapshots through a single-consumer channel.
//!
//! ```text
//! write ──▶ Store ──▶ FeedHub ──▶ mpsc ──▶ SyncReconciler listener
//!                        ▲
//!                   subscribe() delivers the current snapshot first
//! ```

pub mod clock;
pub mod error;
pub mod feed;
pub mod memory;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{StoreError, StoreResult};
pub use feed::{FeedEvent, FeedHub, FeedReceiver};
pub use memory::{MemorySaleStore, MemoryTableStore};

use async_trait::async_trait;
use shared::models::{NewSale, Sale, Table, TableId, TablePatch};

/// Remote table collection
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Open a live feed; the current listing is delivered first.
    /// Dropping the receiver ends the subscription.
    fn subscribe(&self) -> FeedReceiver<Table>;

    /// Merge `patch` into the table, creating it closed when missing
    async fn upsert_merge(&self, table_id: TableId, patch: TablePatch) -> StoreResult<()>;

    /// Overwrite the whole table document
    async fn replace(&self, table: Table) -> StoreResult<()>;
}

/// Remote append-only sale collection
#[async_trait]
pub trait SaleStore: Send + Sync {
    /// Open a live feed; the current listing is delivered first.
    fn subscribe(&self) -> FeedReceiver<Sale>;

    /// Append a sale and return the stored record.
    ///
    /// The store assigns `id`, `timestamp` and the business `date`, both
    /// taken from its own write time. Appending twice with the same
    /// `checkout_id` returns the first record and stores nothing new.
    async fn append(&self, sale: NewSale) -> StoreResult<Sale>;
}
