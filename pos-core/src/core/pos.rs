//! 运行时组装
//!
//! [`PointOfSale`] wires one [`SyncReconciler`] per process to both feeds,
//! starts the table initializer, and exposes the operations a presentation
//! layer needs.
//!
//! # 使用示例
//!
//! ```ignore
//! let ctx = SessionContext::in_memory("staff-1");
//! let pos = PointOfSale::start(ctx, MenuCatalog::builtin());
//!
//! let mut cart = pos.open_cart(3);
//! cart.adjust_quantity(pos.catalog().require("burger")?, 1);
//! pos.save(&cart).await?;
//!
//! pos.shutdown().await;
//! ```

use std::sync::Arc;

use shared::models::{BucketMode, Sale, SalesReport, Table, TableId};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::context::SessionContext;
use crate::checkout::{CheckoutReceipt, CheckoutResult, CheckoutService};
use crate::menu::MenuCatalog;
use crate::orders::OrderCart;
use crate::reports::SalesAggregator;
use crate::sync::{FeedObserver, LoggingObserver, Subscription, SyncReconciler};
use crate::tables::{RegistryResult, TableRegistry};

/// Running controller for one terminal
pub struct PointOfSale {
    ctx: SessionContext,
    catalog: MenuCatalog,
    sync: Arc<SyncReconciler>,
    registry: Arc<TableRegistry>,
    checkout: CheckoutService,
    reports: SalesAggregator,
    subscriptions: Vec<Subscription>,
    initializer: Option<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for PointOfSale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointOfSale")
            .field("ctx", &self.ctx)
            .field("menu_items", &self.catalog.len())
            .field("sync", &self.sync)
            .finish()
    }
}

impl PointOfSale {
    /// Subscribe to both feeds and start the table initializer.
    ///
    /// Must be called from inside a Tokio runtime.
    pub fn start(ctx: SessionContext, catalog: MenuCatalog) -> Self {
        Self::start_with_observer(ctx, catalog, Arc::new(LoggingObserver))
    }

    pub fn start_with_observer(
        ctx: SessionContext,
        catalog: MenuCatalog,
        observer: Arc<dyn FeedObserver>,
    ) -> Self {
        let sync = Arc::new(SyncReconciler::with_observer(observer));
        let subscriptions = vec![
            sync.subscribe_tables(ctx.tables.as_ref()),
            sync.subscribe_sales(ctx.sales.as_ref()),
        ];

        let registry = Arc::new(TableRegistry::new(ctx.clone(), Arc::clone(&sync)));
        let shutdown = CancellationToken::new();
        let initializer = registry.spawn_initializer(shutdown.child_token());

        tracing::info!(
            actor = %ctx.actor_id,
            tables = ctx.table_count,
            timezone = %ctx.timezone,
            menu_items = catalog.len(),
            "Point of sale started"
        );

        Self {
            checkout: CheckoutService::new(ctx.clone()),
            reports: SalesAggregator::with_clock(ctx.timezone, Arc::clone(&ctx.clock)),
            ctx,
            catalog,
            sync,
            registry,
            subscriptions,
            initializer: Some(initializer),
            shutdown,
        }
    }

    // ========== Accessors ==========

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn catalog(&self) -> &MenuCatalog {
        &self.catalog
    }

    pub fn sync(&self) -> &Arc<SyncReconciler> {
        &self.sync
    }

    pub fn registry(&self) -> &Arc<TableRegistry> {
        &self.registry
    }

    pub fn checkout_service(&self) -> &CheckoutService {
        &self.checkout
    }

    // ========== Tables ==========

    pub fn tables(&self) -> Vec<Table> {
        self.registry.tables()
    }

    pub fn find_table(&self, table_id: TableId) -> Table {
        self.registry.find_table(table_id)
    }

    pub fn open_cart(&self, table_id: TableId) -> OrderCart {
        self.registry.open_cart(table_id)
    }

    /// Persist a cart; visible locally once the feed echoes it
    pub async fn save(&self, cart: &OrderCart) -> RegistryResult<()> {
        self.registry.save_order(cart).await
    }

    // ========== Checkout ==========

    /// Check out the table as currently shown
    pub async fn checkout_table(&self, table_id: TableId) -> CheckoutResult<CheckoutReceipt> {
        let table = self.registry.find_table(table_id);
        self.checkout.checkout_table(&table).await
    }

    /// Check out an edited cart directly, without saving it first
    pub async fn checkout_cart(&self, cart: &OrderCart) -> CheckoutResult<CheckoutReceipt> {
        self.checkout
            .checkout(cart.table_id(), cart.to_order(), cart.total())
            .await
    }

    // ========== Reports ==========

    pub fn sales(&self) -> Vec<Sale> {
        self.sync.sales()
    }

    /// Recomputed from the full local sale history
    pub fn report(&self, mode: BucketMode) -> SalesReport {
        self.reports.aggregate(&self.sync.sales(), mode)
    }

    // ========== Lifecycle ==========

    /// Stop the initializer and both feed listeners, waiting for each
    pub async fn shutdown(mut self) {
        tracing::info!("Shutting down point of sale");
        self.shutdown.cancel();
        if let Some(handle) = self.initializer.take()
            && let Err(e) = handle.await
        {
            tracing::error!(error = %e, "Table initializer ended abnormally");
        }
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe().await;
        }
        tracing::info!("Point of sale stopped");
    }
}

impl Drop for PointOfSale {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
