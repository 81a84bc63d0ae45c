use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{NewSale, Order, SaleId, Table, TableId, TablePatch};

use super::error::{CheckoutError, CheckoutResult};
use crate::core::SessionContext;
use crate::orders::{OrderError, validate_order};
use crate::store::StoreResult;

/// Validated checkout, ready to execute (and re-execute)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCheckout {
    /// Idempotency key carried into the sale record
    pub checkout_id: String,
    pub table_id: TableId,
    pub order: Order,
    pub total: Decimal,
}

/// Outcome of a completed checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub checkout_id: String,
    pub sale_id: SaleId,
    pub table_id: TableId,
    pub total: Decimal,
    /// Business date the store booked the sale under
    pub date: String,
}

/// Checkout service (结账)
#[derive(Debug, Clone)]
pub struct CheckoutService {
    ctx: SessionContext,
}

impl CheckoutService {
    pub fn new(ctx: SessionContext) -> Self {
        Self { ctx }
    }

    /// Validate a checkout request without touching any store
    pub fn prepare(
        &self,
        table_id: TableId,
        order: Order,
        total: Decimal,
    ) -> CheckoutResult<PendingCheckout> {
        if !self.ctx.is_known_table(table_id) {
            return Err(OrderError::UnknownTable(table_id).into());
        }
        if order.is_empty() {
            return Err(OrderError::EmptyOrder.into());
        }
        validate_order(&order, total)?;

        Ok(PendingCheckout {
            checkout_id: uuid::Uuid::new_v4().to_string(),
            table_id,
            order,
            total,
        })
    }

    /// Record the sale, then reset the table.
    ///
    /// Safe to call again with the same `pending` after any failure: the sale
    /// store returns the already-recorded sale for a repeated `checkout_id`.
    pub async fn execute(&self, pending: &PendingCheckout) -> CheckoutResult<CheckoutReceipt> {
        let sale = NewSale {
            checkout_id: pending.checkout_id.clone(),
            table_id: pending.table_id,
            items: pending.order.clone(),
            total: pending.total,
            created_by: Some(self.ctx.actor_id.clone()),
        };

        let stored = self.ctx.sales.append(sale).await.map_err(|e| {
            tracing::warn!(
                table_id = pending.table_id,
                checkout_id = %pending.checkout_id,
                error = %e,
                "Checkout aborted, sale not recorded"
            );
            CheckoutError::SaleAppend(e)
        })?;

        if let Err(e) = self.reset_table(pending.table_id).await {
            tracing::error!(
                table_id = pending.table_id,
                sale_id = %stored.id,
                error = %e,
                "Sale recorded but table reset failed"
            );
            return Err(CheckoutError::PartialCheckout {
                sale_id: stored.id,
                table_id: pending.table_id,
                source: e,
            });
        }

        tracing::info!(
            table_id = pending.table_id,
            sale_id = %stored.id,
            total = %stored.total,
            date = %stored.date,
            actor = %self.ctx.actor_id,
            "Checkout completed"
        );
        Ok(CheckoutReceipt {
            checkout_id: pending.checkout_id.clone(),
            sale_id: stored.id,
            table_id: stored.table_id,
            total: stored.total,
            date: stored.date,
        })
    }

    /// [`Self::prepare`] followed by [`Self::execute`]
    pub async fn checkout(
        &self,
        table_id: TableId,
        order: Order,
        total: Decimal,
    ) -> CheckoutResult<CheckoutReceipt> {
        let pending = self.prepare(table_id, order, total)?;
        self.execute(&pending).await
    }

    /// Check out whatever the table currently holds
    pub async fn checkout_table(&self, table: &Table) -> CheckoutResult<CheckoutReceipt> {
        self.checkout(table.table_id, table.order.clone(), table.total)
            .await
    }

    /// Re-issue the reset after a [`CheckoutError::PartialCheckout`]
    pub async fn retry_reset(&self, table_id: TableId) -> StoreResult<()> {
        self.reset_table(table_id).await?;
        tracing::info!(table_id = table_id, "Table reset retried successfully");
        Ok(())
    }

    async fn reset_table(&self, table_id: TableId) -> StoreResult<()> {
        let patch = TablePatch::closed().by(self.ctx.actor_id.clone());
        self.ctx.tables.upsert_merge(table_id, patch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::store::{ManualClock, MemorySaleStore, MemoryTableStore, StoreError, TableStore};
    use rust_decimal::dec;
    use shared::models::{OrderLine, TableStatus};

    // 2024-01-05T12:00:00Z
    const NOON: i64 = 1_704_456_000_000;

    struct Fixture {
        tables: Arc<MemoryTableStore>,
        sales: Arc<MemorySaleStore>,
        service: CheckoutService,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(NOON));
        let tables = Arc::new(MemoryTableStore::with_clock(clock.clone()));
        let sales = Arc::new(MemorySaleStore::with_clock(clock.clone()));
        let ctx = SessionContext::new("staff-9", tables.clone(), sales.clone()).with_clock(clock);
        Fixture {
            tables,
            sales,
            service: CheckoutService::new(ctx),
        }
    }

    fn order() -> Order {
        Order::from_lines(vec![
            OrderLine {
                id: "burger".into(),
                name: "Burger".into(),
                price: dec!(12.50),
                quantity: 2,
            },
            OrderLine {
                id: "cola".into(),
                name: "Cola".into(),
                price: dec!(3.00),
                quantity: 1,
            },
        ])
    }

    async fn open_table(f: &Fixture, table_id: TableId) -> Table {
        let table = Table::with_order(table_id, order());
        f.tables.replace(table.clone()).await.unwrap();
        table
    }

    #[tokio::test]
    async fn test_empty_order_rejected_before_any_write() {
        let f = fixture();
        f.tables.replace(Table::closed(1)).await.unwrap();
        let before = f.tables.get(1);

        let err = f
            .service
            .checkout(1, Order::new(), dec!(0))
            .await
            .unwrap_err();

        assert_eq!(err, CheckoutError::Validation(OrderError::EmptyOrder));
        assert!(err.is_validation());
        assert!(f.sales.is_empty());
        assert_eq!(f.tables.get(1), before);
    }

    #[tokio::test]
    async fn test_checkout_records_one_sale_and_resets_table() {
        let f = fixture();
        let table = open_table(&f, 6).await;

        let receipt = f.service.checkout_table(&table).await.unwrap();
        assert_eq!(receipt.total, dec!(28.00));
        assert_eq!(receipt.date, "2024-01-05");

        let sales = f.sales.snapshot();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].id, receipt.sale_id);
        assert_eq!(sales[0].items, table.order);
        assert_eq!(sales[0].total, table.total);
        assert_eq!(sales[0].timestamp, Some(NOON));
        assert_eq!(sales[0].created_by.as_deref(), Some("staff-9"));

        let reset = f.tables.get(6).unwrap();
        assert_eq!(reset.status, TableStatus::Closed);
        assert!(reset.order.is_empty());
        assert_eq!(reset.total, dec!(0));
    }

    #[tokio::test]
    async fn test_total_mismatch_rejected() {
        let f = fixture();
        let err = f.service.prepare(2, order(), dec!(27.99)).unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Validation(OrderError::TotalMismatch { .. })
        ));
        assert!(f.sales.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_table_rejected() {
        let f = fixture();
        let err = f.service.prepare(0, order(), dec!(28.00)).unwrap_err();
        assert_eq!(err, CheckoutError::Validation(OrderError::UnknownTable(0)));
    }

    #[tokio::test]
    async fn test_sale_append_failure_leaves_table_open() {
        let f = fixture();
        open_table(&f, 3).await;
        f.sales.fail_next_writes(1);

        let err = f
            .service
            .checkout(3, order(), dec!(28.00))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::SaleAppend(StoreError::Unavailable(_))));
        assert!(err.sale_recorded().is_none());
        assert!(f.sales.is_empty());
        assert!(f.tables.get(3).unwrap().is_open());
    }

    #[tokio::test]
    async fn test_partial_checkout_keeps_sale_and_reset_can_retry() {
        let f = fixture();
        open_table(&f, 4).await;
        f.tables.fail_next_writes(1);

        let pending = f.service.prepare(4, order(), dec!(28.00)).unwrap();
        let err = f.service.execute(&pending).await.unwrap_err();
        let sale_id = err.sale_recorded().cloned().unwrap();
        assert_eq!(f.sales.len(), 1);
        assert!(f.tables.get(4).unwrap().is_open());

        f.service.retry_reset(4).await.unwrap();
        assert!(!f.tables.get(4).unwrap().is_open());
        assert_eq!(f.sales.snapshot()[0].id, sale_id);
    }

    #[tokio::test]
    async fn test_reexecuting_pending_checkout_does_not_double_record() {
        let f = fixture();
        open_table(&f, 5).await;
        f.tables.fail_next_writes(1);

        let pending = f.service.prepare(5, order(), dec!(28.00)).unwrap();
        let first = f.service.execute(&pending).await.unwrap_err();
        let receipt = f.service.execute(&pending).await.unwrap();

        assert_eq!(first.sale_recorded(), Some(&receipt.sale_id));
        assert_eq!(f.sales.len(), 1);
        assert!(!f.tables.get(5).unwrap().is_open());
    }

    #[tokio::test]
    async fn test_receipt_date_matches_stored_sale_across_midnight() {
        // Session clock and store clock disagree about the day
        let session_clock = Arc::new(ManualClock::new(NOON));
        let store_clock = Arc::new(ManualClock::new(1_704_497_400_000)); // 2024-01-05T23:30:00Z
        let tables = Arc::new(MemoryTableStore::with_clock(store_clock.clone()));
        let sales = Arc::new(
            MemorySaleStore::with_clock(store_clock.clone()).with_timezone(chrono_tz::Asia::Shanghai),
        );
        let ctx = SessionContext::new("staff-9", tables.clone(), sales.clone())
            .with_clock(session_clock)
            .with_timezone(chrono_tz::Asia::Shanghai);
        let service = CheckoutService::new(ctx);
        tables.replace(Table::with_order(2, order())).await.unwrap();
        tables.fail_next_writes(1);

        let pending = service.prepare(2, order(), dec!(28.00)).unwrap();
        service.execute(&pending).await.unwrap_err();
        store_clock.advance(86_400_000);
        let receipt = service.execute(&pending).await.unwrap();

        let stored = &sales.snapshot()[0];
        assert_eq!(stored.date, "2024-01-06");
        assert_eq!(receipt.date, stored.date);
        assert_eq!(stored.timestamp, Some(1_704_497_400_000));
    }

    #[tokio::test]
    async fn test_partial_checkout_maps_to_incomplete_code() {
        let err = CheckoutError::PartialCheckout {
            sale_id: "s-1".into(),
            table_id: 2,
            source: StoreError::unavailable("timeout"),
        };
        let app: shared::error::AppError = err.into();
        assert_eq!(app.code, shared::error::ErrorCode::CheckoutIncomplete);
        assert!(app.details.unwrap().contains_key("sale_id"));
    }
}
