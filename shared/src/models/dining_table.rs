//! Dining Table Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::order::Order;

/// Table number inside the fixed pool (1..=N)
pub type TableId = i64;

/// Table occupancy status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    #[default]
    Closed,
    Open,
}

impl TableStatus {
    /// Status implied by an order: open iff it has lines
    pub fn for_order(order: &Order) -> Self {
        if order.is_empty() {
            TableStatus::Closed
        } else {
            TableStatus::Open
        }
    }
}

/// Dining table entity (桌台)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub table_id: TableId,
    #[serde(default)]
    pub status: TableStatus,
    #[serde(default)]
    pub order: Order,
    #[serde(default)]
    pub total: Decimal,
    /// Server write time (Unix millis)
    #[serde(default)]
    pub last_update: Option<i64>,
    /// Actor that issued the last write (audit only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl Table {
    /// Closed table with no order, used for initialization and for reads of
    /// ids the registry has never seen
    pub fn closed(table_id: TableId) -> Self {
        Self {
            table_id,
            status: TableStatus::Closed,
            order: Order::new(),
            total: Decimal::ZERO,
            last_update: None,
            updated_by: None,
        }
    }

    /// Table carrying `order`, status and total derived from it
    pub fn with_order(table_id: TableId, order: Order) -> Self {
        Self {
            table_id,
            status: TableStatus::for_order(&order),
            total: order.total(),
            order,
            last_update: None,
            updated_by: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == TableStatus::Open
    }

    /// Open iff the order has lines; closed tables carry a zero total; the
    /// total always equals the line sum
    pub fn is_consistent(&self) -> bool {
        let status_ok = self.status == TableStatus::for_order(&self.order);
        let total_ok = self.total == self.order.total();
        let closed_ok = self.status == TableStatus::Open || self.total.is_zero();
        status_ok && total_ok && closed_ok
    }
}

/// Partial table write for merge upserts.
///
/// `None` fields are left untouched on an existing table. When the table does
/// not exist yet it is created closed and the patch is applied on top.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TableStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl TablePatch {
    /// Creation-only patch: materializes a missing table, changes nothing on
    /// an existing one
    pub fn seed() -> Self {
        Self::default()
    }

    /// Reset to `{order: [], total: 0, status: Closed}`
    pub fn closed() -> Self {
        Self {
            status: Some(TableStatus::Closed),
            order: Some(Order::new()),
            total: Some(Decimal::ZERO),
            updated_by: None,
        }
    }

    pub fn by(mut self, actor_id: impl Into<String>) -> Self {
        self.updated_by = Some(actor_id.into());
        self
    }

    /// Whether the patch writes any business field
    pub fn is_seed(&self) -> bool {
        self.status.is_none() && self.order.is_none() && self.total.is_none()
    }

    /// Merge the patch into `table`
    pub fn apply_to(&self, table: &mut Table) {
        if let Some(status) = self.status {
            table.status = status;
        }
        if let Some(order) = &self.order {
            table.order = order.clone();
        }
        if let Some(total) = self.total {
            table.total = total;
        }
        if let Some(actor) = &self.updated_by {
            table.updated_by = Some(actor.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::OrderLine;
    use rust_decimal::dec;

    fn order_with_tea(quantity: i32) -> Order {
        Order::from_lines(vec![OrderLine {
            id: "tea".into(),
            name: "Tea".into(),
            price: dec!(3.00),
            quantity,
        }])
    }

    #[test]
    fn test_closed_table_is_consistent() {
        let table = Table::closed(3);
        assert_eq!(table.status, TableStatus::Closed);
        assert!(table.is_consistent());
    }

    #[test]
    fn test_with_order_derives_status_and_total() {
        let table = Table::with_order(2, order_with_tea(2));
        assert!(table.is_open());
        assert_eq!(table.total, dec!(6.00));
        assert!(table.is_consistent());
    }

    #[test]
    fn test_inconsistent_total_detected() {
        let mut table = Table::with_order(2, order_with_tea(2));
        table.total = dec!(5.00);
        assert!(!table.is_consistent());
    }

    #[test]
    fn test_seed_patch_leaves_existing_fields() {
        let mut table = Table::with_order(4, order_with_tea(1));
        let before = table.clone();
        TablePatch::seed().apply_to(&mut table);
        assert_eq!(table, before);
        assert!(TablePatch::seed().is_seed());
    }

    #[test]
    fn test_closed_patch_resets() {
        let mut table = Table::with_order(4, order_with_tea(3));
        TablePatch::closed().by("staff-1").apply_to(&mut table);
        assert_eq!(table.status, TableStatus::Closed);
        assert!(table.order.is_empty());
        assert_eq!(table.total, Decimal::ZERO);
        assert_eq!(table.updated_by.as_deref(), Some("staff-1"));
        assert!(table.is_consistent());
    }

    #[test]
    fn test_table_json_shape() {
        let json = serde_json::to_value(Table::closed(1)).unwrap();
        assert_eq!(json["tableId"], 1);
        assert_eq!(json["status"], "closed");
        assert!(json["order"].as_array().unwrap().is_empty());
    }
}
