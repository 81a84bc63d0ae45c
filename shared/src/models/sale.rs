//! Sale Model (销售记录)
//!
//! Append-only record written once per checkout. The order is copied into
//! the sale; nothing links back to the live table afterwards.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::dining_table::TableId;
use super::order::Order;

/// Store-assigned sale id
pub type SaleId = String;

/// Committed sale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: SaleId,
    pub table_id: TableId,
    /// Snapshot of the order at checkout time
    pub items: Order,
    pub total: Decimal,
    /// Server write time (Unix millis); absent while the write is pending
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Calendar date of `timestamp` (YYYY-MM-DD, business timezone)
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    /// Idempotency key of the checkout that produced this sale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_id: Option<String>,
}

/// Sale append payload; `id`, `timestamp` and `date` are assigned by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub checkout_id: String,
    pub table_id: TableId,
    pub items: Order,
    pub total: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl NewSale {
    /// Materialize the stored record from the store's write stamp
    pub fn into_sale(self, id: SaleId, timestamp: i64, date: String) -> Sale {
        Sale {
            id,
            table_id: self.table_id,
            items: self.items,
            total: self.total,
            timestamp: Some(timestamp),
            date,
            created_by: self.created_by,
            checkout_id: Some(self.checkout_id),
        }
    }
}
