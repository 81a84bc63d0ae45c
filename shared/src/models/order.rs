//! Order Model
//!
//! An order is the set of lines currently attached to a table. Lines are
//! unique by menu item id and never carry a quantity below 1.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::menu_item::MenuItem;

/// One menu item and its quantity inside an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Menu item id
    pub id: String,
    pub name: String,
    /// Unit price captured when the line was created
    pub price: Decimal,
    pub quantity: i32,
}

impl OrderLine {
    /// New line for a menu item with quantity 1
    pub fn from_menu_item(item: &MenuItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            price: item.price,
            quantity: 1,
        }
    }

    /// price × quantity
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Order snapshot (serialized as a plain list of lines)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Order {
    lines: Vec<OrderLine>,
}

impl Order {
    /// Empty order
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an order from raw lines.
    ///
    /// Duplicate ids are folded into the first occurrence and lines whose
    /// quantity ends up below 1 are dropped, so the result always satisfies
    /// the line invariants.
    pub fn from_lines(lines: impl IntoIterator<Item = OrderLine>) -> Self {
        let mut folded: Vec<OrderLine> = Vec::new();
        for line in lines {
            match folded.iter_mut().find(|l| l.id == line.id) {
                Some(existing) => existing.quantity += line.quantity,
                None => folded.push(line),
            }
        }
        folded.retain(|l| l.quantity >= 1);
        Self { lines: folded }
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<OrderLine> {
        self.lines
    }

    pub fn get(&self, id: &str) -> Option<&OrderLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Total item count across all lines
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| i64::from(l.quantity)).sum()
    }

    /// Σ price × quantity, always recomputed from the lines
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(OrderLine::line_total).sum()
    }
}
