//! Order Cart
//!
//! Editable copy of a table's order. Nothing here touches a store; the cart
//! only becomes visible to other terminals through Save or Checkout.

use rust_decimal::Decimal;
use shared::models::{MenuItem, Order, OrderLine, Table, TableId};

/// What a quantity adjustment did to the cart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// New line created with quantity 1
    Added,
    /// Existing line now has this quantity
    Updated(i32),
    /// Line dropped because its quantity reached zero
    Removed,
    /// Nothing happened (negative delta on an absent line, or zero delta)
    Unchanged,
}

/// Per-table, in-progress order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderCart {
    table_id: TableId,
    lines: Vec<OrderLine>,
}

impl OrderCart {
    /// Empty cart for a table
    pub fn new(table_id: TableId) -> Self {
        Self {
            table_id,
            lines: Vec::new(),
        }
    }

    /// Start an editing session from the table's current order
    pub fn from_table(table: &Table) -> Self {
        Self {
            table_id: table.table_id,
            lines: table.order.lines().to_vec(),
        }
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Apply a signed quantity change for `item`.
    ///
    /// - present: quantity += delta, the line is removed once it drops to 0
    /// - absent, delta > 0: a line with quantity 1 is added
    /// - absent, delta <= 0: no-op
    pub fn adjust_quantity(&mut self, item: &MenuItem, delta: i32) -> CartChange {
        match self.lines.iter().position(|l| l.id == item.id) {
            Some(_) if delta == 0 => CartChange::Unchanged,
            Some(idx) => {
                let quantity = self.lines[idx].quantity.saturating_add(delta);
                if quantity <= 0 {
                    self.lines.remove(idx);
                    CartChange::Removed
                } else {
                    self.lines[idx].quantity = quantity;
                    CartChange::Updated(quantity)
                }
            }
            None if delta > 0 => {
                self.lines.push(OrderLine::from_menu_item(item));
                CartChange::Added
            }
            None => CartChange::Unchanged,
        }
    }

    /// `+1` affordance
    pub fn increment(&mut self, item: &MenuItem) -> CartChange {
        self.adjust_quantity(item, 1)
    }

    /// `-1` affordance
    pub fn decrement(&mut self, item: &MenuItem) -> CartChange {
        self.adjust_quantity(item, -1)
    }

    /// Drop every line
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn quantity_of(&self, item_id: &str) -> i32 {
        self.lines
            .iter()
            .find(|l| l.id == item_id)
            .map_or(0, |l| l.quantity)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Σ price × quantity, derived on every call
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(OrderLine::line_total).sum()
    }

    /// Snapshot for persistence
    pub fn to_order(&self) -> Order {
        Order::from_lines(self.lines.clone())
    }
}
