//! Data models
//!
//! Shared between `pos-core` and the presentation layer.
//! Money is `rust_decimal::Decimal` (serialized as a JSON number),
//! timestamps are Unix millis assigned by the remote store.

pub mod dining_table;
pub mod menu_item;
pub mod order;
pub mod sale;
pub mod sales_report;

// Re-exports
pub use dining_table::*;
pub use menu_item::*;
pub use order::*;
pub use sale::*;
pub use sales_report::*;
