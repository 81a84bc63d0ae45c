//! Checkout Transaction
//!
//! Two writes, always in this order:
//!
//! ```text
//! 1. SaleStore::append(NewSale { checkout_id, .. })   ← revenue recorded
//! 2. TableStore::upsert_merge(id, TablePatch::closed()) ← table reset
//! ```
//!
//! A failure between the steps leaves a recorded sale and a table that still
//! looks open; never the reverse. Step 1 is keyed by `checkout_id` so
//! re-executing the same [`PendingCheckout`] cannot record the sale twice,
//! and step 2 is a plain idempotent reset.

pub mod error;
pub mod service;

pub use error::{CheckoutError, CheckoutResult};
pub use service::{CheckoutReceipt, CheckoutService, PendingCheckout};
