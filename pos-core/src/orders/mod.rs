//! Order editing
//!
//! - **cart**: per-table editable order, mutated locally until Save/Checkout
//! - **money**: decimal arithmetic and the validation run before any write
//! - **error**: validation failures (reported before a store is touched)

pub mod cart;
pub mod error;
pub mod money;

pub use cart::{CartChange, OrderCart};
pub use error::{OrderError, OrderResult};
pub use money::{validate_order, validate_price};
