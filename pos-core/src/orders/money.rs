//! Money calculation utilities using rust_decimal for precision
//!
//! Prices carry at most two decimal places; totals are exact sums and are
//! recomputed from the lines every time an order is persisted.

use rust_decimal::prelude::*;
use shared::models::{Order, OrderLine};

use super::error::{OrderError, OrderResult};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed price per item (€1,000,000)
const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
/// Maximum allowed quantity per line
pub const MAX_QUANTITY: i32 = 9999;

/// Round to cents, midpoint away from zero
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Non-negative, bounded, at most two decimal places
pub fn validate_price(price: Decimal, field_name: &str) -> OrderResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(OrderError::InvalidLine(format!(
            "{} must be non-negative, got {}",
            field_name, price
        )));
    }
    if price > MAX_PRICE {
        return Err(OrderError::InvalidLine(format!(
            "{} exceeds maximum allowed ({}), got {}",
            field_name, MAX_PRICE, price
        )));
    }
    if round_money(price) != price {
        return Err(OrderError::InvalidLine(format!(
            "{} has more than {} decimal places, got {}",
            field_name, DECIMAL_PLACES, price
        )));
    }
    Ok(())
}

fn validate_line(line: &OrderLine) -> OrderResult<()> {
    if line.id.trim().is_empty() {
        return Err(OrderError::InvalidLine("line id must not be empty".into()));
    }
    validate_price(line.price, "price")?;
    if line.quantity < 1 {
        return Err(OrderError::InvalidLine(format!(
            "quantity must be positive, got {}",
            line.quantity
        )));
    }
    if line.quantity > MAX_QUANTITY {
        return Err(OrderError::InvalidLine(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, line.quantity
        )));
    }
    Ok(())
}

/// Checked before every write of an order: lines are sane and the claimed
/// total equals Σ price × quantity.
pub fn validate_order(order: &Order, claimed_total: Decimal) -> OrderResult<()> {
    for line in order.lines() {
        validate_line(line)?;
    }
    let actual = order.total();
    if actual != claimed_total {
        return Err(OrderError::TotalMismatch {
            claimed: claimed_total,
            actual,
        });
    }
    Ok(())
}
