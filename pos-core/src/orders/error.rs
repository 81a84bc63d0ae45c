use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::TableId;
use thiserror::Error;

/// Local, synchronous validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("Order is empty")]
    EmptyOrder,

    #[error("Order total {claimed} does not match line sum {actual}")]
    TotalMismatch { claimed: Decimal, actual: Decimal },

    #[error("Invalid order line: {0}")]
    InvalidLine(String),

    #[error("Unknown table: {0}")]
    UnknownTable(TableId),

    #[error("Menu item not found: {0}")]
    UnknownMenuItem(String),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let code = match &err {
            OrderError::EmptyOrder => ErrorCode::OrderEmpty,
            OrderError::TotalMismatch { .. } => ErrorCode::OrderTotalMismatch,
            OrderError::InvalidLine(_) => ErrorCode::OrderLineInvalid,
            OrderError::UnknownTable(_) => ErrorCode::TableNotFound,
            OrderError::UnknownMenuItem(_) => ErrorCode::MenuItemNotFound,
        };
        let app = AppError::with_message(code, err.to_string());
        match err {
            OrderError::UnknownTable(id) => app.with_detail("table_id", id),
            OrderError::UnknownMenuItem(id) => app.with_detail("menu_item_id", id),
            _ => app,
        }
    }
}

pub type OrderResult<T> = Result<T, OrderError>;
