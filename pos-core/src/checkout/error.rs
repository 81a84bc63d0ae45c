use shared::error::{AppError, ErrorCode};
use shared::models::{SaleId, TableId};
use thiserror::Error;

use crate::orders::OrderError;
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckoutError {
    /// Rejected before any write
    #[error(transparent)]
    Validation(#[from] OrderError),

    /// Step 1 failed; nothing was recorded
    #[error("Sale could not be recorded: {0}")]
    SaleAppend(StoreError),

    /// Step 1 succeeded, step 2 failed; the table still shows the old order
    #[error("Sale {sale_id} recorded but table {table_id} was not reset: {source}")]
    PartialCheckout {
        sale_id: SaleId,
        table_id: TableId,
        #[source]
        source: StoreError,
    },
}

impl CheckoutError {
    pub fn is_validation(&self) -> bool {
        matches!(self, CheckoutError::Validation(_))
    }

    /// Revenue was recorded despite the error
    pub fn sale_recorded(&self) -> Option<&SaleId> {
        match self {
            CheckoutError::PartialCheckout { sale_id, .. } => Some(sale_id),
            _ => None,
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        let message = err.to_string();
        match err {
            CheckoutError::Validation(e) => e.into(),
            CheckoutError::SaleAppend(e) => AppError::with_message(AppError::from(e).code, message),
            CheckoutError::PartialCheckout {
                sale_id, table_id, ..
            } => AppError::with_message(ErrorCode::CheckoutIncomplete, message)
                .with_detail("sale_id", sale_id)
                .with_detail("table_id", table_id),
        }
    }
}

pub type CheckoutResult<T> = Result<T, CheckoutError>;
