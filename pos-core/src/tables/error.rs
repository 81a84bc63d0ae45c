use shared::error::AppError;
use thiserror::Error;

use crate::orders::OrderError;
use crate::store::StoreError;

/// Save / initialization failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// Rejected locally, nothing was written
    #[error(transparent)]
    Validation(#[from] OrderError),

    /// The store refused or could not be reached
    #[error("Table write failed: {0}")]
    Store(#[from] StoreError),
}

impl RegistryError {
    pub fn is_validation(&self) -> bool {
        matches!(self, RegistryError::Validation(_))
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Validation(e) => e.into(),
            RegistryError::Store(e) => e.into(),
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
