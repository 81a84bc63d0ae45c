use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Transport / remote store failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Feed closed")]
    Closed,
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Whether the same request may succeed later
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Closed)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let code = match &err {
            StoreError::Unavailable(_) => ErrorCode::SystemBusy,
            StoreError::Rejected(_) => ErrorCode::InvalidRequest,
            StoreError::Serialization(_) => ErrorCode::StorageCorrupted,
            StoreError::Closed => ErrorCode::FeedClosed,
        };
        AppError::with_message(code, err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_to_app_error() {
        let app: AppError = StoreError::unavailable("offline").into();
        assert_eq!(app.code, ErrorCode::SystemBusy);
        assert!(app.code.is_retryable());
        assert_eq!(app.message, "Store unavailable: offline");

        let app: AppError = StoreError::Closed.into();
        assert_eq!(app.code, ErrorCode::FeedClosed);
    }

    #[test]
    fn test_transient_classification() {
        assert!(StoreError::unavailable("x").is_transient());
        assert!(!StoreError::Rejected("x".into()).is_transient());
    }
}
