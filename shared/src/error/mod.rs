//! Unified error system for the table POS
//!
//! This module provides:
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 4xxx: Order / checkout errors
//! - 6xxx: Menu errors
//! - 7xxx: Table errors
//! - 9xxx: System errors (transport, feed, storage)
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::OrderEmpty);
//! assert_eq!(err.code.code(), 4007);
//!
//! let err = AppError::validation("quantity must be positive")
//!     .with_detail("field", "quantity");
//! assert!(err.details.is_some());
//! ```

mod category;
mod codes;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult};
