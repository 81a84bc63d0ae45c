//! Shared types for the table POS
//!
//! Models, the unified error system and small utilities used by `pos-core`
//! and by whichever presentation layer renders its state.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use serde::{Deserialize, Serialize};
