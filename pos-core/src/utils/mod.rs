//! 工具模块 - 通用工具函数和类型
//!
//! - [`AppError`] / [`AppResult`] - 统一错误类型 (from shared::error)
//! - [`logger`] - tracing 初始化
//! - [`time`] - 业务时区日期换算

pub mod logger;
pub mod time;

pub use shared::error::{AppError, AppResult, ErrorCategory, ErrorCode};
