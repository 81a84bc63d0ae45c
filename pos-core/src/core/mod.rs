//! 核心模块 - 配置、会话上下文、运行时
//!
//! - [`Config`] - 环境变量配置
//! - [`SessionContext`] - 显式传递的会话身份与存储句柄
//! - [`PointOfSale`] - 组装所有组件的运行时

pub mod config;
pub mod context;
pub mod pos;

pub use config::Config;
pub use context::SessionContext;
pub use pos::PointOfSale;
