//! POS Core - 餐厅点单、结账与销售报表核心
//!
//! # 架构概述
//!
//! - **菜单** (`menu`): 菜单目录加载与校验
//! - **点单** (`orders`): 购物车数量调整、金额计算与校验
//! - **桌台** (`tables`): 桌台注册表、幂等初始化、保存订单
//! - **同步** (`sync`): 远端快照订阅与本地读模型
//! - **结账** (`checkout`): 先记销售、再重置桌台
//! - **报表** (`reports`): 按日/月/年汇总销售额
//! - **存储接口** (`store`): 远端集合抽象与内存实现
//!
//! # 模块结构
//!
//! ```text
//! pos-core/src/
//! ├── core/          # 配置、会话上下文、运行时组装
//! ├── menu/          # 菜单目录
//! ├── orders/        # 购物车与金额
//! ├── tables/        # 桌台注册表
//! ├── sync/          # 快照同步
//! ├── checkout/      # 结账事务
//! ├── reports/       # 销售报表
//! ├── store/         # 存储接口
//! └── utils/         # 日志、时间
//! ```

pub mod checkout;
pub mod core;
pub mod menu;
pub mod orders;
pub mod reports;
pub mod store;
pub mod sync;
pub mod tables;
pub mod utils;

// Re-export 公共类型
pub use checkout::{CheckoutError, CheckoutReceipt, CheckoutService, PendingCheckout};
pub use crate::core::{Config, PointOfSale, SessionContext};
pub use menu::MenuCatalog;
pub use orders::{CartChange, OrderCart, OrderError};
pub use reports::{SalesAggregator, aggregate_sales};
pub use store::{
    Clock, ManualClock, MemorySaleStore, MemoryTableStore, SaleStore, StoreError, SystemClock,
    TableStore,
};
pub use sync::{FeedKind, FeedObserver, Subscription, SyncReconciler};
pub use tables::{RegistryError, TableRegistry};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
