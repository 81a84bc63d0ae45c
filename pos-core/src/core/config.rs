use chrono_tz::Tz;
use shared::error::AppResult;

use crate::menu::MenuCatalog;
use crate::utils::time::parse_timezone;

/// Size of the table pool when nothing else is configured
pub const DEFAULT_TABLE_COUNT: i64 = 10;

/// Controller configuration
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | TABLE_COUNT | 10 | 桌台数量 |
/// | BUSINESS_TIMEZONE | UTC | 业务时区 (销售日期与报表分桶) |
/// | MENU_PATH | - | 菜单 JSON 文件, 未设置时使用内置菜单 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | - | 日志目录 (按天滚动) |
/// | ENVIRONMENT | development | 运行环境 |
#[derive(Debug, Clone)]
pub struct Config {
    /// Tables are numbered 1..=table_count
    pub table_count: i64,
    pub timezone: Tz,
    pub menu_path: Option<String>,
    pub log_level: String,
    pub log_dir: Option<String>,
    /// development | staging | production
    pub environment: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// Reads `.env` first when present. Invalid values fall back to defaults.
    pub fn from_env() -> Self {
        let _ = dotenv::dotenv();

        let table_count = match std::env::var("TABLE_COUNT") {
            Ok(raw) => match raw.parse::<i64>() {
                Ok(n) if n > 0 => n,
                _ => {
                    tracing::warn!(value = %raw, "Invalid TABLE_COUNT, using default");
                    DEFAULT_TABLE_COUNT
                }
            },
            Err(_) => DEFAULT_TABLE_COUNT,
        };

        let timezone = match std::env::var("BUSINESS_TIMEZONE") {
            Ok(raw) => parse_timezone(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Invalid BUSINESS_TIMEZONE, using UTC");
                chrono_tz::UTC
            }),
            Err(_) => chrono_tz::UTC,
        };

        Self {
            table_count,
            timezone,
            menu_path: std::env::var("MENU_PATH").ok().filter(|p| !p.is_empty()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|p| !p.is_empty()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(table_count: i64, timezone: Tz) -> Self {
        Self {
            table_count,
            timezone,
            menu_path: None,
            log_level: "info".into(),
            log_dir: None,
            environment: "test".into(),
        }
    }

    /// Configured menu, or the built-in one
    pub fn load_menu(&self) -> AppResult<MenuCatalog> {
        match &self.menu_path {
            Some(path) => MenuCatalog::from_path(path),
            None => Ok(MenuCatalog::builtin()),
        }
    }

    /// Install the global logger according to this config
    pub fn init_logging(&self) {
        crate::utils::logger::init_logger_with_file(
            Some(&self.log_level),
            self.log_dir.as_deref(),
        );
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::with_overrides(DEFAULT_TABLE_COUNT, chrono_tz::UTC)
    }
}
