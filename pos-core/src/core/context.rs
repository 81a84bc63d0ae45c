//! Session context
//!
//! Everything the core needs from its surroundings, passed explicitly: the
//! acting staff id, the two remote collections, the write clock and the
//! business timezone.

use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;
use shared::models::TableId;

use super::config::{Config, DEFAULT_TABLE_COUNT};
use crate::store::{Clock, MemorySaleStore, MemoryTableStore, SaleStore, SystemClock, TableStore};
use crate::utils::time;

#[derive(Clone)]
pub struct SessionContext {
    /// Opaque actor id from the identity provider (audit only)
    pub actor_id: String,
    pub tables: Arc<dyn TableStore>,
    pub sales: Arc<dyn SaleStore>,
    pub clock: Arc<dyn Clock>,
    pub timezone: Tz,
    pub table_count: i64,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("actor_id", &self.actor_id)
            .field("tables", &"<TableStore>")
            .field("sales", &"<SaleStore>")
            .field("timezone", &self.timezone)
            .field("table_count", &self.table_count)
            .finish()
    }
}

impl SessionContext {
    pub fn new(
        actor_id: impl Into<String>,
        tables: Arc<dyn TableStore>,
        sales: Arc<dyn SaleStore>,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            tables,
            sales,
            clock: Arc::new(SystemClock),
            timezone: chrono_tz::UTC,
            table_count: DEFAULT_TABLE_COUNT,
        }
    }

    /// Context backed by fresh in-memory stores
    pub fn in_memory(actor_id: impl Into<String>) -> Self {
        Self::new(
            actor_id,
            Arc::new(MemoryTableStore::new()),
            Arc::new(MemorySaleStore::new()),
        )
    }

    /// In-memory stores whose sale dates use the configured timezone
    pub fn in_memory_configured(actor_id: impl Into<String>, config: &Config) -> Self {
        let sales = MemorySaleStore::new().with_timezone(config.timezone);
        Self::new(actor_id, Arc::new(MemoryTableStore::new()), Arc::new(sales)).configured(config)
    }

    /// Apply pool size and timezone from config
    pub fn configured(mut self, config: &Config) -> Self {
        self.timezone = config.timezone;
        self.table_count = config.table_count;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_table_count(mut self, table_count: i64) -> Self {
        self.table_count = table_count;
        self
    }

    /// Whether `table_id` belongs to the fixed pool
    pub fn is_known_table(&self, table_id: TableId) -> bool {
        (1..=self.table_count).contains(&table_id)
    }

    pub fn table_ids(&self) -> std::ops::RangeInclusive<TableId> {
        1..=self.table_count
    }

    /// Today's business date according to the context clock
    pub fn today(&self) -> NaiveDate {
        time::millis_to_date(self.clock.now_millis(), self.timezone).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ManualClock;

    #[test]
    fn test_table_pool_bounds() {
        let ctx = SessionContext::in_memory("staff-1").with_table_count(3);
        assert!(!ctx.is_known_table(0));
        assert!(ctx.is_known_table(1));
        assert!(ctx.is_known_table(3));
        assert!(!ctx.is_known_table(4));
        assert_eq!(ctx.table_ids().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_in_memory_configured_applies_config() {
        let config = Config::with_overrides(4, chrono_tz::Europe::Madrid);
        let ctx = SessionContext::in_memory_configured("staff-1", &config);
        assert_eq!(ctx.table_count, 4);
        assert_eq!(ctx.timezone, chrono_tz::Europe::Madrid);
    }

    #[test]
    fn test_today_uses_clock_and_timezone() {
        // 2024-03-31T22:30:00Z
        let clock = Arc::new(ManualClock::new(1_711_924_200_000));
        let ctx = SessionContext::in_memory("staff-1").with_clock(clock);
        assert_eq!(ctx.today(), NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());

        let ctx = ctx.with_timezone(chrono_tz::Asia::Tokyo);
        assert_eq!(ctx.today(), NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
    }
}
