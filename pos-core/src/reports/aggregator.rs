use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use shared::models::{BucketMode, ReportRow, Sale, SalesReport};

use crate::store::{Clock, SystemClock};
use crate::utils::time;

/// Grouping key: `YYYY-MM-DD`, `YYYY-MM` or `YYYY`
pub fn bucket_key(date: NaiveDate, mode: BucketMode) -> String {
    match mode {
        BucketMode::Daily => date.format("%Y-%m-%d").to_string(),
        BucketMode::Monthly => date.format("%Y-%m").to_string(),
        BucketMode::Yearly => date.format("%Y").to_string(),
    }
}

/// Display label: `Jan 2024` for months, the key otherwise
pub fn bucket_label(date: NaiveDate, mode: BucketMode) -> String {
    match mode {
        BucketMode::Monthly => date.format("%b %Y").to_string(),
        _ => bucket_key(date, mode),
    }
}

/// Calendar date a sale is booked under.
///
/// Server timestamp first, then the stored date string. A sale with neither
/// (write still pending) is counted under `today`.
fn date_basis(sale: &Sale, tz: Tz, today: NaiveDate) -> NaiveDate {
    if let Some(date) = sale.timestamp.and_then(|ms| time::millis_to_date(ms, tz)) {
        return date;
    }
    match time::parse_date(&sale.date) {
        Ok(date) => date,
        Err(_) => {
            tracing::debug!(sale_id = %sale.id, "Sale has no usable date, counting it under today");
            today
        }
    }
}

/// Group-by-sum of sale totals per bucket.
///
/// Rows come back ascending by bucket key, which is chronological for every
/// mode (month labels do not sort chronologically, keys do).
pub fn aggregate_sales(sales: &[Sale], mode: BucketMode, tz: Tz, today: NaiveDate) -> SalesReport {
    let mut buckets: BTreeMap<String, (String, Decimal)> = BTreeMap::new();
    for sale in sales {
        let date = date_basis(sale, tz, today);
        let entry = buckets
            .entry(bucket_key(date, mode))
            .or_insert_with(|| (bucket_label(date, mode), Decimal::ZERO));
        entry.1 += sale.total;
    }

    let rows: Vec<ReportRow> = buckets
        .into_iter()
        .map(|(bucket_key, (label, sales))| ReportRow {
            bucket_key,
            label,
            sales,
        })
        .collect();
    let total_sales: Decimal = rows.iter().map(|r| r.sales).sum();

    SalesReport {
        mode,
        rows,
        total_sales,
    }
}

/// Report builder bound to a business timezone and clock
#[derive(Clone)]
pub struct SalesAggregator {
    timezone: Tz,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SalesAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesAggregator")
            .field("timezone", &self.timezone)
            .finish()
    }
}

impl SalesAggregator {
    pub fn new(timezone: Tz) -> Self {
        Self::with_clock(timezone, Arc::new(SystemClock))
    }

    pub fn with_clock(timezone: Tz, clock: Arc<dyn Clock>) -> Self {
        Self { timezone, clock }
    }

    pub fn aggregate(&self, sales: &[Sale], mode: BucketMode) -> SalesReport {
        let today = time::millis_to_date(self.clock.now_millis(), self.timezone).unwrap_or_default();
        let report = aggregate_sales(sales, mode, self.timezone, today);
        tracing::debug!(
            mode = %mode,
            sales = sales.len(),
            buckets = report.rows.len(),
            total = %report.total_sales,
            "Sales report computed"
        );
        report
    }
}
