//! Sales Report Model
//!
//! Report rows are derived on demand from the sale history and never stored.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Time bucket used to group sales
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketMode {
    #[default]
    Daily,
    Monthly,
    Yearly,
}

impl fmt::Display for BucketMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketMode::Daily => write!(f, "daily"),
            BucketMode::Monthly => write!(f, "monthly"),
            BucketMode::Yearly => write!(f, "yearly"),
        }
    }
}

impl FromStr for BucketMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(BucketMode::Daily),
            "monthly" | "month" => Ok(BucketMode::Monthly),
            "yearly" | "year" => Ok(BucketMode::Yearly),
            other => Err(format!("unknown bucket mode: {}", other)),
        }
    }
}

/// One bucket of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    /// `YYYY-MM-DD`, `YYYY-MM` or `YYYY`
    pub bucket_key: String,
    /// Display label (`Jan 2024` for monthly buckets, the key otherwise)
    pub label: String,
    pub sales: Decimal,
}

/// Full report for one bucket mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub mode: BucketMode,
    /// Sorted ascending by `bucket_key`
    pub rows: Vec<ReportRow>,
    /// Σ rows.sales
    pub total_sales: Decimal,
}

impl SalesReport {
    pub fn row(&self, bucket_key: &str) -> Option<&ReportRow> {
        self.rows.iter().find(|r| r.bucket_key == bucket_key)
    }
}
