//! Sales Aggregator
//!
//! Reports are recomputed from the full sale history on every request;
//! nothing is cached between calls.

pub mod aggregator;

pub use aggregator::{SalesAggregator, aggregate_sales, bucket_key, bucket_label};
