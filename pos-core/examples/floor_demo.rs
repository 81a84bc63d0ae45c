//! Walk one table through order → save → checkout → report
//!
//! ```bash
//! LOG_LEVEL=debug cargo run -p pos-core --example floor_demo
//! ```

use std::time::Duration;

use pos_core::{Config, PointOfSale, SessionContext};
use shared::models::BucketMode;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    config.init_logging();

    let catalog = config.load_menu()?;
    let ctx = SessionContext::in_memory_configured("demo-staff", &config);
    let pos = PointOfSale::start(ctx, catalog);

    while pos.tables().len() < config.table_count as usize {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tracing::info!(tables = pos.tables().len(), "Floor ready");

    let mut cart = pos.open_cart(1);
    for id in ["burger", "fries", "burger", "water"] {
        let item = pos.catalog().require(id)?;
        let change = cart.adjust_quantity(item, 1);
        tracing::info!(item = id, ?change, total = %cart.total(), "Cart updated");
    }
    pos.save(&cart).await?;

    while !pos.find_table(1).is_open() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let receipt = pos.checkout_table(1).await?;
    tracing::info!(sale_id = %receipt.sale_id, total = %receipt.total, "Checked out");

    while pos.sales().is_empty() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    for mode in [BucketMode::Daily, BucketMode::Monthly, BucketMode::Yearly] {
        let report = pos.report(mode);
        println!("{} report (total {})", mode, report.total_sales);
        for row in &report.rows {
            println!("  {:<10} {:>10}", row.label, row.sales);
        }
    }

    pos.shutdown().await;
    Ok(())
}
