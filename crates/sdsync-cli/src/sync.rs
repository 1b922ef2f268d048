//! Fetch command handlers for the CLI.
//!
//! Records go to stdout as pretty JSON so they can be piped; logs go to
//! stderr.

use std::io::Write;

use serde::Serialize;
use sdsync_client::{OrderQuery, PageOptions, SyncClient};
use sdsync_core::StockLevel;

fn emit<T: Serialize>(records: &[T]) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, records)?;
    writeln!(stdout)?;
    Ok(())
}

fn stock_summary(stock: &[StockLevel]) -> String {
    let masters = stock.iter().filter(|s| s.is_master_product).count();
    let available: i64 = stock.iter().map(|s| s.available_quantity).sum();
    format!(
        "{} stock levels ({masters} master, {} kit), {available} units available",
        stock.len(),
        stock.len() - masters
    )
}

pub(crate) async fn run_stock(
    client: &SyncClient,
    options: PageOptions,
    summary: bool,
) -> anyhow::Result<()> {
    let stock = client.get_all_stock_levels(options).await?;
    if summary {
        println!("{}", stock_summary(&stock));
        return Ok(());
    }
    emit(&stock)
}

pub(crate) async fn run_orders(
    client: &SyncClient,
    query: OrderQuery,
    summary: bool,
) -> anyhow::Result<()> {
    let (from, to, order_type) = (query.from_date, query.to_date, query.order_type);
    let orders = client.get_customer_orders(query).await?;
    if summary {
        println!("{} {order_type} orders between {from} and {to}", orders.len());
        return Ok(());
    }
    emit(&orders)
}

pub(crate) async fn run_products(
    client: &SyncClient,
    options: PageOptions,
    summary: bool,
) -> anyhow::Result<()> {
    let products = client.get_all_products(options).await?;
    if summary {
        println!("{} products", products.len());
        return Ok(());
    }
    emit(&products)
}
