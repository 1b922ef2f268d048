mod sync;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use sdsync_core::OrderType;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sdsync")]
#[command(about = "Fetch stock, orders and products from SellerDynamics")]
struct Cli {
    /// Print record counts instead of the records as JSON.
    #[arg(long, global = true)]
    summary: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// All stock levels.
    Stock(PageArgs),
    /// Orders placed in a date range.
    Orders {
        /// First day of the range, YYYY-MM-DD.
        #[arg(long)]
        from: NaiveDate,
        /// Last day of the range, YYYY-MM-DD.
        #[arg(long)]
        to: NaiveDate,
        #[arg(long, default_value = "pending")]
        order_type: OrderType,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// The full product catalogue.
    Products(PageArgs),
}

#[derive(Debug, Args, PartialEq, Eq)]
struct PageArgs {
    #[arg(long)]
    page_size: Option<u32>,
    #[arg(long)]
    start_page: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = sdsync_core::load_sync_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let client = sdsync_client::SyncClient::new(&config)?;
    tracing::debug!(
        endpoint = config.credentials.endpoint(),
        retailer_id = config.credentials.retailer_id(),
        "sync client ready"
    );

    match cli.command {
        Commands::Stock(page) => sync::run_stock(&client, page.into(), cli.summary).await,
        Commands::Orders {
            from,
            to,
            order_type,
            page_size,
        } => {
            let query = sdsync_client::OrderQuery {
                from_date: from,
                to_date: to,
                order_type,
                page_size,
            };
            sync::run_orders(&client, query, cli.summary).await
        }
        Commands::Products(page) => sync::run_products(&client, page.into(), cli.summary).await,
    }
}

impl From<PageArgs> for sdsync_client::PageOptions {
    fn from(args: PageArgs) -> Self {
        Self {
            page_size: args.page_size,
            start_page: args.start_page,
        }
    }
}
