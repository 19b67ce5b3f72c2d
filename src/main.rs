use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use price_sentry::config::AppConfig;
use price_sentry::mailer::SmtpMailer;
use price_sentry::monitor::{MonitorRunner, PriceMonitor};
use price_sentry::notifier::Notifier;
use price_sentry::storage::MemoryStorage;
use price_sentry::vendor::amazon::AmazonAdapter;
use price_sentry::vendor::{AdapterRegistry, VendorAdapter};

#[derive(Parser)]
#[command(name = "price-sentry", about = "Price drop monitoring and alerting")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the periodic price monitor until interrupted.
    Monitor,
    /// Search the vendor catalog for products matching a keyword.
    Search {
        keyword: String,
        /// Only keep results whose title contains every whitespace-separated
        /// token of this string.
        #[arg(long)]
        include: Option<String>,
        /// Stop after this many qualified results.
        #[arg(long, default_value_t = 5)]
        max: usize,
    },
    /// Fetch the current price for a single product page.
    FetchPrice { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("price_sentry=debug".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    match cli.command {
        Command::Monitor => run_monitor(config).await,
        Command::Search {
            keyword,
            include,
            max,
        } => {
            let adapter = AmazonAdapter::new(&config.scraper)?;
            let products = adapter.search(&keyword, include.as_deref(), max).await?;
            for product in products {
                println!("{}  {}  {}", product.price, product.title, product.link);
            }
            Ok(())
        }
        Command::FetchPrice { url } => {
            let adapter = AmazonAdapter::new(&config.scraper)?;
            let price = adapter.fetch_price(&url).await?;
            println!("{}", price);
            Ok(())
        }
    }
}

async fn run_monitor(config: AppConfig) -> Result<()> {
    info!("Starting Price Sentry...");

    let storage = Arc::new(MemoryStorage::new());
    let mailer = Arc::new(SmtpMailer::new(&config.smtp)?);

    let mut registry = AdapterRegistry::new();
    registry.register(Arc::new(AmazonAdapter::new(&config.scraper)?));

    let notifier = Notifier::new(storage.clone(), mailer);
    let monitor = Arc::new(PriceMonitor::new(
        storage,
        Arc::new(registry),
        notifier,
        config.monitor.clone(),
    ));

    let mut runner = MonitorRunner::new(monitor, &config.monitor.check_interval).await?;
    runner.start().await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");
    runner.shutdown().await?;

    Ok(())
}
