use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vintage_market::config::{load_config, MarketConfig};
use vintage_market::market::{calculate_price_range, AggregateOptions, MarketIntelligenceService};
use vintage_market::models::EstimateRange;
use vintage_market::sources::SearchFilters;

#[derive(Parser)]
#[command(name = "vintage-market", version, about = "Market data for vintage and antique items")]
struct Cli {
    /// TOML config file; credentials may also come from the environment
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write the JSON result to this file
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search every configured auction database for sold listings
    Search {
        terms: String,
        #[arg(long)]
        category: Option<String>,
        /// Minimum price in cents
        #[arg(long, value_parser = clap::value_parser!(i64).range(0..))]
        min_price: Option<i64>,
        /// Maximum price in cents
        #[arg(long, value_parser = clap::value_parser!(i64).range(0..))]
        max_price: Option<i64>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Build a market intelligence report for an item
    Intel {
        name: String,
        #[arg(long)]
        maker: Option<String>,
        #[arg(long)]
        era: Option<String>,
        /// Low end of the estimated value, in cents
        #[arg(long, requires = "max")]
        min: Option<i64>,
        /// High end of the estimated value, in cents
        #[arg(long, requires = "min")]
        max: Option<i64>,
    },
    /// Check an estimated value against market data
    Validate {
        name: String,
        #[arg(long)]
        maker: Option<String>,
        #[arg(long)]
        min: i64,
        #[arg(long)]
        max: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => MarketConfig::from_env()?,
    };
    let service = MarketIntelligenceService::from_config(&config)?;
    info!(sources = ?service.aggregator().source_names(), "Market sources ready");

    match cli.command {
        Command::Search {
            terms,
            category,
            min_price,
            max_price,
            limit,
        } => {
            let options = AggregateOptions {
                filters: SearchFilters {
                    category,
                    min_price,
                    max_price,
                },
                limit,
            };
            let result = service.search_all_auction_databases(&terms, &options).await;
            if let Some(stats) = calculate_price_range(&result.all_results) {
                info!(
                    count = stats.count,
                    min = stats.min,
                    max = stats.max,
                    median = stats.median,
                    "Sold price summary"
                );
            }
            emit(&result, cli.output.as_ref()).await
        }
        Command::Intel {
            name,
            maker,
            era,
            min,
            max,
        } => {
            let estimate = min.zip(max).map(|(min, max)| EstimateRange::new(min, max));
            let intel = service
                .get_market_intelligence(&name, maker.as_deref(), era.as_deref(), estimate)
                .await;
            emit(&intel, cli.output.as_ref()).await
        }
        Command::Validate {
            name,
            maker,
            min,
            max,
        } => {
            let validation = service
                .validate_price_estimate(&name, maker.as_deref(), EstimateRange::new(min, max))
                .await;
            emit(&validation, cli.output.as_ref()).await
        }
    }
}

async fn emit<T: Serialize>(value: &T, output: Option<&PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);

    if let Some(path) = output {
        tokio::fs::write(path, &json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("💾 Saved result to {}", path.display());
    }
    Ok(())
}
