use std::sync::Arc;

use clap::{Parser, Subcommand};
use kwprice_core::{load_configured_targets, AppConfig, TargetsFile, Vertical};
use kwprice_scraper::{
    Aggregator, DiscoveryEndpoints, FetchSettings, HttpFetcher, Query, SourceDiscoverer,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "kwprice-cli")]
#[command(about = "Compare product and food prices across Kuwaiti sites")]
struct Cli {
    /// Include the URLs each source visited in the output.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search retail product prices.
    Search { query: String },
    /// Search food-delivery menu prices.
    Food {
        query: String,
        #[arg(long)]
        city: Option<String>,
    },
    /// List the configured target sites.
    Targets,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = kwprice_core::load_app_config()?;
    // Logs go to stderr so stdout stays valid JSON.
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let targets = load_configured_targets(&config)?;

    match cli.command {
        Commands::Search { query } => {
            run_search(&config, &targets, Vertical::Products, &query, None, cli.debug).await
        }
        Commands::Food { query, city } => {
            run_search(
                &config,
                &targets,
                Vertical::Food,
                &query,
                city.as_deref(),
                cli.debug,
            )
            .await
        }
        Commands::Targets => print_targets(&targets),
    }
}

async fn run_search(
    config: &AppConfig,
    targets: &TargetsFile,
    vertical: Vertical,
    raw_query: &str,
    city: Option<&str>,
    debug: bool,
) -> anyhow::Result<()> {
    let query = Query::new(raw_query, vertical)
        .ok_or_else(|| anyhow::anyhow!("query must not be empty"))?
        .with_city(city, &config.default_city)
        .with_debug(debug);

    let fetcher = HttpFetcher::new(&FetchSettings::from_config(config))?;
    let discoverer = Arc::new(SourceDiscoverer::from_config(
        config,
        DiscoveryEndpoints::default(),
    ));
    let aggregator = Aggregator::for_targets(
        targets.for_vertical(vertical),
        config,
        &fetcher,
        &discoverer,
    );

    tracing::info!(
        vertical = %vertical,
        query = %query.text,
        sources = aggregator.sources().len(),
        "starting search"
    );
    let result = aggregator.run(&query).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn print_targets(targets: &TargetsFile) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(targets)?);
    Ok(())
}
