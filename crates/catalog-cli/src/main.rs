//! ucharvest CLI
//!
//! Command-line entrypoint for harvesting Unity Catalog metadata. Every
//! command prints a `{success, content | error}` envelope as JSON on stdout.

use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use ucharvest_client::{HarvestConfig, Harvester};

#[derive(Parser)]
#[command(name = "ucharvest")]
#[command(version, about = "Unity Catalog metadata harvester", long_about = None)]
struct Cli {
    /// Maximum simultaneous in-flight requests
    #[arg(long, default_value_t = 8, global = true)]
    max_concurrent_requests: usize,

    /// Attempts per request when rate limited
    #[arg(long, default_value_t = 5, global = true)]
    max_retries: u32,

    /// Delay after the first rate-limited attempt, in milliseconds
    #[arg(long, default_value_t = 500, global = true)]
    base_delay_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, default_value_t = 30, global = true)]
    timeout_secs: u64,

    /// Print single-line JSON instead of pretty output
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover all catalogs, schemas and tables in the workspace
    Tables,

    /// Show columns of tables given as catalog.schema.table
    Details {
        /// Fully qualified table names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// List jobs defined in the workspace
    Jobs,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the envelope reported success.
async fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let config = HarvestConfig::from_env()?
        .max_concurrent_requests(cli.max_concurrent_requests)
        .max_retries(cli.max_retries)
        .base_delay(Duration::from_millis(cli.base_delay_ms))
        .timeout(Duration::from_secs(cli.timeout_secs))
        .build()?;

    tracing::debug!(?config, "Using configuration");
    let harvester = Harvester::new(config)?;

    let (success, output) = match cli.command {
        Commands::Tables => {
            let response = harvester.discover_all_tables().await;
            (response.success, serde_json::to_value(&response)?)
        }
        Commands::Details { names } => {
            let response = harvester.get_table_details(names.as_slice()).await;
            (response.success, serde_json::to_value(&response)?)
        }
        Commands::Jobs => {
            let response = harvester.get_jobs().await;
            (response.success, serde_json::to_value(&response)?)
        }
    };

    let rendered = if cli.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{}", rendered);

    Ok(success)
}
