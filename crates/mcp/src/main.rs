//! Salesdata MCP Server Binary
//!
//! ## Usage
//!
//! ```bash
//! # Random dataset over the default window
//! salesdata-mcp
//!
//! # Reproducible dataset
//! salesdata-mcp --seed 42
//!
//! # Explicit config file, generate before accepting calls
//! salesdata-mcp --config config/salesdata.toml --eager
//!
//! # Environment overrides
//! SALESDATA_DATASET_PRODUCTS=10 SALESDATA_LOG_LEVEL=debug salesdata-mcp
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use salesdata_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};
use salesdata_core::SharedDataset;
use salesdata_mcp::{SalesMcpServer, SalesToolbox, SystemClock};
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "salesdata-mcp",
    about = "Serve synthetic sales data to AI agents over MCP (stdio)",
    after_help = "Examples:\n  salesdata-mcp --seed 42\n  \
                  salesdata-mcp --config salesdata.toml --eager"
)]
struct Args {
    #[arg(long, help = "Path to a TOML config file (must exist when given)")]
    config: Option<PathBuf>,
    #[arg(long, help = "Seed for a reproducible dataset")]
    seed: Option<u64>,
    #[arg(long, help = "Number of products to generate")]
    products: Option<usize>,
    #[arg(long, help = "Generate the dataset at startup instead of on the first call")]
    eager: bool,
}

impl Args {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                dataset_seed: self.seed,
                dataset_products: self.products,
                ..ConfigOverrides::default()
            },
        }
    }
}

// stdout carries the protocol, so logs go to stderr.
fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(log_level);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load config and initialize logging before any other operations
    let config = AppConfig::load(args.load_options())?;
    init_logging(&config);

    info!(
        event_name = "system.mcp.bootstrap",
        products = config.dataset.products,
        start_date = %config.dataset.start_date,
        end_date = %config.dataset.end_date,
        seeded = config.dataset.seed.is_some(),
        "starting salesdata MCP server"
    );

    let dataset = Arc::new(SharedDataset::new(config.dataset.clone()));
    if args.eager {
        let records = dataset.get().len();
        info!(event_name = "system.mcp.dataset_ready", records, "dataset generated at startup");
    }

    let toolbox = SalesToolbox::new(dataset, Arc::new(SystemClock));
    SalesMcpServer::new(toolbox).run_stdio().await
}
