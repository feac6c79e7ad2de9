//! Raw data download.
//!
//! Fetches the core dataset and the zipped geographic framework named in the
//! data configuration. The archive is only downloaded when its extraction
//! directory does not exist yet.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use seguia::config::{Config, DEFAULT_CONFIG_PATH};
use seguia::download::{fetch_core_data, fetch_geo_data, FetchOutcome, Transport};

#[derive(Parser, Debug)]
#[command(name = "fetch")]
#[command(about = "Download the core dataset and the geographic archive")]
struct Args {
    /// Project root that data paths are resolved against
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Data configuration file (default: <root>/config/data.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config_path = args
        .config
        .unwrap_or_else(|| args.root.join(DEFAULT_CONFIG_PATH));
    info!("Reading config: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let transport = Transport::new(&config.transport).context("Failed to build HTTP client")?;
    let raw_dir = config.raw_dir(&args.root);

    info!("Getting core data...");
    let start = Instant::now();
    let core_path = fetch_core_data(
        &transport,
        &config.data.url_core,
        &raw_dir,
        &config.data.key_core,
    )
    .await
    .context("Failed to fetch core data")?;
    info!(
        "Time to download core data: {:.3?} ({})",
        start.elapsed(),
        core_path.display()
    );

    info!("Getting geo data...");
    let start = Instant::now();
    match fetch_geo_data(&transport, &config.data.url_geo, &raw_dir).await {
        FetchOutcome::AlreadyPresent { target } => {
            info!("Geo data already present in {}", target.display());
        }
        FetchOutcome::Fetched {
            archive,
            target,
            extracted,
        } => {
            info!(
                "Extracted {} entries from {} into {}",
                extracted,
                archive.display(),
                target.display()
            );
        }
        FetchOutcome::Failed(e) => bail!("Failed to fetch geo data: {}", e),
    }
    info!("Time to download geo data: {:.3?}", start.elapsed());

    Ok(())
}
