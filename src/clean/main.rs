//! Island removal pipeline.
//!
//! Builds the mainland reference from state boundaries, tags every locality
//! by whether it intersects it, renders the result and exports the mainland
//! localities.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use seguia::config::{Config, DEFAULT_CONFIG_PATH};
use seguia::pipeline::{clean_boundaries, locate_boundary_file};

const STATES_FILE: &str = "00ent.shp";
const LOCALITIES_FILE: &str = "00a.shp";
const OUTPUT_FILE: &str = "00a_mainland.csv";
const FIGURE_FILE: &str = "mexico_land.svg";

#[derive(Parser, Debug)]
#[command(name = "clean")]
#[command(about = "Strip island localities using a mainland reference")]
struct Args {
    /// Project root that data paths are resolved against
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Data configuration file (default: <root>/config/data.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// State boundaries (default: 00ent.shp from the extracted archive)
    #[arg(long)]
    states: Option<PathBuf>,

    /// Locality boundaries (default: 00a.shp from the extracted archive)
    #[arg(long)]
    localities: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| args.root.join(DEFAULT_CONFIG_PATH));
    info!("Reading config: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let geo_dir = config.geographic_dir(&args.root)?;
    let states_path = match args.states {
        Some(path) => path,
        None => locate_boundary_file(&geo_dir, STATES_FILE)?,
    };
    let localities_path = match args.localities {
        Some(path) => path,
        None => locate_boundary_file(&geo_dir, LOCALITIES_FILE)?,
    };

    let output_path = config.interim_dir(&args.root).join(OUTPUT_FILE);
    let figure_path = config.figures_dir(&args.root).join(FIGURE_FILE);
    clean_boundaries(&states_path, &localities_path, &output_path, &figure_path)?;

    Ok(())
}
