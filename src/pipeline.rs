//! End-to-end island removal over boundary files.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cleaner::{filter_and_export, mainland_reference, tag_membership};
use crate::export::write_csv;
use crate::loader::{find_boundary_file, load_boundaries};
use crate::render::visualize;

/// Directory holding the boundary layers inside the extracted archive
pub const DATASET_DIR: &str = "conjunto_de_datos";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanSummary {
    pub total: usize,
    pub kept: usize,
}

/// Find a boundary file in the extracted archive, preferring its usual layout
pub fn locate_boundary_file(geo_dir: &Path, file_name: &str) -> Result<PathBuf> {
    let expected = geo_dir.join(DATASET_DIR).join(file_name);
    if expected.is_file() {
        return Ok(expected);
    }

    find_boundary_file(geo_dir, file_name).with_context(|| {
        format!(
            "{} not found under {} (run fetch first)",
            file_name,
            geo_dir.display()
        )
    })
}

/// Build the mainland from `states`, tag `localities` against it, render the
/// figure and write the mainland localities to `output`.
///
/// A failed render is logged and does not stop the export.
pub fn clean_boundaries(
    states: &Path,
    localities: &Path,
    output: &Path,
    figure: &Path,
) -> Result<CleanSummary> {
    let states = load_boundaries(states)?;
    let localities = load_boundaries(localities)?;

    let start = Instant::now();
    let mainland = mainland_reference(&states).context("Failed to build mainland geometry")?;
    info!("Time to get {} land geometry: {:.3?}", mainland.name, start.elapsed());

    let start = Instant::now();
    let tagged = tag_membership(localities, &mainland);
    info!("Time to process localities for land geometry: {:.3?}", start.elapsed());

    let start = Instant::now();
    if let Err(e) = visualize(&tagged, figure) {
        warn!("Could not render {}: {:#}", figure.display(), e);
    }
    info!("Time plotting info: {:.3?}", start.elapsed());

    let mainland_localities = filter_and_export(&tagged);
    write_csv(&mainland_localities, output)?;

    let summary = CleanSummary {
        total: tagged.len(),
        kept: mainland_localities.len(),
    };
    info!("Kept {} of {} localities", summary.kept, summary.total);
    Ok(summary)
}
