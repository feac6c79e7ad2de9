//! Two-tone map of mainland membership, written as a single SVG page.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use geo::{LineString, Polygon, Rect};
use tracing::info;

use crate::cleaner::TaggedRecord;

const PAGE_WIDTH: u32 = 1300;
const PAGE_HEIGHT: u32 = 800;
const MAINLAND_FILL: &str = "blue";
const OUTSIDE_FILL: &str = "red";

/// Render every record, mainland in translucent blue and the rest in red.
///
/// Axes are omitted. Rendering never alters the records.
pub fn visualize(records: &[TaggedRecord], output_path: &Path) -> Result<()> {
    let Some(bounds) = bounds(records) else {
        bail!("No geometry to render");
    };

    let (min_x, max_y) = (bounds.min().x, bounds.max().y);
    let width = bounds.width().max(f64::EPSILON);
    let height = bounds.height().max(f64::EPSILON);

    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="{} {} {} {}" preserveAspectRatio="xMidYMid meet">"#,
        PAGE_WIDTH, PAGE_HEIGHT, min_x, -max_y, width, height
    )?;

    writeln!(
        svg,
        r#"<g fill="{}" fill-opacity="0.4" fill-rule="evenodd" stroke="{}" stroke-width="0.5" vector-effect="non-scaling-stroke">"#,
        MAINLAND_FILL, MAINLAND_FILL
    )?;
    for tagged in records.iter().filter(|t| t.is_mainland) {
        push_paths(&mut svg, tagged)?;
    }
    writeln!(svg, "</g>")?;

    writeln!(
        svg,
        r#"<g fill="{}" fill-rule="evenodd" stroke="{}" stroke-width="0.5" vector-effect="non-scaling-stroke">"#,
        OUTSIDE_FILL, OUTSIDE_FILL
    )?;
    for tagged in records.iter().filter(|t| !t.is_mainland) {
        push_paths(&mut svg, tagged)?;
    }
    writeln!(svg, "</g>")?;
    writeln!(svg, "</svg>")?;

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(output_path, svg)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    info!("Rendered {} records into: {}", records.len(), output_path.display());
    Ok(())
}

fn bounds(records: &[TaggedRecord]) -> Option<Rect<f64>> {
    records
        .iter()
        .filter_map(|t| t.record.geometry.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
            )
        })
}

fn push_paths(svg: &mut String, tagged: &TaggedRecord) -> std::fmt::Result {
    for polygon in tagged.record.geometry.parts() {
        svg.push_str("<path d=\"");
        push_polygon(svg, polygon)?;
        svg.push_str("\"/>\n");
    }
    Ok(())
}

fn push_polygon(svg: &mut String, polygon: &Polygon<f64>) -> std::fmt::Result {
    push_ring(svg, polygon.exterior())?;
    for interior in polygon.interiors() {
        push_ring(svg, interior)?;
    }
    Ok(())
}

// y is flipped so north is up
fn push_ring(svg: &mut String, ring: &LineString<f64>) -> std::fmt::Result {
    for (i, coord) in ring.coords().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        write!(svg, "{}{} {} ", cmd, coord.x, -coord.y)?;
    }
    svg.push('Z');
    Ok(())
}
