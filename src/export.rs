//! CSV export of tagged boundaries.

use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use geo::Polygon;
use serde::Serialize;
use tracing::info;

use crate::cleaner::{optional_composite_key, TaggedRecord};
use crate::models::code::{ENTITY_WIDTH, LOCALITY_WIDTH, MUNICIPALITY_WIDTH};
use crate::models::{BoundaryGeometry, CodeValue, KeyError, KeyLevel};

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "CVEGEO")]
    geo_code: Option<&'a str>,
    #[serde(rename = "CVE_ENT")]
    entity_code: String,
    #[serde(rename = "CVE_MUN")]
    municipality_code: Option<String>,
    #[serde(rename = "CVE_LOC")]
    locality_code: Option<String>,
    #[serde(rename = "NOMGEO")]
    name: &'a str,
    #[serde(rename = "CVE_CONCAT")]
    key: Option<String>,
    #[serde(rename = "CVE_CONCAT_LOC")]
    locality_key: Option<String>,
    isin_mexico: bool,
    geometry: String,
}

/// Write tagged records to `path`, one row each, geometry as WKT.
pub fn write_csv(records: &[TaggedRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    for tagged in records {
        let record = &tagged.record;
        let row = ExportRow {
            geo_code: record.geo_code.as_deref(),
            entity_code: record.entity_code.normalize("CVE_ENT", ENTITY_WIDTH)?,
            municipality_code: padded(&record.municipality_code, "CVE_MUN", MUNICIPALITY_WIDTH)?,
            locality_code: padded(&record.locality_code, "CVE_LOC", LOCALITY_WIDTH)?,
            name: &record.name,
            key: optional_composite_key(record, KeyLevel::Municipality)?,
            locality_key: optional_composite_key(record, KeyLevel::Locality)?,
            isin_mexico: tagged.is_mainland,
            geometry: to_wkt(&record.geometry)?,
        };
        writer.serialize(row)?;
    }

    writer.flush()?;
    info!("Saved {} records into: {}", records.len(), path.display());
    Ok(())
}

fn padded(
    code: &Option<CodeValue>,
    field: &'static str,
    width: usize,
) -> Result<Option<String>, KeyError> {
    code.as_ref().map(|c| c.normalize(field, width)).transpose()
}

/// Well-known text for a boundary geometry
pub fn to_wkt(geometry: &BoundaryGeometry) -> Result<String, fmt::Error> {
    let mut out = String::new();
    match geometry {
        BoundaryGeometry::Polygon(p) => {
            out.push_str("POLYGON ");
            push_polygon(&mut out, p)?;
        }
        BoundaryGeometry::MultiPolygon(mp) => {
            out.push_str("MULTIPOLYGON (");
            for (i, p) in mp.0.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                push_polygon(&mut out, p)?;
            }
            out.push(')');
        }
    }
    Ok(out)
}

fn push_polygon(out: &mut String, polygon: &Polygon<f64>) -> fmt::Result {
    out.push('(');
    let rings = std::iter::once(polygon.exterior()).chain(polygon.interiors());
    for (i, ring) in rings.enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('(');
        for (j, coord) in ring.coords().enumerate() {
            if j > 0 {
                out.push_str(", ");
            }
            write!(out, "{} {}", coord.x, coord.y)?;
        }
        out.push(')');
    }
    out.push(')');
    Ok(())
}
