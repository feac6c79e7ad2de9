//! Boundary loading from shapefiles and GeoJSON.
//!
//! Both formats are read into the same [`BoundaryRecord`] shape, using the
//! attribute names of the geostatistical framework: CVEGEO, CVE_ENT,
//! CVE_MUN, CVE_LOC and NOMGEO.

use std::fs;
use std::path::{Path, PathBuf};

use geojson::{FeatureCollection, GeoJson};
use shapefile::dbase::FieldValue;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::models::{BoundaryGeometry, BoundaryRecord, CodeValue};

pub const FIELD_GEO_CODE: &str = "CVEGEO";
pub const FIELD_ENTITY: &str = "CVE_ENT";
pub const FIELD_MUNICIPALITY: &str = "CVE_MUN";
pub const FIELD_LOCALITY: &str = "CVE_LOC";
pub const FIELD_NAME: &str = "NOMGEO";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read shapefile {}: {source}", .path.display())]
    Shapefile {
        path: PathBuf,
        source: shapefile::Error,
    },

    #[error("invalid GeoJSON in {}: {source}", .path.display())]
    GeoJson {
        path: PathBuf,
        source: geojson::Error,
    },

    #[error("row {row} of {}: {reason}", .path.display())]
    Row {
        path: PathBuf,
        row: usize,
        reason: String,
    },

    #[error("unsupported boundary file {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// Load boundaries, choosing the reader from the file extension.
pub fn load_boundaries(path: &Path) -> Result<Vec<BoundaryRecord>, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("shp") => load_shapefile(path),
        Some("geojson") | Some("json") => load_geojson(path),
        _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Load every polygon and its dBase attributes from a shapefile.
pub fn load_shapefile(path: &Path) -> Result<Vec<BoundaryRecord>, LoadError> {
    info!("Reading shapefile: {}", path.display());

    let shapefile_err = |source| LoadError::Shapefile {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = shapefile::Reader::from_path(path).map_err(shapefile_err)?;
    let mut records = Vec::new();

    for (row, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, attributes) = result.map_err(shapefile_err)?;

        let geometry = geo_types::Geometry::<f64>::try_from(shape).map_err(|e| LoadError::Row {
            path: path.to_path_buf(),
            row,
            reason: e.to_string(),
        })?;

        let record = build_record(path, row, geometry, |field| {
            dbase_code(attributes.get(field))
        })?;
        records.push(record);
    }

    info!("Loaded {} boundaries from {}", records.len(), path.display());
    Ok(records)
}

/// Load every feature of a GeoJSON FeatureCollection.
pub fn load_geojson(path: &Path) -> Result<Vec<BoundaryRecord>, LoadError> {
    info!("Reading GeoJSON: {}", path.display());

    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let geojson_err = |source| LoadError::GeoJson {
        path: path.to_path_buf(),
        source,
    };
    let geojson: GeoJson = text.parse().map_err(geojson_err)?;
    let collection = FeatureCollection::try_from(geojson).map_err(geojson_err)?;

    let mut records = Vec::with_capacity(collection.features.len());
    for (row, feature) in collection.features.iter().enumerate() {
        let row_err = |reason: String| LoadError::Row {
            path: path.to_path_buf(),
            row,
            reason,
        };

        let geometry = feature
            .geometry
            .clone()
            .ok_or_else(|| row_err("feature has no geometry".to_string()))?;
        let geometry = geo_types::Geometry::<f64>::try_from(geometry)
            .map_err(|e| row_err(e.to_string()))?;

        let record = build_record(path, row, geometry, |field| {
            feature.property(field).and_then(json_code)
        })?;
        records.push(record);
    }

    info!("Loaded {} boundaries from {}", records.len(), path.display());
    Ok(records)
}

/// Find `file_name` anywhere below `root`.
pub fn find_boundary_file(root: &Path, file_name: &str) -> Option<PathBuf> {
    WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
        .map(|entry| {
            debug!("Found {} at {}", file_name, entry.path().display());
            entry.into_path()
        })
}

fn build_record<F>(
    path: &Path,
    row: usize,
    geometry: geo_types::Geometry<f64>,
    attribute: F,
) -> Result<BoundaryRecord, LoadError>
where
    F: Fn(&str) -> Option<CodeValue>,
{
    let row_err = |reason: String| LoadError::Row {
        path: path.to_path_buf(),
        row,
        reason,
    };

    let geometry = BoundaryGeometry::try_from(geometry).map_err(|e| row_err(e.to_string()))?;
    let entity_code = attribute(FIELD_ENTITY)
        .ok_or_else(|| row_err(format!("missing field {}", FIELD_ENTITY)))?;

    Ok(BoundaryRecord {
        geo_code: attribute(FIELD_GEO_CODE).map(|c| c.to_string()),
        entity_code,
        municipality_code: attribute(FIELD_MUNICIPALITY),
        locality_code: attribute(FIELD_LOCALITY),
        name: attribute(FIELD_NAME)
            .map(|c| c.to_string())
            .unwrap_or_default(),
        geometry,
    })
}

fn dbase_code(value: Option<&FieldValue>) -> Option<CodeValue> {
    match value? {
        FieldValue::Character(Some(s)) => text_code(s),
        FieldValue::Numeric(Some(n)) => Some(CodeValue::Number(*n)),
        FieldValue::Float(Some(n)) => Some(CodeValue::Number(f64::from(*n))),
        FieldValue::Integer(n) => Some(CodeValue::Number(f64::from(*n))),
        FieldValue::Double(n) => Some(CodeValue::Number(*n)),
        _ => None,
    }
}

fn json_code(value: &serde_json::Value) -> Option<CodeValue> {
    match value {
        serde_json::Value::String(s) => text_code(s),
        serde_json::Value::Number(n) => n.as_f64().map(CodeValue::Number),
        _ => None,
    }
}

fn text_code(s: &str) -> Option<CodeValue> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(CodeValue::Text(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LOCALITIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {
                    "CVEGEO": "010010001", "CVE_ENT": "01", "CVE_MUN": 1,
                    "CVE_LOC": "0001", "NOMGEO": "Aguascalientes"
                },
                "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}
            },
            {
                "type": "Feature",
                "properties": {"CVE_ENT": 2, "NOMGEO": "Baja California"},
                "geometry": {"type": "MultiPolygon", "coordinates": [
                    [[[0,0],[4,0],[4,4],[0,4],[0,0]]],
                    [[[9,9],[10,9],[10,10],[9,10],[9,9]]]
                ]}
            }
        ]
    }"#;

    fn write_fixture(contents: &str, suffix: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_geojson_records() {
        let file = write_fixture(LOCALITIES, ".geojson");
        let records = load_boundaries(file.path()).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.geo_code.as_deref(), Some("010010001"));
        assert_eq!(first.entity_code, CodeValue::Text("01".to_string()));
        assert_eq!(first.municipality_code, Some(CodeValue::Number(1.0)));
        assert_eq!(first.name, "Aguascalientes");
        assert!(matches!(first.geometry, BoundaryGeometry::Polygon(_)));

        let second = &records[1];
        assert_eq!(second.municipality_code, None);
        assert_eq!(second.geometry.parts().len(), 2);
    }

    #[test]
    fn test_missing_entity_is_row_error() {
        let contents = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"NOMGEO": "x"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}
        ]}"#;
        let file = write_fixture(contents, ".geojson");
        let err = load_geojson(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Row { row: 0, .. }));
    }

    #[test]
    fn test_point_geometry_is_row_error() {
        let contents = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"CVE_ENT": "01"},
             "geometry": {"type": "Point", "coordinates": [1, 2]}}
        ]}"#;
        let file = write_fixture(contents, ".geojson");
        let err = load_geojson(file.path()).unwrap_err();
        assert!(err.to_string().contains("expected polygonal geometry"));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_fixture("", ".kml");
        assert!(matches!(
            load_boundaries(file.path()),
            Err(LoadError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_load_shapefile_with_numeric_codes() {
        use crate::cleaner::composite_key;
        use crate::models::KeyLevel;
        use shapefile::dbase::{FieldName, Record, TableWriterBuilder};
        use shapefile::{Point, PolygonRing};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("00mun.shp");

        {
            let table = TableWriterBuilder::new()
                .add_character_field(FieldName::try_from(FIELD_GEO_CODE).unwrap(), 9)
                .add_character_field(FieldName::try_from(FIELD_ENTITY).unwrap(), 2)
                .add_numeric_field(FieldName::try_from(FIELD_MUNICIPALITY).unwrap(), 10, 0)
                .add_character_field(FieldName::try_from(FIELD_NAME).unwrap(), 50);
            let mut writer = shapefile::Writer::from_path(&path, table).unwrap();

            let square = shapefile::Polygon::new(PolygonRing::Outer(vec![
                Point::new(0.0, 0.0),
                Point::new(0.0, 1.0),
                Point::new(1.0, 1.0),
                Point::new(1.0, 0.0),
                Point::new(0.0, 0.0),
            ]));
            let mut record = Record::default();
            record.insert(
                FIELD_GEO_CODE.to_string(),
                FieldValue::Character(Some("01007".to_string())),
            );
            record.insert(
                FIELD_ENTITY.to_string(),
                FieldValue::Character(Some("01".to_string())),
            );
            record.insert(FIELD_MUNICIPALITY.to_string(), FieldValue::Numeric(Some(7.0)));
            record.insert(
                FIELD_NAME.to_string(),
                FieldValue::Character(Some("Calvillo".to_string())),
            );
            writer.write_shape_and_record(&square, &record).unwrap();
        }

        let records = load_boundaries(&path).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.geo_code.as_deref(), Some("01007"));
        assert_eq!(record.entity_code, CodeValue::Text("01".to_string()));
        assert_eq!(record.municipality_code, Some(CodeValue::Number(7.0)));
        assert_eq!(record.locality_code, None);
        assert_eq!(record.name, "Calvillo");
        assert!(matches!(record.geometry, BoundaryGeometry::Polygon(_)));
        assert!((record.geometry.area() - 1.0).abs() < 1e-12);
        assert_eq!(
            composite_key(record, KeyLevel::Municipality).unwrap(),
            "01007"
        );
    }

    #[test]
    fn test_find_boundary_file_searches_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("mg").join("conjunto_de_datos");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("00ent.shp"), b"").unwrap();

        let found = find_boundary_file(dir.path(), "00ent.shp").unwrap();
        assert_eq!(found, nested.join("00ent.shp"));
        assert!(find_boundary_file(dir.path(), "00a.shp").is_none());
    }
}
