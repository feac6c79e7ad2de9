//! Administrative boundary records and their polygonal geometry.

use geo::{Area, BoundingRect, Geometry, Intersects, MultiPolygon, Polygon, Rect};
use thiserror::Error;

use super::CodeValue;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("expected polygonal geometry, found {0}")]
    NotPolygonal(&'static str),

    #[error("multipolygon has no parts")]
    EmptyMultiPolygon,

    #[error("no boundaries to build a mainland reference from")]
    NoBoundaries,
}

/// Polygonal geometry of a boundary.
///
/// Sources frequently store single-part shapes as one-element multipolygons;
/// those are collapsed to `Polygon` on construction so that a unit with no
/// islands is always a plain polygon.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryGeometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl BoundaryGeometry {
    pub fn from_multi_polygon(mut mp: MultiPolygon<f64>) -> Result<Self, GeometryError> {
        match mp.0.len() {
            0 => Err(GeometryError::EmptyMultiPolygon),
            1 => Ok(BoundaryGeometry::Polygon(mp.0.remove(0))),
            _ => Ok(BoundaryGeometry::MultiPolygon(mp)),
        }
    }

    /// Sum of the unsigned areas of all parts
    pub fn area(&self) -> f64 {
        match self {
            BoundaryGeometry::Polygon(p) => p.unsigned_area(),
            BoundaryGeometry::MultiPolygon(mp) => mp.unsigned_area(),
        }
    }

    /// Polygon parts in source order
    pub fn parts(&self) -> &[Polygon<f64>] {
        match self {
            BoundaryGeometry::Polygon(p) => std::slice::from_ref(p),
            BoundaryGeometry::MultiPolygon(mp) => &mp.0,
        }
    }

    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            BoundaryGeometry::Polygon(p) => p.bounding_rect(),
            BoundaryGeometry::MultiPolygon(mp) => mp.bounding_rect(),
        }
    }

    /// Whether `polygon` touches or overlaps this geometry
    pub fn intersects_polygon(&self, polygon: &Polygon<f64>) -> bool {
        match self {
            BoundaryGeometry::Polygon(p) => polygon.intersects(p),
            BoundaryGeometry::MultiPolygon(mp) => polygon.intersects(mp),
        }
    }
}

impl From<Polygon<f64>> for BoundaryGeometry {
    fn from(p: Polygon<f64>) -> Self {
        BoundaryGeometry::Polygon(p)
    }
}

impl TryFrom<Geometry<f64>> for BoundaryGeometry {
    type Error = GeometryError;

    fn try_from(geometry: Geometry<f64>) -> Result<Self, Self::Error> {
        match geometry {
            Geometry::Polygon(p) => Ok(BoundaryGeometry::Polygon(p)),
            Geometry::MultiPolygon(mp) => BoundaryGeometry::from_multi_polygon(mp),
            Geometry::Rect(r) => Ok(BoundaryGeometry::Polygon(r.to_polygon())),
            Geometry::Triangle(t) => Ok(BoundaryGeometry::Polygon(t.to_polygon())),
            Geometry::Point(_) => Err(GeometryError::NotPolygonal("point")),
            Geometry::MultiPoint(_) => Err(GeometryError::NotPolygonal("multipoint")),
            Geometry::Line(_) => Err(GeometryError::NotPolygonal("line")),
            Geometry::LineString(_) => Err(GeometryError::NotPolygonal("linestring")),
            Geometry::MultiLineString(_) => Err(GeometryError::NotPolygonal("multilinestring")),
            Geometry::GeometryCollection(_) => {
                Err(GeometryError::NotPolygonal("geometrycollection"))
            }
        }
    }
}

/// One administrative unit (state, municipality or locality)
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryRecord {
    /// Source composite code (CVEGEO)
    pub geo_code: Option<String>,
    /// Entity / state code (CVE_ENT)
    pub entity_code: CodeValue,
    /// Municipality code (CVE_MUN), absent at state level
    pub municipality_code: Option<CodeValue>,
    /// Locality code (CVE_LOC)
    pub locality_code: Option<CodeValue>,
    /// Geographic name (NOMGEO)
    pub name: String,
    pub geometry: BoundaryGeometry,
}

impl BoundaryRecord {
    pub fn new(entity_code: impl Into<CodeValue>, name: &str, geometry: BoundaryGeometry) -> Self {
        Self {
            geo_code: None,
            entity_code: entity_code.into(),
            municipality_code: None,
            locality_code: None,
            name: name.to_string(),
            geometry,
        }
    }

    pub fn with_municipality(mut self, code: impl Into<CodeValue>) -> Self {
        self.municipality_code = Some(code.into());
        self
    }

    pub fn with_locality(mut self, code: impl Into<CodeValue>) -> Self {
        self.locality_code = Some(code.into());
        self
    }
}
