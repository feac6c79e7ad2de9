//! Largest-part selection for multipart boundaries.

use geo::{Area, Polygon};

use crate::models::{BoundaryGeometry, GeometryError};

/// Keep only the polygon with the largest area.
///
/// A plain polygon is returned unchanged. For a multipolygon, the part with
/// the greatest unsigned area wins; on ties the earliest part is kept.
pub fn largest_component(geometry: &BoundaryGeometry) -> Result<Polygon<f64>, GeometryError> {
    match geometry {
        BoundaryGeometry::Polygon(p) => Ok(p.clone()),
        BoundaryGeometry::MultiPolygon(mp) => {
            let mut best: Option<(&Polygon<f64>, f64)> = None;
            for part in &mp.0 {
                let area = part.unsigned_area();
                match best {
                    Some((_, best_area)) if area <= best_area => {}
                    _ => best = Some((part, area)),
                }
            }
            best.map(|(p, _)| p.clone()).ok_or(GeometryError::EmptyMultiPolygon)
        }
    }
}
