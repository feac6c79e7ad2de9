//! Mainland reference geometry and its spatial index.

use geo::{BooleanOps, BoundingRect, MultiPolygon, Polygon};
use rstar::{RTree, RTreeObject, AABB};
use tracing::{debug, info};

use super::largest_component;
use crate::models::{BoundaryGeometry, BoundaryRecord, GeometryError};

/// Name given to the dissolved reference
pub const MAINLAND_NAME: &str = "Mexico";
/// Code given to the dissolved reference (CVEGEO and CVE_ENT)
pub const MAINLAND_CODE: &str = "00";

/// Union of the largest component of every input boundary
#[derive(Debug, Clone, PartialEq)]
pub struct MainlandGeometry {
    pub name: String,
    pub geo_code: String,
    pub entity_code: String,
    pub geometry: MultiPolygon<f64>,
}

/// Reduce every boundary to its largest part and dissolve the results.
///
/// Islands (every part but the largest of each record) are discarded. The
/// output is deterministic for a given input order.
pub fn mainland_reference(records: &[BoundaryRecord]) -> Result<MainlandGeometry, GeometryError> {
    if records.is_empty() {
        return Err(GeometryError::NoBoundaries);
    }

    let mut dropped_parts = 0;
    let mut kept: Vec<Polygon<f64>> = Vec::with_capacity(records.len());
    for record in records {
        kept.push(largest_component(&record.geometry)?);
        dropped_parts += record.geometry.parts().len() - 1;
    }

    info!(
        "Dissolving {} mainland components ({} island parts dropped)",
        kept.len(),
        dropped_parts
    );

    let mut iter = kept.into_iter();
    let first = iter.next().ok_or(GeometryError::NoBoundaries)?;
    let geometry = iter.fold(MultiPolygon::new(vec![first]), |acc, polygon| {
        acc.union(&polygon)
    });

    debug!("Mainland reference has {} parts", geometry.0.len());

    Ok(MainlandGeometry {
        name: MAINLAND_NAME.to_string(),
        geo_code: MAINLAND_CODE.to_string(),
        entity_code: MAINLAND_CODE.to_string(),
        geometry,
    })
}

/// One part of the mainland reference, indexed by its envelope
struct IndexedPart {
    polygon: Polygon<f64>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedPart {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedPart {
    fn new(polygon: Polygon<f64>) -> Option<Self> {
        let rect = polygon.bounding_rect()?;
        let envelope =
            AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
        Some(Self { polygon, envelope })
    }
}

/// R-tree over the parts of a mainland reference.
///
/// Candidates are found by envelope overlap and then tested with an exact
/// intersection, which gives the same answer as intersecting the whole
/// multipolygon.
pub struct MainlandIndex {
    tree: RTree<IndexedPart>,
}

impl MainlandIndex {
    pub fn build(reference: &MainlandGeometry) -> Self {
        let parts: Vec<IndexedPart> = reference
            .geometry
            .0
            .iter()
            .cloned()
            .filter_map(IndexedPart::new)
            .collect();

        let tree = RTree::bulk_load(parts);
        debug!("Mainland index built with {} parts", tree.size());

        Self { tree }
    }

    /// Whether the geometry touches or overlaps the mainland
    pub fn intersects(&self, geometry: &BoundaryGeometry) -> bool {
        let Some(rect) = geometry.bounding_rect() else {
            return false;
        };
        let query_envelope =
            AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);

        self.tree
            .locate_in_envelope_intersecting(&query_envelope)
            .any(|part| geometry.intersects_polygon(&part.polygon))
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
