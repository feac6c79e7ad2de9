//! Mainland membership tagging and filtering.

use tracing::{info, warn};

use super::{MainlandGeometry, MainlandIndex};
use crate::models::BoundaryRecord;

/// A boundary annotated with its mainland membership
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedRecord {
    pub record: BoundaryRecord,
    pub is_mainland: bool,
}

/// Flag every record by whether it intersects the mainland reference.
///
/// Membership is intersects-based, not contains-based: a coastal unit that
/// only shares an edge or a point with the mainland counts as mainland.
pub fn tag_membership(
    records: Vec<BoundaryRecord>,
    reference: &MainlandGeometry,
) -> Vec<TaggedRecord> {
    let index = MainlandIndex::build(reference);
    if index.is_empty() {
        warn!("Mainland reference has no parts; every record will be tagged outside");
    } else {
        info!("Tagging against {} mainland parts", index.len());
    }

    let tagged: Vec<TaggedRecord> = records
        .into_iter()
        .map(|record| {
            let is_mainland = index.intersects(&record.geometry);
            TaggedRecord {
                record,
                is_mainland,
            }
        })
        .collect();

    let mainland = tagged.iter().filter(|t| t.is_mainland).count();
    info!(
        "Tagged {} records: {} mainland, {} outside",
        tagged.len(),
        mainland,
        tagged.len() - mainland
    );

    tagged
}

/// Keep only mainland records, preserving order.
pub fn filter_and_export(records: &[TaggedRecord]) -> Vec<TaggedRecord> {
    records.iter().filter(|t| t.is_mainland).cloned().collect()
}
