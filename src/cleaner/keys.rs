//! Composite administrative keys.

use crate::models::code::{ENTITY_WIDTH, LOCALITY_WIDTH, MUNICIPALITY_WIDTH};
use crate::models::{BoundaryRecord, KeyError, KeyLevel};

/// Build the fixed-width composite key for a record.
///
/// `Municipality` yields entity ++ municipality (5 chars), `Locality` yields
/// entity ++ municipality ++ locality (9 chars). Each component is zero-padded
/// whether the source stored it as a number or as text.
pub fn composite_key(record: &BoundaryRecord, level: KeyLevel) -> Result<String, KeyError> {
    let mut key = String::with_capacity(level.width());
    key.push_str(&record.entity_code.normalize("CVE_ENT", ENTITY_WIDTH)?);

    let municipality = record
        .municipality_code
        .as_ref()
        .ok_or(KeyError::MissingField("CVE_MUN"))?;
    key.push_str(&municipality.normalize("CVE_MUN", MUNICIPALITY_WIDTH)?);

    if level == KeyLevel::Locality {
        let locality = record
            .locality_code
            .as_ref()
            .ok_or(KeyError::MissingField("CVE_LOC"))?;
        key.push_str(&locality.normalize("CVE_LOC", LOCALITY_WIDTH)?);
    }

    Ok(key)
}

/// Like [`composite_key`], but a record lacking a level's fields gives `None`.
///
/// Malformed codes are still errors.
pub fn optional_composite_key(
    record: &BoundaryRecord,
    level: KeyLevel,
) -> Result<Option<String>, KeyError> {
    match composite_key(record, level) {
        Ok(key) => Ok(Some(key)),
        Err(KeyError::MissingField(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
