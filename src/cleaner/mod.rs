//! Island removal and mainland membership for administrative boundaries.
//!
//! States are reduced to their largest polygon, dissolved into a single
//! mainland reference, and finer-level boundaries are then tagged by whether
//! they intersect that reference.

mod component;
mod keys;
mod mainland;
mod membership;

pub use component::largest_component;
pub use keys::{composite_key, optional_composite_key};
pub use mainland::{
    mainland_reference, MainlandGeometry, MainlandIndex, MAINLAND_CODE, MAINLAND_NAME,
};
pub use membership::{filter_and_export, tag_membership, TaggedRecord};
