//! Core data models for the boundary cleaning pipeline.

pub mod boundary;
pub mod code;

pub use boundary::{BoundaryGeometry, BoundaryRecord, GeometryError};
pub use code::{CodeValue, KeyError, KeyLevel};
