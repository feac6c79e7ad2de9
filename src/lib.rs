//! Seguia - data preparation for the national geostatistical framework
//!
//! This library provides shared types and modules for the fetch and clean binaries.

pub mod cleaner;
pub mod config;
pub mod download;
pub mod export;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod render;

pub use cleaner::{mainland_reference, tag_membership, MainlandGeometry, TaggedRecord};
pub use models::{BoundaryGeometry, BoundaryRecord, CodeValue, KeyLevel};
