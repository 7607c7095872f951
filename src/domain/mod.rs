//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the vehicle-category `Bucket` enum and its label heuristic
//! - normalized table records (`CategoryYearRecord`, `ManufacturerQuarterRecord`, ...)
//! - the raw-vs-enriched `GrowthSource` input and the `ViewFilter` selection

pub mod types;

pub use types::*;
