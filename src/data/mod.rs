//! Data loading and generation.
//!
//! - the immutable loaded `Snapshot` and its source paths (`snapshot`)
//! - synthetic demo dataset generation (`sample`)

pub mod sample;
pub mod snapshot;

pub use sample::*;
pub use snapshot::*;
