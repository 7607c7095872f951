//! The derived-metrics engine.
//!
//! - growth-column derivation (`growth`)
//! - aggregate queries over loaded tables (`query`)

pub mod growth;
pub mod query;

pub use growth::*;
pub use query::*;
