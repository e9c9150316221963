//! HTTP handlers for presenting collections and single records.

pub mod presenting;
pub use presenting::*;
