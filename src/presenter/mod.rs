//! Presenters: declarations, field descriptors, filter/order callables and post-processing.

mod base;
mod callable;
mod definition;
mod field;

pub use base::*;
pub use callable::*;
pub use definition::*;
pub use field::*;
