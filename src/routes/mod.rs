//! Route builders.

mod common;
mod presenting;

pub use common::{common_routes, common_routes_with_ready};
pub use presenting::presenting_routes;
