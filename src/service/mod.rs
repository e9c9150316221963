//! Presenting service: request parameters, the pipeline and startup validation.

pub mod params;
mod presenting;
mod validator;

pub use params::{IncludeRequest, PresentParams};
pub use presenting::{effective_pagination, Pagination, PresenterCollection, PresentingOptions};
pub use validator::validate;
