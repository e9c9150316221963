//! Shared application state for the presenting routes.

use crate::scope::ScopeSource;
use crate::service::PresenterCollection;
use std::sync::Arc;

#[derive(Clone)]
pub struct PresentingState {
    /// Finalized before the router is built.
    pub collection: Arc<PresenterCollection>,
    pub scopes: Arc<dyn ScopeSource>,
}

impl PresentingState {
    pub fn new(collection: Arc<PresenterCollection>, scopes: Arc<dyn ScopeSource>) -> Self {
        Self { collection, scopes }
    }
}
