//! Record type to presenter mapping.
//!
//! Built during startup, then finalized. Lookups after finalization need no
//! locking; registration after finalization is rejected.

use crate::error::ConfigError;
use crate::presenter::Presenter;
use crate::service::PresenterCollection;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

#[derive(Clone, Default)]
pub struct PresenterRegistry {
    presenters: HashMap<String, Arc<dyn Presenter>>,
    finalized: bool,
}

impl PresenterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps each record type to `presenter`, replacing earlier registrations.
    pub fn register(
        &mut self,
        presenter: Arc<dyn Presenter>,
        record_types: &[&str],
    ) -> Result<(), ConfigError> {
        if self.finalized {
            return Err(ConfigError::RegistryFinalized);
        }
        for record_type in record_types {
            tracing::debug!(record_type, "registering presenter");
            self.presenters
                .insert((*record_type).to_string(), Arc::clone(&presenter));
        }
        Ok(())
    }

    pub fn presents<P>(&mut self, presenter: P, record_types: &[&str]) -> Result<(), ConfigError>
    where
        P: Presenter + 'static,
    {
        self.register(Arc::new(presenter), record_types)
    }

    pub fn finalize_registration(&mut self) {
        self.finalized = true;
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn lookup(&self, record_type: &str) -> Option<Arc<dyn Presenter>> {
        self.presenters.get(record_type).cloned()
    }

    pub fn lookup_or_fail(&self, record_type: &str) -> Result<Arc<dyn Presenter>, ConfigError> {
        self.lookup(record_type).ok_or_else(|| {
            tracing::warn!(record_type, "no presenter registered");
            ConfigError::MissingPresenter {
                record_type: record_type.to_string(),
            }
        })
    }

    /// `(record type, presenter)` pairs sorted by record type.
    pub fn entries(&self) -> Vec<(String, Arc<dyn Presenter>)> {
        let mut entries: Vec<(String, Arc<dyn Presenter>)> = self
            .presenters
            .iter()
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Registered record types, sorted.
    pub fn record_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.presenters.keys().cloned().collect();
        types.sort();
        types
    }
}

impl fmt::Debug for PresenterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenterRegistry")
            .field("record_types", &self.record_types())
            .field("finalized", &self.finalized)
            .finish()
    }
}

static GLOBAL: OnceLock<Arc<PresenterCollection>> = OnceLock::new();

/// Finalizes `collection` and installs it as the process-wide collection.
/// Fails when one is already installed.
pub fn install_global(mut collection: PresenterCollection) -> Result<Arc<PresenterCollection>, ConfigError> {
    collection.finalize_registration();
    let collection = Arc::new(collection);
    GLOBAL
        .set(Arc::clone(&collection))
        .map_err(|_| ConfigError::RegistryFinalized)?;
    Ok(collection)
}

pub fn global() -> Option<Arc<PresenterCollection>> {
    GLOBAL.get().cloned()
}
