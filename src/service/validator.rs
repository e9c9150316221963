//! Startup checks over registered presenters: sort orders and association targets.

use crate::error::ConfigError;
use crate::registry::PresenterRegistry;
use std::collections::HashSet;

pub fn validate(registry: &PresenterRegistry) -> Result<(), ConfigError> {
    let registered: HashSet<String> = registry.record_types().into_iter().collect();

    for (record_type, presenter) in registry.entries() {
        let definition = presenter.definition();
        let sort_orders = definition.valid_sort_orders();

        if let Some(field) = definition.default_sort_field() {
            if !sort_orders.contains_key(&field) {
                return Err(ConfigError::Validation(format!(
                    "{record_type}: default sort order '{field}' is not a declared sort order"
                )));
            }
        }

        let mut json_names = HashSet::new();
        for (name, association) in definition.valid_associations() {
            if !registered.contains(&association.target_type) {
                return Err(ConfigError::Validation(format!(
                    "{record_type}: association '{name}' targets '{}', which has no presenter",
                    association.target_type
                )));
            }
            if let Some(json_name) = association.field.json_name.as_deref() {
                if !json_names.insert(json_name.to_string()) {
                    return Err(ConfigError::Validation(format!(
                        "{record_type}: json name '{json_name}' is used by more than one association"
                    )));
                }
            }
        }
    }

    Ok(())
}
