//! Collection-wide presenting defaults: page sizes and fallback sort order.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: u64 = 20;
pub const DEFAULT_MAX_PER_PAGE: u64 = 200;
pub const DEFAULT_SORT_ORDER: &str = "updated_at:desc";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentingSettings {
    #[serde(default = "default_per_page")]
    pub default_per_page: u64,
    #[serde(default = "default_max_per_page")]
    pub default_max_per_page: u64,
    /// Used when a presenter declares no default sort order ("field:direction").
    #[serde(default = "default_sort_order")]
    pub default_sort_order: String,
}

fn default_per_page() -> u64 {
    DEFAULT_PER_PAGE
}

fn default_max_per_page() -> u64 {
    DEFAULT_MAX_PER_PAGE
}

fn default_sort_order() -> String {
    DEFAULT_SORT_ORDER.to_string()
}

impl Default for PresentingSettings {
    fn default() -> Self {
        Self {
            default_per_page: DEFAULT_PER_PAGE,
            default_max_per_page: DEFAULT_MAX_PER_PAGE,
            default_sort_order: DEFAULT_SORT_ORDER.to_string(),
        }
    }
}

impl PresentingSettings {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Validation(e.to_string()))
    }

    /// Defaults overridden by `PRESENTER_DEFAULT_PER_PAGE`, `PRESENTER_MAX_PER_PAGE`
    /// and `PRESENTER_DEFAULT_SORT_ORDER`. Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        if let Some(n) = positive_from(&lookup, "PRESENTER_DEFAULT_PER_PAGE") {
            settings.default_per_page = n;
        }
        if let Some(n) = positive_from(&lookup, "PRESENTER_MAX_PER_PAGE") {
            settings.default_max_per_page = n;
        }
        if let Some(order) = lookup("PRESENTER_DEFAULT_SORT_ORDER").filter(|s| !s.trim().is_empty()) {
            settings.default_sort_order = order;
        }
        settings
    }
}

fn positive_from<F>(lookup: &F, name: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            tracing::warn!(variable = name, value = %raw, "ignoring invalid presenting setting");
            None
        }
    }
}
