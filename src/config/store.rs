//! Inheritance-aware key/value store backing every presenter declaration.
//!
//! A [`Configuration`] defers to its parent for keys it does not hold itself.
//! Nested nodes and append lists found in the parent are wrapped in a fresh
//! child on first read and cached locally, so writes made through a child never
//! reach the parent's storage.

use crate::config::InheritableAppendList;
use crate::error::ConfigError;
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// A value held under one key of a [`Configuration`].
pub enum ConfigValue<V> {
    Value(V),
    Nested(Configuration<V>),
    List(InheritableAppendList<V>),
}

impl<V: Clone> Clone for ConfigValue<V> {
    fn clone(&self) -> Self {
        match self {
            ConfigValue::Value(v) => ConfigValue::Value(v.clone()),
            ConfigValue::Nested(node) => ConfigValue::Nested(node.clone()),
            ConfigValue::List(list) => ConfigValue::List(list.clone()),
        }
    }
}

impl<V> ConfigValue<V> {
    pub fn as_value(&self) -> Option<&V> {
        match self {
            ConfigValue::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<V> {
        match self {
            ConfigValue::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_nested(&self) -> Option<&Configuration<V>> {
        match self {
            ConfigValue::Nested(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&InheritableAppendList<V>> {
        match self {
            ConfigValue::List(list) => Some(list),
            _ => None,
        }
    }
}

impl<V: Clone + fmt::Debug> fmt::Debug for ConfigValue<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Value(v) => f.debug_tuple("Value").field(v).finish(),
            ConfigValue::Nested(node) => f.debug_tuple("Nested").field(node).finish(),
            ConfigValue::List(list) => f.debug_tuple("List").field(list).finish(),
        }
    }
}

/// Handle to one configuration node. Cloning the handle shares the node.
pub struct Configuration<V> {
    inner: Arc<Node<V>>,
}

struct Node<V> {
    parent: Option<Configuration<V>>,
    storage: RwLock<IndexMap<String, ConfigValue<V>>>,
    nonheritable: RwLock<IndexSet<String>>,
}

impl<V> Clone for Configuration<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone> Default for Configuration<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Configuration<V> {
    /// A root node. Its parent resolves nothing.
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_parent(parent: &Configuration<V>) -> Self {
        Self::build(Some(parent.clone()))
    }

    fn build(parent: Option<Configuration<V>>) -> Self {
        Self {
            inner: Arc::new(Node {
                parent,
                storage: RwLock::new(IndexMap::new()),
                nonheritable: RwLock::new(IndexSet::new()),
            }),
        }
    }

    pub fn parent(&self) -> Option<&Configuration<V>> {
        self.inner.parent.as_ref()
    }

    /// Resolves `key`: own value first, then the parent's unless the parent
    /// hides it. Parent nodes and lists come back wrapped in a cached child.
    pub fn get(&self, key: &str) -> Option<ConfigValue<V>> {
        if let Some(value) = self.inner.storage.read().get(key) {
            return Some(value.clone());
        }
        let parent = self.inner.parent.as_ref()?;
        if parent.is_nonheritable(key) {
            return None;
        }
        match parent.get(key)? {
            ConfigValue::Nested(node) => {
                Some(self.cache(key, ConfigValue::Nested(Configuration::with_parent(&node))))
            }
            ConfigValue::List(list) => Some(self.cache(
                key,
                ConfigValue::List(InheritableAppendList::with_parent(&list)),
            )),
            value => Some(value),
        }
    }

    /// Scalar lookup; `None` for absent keys and for nested/list entries.
    pub fn get_value(&self, key: &str) -> Option<V> {
        self.get(key).and_then(ConfigValue::into_value)
    }

    fn cache(&self, key: &str, value: ConfigValue<V>) -> ConfigValue<V> {
        self.inner
            .storage
            .write()
            .entry(key.to_string())
            .or_insert(value)
            .clone()
    }

    /// Stores a scalar. Keys resolving to a nested node or list cannot be replaced.
    pub fn set(&self, key: impl Into<String>, value: V) -> Result<(), ConfigError> {
        let key = key.into();
        match self.get(&key) {
            Some(ConfigValue::Nested(_)) => Err(ConfigError::NestedOverride { key }),
            Some(ConfigValue::List(_)) => Err(ConfigError::ArrayOverride { key }),
            _ => {
                self.inner.storage.write().insert(key, ConfigValue::Value(value));
                Ok(())
            }
        }
    }

    /// Returns the nested node under `key`, creating it when absent.
    pub fn nest(&self, key: &str) -> Result<Configuration<V>, ConfigError> {
        let existing = match self.get(key) {
            Some(value) => value,
            None => self.cache(key, ConfigValue::Nested(Configuration::new())),
        };
        match existing {
            ConfigValue::Nested(node) => Ok(node),
            _ => Err(ConfigError::KindMismatch { key: key.to_string() }),
        }
    }

    /// Returns the append list under `key`, creating it when absent.
    pub fn array(&self, key: &str) -> Result<InheritableAppendList<V>, ConfigError> {
        let existing = match self.get(key) {
            Some(value) => value,
            None => self.cache(key, ConfigValue::List(InheritableAppendList::new())),
        };
        match existing {
            ConfigValue::List(list) => Ok(list),
            _ => Err(ConfigError::KindMismatch { key: key.to_string() }),
        }
    }

    /// Hides `key` from every descendant. The key stays visible here.
    pub fn nonheritable(&self, key: impl Into<String>) {
        self.inner.nonheritable.write().insert(key.into());
    }

    /// Keys this node hides from its descendants, including marks made on ancestors.
    pub fn nonheritable_keys(&self) -> IndexSet<String> {
        let mut keys = self
            .inner
            .parent
            .as_ref()
            .map(Configuration::nonheritable_keys)
            .unwrap_or_default();
        keys.extend(self.inner.nonheritable.read().iter().cloned());
        keys
    }

    fn is_nonheritable(&self, key: &str) -> bool {
        self.inner.nonheritable.read().contains(key)
            || self.inner.parent.as_ref().is_some_and(|p| p.is_nonheritable(key))
    }

    /// Parent's heritable keys followed by keys first declared here.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: IndexSet<String> = self
            .inner
            .parent
            .as_ref()
            .map(|p| p.keys_visible_to_children().into_iter().collect())
            .unwrap_or_default();
        keys.extend(self.inner.storage.read().keys().cloned());
        keys.into_iter().collect()
    }

    pub fn keys_visible_to_children(&self) -> Vec<String> {
        let hidden = self.nonheritable_keys();
        self.keys().into_iter().filter(|k| !hidden.contains(k)).collect()
    }

    /// Resolved pairs in key order; own values override inherited ones.
    pub fn to_map(&self) -> IndexMap<String, ConfigValue<V>> {
        self.keys()
            .into_iter()
            .filter_map(|k| self.get(&k).map(|v| (k, v)))
            .collect()
    }

    pub fn pairs_visible_to_children(&self) -> IndexMap<String, ConfigValue<V>> {
        let hidden = self.nonheritable_keys();
        self.to_map()
            .into_iter()
            .filter(|(k, _)| !hidden.contains(k))
            .collect()
    }

    pub fn fetch(&self, key: &str) -> Result<ConfigValue<V>, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    pub fn fetch_or(&self, key: &str, default: V) -> ConfigValue<V> {
        self.get(key).unwrap_or(ConfigValue::Value(default))
    }

    pub fn fetch_or_else<F>(&self, key: &str, fallback: F) -> ConfigValue<V>
    where
        F: FnOnce() -> V,
    {
        self.get(key)
            .unwrap_or_else(|| ConfigValue::Value(fallback()))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        if self.inner.storage.read().contains_key(key) {
            return true;
        }
        match self.inner.parent.as_ref() {
            Some(parent) => !parent.is_nonheritable(key) && parent.contains_key(key),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }
}

impl<V: Clone + fmt::Debug> fmt::Debug for Configuration<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.to_map()).finish()
    }
}
