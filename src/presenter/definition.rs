//! Declarative presenter definitions backed by the configuration store.
//!
//! Every construct lives in its own [`Configuration`]: settings, fields,
//! associations, filters and sort orders. [`PresenterDefinition::inherit`]
//! parents each of them on another definition's stores, so a derived
//! presenter overrides or extends declarations without touching its base.

use crate::config::{ConfigValue, Configuration};
use crate::error::ConfigError;
use crate::presenter::callable::{ApiFilter, ApiOrder};
use crate::presenter::field::{
    Accessor, AssociationField, AssociationLoader, Computation, FieldDescriptor, Presented, Slot,
};
use crate::record::{Record, Related};
use crate::scope::BoxScope;
use crate::value::FieldValue;
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;

const TITLE: &str = "title";
const DESCRIPTION: &str = "description";
const NODOC: &str = "nodoc";
const BRAINSTEM_KEY: &str = "brainstem_key";
const DEFAULT_SORT_ORDER: &str = "default_sort_order";
const PRELOADS: &str = "preloads";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
    Decimal,
    Boolean,
    Date,
    Datetime,
    Hash,
    Array,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Decimal => "decimal",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Hash => "hash",
            FieldType::Array => "array",
        }
    }
}

#[derive(Clone, Default)]
pub struct FieldOptions {
    via: Option<String>,
    dynamic: Option<Computation>,
    info: Option<String>,
    optional: bool,
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read another attribute instead of the field's own name.
    pub fn via(mut self, attribute: impl Into<String>) -> Self {
        self.via = Some(attribute.into());
        self
    }

    pub fn dynamic<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Record) -> FieldValue + Send + Sync + 'static,
    {
        self.dynamic = Some(Arc::new(f));
        self
    }

    pub fn info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

#[derive(Clone, Debug)]
pub struct FieldDeclaration {
    pub name: String,
    pub field_type: FieldType,
    pub info: Option<String>,
    pub optional: bool,
    accessor: Accessor,
}

impl FieldDeclaration {
    fn new(name: &str, field_type: FieldType, options: FieldOptions) -> Self {
        let accessor = match (options.dynamic, options.via) {
            (Some(f), _) => Accessor::Computed(f),
            (None, Some(via)) => Accessor::Method(via),
            (None, None) => Accessor::method(name),
        };
        Self {
            name: name.to_string(),
            field_type,
            info: options.info,
            optional: options.optional,
            accessor,
        }
    }

    pub fn accessor(&self) -> &Accessor {
        &self.accessor
    }

    pub fn descriptor(&self) -> FieldDescriptor {
        if self.optional {
            FieldDescriptor::Optional(self.accessor.clone())
        } else {
            FieldDescriptor::Plain(self.accessor.clone())
        }
    }

    fn slot(&self, record: &dyn Record) -> Slot {
        if self.optional {
            Slot::Field(self.descriptor())
        } else {
            Slot::Value(self.accessor.call(record))
        }
    }
}

#[derive(Clone, Default)]
pub struct AssociationOptions {
    via: Option<String>,
    json_name: Option<String>,
    association_name: Option<String>,
    info: Option<String>,
    dynamic: Option<AssociationLoader>,
}

impl AssociationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn via(mut self, accessor: impl Into<String>) -> Self {
        self.via = Some(accessor.into());
        self
    }

    pub fn json_name(mut self, name: impl Into<String>) -> Self {
        self.json_name = Some(name.into());
        self
    }

    pub fn association_name(mut self, name: impl Into<String>) -> Self {
        self.association_name = Some(name.into());
        self
    }

    pub fn info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    pub fn dynamic<F>(mut self, loader: F) -> Self
    where
        F: Fn(&dyn Record) -> Option<Related> + Send + Sync + 'static,
    {
        self.dynamic = Some(Arc::new(loader));
        self
    }
}

#[derive(Clone, Debug)]
pub struct AssociationDeclaration {
    pub name: String,
    pub target_type: String,
    pub info: Option<String>,
    pub field: AssociationField,
}

#[derive(Clone, Debug, Default)]
pub struct FilterOptions {
    pub default: Option<String>,
    pub info: Option<String>,
}

impl FilterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }
}

/// Nested field block: fields declared here present as one map-valued field.
pub struct FieldGroup {
    node: Configuration<FieldDeclaration>,
}

impl FieldGroup {
    pub fn field(
        &mut self,
        name: &str,
        field_type: FieldType,
        options: FieldOptions,
    ) -> Result<&mut Self, ConfigError> {
        self.node
            .set(name, FieldDeclaration::new(name, field_type, options))?;
        Ok(self)
    }

    pub fn fields_in<F>(&mut self, name: &str, block: F) -> Result<&mut Self, ConfigError>
    where
        F: FnOnce(&mut FieldGroup) -> Result<(), ConfigError>,
    {
        let mut group = FieldGroup {
            node: self.node.nest(name)?,
        };
        block(&mut group)?;
        Ok(self)
    }
}

#[derive(Clone, Debug)]
pub struct PresenterDefinition {
    settings: Configuration<String>,
    fields: Configuration<FieldDeclaration>,
    associations: Configuration<AssociationDeclaration>,
    filters: Configuration<ApiFilter>,
    sort_orders: Configuration<ApiOrder>,
}

impl Default for PresenterDefinition {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenterDefinition {
    pub fn new() -> Self {
        Self {
            settings: Configuration::new(),
            fields: Configuration::new(),
            associations: Configuration::new(),
            filters: Configuration::new(),
            sort_orders: Configuration::new(),
        }
    }

    /// A definition whose every store defers to `parent`'s.
    pub fn inherit(parent: &PresenterDefinition) -> Self {
        Self {
            settings: Configuration::with_parent(&parent.settings),
            fields: Configuration::with_parent(&parent.fields),
            associations: Configuration::with_parent(&parent.associations),
            filters: Configuration::with_parent(&parent.filters),
            sort_orders: Configuration::with_parent(&parent.sort_orders),
        }
    }

    pub fn title(&mut self, title: impl Into<String>) -> Result<&mut Self, ConfigError> {
        self.set_nonheritable(TITLE, title.into())
    }

    pub fn description(&mut self, description: impl Into<String>) -> Result<&mut Self, ConfigError> {
        self.set_nonheritable(DESCRIPTION, description.into())
    }

    /// Hides this presenter from documentation. Not inherited.
    pub fn nodoc(&mut self) -> Result<&mut Self, ConfigError> {
        self.set_nonheritable(NODOC, "true".to_string())
    }

    fn set_nonheritable(&mut self, key: &str, value: String) -> Result<&mut Self, ConfigError> {
        self.settings.set(key, value)?;
        self.settings.nonheritable(key);
        Ok(self)
    }

    pub fn brainstem_key(&mut self, key: impl Into<String>) -> Result<&mut Self, ConfigError> {
        self.settings.set(BRAINSTEM_KEY, key.into())?;
        Ok(self)
    }

    /// "field:direction", e.g. "updated_at:desc".
    pub fn default_sort_order(&mut self, order: impl Into<String>) -> Result<&mut Self, ConfigError> {
        self.settings.set(DEFAULT_SORT_ORDER, order.into())?;
        Ok(self)
    }

    pub fn field(
        &mut self,
        name: &str,
        field_type: FieldType,
        options: FieldOptions,
    ) -> Result<&mut Self, ConfigError> {
        self.fields
            .set(name, FieldDeclaration::new(name, field_type, options))?;
        Ok(self)
    }

    /// Field emitted only when its name is requested through `fields`.
    pub fn optional_field(&mut self, name: &str, field_type: FieldType) -> Result<&mut Self, ConfigError> {
        self.field(name, field_type, FieldOptions::new().optional())
    }

    pub fn optional_field_with<F>(
        &mut self,
        name: &str,
        field_type: FieldType,
        f: F,
    ) -> Result<&mut Self, ConfigError>
    where
        F: Fn(&dyn Record) -> FieldValue + Send + Sync + 'static,
    {
        self.field(name, field_type, FieldOptions::new().optional().dynamic(f))
    }

    pub fn fields_in<F>(&mut self, name: &str, block: F) -> Result<&mut Self, ConfigError>
    where
        F: FnOnce(&mut FieldGroup) -> Result<(), ConfigError>,
    {
        let mut group = FieldGroup {
            node: self.fields.nest(name)?,
        };
        block(&mut group)?;
        Ok(self)
    }

    pub fn association(
        &mut self,
        name: &str,
        target_type: &str,
        options: AssociationOptions,
    ) -> Result<&mut Self, ConfigError> {
        let method_name = match options.dynamic {
            Some(_) => None,
            None => Some(options.via.unwrap_or_else(|| name.to_string())),
        };
        let field = AssociationField::from_parts(
            method_name,
            options.association_name,
            options.json_name,
            options.dynamic,
        );
        let declaration = AssociationDeclaration {
            name: name.to_string(),
            target_type: target_type.to_string(),
            info: options.info,
            field,
        };
        self.associations.set(name, declaration)?;
        Ok(self)
    }

    pub fn filter<F>(&mut self, name: &str, options: FilterOptions, f: F) -> Result<&mut Self, ConfigError>
    where
        F: Fn(BoxScope, &str) -> BoxScope + Send + Sync + 'static,
    {
        let filter = ApiFilter::new(f)
            .with_default(options.default)
            .with_info(options.info);
        self.filters.set(name, filter)?;
        Ok(self)
    }

    pub fn sort_order(&mut self, name: &str, rule: impl Into<ApiOrder>) -> Result<&mut Self, ConfigError> {
        self.sort_orders.set(name, rule.into())?;
        Ok(self)
    }

    /// Association loaded in the same batch as requested includes.
    pub fn preload(&mut self, association: impl Into<String>) -> Result<&mut Self, ConfigError> {
        self.settings.array(PRELOADS)?.push(association.into());
        Ok(self)
    }

    pub fn title_text(&self) -> Option<String> {
        self.settings.get_value(TITLE)
    }

    pub fn description_text(&self) -> Option<String> {
        self.settings.get_value(DESCRIPTION)
    }

    pub fn is_nodoc(&self) -> bool {
        self.settings.get_value(NODOC).is_some()
    }

    pub fn brainstem_key_name(&self) -> Option<String> {
        self.settings.get_value(BRAINSTEM_KEY)
    }

    pub fn declared_default_sort_order(&self) -> Option<String> {
        self.settings.get_value(DEFAULT_SORT_ORDER)
    }

    pub fn default_sort_field(&self) -> Option<String> {
        self.declared_default_sort_order()
            .map(|s| s.split(':').next().unwrap_or_default().to_string())
    }

    pub fn default_sort_direction(&self) -> Option<String> {
        self.declared_default_sort_order()
            .and_then(|s| s.split(':').nth(1).map(str::to_string))
    }

    pub fn preloads(&self) -> Vec<String> {
        self.settings
            .get(PRELOADS)
            .and_then(|v| v.as_list().map(|l| l.to_vec()))
            .unwrap_or_default()
    }

    pub fn settings(&self) -> &Configuration<String> {
        &self.settings
    }

    pub fn fields(&self) -> &Configuration<FieldDeclaration> {
        &self.fields
    }

    /// Top-level scalar field declarations in declaration order.
    pub fn valid_fields(&self) -> IndexMap<String, FieldDeclaration> {
        scalars(&self.fields)
    }

    pub fn valid_filters(&self) -> IndexMap<String, ApiFilter> {
        scalars(&self.filters)
    }

    pub fn valid_sort_orders(&self) -> IndexMap<String, ApiOrder> {
        scalars(&self.sort_orders)
    }

    pub fn valid_associations(&self) -> IndexMap<String, AssociationDeclaration> {
        scalars(&self.associations)
    }

    pub fn sort_order_named(&self, name: &str) -> Option<ApiOrder> {
        self.sort_orders.get_value(name)
    }

    /// Declared fields evaluated on `record`; optional fields and associations
    /// stay as descriptors for post-processing.
    pub fn present(&self, record: &dyn Record) -> Presented {
        let mut out = Presented::new();
        for (key, value) in self.fields.to_map() {
            match value {
                ConfigValue::Value(declaration) => {
                    out.insert(key, declaration.slot(record));
                }
                ConfigValue::Nested(group) => {
                    out.insert(key, Slot::Group(present_group(&group, record)));
                }
                ConfigValue::List(_) => {}
            }
        }
        for (key, declaration) in self.valid_associations() {
            out.insert(key, Slot::Field(FieldDescriptor::Association(declaration.field)));
        }
        out
    }
}

fn scalars<V: Clone>(node: &Configuration<V>) -> IndexMap<String, V> {
    node.to_map()
        .into_iter()
        .filter_map(|(k, v)| v.into_value().map(|v| (k, v)))
        .collect()
}

fn present_group(group: &Configuration<FieldDeclaration>, record: &dyn Record) -> Presented {
    let mut out = Presented::new();
    for (key, value) in group.to_map() {
        match value {
            ConfigValue::Value(declaration) => {
                out.insert(key, declaration.slot(record));
            }
            ConfigValue::Nested(inner) => {
                out.insert(key, Slot::Group(present_group(&inner, record)));
            }
            ConfigValue::List(_) => {}
        }
    }
    out
}
