//! Field descriptors: the unresolved entries a presenter may return from `present`.

use crate::record::{Record, Related};
use crate::value::FieldValue;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub type Computation = Arc<dyn Fn(&dyn Record) -> FieldValue + Send + Sync>;
pub type AssociationLoader = Arc<dyn Fn(&dyn Record) -> Option<Related> + Send + Sync>;

/// How a field reads its value: a named attribute or a computation.
#[derive(Clone)]
pub enum Accessor {
    Method(String),
    Computed(Computation),
}

impl Accessor {
    pub fn method(name: impl Into<String>) -> Self {
        Accessor::Method(name.into())
    }

    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&dyn Record) -> FieldValue + Send + Sync + 'static,
    {
        Accessor::Computed(Arc::new(f))
    }

    /// Computation that ignores the record (values captured when presenting).
    pub fn constant<F>(f: F) -> Self
    where
        F: Fn() -> FieldValue + Send + Sync + 'static,
    {
        Accessor::Computed(Arc::new(move |_| f()))
    }

    pub fn method_name(&self) -> Option<&str> {
        match self {
            Accessor::Method(name) => Some(name),
            Accessor::Computed(_) => None,
        }
    }

    pub fn call(&self, record: &dyn Record) -> FieldValue {
        match self {
            Accessor::Method(name) => record.attribute(name).unwrap_or(FieldValue::Null),
            Accessor::Computed(f) => f(record),
        }
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Method(name) => f.debug_tuple("Method").field(name).finish(),
            Accessor::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Reference to related records. `method_name` is the accessor on the owning
/// record; `association_name` overrides the name used to preload and gather;
/// `json_name` overrides the top-level key included records are listed under.
#[derive(Clone)]
pub struct AssociationField {
    pub method_name: Option<String>,
    pub association_name: Option<String>,
    pub json_name: Option<String>,
    loader: Option<AssociationLoader>,
}

impl AssociationField {
    pub fn new(method_name: impl Into<String>) -> Self {
        Self {
            method_name: Some(method_name.into()),
            association_name: None,
            json_name: None,
            loader: None,
        }
    }

    pub fn dynamic<F>(loader: F) -> Self
    where
        F: Fn(&dyn Record) -> Option<Related> + Send + Sync + 'static,
    {
        Self {
            method_name: None,
            association_name: None,
            json_name: None,
            loader: Some(Arc::new(loader)),
        }
    }

    pub(crate) fn from_parts(
        method_name: Option<String>,
        association_name: Option<String>,
        json_name: Option<String>,
        loader: Option<AssociationLoader>,
    ) -> Self {
        Self {
            method_name,
            association_name,
            json_name,
            loader,
        }
    }

    pub fn json_name(mut self, name: impl Into<String>) -> Self {
        self.json_name = Some(name.into());
        self
    }

    pub fn association_name(mut self, name: impl Into<String>) -> Self {
        self.association_name = Some(name.into());
        self
    }

    /// Name used for preloading and gathering: declared association name, else accessor.
    pub fn preload_name(&self) -> Option<&str> {
        self.association_name.as_deref().or(self.method_name.as_deref())
    }

    pub fn call(&self, record: &dyn Record) -> Option<Related> {
        match (&self.loader, &self.method_name) {
            (Some(loader), _) => loader(record),
            (None, Some(method)) => record.association(method),
            (None, None) => None,
        }
    }

    /// Like [`call`](Self::call) but reads through `association` when no loader is set.
    pub fn load(&self, record: &dyn Record, association: &str) -> Option<Related> {
        match &self.loader {
            Some(loader) => loader(record),
            None => record.association(association),
        }
    }
}

impl fmt::Debug for AssociationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssociationField")
            .field("method_name", &self.method_name)
            .field("association_name", &self.association_name)
            .field("json_name", &self.json_name)
            .field("dynamic", &self.loader.is_some())
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Plain,
    Optional,
    Association,
}

#[derive(Clone, Debug)]
pub enum FieldDescriptor {
    /// Always included.
    Plain(Accessor),
    /// Included only when requested through `fields`.
    Optional(Accessor),
    Association(AssociationField),
}

impl FieldDescriptor {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldDescriptor::Plain(_) => FieldKind::Plain,
            FieldDescriptor::Optional(_) => FieldKind::Optional,
            FieldDescriptor::Association(_) => FieldKind::Association,
        }
    }

    pub fn plain(method: impl Into<String>) -> Self {
        FieldDescriptor::Plain(Accessor::method(method))
    }

    pub fn optional(method: impl Into<String>) -> Self {
        FieldDescriptor::Optional(Accessor::method(method))
    }

    pub fn optional_with<F>(f: F) -> Self
    where
        F: Fn() -> FieldValue + Send + Sync + 'static,
    {
        FieldDescriptor::Optional(Accessor::constant(f))
    }

    pub fn association(method: impl Into<String>) -> Self {
        FieldDescriptor::Association(AssociationField::new(method))
    }
}

/// One entry of a presenter's raw output.
#[derive(Clone, Debug)]
pub enum Slot {
    Value(FieldValue),
    Field(FieldDescriptor),
    /// Nested field group, resolved into a map during post-processing.
    Group(Presented),
}

impl From<FieldValue> for Slot {
    fn from(v: FieldValue) -> Self {
        Slot::Value(v)
    }
}

impl From<FieldDescriptor> for Slot {
    fn from(d: FieldDescriptor) -> Self {
        Slot::Field(d)
    }
}

/// Raw presenter output before post-processing.
pub type Presented = BTreeMap<String, Slot>;
