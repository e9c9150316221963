//! The presenter contract and post-processing of presented records.

use crate::inflect::singularize;
use crate::presenter::definition::PresenterDefinition;
use crate::presenter::field::{FieldDescriptor, Presented, Slot};
use crate::record::{Record, RecordRef};
use crate::value::{dates_to_strings, datetimes_to_epoch, FieldValue, Struct};

/// Turns records of one or more types into structured values.
///
/// Implementors supply a [`PresenterDefinition`]; `present` defaults to the
/// declared fields and associations and may be overridden to return any mix
/// of literal values and [`FieldDescriptor`]s.
pub trait Presenter: Send + Sync {
    fn definition(&self) -> &PresenterDefinition;

    fn present(&self, record: &dyn Record) -> Presented {
        self.definition().present(record)
    }

    /// Runs once per `group_present` call, before any record is presented.
    fn custom_preload(&self, _records: &[RecordRef], _fields: &[String], _associations: &[String]) {}

    fn present_and_post_process(
        &self,
        record: &dyn Record,
        fields: &[String],
        associations: &[String],
    ) -> Struct {
        post_process(self.present(record), record, fields, associations)
    }

    /// Presents every record, preserving input order.
    fn group_present(&self, records: &[RecordRef], fields: &[String], associations: &[String]) -> Vec<Struct> {
        self.custom_preload(records, fields, associations);
        records
            .iter()
            .map(|record| self.present_and_post_process(record.as_ref(), fields, associations))
            .collect()
    }
}

/// Presenter driven entirely by its declarations.
#[derive(Clone, Debug, Default)]
pub struct DeclaredPresenter {
    definition: PresenterDefinition,
}

impl DeclaredPresenter {
    pub fn new(definition: PresenterDefinition) -> Self {
        Self { definition }
    }
}

impl Presenter for DeclaredPresenter {
    fn definition(&self) -> &PresenterDefinition {
        &self.definition
    }
}

/// Resolves descriptors and normalizes dates then timestamps.
///
/// Associations become `<key>_id` from the owning record's foreign-key column
/// unless requested; requested ones are loaded and written as
/// `<singular key>_id` or `<singular key>_ids`. Optional fields survive only
/// when named in `fields` and are computed only then.
pub fn post_process(
    presented: Presented,
    record: &dyn Record,
    fields: &[String],
    associations: &[String],
) -> Struct {
    let mut out = Struct::new();
    let mut descriptors = Vec::new();
    for (key, slot) in presented {
        match slot {
            Slot::Value(value) => {
                out.insert(key, value);
            }
            Slot::Field(descriptor) => descriptors.push((key, descriptor)),
            Slot::Group(group) => {
                out.insert(key, FieldValue::Map(resolve_group(group, record, fields)));
            }
        }
    }

    for (key, descriptor) in &descriptors {
        if let FieldDescriptor::Association(field) = descriptor {
            let requested = associations
                .iter()
                .any(|a| a == key || field.json_name.as_deref() == Some(a.as_str()));
            let foreign_key = field
                .method_name
                .as_ref()
                .map(|m| format!("{m}_id"))
                .filter(|fk| record.has_column(fk));
            match foreign_key {
                Some(fk) if !requested => {
                    let value = record.attribute(&fk).unwrap_or(FieldValue::Null);
                    out.insert(format!("{key}_id"), value);
                }
                _ if requested => {
                    let singular = singularize(key);
                    match field.call(record) {
                        Some(related) if related.is_collection() => {
                            out.insert(format!("{singular}_ids"), related.ids());
                        }
                        Some(related) => {
                            out.insert(format!("{singular}_id"), related.ids());
                        }
                        None => {
                            out.insert(format!("{singular}_id"), FieldValue::Null);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    for (key, descriptor) in descriptors {
        match descriptor {
            FieldDescriptor::Optional(accessor) => {
                if fields.iter().any(|f| *f == key) {
                    out.insert(key, accessor.call(record));
                }
            }
            FieldDescriptor::Plain(accessor) => {
                out.insert(key, accessor.call(record));
            }
            FieldDescriptor::Association(_) => {}
        }
    }

    match datetimes_to_epoch(dates_to_strings(FieldValue::Map(out))) {
        FieldValue::Map(map) => map,
        _ => Struct::new(),
    }
}

/// Nested groups carry plain and optional fields only; optional ones follow
/// the same `fields` list as the top level.
fn resolve_group(group: Presented, record: &dyn Record, fields: &[String]) -> Struct {
    let mut out = Struct::new();
    for (key, slot) in group {
        match slot {
            Slot::Value(value) => {
                out.insert(key, value);
            }
            Slot::Field(FieldDescriptor::Plain(accessor)) => {
                out.insert(key, accessor.call(record));
            }
            Slot::Field(FieldDescriptor::Optional(accessor)) => {
                if fields.iter().any(|f| *f == key) {
                    out.insert(key, accessor.call(record));
                }
            }
            Slot::Field(FieldDescriptor::Association(_)) => {}
            Slot::Group(inner) => {
                out.insert(key, FieldValue::Map(resolve_group(inner, record, fields)));
            }
        }
    }
    out
}
