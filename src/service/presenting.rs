//! The presenting pipeline: filter, select, order, discover and preload
//! includes, then present primary and included records.

use crate::config::PresentingSettings;
use crate::error::{AppError, ConfigError};
use crate::inflect::{classify, tableize};
use crate::presenter::{AssociationField, FieldDescriptor, Presenter, PresenterDefinition, Slot};
use crate::record::{dedup_records, RecordRef};
use crate::registry::PresenterRegistry;
use crate::response::PresentedResponse;
use crate::scope::{BoxScope, Direction, Scope};
use crate::service::params::{
    parse_fields, parse_filters, parse_includes, parse_leading_int, parse_only, parse_order,
    PresentParams,
};
use crate::value::Struct;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-call overrides of the collection defaults.
#[derive(Clone, Debug, Default)]
pub struct PresentingOptions {
    pub params: PresentParams,
    /// Record type to present instead of the one inferred from the name.
    pub model: Option<String>,
    /// Output key for the primary records; defaults to the tableized name.
    pub as_key: Option<String>,
    pub per_page: Option<u64>,
    pub max_per_page: Option<u64>,
}

impl PresentingOptions {
    pub fn new(params: PresentParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn as_key(mut self, key: impl Into<String>) -> Self {
        self.as_key = Some(key.into());
        self
    }

    pub fn per_page(mut self, per_page: u64) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn max_per_page(mut self, max_per_page: u64) -> Self {
        self.max_per_page = Some(max_per_page);
        self
    }

    /// Record type presented for `name`: "task_items" -> "TaskItem".
    pub fn record_type(&self, name: &str) -> String {
        classify(self.model.as_deref().unwrap_or(name))
    }
}

impl From<PresentParams> for PresentingOptions {
    fn from(params: PresentParams) -> Self {
        Self::new(params)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
}

impl Pagination {
    /// Saturates for pages far past the end.
    pub fn offset(&self) -> u64 {
        self.per_page.saturating_mul(self.page - 1)
    }
}

/// Requested page size below 1 (or absent) falls back to `default_per_page`;
/// the result is capped at `max_per_page` and never below 1. Pages below 1 are page 1.
pub fn effective_pagination(params: &PresentParams, default_per_page: u64, max_per_page: u64) -> Pagination {
    let default_per_page = default_per_page.max(1);
    let requested = params.per_page.as_deref().map(parse_leading_int).unwrap_or(0);
    let per_page = if requested < 1 {
        default_per_page
    } else {
        requested.unsigned_abs()
    };
    let per_page = per_page.min(max_per_page).max(1);
    let page = params.page.as_deref().map(parse_leading_int).unwrap_or(1);
    Pagination {
        page: if page < 1 { 1 } else { page.unsigned_abs() },
        per_page,
    }
}

/// Association a caller asked for and the presenter allows.
#[derive(Clone, Debug)]
struct AcceptedInclude {
    /// Key of the association in the presenter's output.
    key: String,
    /// Top-level output key for the included records.
    json_name: String,
    /// Name used to preload and gather.
    association: String,
    fields: Vec<String>,
    field: AssociationField,
}

/// Registry plus collection-wide defaults; entry point for presenting.
#[derive(Clone, Debug, Default)]
pub struct PresenterCollection {
    registry: PresenterRegistry,
    settings: PresentingSettings,
}

impl PresenterCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: PresentingSettings) -> Self {
        Self {
            registry: PresenterRegistry::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &PresentingSettings {
        &self.settings
    }

    pub fn registry(&self) -> &PresenterRegistry {
        &self.registry
    }

    pub fn register(&mut self, presenter: Arc<dyn Presenter>, record_types: &[&str]) -> Result<(), ConfigError> {
        self.registry.register(presenter, record_types)
    }

    pub fn presents<P>(&mut self, presenter: P, record_types: &[&str]) -> Result<(), ConfigError>
    where
        P: Presenter + 'static,
    {
        self.registry.presents(presenter, record_types)
    }

    pub fn finalize_registration(&mut self) {
        self.registry.finalize_registration();
    }

    pub fn for_type(&self, record_type: &str) -> Result<Arc<dyn Presenter>, ConfigError> {
        self.registry.lookup_or_fail(record_type)
    }

    /// Presents a single record through `only=<id>`.
    pub fn present_one<F>(
        &self,
        name: &str,
        id: i64,
        mut options: PresentingOptions,
        scope_builder: F,
    ) -> Result<PresentedResponse, AppError>
    where
        F: FnOnce(&str) -> BoxScope,
    {
        options.params.only = Some(id.to_string());
        self.presenting(name, options, scope_builder)
    }

    /// Runs the full pipeline for `name`; `scope_builder` receives the record
    /// type and returns the base scope.
    pub fn presenting<F>(
        &self,
        name: &str,
        options: PresentingOptions,
        scope_builder: F,
    ) -> Result<PresentedResponse, AppError>
    where
        F: FnOnce(&str) -> BoxScope,
    {
        let record_type = options.record_type(name);
        let presenter = self.for_type(&record_type)?;
        let definition = presenter.definition();
        let as_key = options.as_key.clone().unwrap_or_else(|| tableize(name));
        let params = &options.params;
        tracing::debug!(name, record_type = %record_type, as_key = %as_key, "presenting");

        let scope = scope_builder(&record_type);
        let scope = run_filters(scope, definition, params);

        let (scope, count) = match params.only.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(only) => handle_only(scope, only)?,
            None => self.paginate(scope, &options)?,
        };

        let scope = self.handle_ordering(scope, definition, params);

        let records = scope.to_list()?;
        let allowed = allowed_includes(presenter.as_ref(), records.first());
        let includes = filter_includes(params.include.as_deref(), &allowed);

        perform_preloading(scope.as_ref(), &records, &includes, definition)?;

        let buckets = gather_associations(&records, &includes);

        let mut response = PresentedResponse::new(count);
        let primary = if records.is_empty() {
            Vec::new()
        } else {
            let fields = params.fields.as_deref().map(parse_fields).unwrap_or_default();
            let mut associations: Vec<String> = Vec::new();
            for include in &includes {
                for name in [&include.json_name, &include.key] {
                    if !associations.contains(name) {
                        associations.push(name.clone());
                    }
                }
            }
            presenter.group_present(&records, &fields, &associations)
        };
        response.insert(as_key.clone(), primary);

        for (json_name, related) in buckets {
            let fields = includes
                .iter()
                .find(|i| i.json_name == json_name)
                .map(|i| i.fields.clone())
                .unwrap_or_default();
            let presented = self.hydrate(related, &fields)?;
            response.collections.entry(json_name).or_default().extend(presented);
        }

        Ok(response)
    }

    fn paginate(&self, scope: BoxScope, options: &PresentingOptions) -> Result<(BoxScope, u64), AppError> {
        let default_per_page = options.per_page.unwrap_or(self.settings.default_per_page);
        let max_per_page = options.max_per_page.unwrap_or(self.settings.default_max_per_page);
        let pagination = effective_pagination(&options.params, default_per_page, max_per_page);
        let count = scope.distinct_count(scope.id_column())?;
        tracing::debug!(page = pagination.page, per_page = pagination.per_page, count, "paginating");
        let scope = scope
            .limit(pagination.per_page)
            .offset(pagination.offset());
        Ok((scope, count))
    }

    fn handle_ordering(&self, scope: BoxScope, definition: &PresenterDefinition, params: &PresentParams) -> BoxScope {
        let default_order = definition
            .declared_default_sort_order()
            .unwrap_or_else(|| self.settings.default_sort_order.clone());
        let (default_column, default_direction) = parse_order(&default_order);
        let (column, direction) = params.order.as_deref().map(parse_order).unwrap_or_default();

        let requested = column
            .as_deref()
            .and_then(|c| definition.sort_order_named(c).map(|rule| (c.to_string(), rule)));
        let (name, rule, direction) = match requested {
            Some((name, rule)) => (name, Some(rule), direction),
            None => {
                let name = default_column.unwrap_or_default();
                let rule = definition.sort_order_named(&name);
                (name, rule, default_direction)
            }
        };
        match rule {
            Some(rule) => {
                let direction = Direction::parse(direction.as_deref());
                tracing::debug!(sort_order = %name, direction = direction.as_str(), "ordering");
                rule.call(scope, direction)
            }
            None => {
                tracing::debug!(sort_order = %name, "no matching sort order; leaving scope unordered");
                scope
            }
        }
    }

    /// Presents one include bucket, each record type through its own presenter.
    fn hydrate(&self, related: Vec<RecordRef>, fields: &[String]) -> Result<Vec<Struct>, AppError> {
        let mut by_type: IndexMap<String, Vec<RecordRef>> = IndexMap::new();
        for record in dedup_records(related) {
            by_type
                .entry(record.record_type().to_string())
                .or_default()
                .push(record);
        }
        let mut out = Vec::new();
        for (record_type, records) in by_type {
            let presenter = self.for_type(&record_type)?;
            out.extend(presenter.group_present(&records, fields, &[]));
        }
        Ok(out)
    }
}

fn run_filters(mut scope: BoxScope, definition: &PresenterDefinition, params: &PresentParams) -> BoxScope {
    let requested: HashMap<String, Option<String>> = params
        .filters
        .as_deref()
        .map(parse_filters)
        .unwrap_or_default()
        .into_iter()
        .collect();
    let declared = definition.valid_filters();
    for name in requested.keys().filter(|n| !declared.contains_key(*n)) {
        tracing::debug!(filter = %name, "dropping unknown filter");
    }
    for (name, filter) in declared {
        match requested.get(&name).and_then(|v| v.as_deref()) {
            Some(value) => {
                tracing::debug!(filter = %name, value, "applying requested filter");
                scope = filter.call(scope, value);
            }
            None => {
                if let Some(default) = filter.default_value() {
                    tracing::debug!(filter = %name, value = default, "applying default filter");
                    scope = filter.call(scope, default);
                }
            }
        }
    }
    scope
}

fn handle_only(scope: BoxScope, only: &str) -> Result<(BoxScope, u64), AppError> {
    let ids = parse_only(only);
    tracing::debug!(?ids, "selecting explicit ids");
    let scope = scope.where_ids_in(&ids);
    let count = scope.count()?;
    Ok((scope, count))
}

/// Association fields the first record's presentation exposes, keyed by json name.
fn allowed_includes(presenter: &dyn Presenter, first: Option<&RecordRef>) -> IndexMap<String, (String, AssociationField)> {
    let mut allowed = IndexMap::new();
    let Some(record) = first else {
        return allowed;
    };
    for (key, slot) in presenter.present(record.as_ref()) {
        if let Slot::Field(FieldDescriptor::Association(field)) = slot {
            let json_name = field
                .json_name
                .clone()
                .or_else(|| {
                    field
                        .method_name
                        .as_deref()
                        .and_then(|m| record.reflection(m))
                        .map(|r| r.table_name)
                })
                .unwrap_or_else(|| key.clone());
            allowed.insert(json_name, (key, field));
        }
    }
    allowed
}

fn filter_includes(
    include: Option<&str>,
    allowed: &IndexMap<String, (String, AssociationField)>,
) -> Vec<AcceptedInclude> {
    let requested = include.map(parse_includes).unwrap_or_default();
    let mut accepted = Vec::new();
    for request in requested {
        let Some((key, field)) = allowed.get(&request.name) else {
            tracing::debug!(include = %request.name, "dropping unknown include");
            continue;
        };
        let association = field.preload_name().unwrap_or(key.as_str()).to_string();
        tracing::debug!(include = %request.name, association = %association, fields = ?request.fields, "accepting include");
        accepted.push(AcceptedInclude {
            key: key.clone(),
            json_name: request.name,
            association,
            fields: request.fields,
            field: field.clone(),
        });
    }
    accepted
}

/// One bulk preload for the requested includes and the presenter's declared
/// preloads, limited to associations the record type actually has.
fn perform_preloading(
    scope: &dyn Scope,
    records: &[RecordRef],
    includes: &[AcceptedInclude],
    definition: &PresenterDefinition,
) -> Result<(), AppError> {
    let Some(first) = records.first() else {
        return Ok(());
    };
    let mut names: Vec<String> = Vec::new();
    let candidates = includes
        .iter()
        .map(|i| i.association.clone())
        .chain(definition.preloads());
    for name in candidates {
        if first.reflection(&name).is_some() && !names.contains(&name) {
            names.push(name);
        }
    }
    if names.is_empty() {
        return Ok(());
    }
    tracing::info!(associations = ?names, records = records.len(), "starting eager load");
    scope.preload(records, &names)?;
    tracing::info!(associations = %names.join(", "), "ended eager load");
    Ok(())
}

/// Related records per include json name. Every accepted include gets a
/// bucket, even when nothing is related.
fn gather_associations(records: &[RecordRef], includes: &[AcceptedInclude]) -> IndexMap<String, Vec<RecordRef>> {
    let mut buckets: IndexMap<String, Vec<RecordRef>> = includes
        .iter()
        .map(|i| (i.json_name.clone(), Vec::new()))
        .collect();
    for record in records {
        for include in includes {
            let Some(related) = include.field.load(record.as_ref(), &include.association) else {
                continue;
            };
            let found = related.records();
            if found.is_empty() {
                continue;
            }
            if let Some(bucket) = buckets.get_mut(&include.json_name) {
                bucket.extend(found);
            }
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<&str>, per_page: Option<&str>) -> PresentParams {
        PresentParams {
            page: page.map(str::to_string),
            per_page: per_page.map(str::to_string),
            ..PresentParams::default()
        }
    }

    #[test]
    fn per_page_is_capped_at_max() {
        let p = effective_pagination(&params(None, Some("500")), 20, 200);
        assert_eq!(p.per_page, 200);
    }

    #[test]
    fn per_page_below_one_or_absent_uses_default() {
        for raw in [None, Some("0"), Some("-5"), Some("abc")] {
            assert_eq!(effective_pagination(&params(None, raw), 20, 200).per_page, 20);
        }
    }

    #[test]
    fn page_below_one_is_first_page() {
        for raw in [None, Some("0"), Some("-2"), Some("x")] {
            let p = effective_pagination(&params(raw, Some("10")), 20, 200);
            assert_eq!(p.page, 1);
            assert_eq!(p.offset(), 0);
        }
        let p = effective_pagination(&params(Some("3"), Some("10")), 20, 200);
        assert_eq!(p.offset(), 20);
    }

    #[test]
    fn huge_pages_saturate_instead_of_overflowing() {
        let p = effective_pagination(&params(Some("9223372036854775807"), Some("50")), 20, 200);
        assert_eq!(p.page, 9_223_372_036_854_775_807);
        assert_eq!(p.offset(), u64::MAX);
    }

    #[test]
    fn default_above_max_is_capped() {
        let p = effective_pagination(&params(None, None), 50, 10);
        assert_eq!(p.per_page, 10);
    }

    #[test]
    fn options_infer_record_type() {
        assert_eq!(PresentingOptions::default().record_type("workspaces"), "Workspace");
        assert_eq!(
            PresentingOptions::default().model("TaskItem").record_type("tasks"),
            "TaskItem"
        );
    }
}
