//! In-memory record store: records, belongs-to / has-many relations, chainable
//! scopes and batch preloading. Backs the demo server and the tests.

use crate::error::ScopeError;
use crate::inflect::tableize;
use crate::record::{Record, RecordRef, Reflection, Related};
use crate::scope::{BoxScope, Condition, Direction, Scope, ScopeSource};
use crate::value::FieldValue;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationKind {
    /// Owner holds `foreign_key` pointing at the target's id.
    BelongsTo,
    /// Targets hold `foreign_key` pointing at the owner's id.
    HasMany,
}

#[derive(Clone, Debug)]
struct Relation {
    kind: RelationKind,
    target_type: String,
    foreign_key: String,
}

type PreloadKey = (String, i64, String);

#[derive(Default)]
struct Inner {
    tables: RwLock<IndexMap<String, Vec<Arc<MemoryRecord>>>>,
    relations: RwLock<HashMap<String, IndexMap<String, Relation>>>,
    preloaded: RwLock<HashMap<PreloadKey, Related>>,
    preload_calls: AtomicU64,
    lazy_loads: AtomicU64,
}

impl Inner {
    fn relation(&self, record_type: &str, name: &str) -> Option<Relation> {
        self.relations.read().get(record_type)?.get(name).cloned()
    }

    fn find(&self, record_type: &str, id: i64) -> Option<Arc<MemoryRecord>> {
        self.tables
            .read()
            .get(record_type)?
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    fn resolve(&self, record: &dyn Record, relation: &Relation) -> Option<Related> {
        match relation.kind {
            RelationKind::BelongsTo => {
                let target_id = record.attribute(&relation.foreign_key)?.as_i64()?;
                let target = self.find(&relation.target_type, target_id)?;
                Some(Related::One(target))
            }
            RelationKind::HasMany => {
                let tables = self.tables.read();
                let related = tables
                    .get(&relation.target_type)
                    .map(|rows| {
                        rows.iter()
                            .filter(|r| r.attributes.get(&relation.foreign_key) == Some(&FieldValue::Int(record.id())))
                            .map(|r| Arc::clone(r) as RecordRef)
                            .collect()
                    })
                    .unwrap_or_default();
                Some(Related::Many(related))
            }
        }
    }
}

/// Shared handle to an in-memory dataset.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record; `id` is also readable as the `id` attribute.
    pub fn insert<I, K>(&self, record_type: &str, id: i64, attributes: I) -> RecordRef
    where
        I: IntoIterator<Item = (K, FieldValue)>,
        K: Into<String>,
    {
        let mut attrs: BTreeMap<String, FieldValue> =
            attributes.into_iter().map(|(k, v)| (k.into(), v)).collect();
        attrs.insert("id".to_string(), FieldValue::Int(id));
        let record = Arc::new(MemoryRecord {
            record_type: record_type.to_string(),
            id,
            attributes: attrs,
            store: Arc::downgrade(&self.inner),
        });
        self.inner
            .tables
            .write()
            .entry(record_type.to_string())
            .or_default()
            .push(Arc::clone(&record));
        record
    }

    pub fn belongs_to(&self, owner_type: &str, name: &str, target_type: &str, foreign_key: &str) -> &Self {
        self.relate(owner_type, name, RelationKind::BelongsTo, target_type, foreign_key)
    }

    pub fn has_many(&self, owner_type: &str, name: &str, target_type: &str, foreign_key: &str) -> &Self {
        self.relate(owner_type, name, RelationKind::HasMany, target_type, foreign_key)
    }

    fn relate(&self, owner_type: &str, name: &str, kind: RelationKind, target_type: &str, foreign_key: &str) -> &Self {
        self.inner
            .relations
            .write()
            .entry(owner_type.to_string())
            .or_default()
            .insert(
                name.to_string(),
                Relation {
                    kind,
                    target_type: target_type.to_string(),
                    foreign_key: foreign_key.to_string(),
                },
            );
        self
    }

    pub fn scope(&self, record_type: &str) -> MemoryScope {
        MemoryScope {
            store: self.clone(),
            record_type: record_type.to_string(),
            conditions: Vec::new(),
            ids: None,
            orders: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn find(&self, record_type: &str, id: i64) -> Option<RecordRef> {
        self.inner.find(record_type, id).map(|r| r as RecordRef)
    }

    /// Number of batch preloads issued through any scope.
    pub fn preload_calls(&self) -> u64 {
        self.inner.preload_calls.load(Ordering::SeqCst)
    }

    /// Number of association reads that missed the preload cache.
    pub fn lazy_loads(&self) -> u64 {
        self.inner.lazy_loads.load(Ordering::SeqCst)
    }

    pub fn reset_counters(&self) {
        self.inner.preload_calls.store(0, Ordering::SeqCst);
        self.inner.lazy_loads.store(0, Ordering::SeqCst);
        self.inner.preloaded.write().clear();
    }

    fn rows(&self, record_type: &str) -> Vec<Arc<MemoryRecord>> {
        self.inner
            .tables
            .read()
            .get(record_type)
            .cloned()
            .unwrap_or_default()
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables = self.inner.tables.read();
        f.debug_struct("MemoryStore")
            .field("tables", &tables.iter().map(|(k, v)| (k.clone(), v.len())).collect::<Vec<_>>())
            .finish()
    }
}

impl ScopeSource for MemoryStore {
    fn scope_for(&self, record_type: &str) -> Option<BoxScope> {
        if self.inner.tables.read().contains_key(record_type) {
            Some(Box::new(self.scope(record_type)))
        } else {
            None
        }
    }
}

pub struct MemoryRecord {
    record_type: String,
    id: i64,
    attributes: BTreeMap<String, FieldValue>,
    store: Weak<Inner>,
}

impl fmt::Debug for MemoryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRecord")
            .field("record_type", &self.record_type)
            .field("id", &self.id)
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl Record for MemoryRecord {
    fn record_type(&self) -> &str {
        &self.record_type
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn attribute(&self, name: &str) -> Option<FieldValue> {
        self.attributes.get(name).cloned()
    }

    fn has_column(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    fn reflection(&self, association: &str) -> Option<Reflection> {
        let store = self.store.upgrade()?;
        let relation = store.relation(&self.record_type, association)?;
        Some(Reflection {
            name: association.to_string(),
            table_name: tableize(&relation.target_type),
            target_type: relation.target_type,
            collection: relation.kind == RelationKind::HasMany,
        })
    }

    fn association(&self, name: &str) -> Option<Related> {
        let store = self.store.upgrade()?;
        let key = (self.record_type.clone(), self.id, name.to_string());
        if let Some(related) = store.preloaded.read().get(&key) {
            return Some(related.clone());
        }
        let relation = store.relation(&self.record_type, name)?;
        store.lazy_loads.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(record_type = %self.record_type, id = self.id, association = name, "lazy association load");
        store.resolve(self, &relation)
    }
}

/// Chainable query over one record type. Filters, ordering and limits are
/// evaluated together in `to_list`, like a single SQL statement.
#[derive(Clone, Debug)]
pub struct MemoryScope {
    store: MemoryStore,
    record_type: String,
    conditions: Vec<Condition>,
    ids: Option<Vec<i64>>,
    orders: Vec<(String, Direction)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl MemoryScope {
    fn with(&self, f: impl FnOnce(&mut MemoryScope)) -> BoxScope {
        let mut next = self.clone();
        f(&mut next);
        Box::new(next)
    }

    fn filtered(&self) -> Vec<Arc<MemoryRecord>> {
        let mut rows: Vec<Arc<MemoryRecord>> = self
            .store
            .rows(&self.record_type)
            .into_iter()
            .filter(|r| self.ids.as_ref().map_or(true, |ids| ids.contains(&r.id)))
            .filter(|r| {
                self.conditions
                    .iter()
                    .all(|c| c.matches(r.attributes.get(&c.column)))
            })
            .collect();
        if !self.orders.is_empty() {
            rows.sort_by(|a, b| {
                for (column, direction) in &self.orders {
                    let left = a.attributes.get(column).unwrap_or(&FieldValue::Null);
                    let right = b.attributes.get(column).unwrap_or(&FieldValue::Null);
                    let ordering = match direction {
                        Direction::Asc => left.compare(right),
                        Direction::Desc => right.compare(left),
                    };
                    if ordering != std::cmp::Ordering::Equal {
                        return ordering;
                    }
                }
                std::cmp::Ordering::Equal
            });
        }
        rows
    }

    fn bounded(&self) -> Vec<Arc<MemoryRecord>> {
        let offset = usize::try_from(self.offset.unwrap_or(0)).unwrap_or(usize::MAX);
        let rows = self.filtered().into_iter().skip(offset);
        match self.limit {
            Some(limit) => rows.take(usize::try_from(limit).unwrap_or(usize::MAX)).collect(),
            None => rows.collect(),
        }
    }
}

impl Scope for MemoryScope {
    fn record_type(&self) -> &str {
        &self.record_type
    }

    fn limit(&self, n: u64) -> BoxScope {
        self.with(|s| s.limit = Some(n))
    }

    fn offset(&self, n: u64) -> BoxScope {
        self.with(|s| s.offset = Some(n))
    }

    fn where_ids_in(&self, ids: &[i64]) -> BoxScope {
        self.with(|s| {
            let narrowed = match &s.ids {
                Some(existing) => existing.iter().copied().filter(|id| ids.contains(id)).collect(),
                None => ids.to_vec(),
            };
            s.ids = Some(narrowed);
        })
    }

    fn where_condition(&self, condition: Condition) -> BoxScope {
        self.with(|s| s.conditions.push(condition))
    }

    fn order(&self, column: &str, direction: Direction) -> BoxScope {
        let column = column.to_string();
        self.with(|s| s.orders.push((column, direction)))
    }

    fn count(&self) -> Result<u64, ScopeError> {
        Ok(self.bounded().len() as u64)
    }

    fn distinct_count(&self, id_column: &str) -> Result<u64, ScopeError> {
        let distinct: HashSet<String> = self
            .bounded()
            .iter()
            .map(|r| {
                r.attributes
                    .get(id_column)
                    .map(|v| v.to_json().to_string())
                    .unwrap_or_default()
            })
            .collect();
        Ok(distinct.len() as u64)
    }

    fn to_list(&self) -> Result<Vec<RecordRef>, ScopeError> {
        Ok(self.bounded().into_iter().map(|r| r as RecordRef).collect())
    }

    fn preload(&self, records: &[RecordRef], associations: &[String]) -> Result<(), ScopeError> {
        let inner = &self.store.inner;
        inner.preload_calls.fetch_add(1, Ordering::SeqCst);
        for name in associations {
            let mut by_type: IndexMap<String, Vec<&RecordRef>> = IndexMap::new();
            for record in records {
                by_type.entry(record.record_type().to_string()).or_default().push(record);
            }
            for (record_type, owners) in by_type {
                let Some(relation) = inner.relation(&record_type, name) else {
                    return Err(ScopeError(format!("{record_type} has no association '{name}'")));
                };
                let loaded = batch_load(inner, &relation, &owners);
                let mut cache = inner.preloaded.write();
                for (owner, related) in owners.iter().zip(loaded) {
                    cache.insert((record_type.clone(), owner.id(), name.clone()), related);
                }
            }
        }
        Ok(())
    }
}

/// Resolves one relation for many owners with a single pass over the target table.
fn batch_load(inner: &Inner, relation: &Relation, owners: &[&RecordRef]) -> Vec<Related> {
    let tables = inner.tables.read();
    let targets: &[Arc<MemoryRecord>] = tables
        .get(&relation.target_type)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    match relation.kind {
        RelationKind::BelongsTo => {
            let by_id: HashMap<i64, &Arc<MemoryRecord>> = targets.iter().map(|t| (t.id, t)).collect();
            owners
                .iter()
                .map(|owner| {
                    let target = owner
                        .attribute(&relation.foreign_key)
                        .and_then(|v| v.as_i64())
                        .and_then(|id| by_id.get(&id));
                    match target {
                        Some(t) => Related::One(Arc::clone(*t) as RecordRef),
                        None => Related::Value(FieldValue::Null),
                    }
                })
                .collect()
        }
        RelationKind::HasMany => {
            let mut by_owner: HashMap<i64, Vec<RecordRef>> = HashMap::new();
            for target in targets {
                if let Some(owner_id) = target.attributes.get(&relation.foreign_key).and_then(FieldValue::as_i64) {
                    by_owner
                        .entry(owner_id)
                        .or_default()
                        .push(Arc::clone(target) as RecordRef);
                }
            }
            owners
                .iter()
                .map(|owner| Related::Many(by_owner.get(&owner.id()).cloned().unwrap_or_default()))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert("User", 1, [("name", FieldValue::from("ann"))]);
        store.insert("Post", 10, [("title", FieldValue::from("b")), ("user_id", FieldValue::from(1))]);
        store.insert("Post", 11, [("title", FieldValue::from("a")), ("user_id", FieldValue::from(1))]);
        store.insert("Post", 12, [("title", FieldValue::from("c")), ("user_id", FieldValue::Null)]);
        store.belongs_to("Post", "user", "User", "user_id");
        store.has_many("User", "posts", "Post", "user_id");
        store
    }

    #[test]
    fn scope_orders_before_limiting() {
        let store = store();
        let scope = store.scope("Post").limit(2).order("title", Direction::Asc);
        let ids: Vec<i64> = scope.to_list().unwrap().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![11, 10]);
        assert_eq!(store.scope("Post").distinct_count("id").unwrap(), 3);
    }

    #[test]
    fn preload_fills_cache_in_one_call() {
        let store = store();
        let posts = store.scope("Post").to_list().unwrap();
        store
            .scope("Post")
            .preload(&posts, &["user".to_string()])
            .unwrap();
        for post in &posts {
            post.association("user");
        }
        assert_eq!(store.preload_calls(), 1);
        assert_eq!(store.lazy_loads(), 0);
    }

    #[test]
    fn lazy_loads_are_counted() {
        let store = store();
        let user = store.find("User", 1).unwrap();
        let Some(Related::Many(posts)) = user.association("posts") else {
            panic!("expected posts");
        };
        assert_eq!(posts.len(), 2);
        assert_eq!(store.lazy_loads(), 1);
        assert_eq!(user.reflection("posts").unwrap().table_name, "posts");
    }
}
