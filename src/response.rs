//! The presented response: a total count plus one list per output key.

use crate::value::Struct;
use axum::{http::StatusCode, Json};
use indexmap::IndexMap;
use serde::Serialize;

/// `{ "count": n, "<primary key>": [...], "<json name>": [...] }`.
///
/// Collections keep insertion order: the primary key first, then included
/// buckets in request order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PresentedResponse {
    pub count: u64,
    #[serde(flatten)]
    pub collections: IndexMap<String, Vec<Struct>>,
}

impl PresentedResponse {
    pub fn new(count: u64) -> Self {
        Self {
            count,
            collections: IndexMap::new(),
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn insert(&mut self, key: impl Into<String>, records: Vec<Struct>) {
        self.collections.insert(key.into(), records);
    }

    pub fn get(&self, key: &str) -> Option<&[Struct]> {
        self.collections.get(key).map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        out.insert("count".to_string(), self.count.into());
        for (key, records) in &self.collections {
            let items = records
                .iter()
                .map(|record| {
                    serde_json::Value::Object(
                        record.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
                    )
                })
                .collect();
            out.insert(key.clone(), serde_json::Value::Array(items));
        }
        serde_json::Value::Object(out)
    }
}

pub fn presented_ok(response: PresentedResponse) -> (StatusCode, Json<PresentedResponse>) {
    (StatusCode::OK, Json(response))
}
