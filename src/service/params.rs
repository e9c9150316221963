//! Request parameters for presenting and their lenient parsers.
//!
//! Nothing here fails: tokens that cannot be understood are dropped.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

/// String-encoded request parameters, as received in a query string.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct PresentParams {
    /// Comma-separated ids; replaces pagination when present.
    #[serde(default)]
    pub only: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub per_page: Option<String>,
    /// "field:asc" or "field:desc".
    #[serde(default)]
    pub order: Option<String>,
    /// "name:value,name:value".
    #[serde(default)]
    pub filters: Option<String>,
    /// "name,name".
    #[serde(default)]
    pub fields: Option<String>,
    /// "assoc:f1,f2;assoc2:f3".
    #[serde(default)]
    pub include: Option<String>,
}

impl PresentParams {
    pub fn with_only(mut self, only: impl Into<String>) -> Self {
        self.only = Some(only.into());
        self
    }

    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }

    pub fn with_per_page(mut self, per_page: impl Into<String>) -> Self {
        self.per_page = Some(per_page.into());
        self
    }

    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn with_filters(mut self, filters: impl Into<String>) -> Self {
        self.filters = Some(filters.into());
        self
    }

    pub fn with_fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn with_include(mut self, include: impl Into<String>) -> Self {
        self.include = Some(include.into());
        self
    }
}

/// One requested include group: association name and the fields asked of it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncludeRequest {
    pub name: String,
    pub fields: Vec<String>,
}

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+$").expect("static pattern"))
}

/// Numeric ids in first-seen order, duplicates removed.
pub fn parse_only(only: &str) -> Vec<i64> {
    let mut ids = Vec::new();
    for token in only.split(',').map(str::trim) {
        if !id_pattern().is_match(token) {
            tracing::debug!(token, "dropping non-numeric id");
            continue;
        }
        if let Ok(id) = token.parse::<i64>() {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}

/// `name:value` pairs. A pair without a value keeps the name with `None`;
/// anything after a second colon is ignored.
pub fn parse_filters(filters: &str) -> Vec<(String, Option<String>)> {
    filters
        .split(',')
        .filter_map(|pair| {
            let mut parts = pair.split(':');
            let name = parts.next().map(str::trim).filter(|n| !n.is_empty())?;
            let value = parts.next().map(str::to_string);
            Some((name.to_string(), value))
        })
        .collect()
}

/// `(column, direction)`; both absent for an empty string.
pub fn parse_order(order: &str) -> (Option<String>, Option<String>) {
    let mut parts = order.split(':');
    let column = parts
        .next()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);
    let direction = parts.next().map(|d| d.trim().to_string());
    (column, direction)
}

pub fn parse_fields(fields: &str) -> Vec<String> {
    fields
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

/// `assoc:f1,f2;assoc2:f3`. A repeated association replaces the earlier group.
pub fn parse_includes(include: &str) -> Vec<IncludeRequest> {
    let mut out: Vec<IncludeRequest> = Vec::new();
    for group in include.split(';') {
        let mut parts = group.split(':');
        let Some(name) = parts.next().map(str::trim).filter(|n| !n.is_empty()) else {
            continue;
        };
        let fields = parts.next().map(parse_fields).unwrap_or_default();
        match out.iter_mut().find(|r| r.name == name) {
            Some(existing) => existing.fields = fields,
            None => out.push(IncludeRequest {
                name: name.to_string(),
                fields,
            }),
        }
    }
    out
}

/// Leading integer of `s`, 0 when there is none ("12abc" -> 12, "abc" -> 0).
pub fn parse_leading_int(s: &str) -> i64 {
    let s = s.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let n = digits[..end].parse::<i64>().unwrap_or(0);
    if negative {
        -n
    } else {
        n
    }
}
