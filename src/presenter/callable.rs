//! Filter and sort-order callables declared on presenters.

use crate::scope::{BoxScope, Direction};
use std::fmt;
use std::sync::Arc;

pub type FilterFn = Arc<dyn Fn(BoxScope, &str) -> BoxScope + Send + Sync>;
pub type OrderFn = Arc<dyn Fn(BoxScope, Direction) -> BoxScope + Send + Sync>;

/// `(scope, requested value) -> scope`, with an optional default value applied
/// when the request does not mention the filter.
#[derive(Clone)]
pub struct ApiFilter {
    default: Option<String>,
    info: Option<String>,
    apply: FilterFn,
}

impl ApiFilter {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(BoxScope, &str) -> BoxScope + Send + Sync + 'static,
    {
        Self {
            default: None,
            info: None,
            apply: Arc::new(f),
        }
    }

    pub fn with_default(mut self, default: Option<String>) -> Self {
        self.default = default;
        self
    }

    pub fn with_info(mut self, info: Option<String>) -> Self {
        self.info = info;
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn info(&self) -> Option<&str> {
        self.info.as_deref()
    }

    pub fn call(&self, scope: BoxScope, value: &str) -> BoxScope {
        (self.apply)(scope, value)
    }
}

impl fmt::Debug for ApiFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiFilter")
            .field("default", &self.default)
            .field("info", &self.info)
            .finish()
    }
}

/// `(scope, direction) -> scope`. Built from a column name or an arbitrary rule.
#[derive(Clone)]
pub struct ApiOrder {
    column: Option<String>,
    info: Option<String>,
    apply: OrderFn,
}

impl ApiOrder {
    /// Orders by `column` in the requested direction.
    pub fn field(column: impl Into<String>) -> Self {
        let column = column.into();
        let by = column.clone();
        Self {
            column: Some(column),
            info: None,
            apply: Arc::new(move |scope: BoxScope, direction| scope.order(&by, direction)),
        }
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(BoxScope, Direction) -> BoxScope + Send + Sync + 'static,
    {
        Self {
            column: None,
            info: None,
            apply: Arc::new(f),
        }
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn info(&self) -> Option<&str> {
        self.info.as_deref()
    }

    pub fn call(&self, scope: BoxScope, direction: Direction) -> BoxScope {
        (self.apply)(scope, direction)
    }
}

impl From<&str> for ApiOrder {
    fn from(column: &str) -> Self {
        ApiOrder::field(column)
    }
}

impl fmt::Debug for ApiOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiOrder")
            .field("column", &self.column)
            .field("info", &self.info)
            .finish()
    }
}
