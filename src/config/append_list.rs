//! Append-only list whose reads see the parent's items first.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Ordered, append-only sequence. Reading yields the parent's items followed by
/// the items appended on this list; a child never writes into its parent.
pub struct InheritableAppendList<V> {
    inner: Arc<ListNode<V>>,
}

struct ListNode<V> {
    parent: Option<InheritableAppendList<V>>,
    items: RwLock<Vec<V>>,
}

impl<V> Clone for InheritableAppendList<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone> Default for InheritableAppendList<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> InheritableAppendList<V> {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_parent(parent: &InheritableAppendList<V>) -> Self {
        Self::build(Some(parent.clone()))
    }

    fn build(parent: Option<InheritableAppendList<V>>) -> Self {
        Self {
            inner: Arc::new(ListNode {
                parent,
                items: RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn push(&self, item: V) {
        self.inner.items.write().push(item);
    }

    pub fn extend<I: IntoIterator<Item = V>>(&self, items: I) {
        self.inner.items.write().extend(items);
    }

    /// Parent items, then own items.
    pub fn to_vec(&self) -> Vec<V> {
        let mut out = self
            .inner
            .parent
            .as_ref()
            .map(InheritableAppendList::to_vec)
            .unwrap_or_default();
        out.extend(self.inner.items.read().iter().cloned());
        out
    }

    pub fn len(&self) -> usize {
        let inherited = self.inner.parent.as_ref().map_or(0, InheritableAppendList::len);
        inherited + self.inner.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, item: &V) -> bool
    where
        V: PartialEq,
    {
        self.inner.items.read().contains(item)
            || self.inner.parent.as_ref().is_some_and(|p| p.contains(item))
    }
}

impl<V: Clone + fmt::Debug> fmt::Debug for InheritableAppendList<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.to_vec()).finish()
    }
}
