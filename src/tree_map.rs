//! Ordered maps over [`RbTree`]: `TreeMap` (unique keys) and
//! `TreeMultiMap` (equal keys allowed, kept in insertion order).

use crate::compare::{Compare, Natural};
use crate::error::{Error, InvariantViolation, Result};
use crate::rb_tree::{Cursor, InsertReturn, IntoIter, Iter, IterMut, NodeHandle, NodeId, RbTree};
use core::borrow::Borrow;
use core::fmt;
use core::ops::Index;

/// Sorted map with unique keys.
pub struct TreeMap<K, V, C = Natural> {
    tree: RbTree<K, V, C, true>,
}

impl<K, V> TreeMap<K, V> {
    pub fn new() -> Self {
        Self { tree: RbTree::new() }
    }
}

impl<K, V, C> TreeMap<K, V, C> {
    pub fn with_comparator(cmp: C) -> Self {
        Self {
            tree: RbTree::with_comparator(cmp),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// The underlying tree, for node-level navigation.
    pub fn tree(&self) -> &RbTree<K, V, C, true> {
        &self.tree
    }

    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first().and_then(|id| self.tree.get(id))
    }

    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last().and_then(|id| self.tree.get(id))
    }

    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.tree.pop_first()
    }

    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.tree.pop_last()
    }

    pub fn node(&self, id: NodeId) -> Option<(&K, &V)> {
        self.tree.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<(&K, &mut V)> {
        self.tree.get_mut(id)
    }

    pub fn remove_at(&mut self, id: NodeId) -> Option<(K, V)> {
        self.tree.remove(id)
    }

    pub fn extract_at(&mut self, id: NodeId) -> Option<NodeHandle<K, V>> {
        self.tree.extract(id)
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    pub fn swap(&mut self, other: &mut Self) {
        self.tree.swap(&mut other.tree);
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        self.tree.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.tree.iter_mut()
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.tree.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.tree.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut V> + '_ {
        self.tree.iter_mut().map(|(_, v)| v)
    }

    pub fn cursor_front(&self) -> Cursor<'_, K, V> {
        self.tree.cursor_front()
    }

    pub fn cursor_end(&self) -> Cursor<'_, K, V> {
        self.tree.cursor_end()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.tree.find(q).and_then(|id| self.tree.get(id)).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.tree.find(q).and_then(|id| self.tree.get(id))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let id = self.tree.find(q)?;
        self.tree.get_mut(id).map(|(_, v)| v)
    }

    pub fn at<Q>(&self, q: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.get(q).ok_or(Error::KeyNotFound)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.tree.contains(q)
    }

    pub fn count<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.tree.count(q)
    }

    pub fn find<Q>(&self, q: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.tree.find(q)
    }

    pub fn lower_bound<Q>(&self, q: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.tree.lower_bound(q)
    }

    pub fn upper_bound<Q>(&self, q: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.tree.upper_bound(q)
    }

    /// Entries equal to `q`: zero or one.
    pub fn range_of<Q>(&self, q: &Q) -> Iter<'_, K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.tree.equal_range(q)
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let id = self.tree.find(q)?;
        self.tree.remove(id)
    }

    pub fn extract<Q>(&mut self, q: &Q) -> Option<NodeHandle<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.tree.extract_key(q)
    }
}

impl<K, V, C: Compare<K>> TreeMap<K, V, C> {
    /// Inserts or overwrites; returns the previous value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.tree.insert_or_assign(key, value).1
    }

    /// Inserts only if the key is absent. Returns whether it was inserted.
    pub fn emplace(&mut self, key: K, value: V) -> bool {
        self.tree.insert(key, value).1
    }

    /// Looks up `key`, inserting `make()` if absent.
    pub fn try_emplace<F>(&mut self, key: K, make: F) -> (&mut V, bool)
    where
        F: FnOnce() -> V,
    {
        let (id, inserted) = self.tree.try_insert_with(key, make);
        (self.tree.value_mut(id), inserted)
    }

    pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        self.try_emplace(key, make).0
    }

    pub fn insert_with_hint(&mut self, hint: Option<NodeId>, key: K, value: V) -> (NodeId, bool) {
        self.tree.insert_with_hint(hint, key, value)
    }

    pub fn insert_node(&mut self, node: NodeHandle<K, V>) -> InsertReturn<K, V> {
        self.tree.insert_node(node)
    }

    /// Moves entries of `other` whose keys are absent here.
    pub fn merge<C2>(&mut self, other: &mut TreeMap<K, V, C2>) {
        self.tree.merge(&mut other.tree);
    }

    /// Moves entries of `other` whose keys are absent here; of several
    /// equal keys only the first moves.
    pub fn merge_multi<C2>(&mut self, other: &mut TreeMultiMap<K, V, C2>) {
        self.tree.merge(&mut other.tree);
    }

    /// Returns the black height.
    pub fn check_invariants(&self) -> core::result::Result<usize, InvariantViolation> {
        self.tree.check_invariants()
    }
}

impl<K, V, C: Default> Default for TreeMap<K, V, C> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K: Clone, V: Clone, C: Clone> Clone for TreeMap<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for TreeMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.tree, f)
    }
}

impl<K: PartialEq, V: PartialEq, C> PartialEq for TreeMap<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.tree == other.tree
    }
}

impl<K: Eq, V: Eq, C> Eq for TreeMap<K, V, C> {}

impl<K, Q, V, C> Index<&Q> for TreeMap<K, V, C>
where
    K: Borrow<Q>,
    Q: ?Sized,
    C: Compare<Q>,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(v) => v,
            None => panic!("{}", Error::KeyNotFound),
        }
    }
}

/// Later values overwrite earlier ones.
impl<K, V, C: Compare<K>> Extend<(K, V)> for TreeMap<K, V, C> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, C: Compare<K> + Default> FromIterator<(K, V)> for TreeMap<K, V, C> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, C> IntoIterator for TreeMap<K, V, C> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        self.tree.into_iter()
    }
}

impl<'a, K, V, C> IntoIterator for &'a TreeMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

/// Sorted map that keeps every inserted entry, equal keys included.
pub struct TreeMultiMap<K, V, C = Natural> {
    tree: RbTree<K, V, C, false>,
}

impl<K, V> TreeMultiMap<K, V> {
    pub fn new() -> Self {
        Self { tree: RbTree::new() }
    }
}

impl<K, V, C> TreeMultiMap<K, V, C> {
    pub fn with_comparator(cmp: C) -> Self {
        Self {
            tree: RbTree::with_comparator(cmp),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn tree(&self) -> &RbTree<K, V, C, false> {
        &self.tree
    }

    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first().and_then(|id| self.tree.get(id))
    }

    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last().and_then(|id| self.tree.get(id))
    }

    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.tree.pop_first()
    }

    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.tree.pop_last()
    }

    pub fn node(&self, id: NodeId) -> Option<(&K, &V)> {
        self.tree.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<(&K, &mut V)> {
        self.tree.get_mut(id)
    }

    pub fn remove_at(&mut self, id: NodeId) -> Option<(K, V)> {
        self.tree.remove(id)
    }

    pub fn extract_at(&mut self, id: NodeId) -> Option<NodeHandle<K, V>> {
        self.tree.extract(id)
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    pub fn swap(&mut self, other: &mut Self) {
        self.tree.swap(&mut other.tree);
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        self.tree.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.tree.iter_mut()
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.tree.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.tree.iter().map(|(_, v)| v)
    }

    pub fn cursor_front(&self) -> Cursor<'_, K, V> {
        self.tree.cursor_front()
    }

    pub fn cursor_end(&self) -> Cursor<'_, K, V> {
        self.tree.cursor_end()
    }

    /// Value of the first entry with key `q`.
    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.tree.find(q).and_then(|id| self.tree.get(id)).map(|(_, v)| v)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        let id = self.tree.find(q)?;
        self.tree.get_mut(id).map(|(_, v)| v)
    }

    /// All entries with key `q`, in insertion order.
    pub fn range_of<Q>(&self, q: &Q) -> Iter<'_, K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.tree.equal_range(q)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.tree.contains(q)
    }

    pub fn count<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.tree.count(q)
    }

    pub fn find<Q>(&self, q: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.tree.find(q)
    }

    pub fn lower_bound<Q>(&self, q: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.tree.lower_bound(q)
    }

    pub fn upper_bound<Q>(&self, q: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.tree.upper_bound(q)
    }

    /// Removes every entry with key `q`; returns how many.
    pub fn remove<Q>(&mut self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.tree.remove_key(q)
    }

    /// Detaches the first entry with key `q`.
    pub fn extract<Q>(&mut self, q: &Q) -> Option<NodeHandle<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Compare<Q>,
    {
        self.tree.extract_key(q)
    }
}

impl<K, V, C: Compare<K>> TreeMultiMap<K, V, C> {
    /// Always inserts; the new entry goes after existing equal keys.
    pub fn insert(&mut self, key: K, value: V) -> NodeId {
        self.tree.insert(key, value).0
    }

    pub fn insert_with_hint(&mut self, hint: Option<NodeId>, key: K, value: V) -> NodeId {
        self.tree.insert_with_hint(hint, key, value).0
    }

    pub fn insert_node(&mut self, node: NodeHandle<K, V>) -> NodeId {
        self.tree.insert_node(node).position
    }

    pub fn merge<C2>(&mut self, other: &mut TreeMultiMap<K, V, C2>) {
        self.tree.merge(&mut other.tree);
    }

    pub fn merge_unique<C2>(&mut self, other: &mut TreeMap<K, V, C2>) {
        self.tree.merge(&mut other.tree);
    }

    pub fn check_invariants(&self) -> core::result::Result<usize, InvariantViolation> {
        self.tree.check_invariants()
    }
}

impl<K, V, C: Default> Default for TreeMultiMap<K, V, C> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K: Clone, V: Clone, C: Clone> Clone for TreeMultiMap<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for TreeMultiMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.tree, f)
    }
}

impl<K: PartialEq, V: PartialEq, C> PartialEq for TreeMultiMap<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.tree == other.tree
    }
}

impl<K: Eq, V: Eq, C> Eq for TreeMultiMap<K, V, C> {}

impl<K, V, C: Compare<K>> Extend<(K, V)> for TreeMultiMap<K, V, C> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        self.tree.extend(iter);
    }
}

impl<K, V, C: Compare<K> + Default> FromIterator<(K, V)> for TreeMultiMap<K, V, C> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            tree: iter.into_iter().collect(),
        }
    }
}

impl<K, V, C> IntoIterator for TreeMultiMap<K, V, C> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        self.tree.into_iter()
    }
}

impl<'a, K, V, C> IntoIterator for &'a TreeMultiMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: heterogeneous lookup through `Borrow` finds owned keys.
    #[test]
    fn borrowed_lookup() {
        let mut m: TreeMap<String, u32> = TreeMap::new();
        m.insert("b".into(), 2);
        m.insert("a".into(), 1);
        assert_eq!(m.get("a"), Some(&1));
        assert_eq!(m["b"], 2);
        assert_eq!(m.at("z"), Err(Error::KeyNotFound));
        *m.get_or_insert_with("c".into(), || 0) += 3;
        assert_eq!(m.keys().cloned().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(m.remove("b"), Some(2));
        m.check_invariants().unwrap();
    }

    /// Invariant: a unique map merging from a multimap takes one entry per
    /// absent key.
    #[test]
    fn merge_from_multimap() {
        let mut multi: TreeMultiMap<u8, char> =
            [(1, 'a'), (2, 'b'), (2, 'c')].into_iter().collect();
        let mut uniq: TreeMap<u8, char> = TreeMap::new();
        uniq.merge_multi(&mut multi);
        assert_eq!(uniq.len(), 2);
        assert_eq!(uniq[&2], 'b');
        assert_eq!(multi.iter().collect::<Vec<_>>(), vec![(&2, &'c')]);
    }
}
