//! DenseMap: hash map over [`DenseTable`] with insertion-ordered iteration.

use crate::bucket::BucketIndex;
use crate::config::TableConfig;
use crate::dense_table::{DenseTable, IntoIter, Iter, IterMut};
use crate::error::{Error, InvariantViolation, Result};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem;
use core::ops::{Index, Range};
use hashbrown::hash_map::DefaultHashBuilder;

/// Unique-key hash map. Entries are stored contiguously; iteration visits
/// them in dense order, which is insertion order until something is
/// removed.
///
/// Methods that may grow the table come in pairs: the plain form panics on
/// bucket overflow, the `try_` form returns [`Error::BucketOverflow`].
pub struct DenseMap<K, V, S = DefaultHashBuilder, I = u32> {
    table: DenseTable<K, V, S, I>,
}

impl<K, V> DenseMap<K, V> {
    pub fn new() -> Self {
        Self {
            table: DenseTable::new(),
        }
    }
}

impl<K: Hash + Eq, V> DenseMap<K, V> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

fn overflow_panic(e: Error) -> ! {
    panic!("{e}")
}

impl<K, V, S, I: BucketIndex> DenseMap<K, V, S, I> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            table: DenseTable::with_hasher(hasher),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    pub fn load_factor(&self) -> f32 {
        self.table.load_factor()
    }

    pub fn max_load_factor(&self) -> f32 {
        self.table.max_load_factor()
    }

    pub fn hasher(&self) -> &S {
        self.table.hasher()
    }

    pub fn get_index(&self, idx: usize) -> Option<(&K, &V)> {
        self.table.get_index(idx)
    }

    pub fn get_index_mut(&mut self, idx: usize) -> Option<(&K, &mut V)> {
        self.table.get_index_mut(idx)
    }

    pub fn as_slice(&self) -> &[(K, V)] {
        self.table.as_slice()
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        self.table.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.table.iter_mut()
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.table.keys()
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.table.values()
    }

    pub fn values_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut V> + ExactSizeIterator + '_ {
        self.table.values_mut()
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, (K, V)> {
        self.table.drain()
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.table, &mut other.table);
    }

    /// Consumes the map and returns its entries in dense order.
    pub fn into_entries(self) -> Vec<(K, V)> {
        self.table.into_values()
    }
}

impl<K, V, S, I> DenseMap<K, V, S, I>
where
    K: Hash + Eq,
    S: BuildHasher,
    I: BucketIndex,
{
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            table: DenseTable::with_capacity_and_hasher(capacity, hasher),
        }
    }

    pub fn with_config(config: TableConfig, hasher: S) -> Result<Self> {
        Ok(Self {
            table: DenseTable::with_config(config, hasher)?,
        })
    }

    /// Lowering the factor below the current load grows the table at once.
    pub fn set_max_load_factor(&mut self, ml: f32) -> Result<()> {
        self.table.set_max_load_factor(ml)
    }

    /// Inserts or overwrites; returns the previous value.
    ///
    /// # Panics
    /// Panics on bucket overflow. See [`DenseMap::try_insert`].
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.try_insert(key, value).unwrap_or_else(|e| overflow_panic(e))
    }

    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        Ok(self.table.insert_or_assign(key, value)?.1)
    }

    /// Inserts only if `key` is absent. Returns whether it was inserted.
    ///
    /// # Panics
    /// Panics on bucket overflow.
    pub fn emplace(&mut self, key: K, value: V) -> bool {
        match self.table.emplace(key, value) {
            Ok((_, inserted)) => inserted,
            Err(e) => overflow_panic(e),
        }
    }

    /// Looks up `key`, inserting `make()` if it is absent. `make` is not
    /// called for present keys.
    pub fn try_emplace<F>(&mut self, key: K, make: F) -> Result<(&mut V, bool)>
    where
        F: FnOnce() -> V,
    {
        let (idx, inserted) = self.table.try_emplace(key, make)?;
        Ok((self.table.value_at_mut(idx), inserted))
    }

    /// # Panics
    /// Panics on bucket overflow.
    pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        match self.table.try_emplace(key, make) {
            Ok((idx, _)) => self.table.value_at_mut(idx),
            Err(e) => overflow_panic(e),
        }
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get(q)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get_mut(q)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get_key_value(q)
    }

    pub fn at<Q>(&self, q: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.at(q)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.contains(q)
    }

    pub fn count<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.count(q)
    }

    pub fn find_index<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.find_index(q)
    }

    pub fn equal_range<Q>(&self, q: &Q) -> Range<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.equal_range(q)
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.extract(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.extract(q)
    }

    /// Removes the entry at dense index `idx`; the last entry moves into
    /// its place.
    pub fn remove_index(&mut self, idx: usize) -> Option<(K, V)> {
        self.table.remove_index(idx)
    }

    pub fn erase_range(&mut self, range: Range<usize>) {
        self.table.erase_range(range);
    }

    /// Returns the number of removed entries.
    pub fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.table.retain(keep)
    }

    /// Moves every entry of `other` whose key is absent here. Entries with
    /// colliding keys stay in `other`.
    ///
    /// # Panics
    /// Panics on bucket overflow. See [`DenseMap::try_merge`].
    pub fn merge<S2, I2>(&mut self, other: &mut DenseMap<K, V, S2, I2>)
    where
        S2: BuildHasher,
        I2: BucketIndex,
    {
        if let Err(e) = self.try_merge(other) {
            overflow_panic(e)
        }
    }

    /// Like [`DenseMap::merge`], but stops with `BucketOverflow` once this
    /// map is full. Entries not yet moved remain in `other`.
    pub fn try_merge<S2, I2>(&mut self, other: &mut DenseMap<K, V, S2, I2>) -> Result<()>
    where
        S2: BuildHasher,
        I2: BucketIndex,
    {
        let before = self.len();
        let mut idx = 0;
        while let Some((k, _)) = other.get_index(idx) {
            if self.contains_key(k) {
                idx += 1;
                continue;
            }
            if self.len() == DenseTable::<K, V, S, I>::max_size() {
                return Err(Error::BucketOverflow {
                    max_buckets: I::MAX_BUCKETS,
                });
            }
            if let Some((k, v)) = other.remove_index(idx) {
                self.table.emplace(k, v)?;
            }
        }
        log::trace!("dense map merged {} entries", self.len() - before);
        Ok(())
    }

    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    pub fn rehash(&mut self, count: usize) {
        self.table.rehash(count);
    }

    pub fn shrink_to_fit(&mut self) {
        self.table.shrink_to_fit();
    }

    /// Replaces the content with `entries`; the first of any repeated keys
    /// wins.
    pub fn replace(&mut self, entries: Vec<(K, V)>) -> Result<()> {
        self.table.replace(entries)
    }

    pub fn check_invariants(&self) -> core::result::Result<(), InvariantViolation> {
        self.table.check_invariants()
    }
}

impl<K, V, S: Default, I: BucketIndex> Default for DenseMap<K, V, S, I> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K: Clone, V: Clone, S: Clone, I: Clone> Clone for DenseMap<K, V, S, I> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S, I: BucketIndex> fmt::Debug for DenseMap<K, V, S, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.table, f)
    }
}

impl<K, V, S, I> PartialEq for DenseMap<K, V, S, I>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
    I: BucketIndex,
{
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table
    }
}

impl<K, V, S, I> Eq for DenseMap<K, V, S, I>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
    I: BucketIndex,
{
}

impl<K, Q, V, S, I> Index<&Q> for DenseMap<K, V, S, I>
where
    K: Hash + Eq + Borrow<Q>,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
    I: BucketIndex,
{
    type Output = V;

    /// # Panics
    /// Panics if the key is not present.
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(v) => v,
            None => panic!("{}", Error::KeyNotFound),
        }
    }
}

/// Later values overwrite earlier ones for the same key.
impl<K, V, S, I> Extend<(K, V)> for DenseMap<K, V, S, I>
where
    K: Hash + Eq,
    S: BuildHasher,
    I: BucketIndex,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S, I> FromIterator<(K, V)> for DenseMap<K, V, S, I>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
    I: BucketIndex,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, S, I> IntoIterator for DenseMap<K, V, S, I> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.table.into_iter()
    }
}

impl<'a, K, V, S, I: BucketIndex> IntoIterator for &'a DenseMap<K, V, S, I> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S, I: BucketIndex> IntoIterator for &'a mut DenseMap<K, V, S, I> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: merge moves only absent keys and leaves collisions behind.
    #[test]
    fn merge_leaves_collisions_in_source() {
        let mut a: DenseMap<u32, &str> = [(1, "a1"), (2, "a2")].into_iter().collect();
        let mut b: DenseMap<u32, &str> = [(2, "b2"), (3, "b3"), (4, "b4")].into_iter().collect();
        a.merge(&mut b);
        assert_eq!(a.len(), 4);
        assert_eq!(a[&2], "a2");
        assert_eq!(a[&3], "b3");
        assert_eq!(b.len(), 1);
        assert_eq!(b.get(&2), Some(&"b2"));
        a.check_invariants().unwrap();
        b.check_invariants().unwrap();
    }

    /// Invariant: a full u8-indexed map refuses to merge further entries and
    /// keeps them in the source.
    #[test]
    fn try_merge_stops_at_capacity() {
        let mut full: DenseMap<u32, (), DefaultHashBuilder, u8> = DenseMap::default();
        for i in 0..256 {
            full.try_insert(i, ()).unwrap();
        }
        let mut extra: DenseMap<u32, ()> = (1000..1003).map(|k| (k, ())).collect();
        assert_eq!(
            full.try_merge(&mut extra),
            Err(Error::BucketOverflow { max_buckets: 256 })
        );
        assert_eq!(extra.len(), 3);
        assert_eq!(full.len(), 256);
    }

    #[test]
    #[should_panic(expected = "key not found")]
    fn index_missing_key_panics() {
        let m: DenseMap<u32, u32> = DenseMap::new();
        let _ = m[&1];
    }

    /// Invariant: try_emplace hands back the stored value either way.
    #[test]
    fn try_emplace_returns_slot() {
        let mut m: DenseMap<String, Vec<u32>> = DenseMap::new();
        let (v, inserted) = m.try_emplace("k".into(), Vec::new).unwrap();
        assert!(inserted);
        v.push(1);
        let (v, inserted) = m.try_emplace("k".into(), || vec![9]).unwrap();
        assert!(!inserted);
        v.push(2);
        assert_eq!(m["k"], vec![1, 2]);
        m.get_or_insert_with("k".into(), Vec::new).push(3);
        assert_eq!(m.get("k").map(Vec::len), Some(3));
    }
}
