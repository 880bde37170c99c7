//! DenseSet: the key-only flavor of [`DenseTable`].

use crate::bucket::BucketIndex;
use crate::config::TableConfig;
use crate::dense_table::{self, DenseTable};
use crate::error::{Error, InvariantViolation, Result};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::mem;
use hashbrown::hash_map::DefaultHashBuilder;

/// Hash set with dense, insertion-ordered storage.
///
/// # Panics
/// `insert`, `merge`, `extend` and `collect` panic on bucket overflow; use
/// the `try_` forms to get [`Error::BucketOverflow`] instead.
pub struct DenseSet<K, S = DefaultHashBuilder, I = u32> {
    table: DenseTable<K, (), S, I>,
}

impl<K> DenseSet<K> {
    pub fn new() -> Self {
        Self {
            table: DenseTable::new(),
        }
    }
}

impl<K, S, I: BucketIndex> DenseSet<K, S, I> {
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

    pub fn get_index(&self, idx: usize) -> Option<&K> {
        self.table.get_index(idx).map(|(k, _)| k)
    }

    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            it: self.table.iter(),
        }
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.table, &mut other.table);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = K> + '_ {
        self.table.drain().map(|(k, _)| k)
    }

    pub fn into_vec(self) -> Vec<K> {
        self.table.into_values().into_iter().map(|(k, _)| k).collect()
    }
}

impl<K, S, I> DenseSet<K, S, I>
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

    /// Returns whether `key` was newly inserted. A rejected key is dropped.
    pub fn insert(&mut self, key: K) -> bool {
        match self.try_insert(key) {
            Ok(inserted) => inserted,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_insert(&mut self, key: K) -> Result<bool> {
        Ok(self.table.emplace(key, ())?.1)
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
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

    /// The stored key equal to `q`.
    pub fn get<Q>(&self, q: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get_key_value(q).map(|(k, _)| k)
    }

    pub fn find_index<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.find_index(q)
    }

    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.erase(q) == 1
    }

    /// Removes and returns the stored key equal to `q`.
    pub fn take<Q>(&mut self, q: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.extract(q).map(|(k, _)| k)
    }

    pub fn remove_index(&mut self, idx: usize) -> Option<K> {
        self.table.remove_index(idx).map(|(k, _)| k)
    }

    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&K) -> bool,
    {
        self.table.retain(|k, _| keep(k))
    }

    /// Moves every key of `other` that is absent here.
    pub fn merge<S2, I2>(&mut self, other: &mut DenseSet<K, S2, I2>)
    where
        S2: BuildHasher,
        I2: BucketIndex,
    {
        if let Err(e) = self.try_merge(other) {
            panic!("{e}");
        }
    }

    pub fn try_merge<S2, I2>(&mut self, other: &mut DenseSet<K, S2, I2>) -> Result<()>
    where
        S2: BuildHasher,
        I2: BucketIndex,
    {
        let mut idx = 0;
        while let Some(k) = other.get_index(idx) {
            if self.contains(k) {
                idx += 1;
                continue;
            }
            if self.len() == DenseTable::<K, (), S, I>::max_size() {
                return Err(Error::BucketOverflow {
                    max_buckets: I::MAX_BUCKETS,
                });
            }
            if let Some(k) = other.remove_index(idx) {
                self.table.emplace(k, ())?;
            }
        }
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

    /// Rebuilds the set from `keys`; repeated keys are dropped.
    pub fn replace(&mut self, keys: Vec<K>) -> Result<()> {
        self.table.replace(keys.into_iter().map(|k| (k, ())).collect())
    }

    pub fn check_invariants(&self) -> core::result::Result<(), InvariantViolation> {
        self.table.check_invariants()
    }
}

impl<K, S: Default, I: BucketIndex> Default for DenseSet<K, S, I> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K: Clone, S: Clone, I: Clone> Clone for DenseSet<K, S, I> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<K: fmt::Debug, S, I: BucketIndex> fmt::Debug for DenseSet<K, S, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, S, I> PartialEq for DenseSet<K, S, I>
where
    K: Hash + Eq,
    S: BuildHasher,
    I: BucketIndex,
{
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table
    }
}

impl<K, S, I> Eq for DenseSet<K, S, I>
where
    K: Hash + Eq,
    S: BuildHasher,
    I: BucketIndex,
{
}

impl<K, S, I> Extend<K> for DenseSet<K, S, I>
where
    K: Hash + Eq,
    S: BuildHasher,
    I: BucketIndex,
{
    fn extend<T: IntoIterator<Item = K>>(&mut self, iter: T) {
        self.table.extend(iter.into_iter().map(|k| (k, ())));
    }
}

impl<K, S, I> FromIterator<K> for DenseSet<K, S, I>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
    I: BucketIndex,
{
    fn from_iter<T: IntoIterator<Item = K>>(iter: T) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

pub struct Iter<'a, K> {
    it: dense_table::Iter<'a, K, ()>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.it.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K> DoubleEndedIterator for Iter<'_, K> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back().map(|(k, _)| k)
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}
impl<K> FusedIterator for Iter<'_, K> {}

pub struct IntoIter<K> {
    it: dense_table::IntoIter<K, ()>,
}

impl<K> Iterator for IntoIter<K> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.it.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K> DoubleEndedIterator for IntoIter<K> {
    fn next_back(&mut self) -> Option<K> {
        self.it.next_back().map(|(k, _)| k)
    }
}

impl<K> ExactSizeIterator for IntoIter<K> {}

impl<K, S, I> IntoIterator for DenseSet<K, S, I> {
    type Item = K;
    type IntoIter = IntoIter<K>;

    fn into_iter(self) -> IntoIter<K> {
        IntoIter {
            it: self.table.into_iter(),
        }
    }
}

impl<'a, K, S, I: BucketIndex> IntoIterator for &'a DenseSet<K, S, I> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: take hands back the stored key, not the probe.
    #[test]
    fn take_returns_stored_key() {
        let mut s: DenseSet<String> = DenseSet::new();
        assert!(s.insert("alpha".to_string()));
        assert!(!s.insert("alpha".to_string()));
        assert_eq!(s.get("alpha").map(String::as_str), Some("alpha"));
        assert_eq!(s.take("alpha"), Some("alpha".to_string()));
        assert!(s.is_empty());
        s.check_invariants().unwrap();
    }

    /// Invariant: merge keeps duplicates in the source set.
    #[test]
    fn merge_moves_absent_keys() {
        let mut a: DenseSet<u8> = [1, 2, 3].into_iter().collect();
        let mut b: DenseSet<u8> = [3, 4].into_iter().collect();
        a.merge(&mut b);
        assert_eq!(a.len(), 4);
        assert_eq!(b.into_vec(), vec![3]);
    }
}
