//! DenseTable: robin-hood bucket index over a dense, gap-free value array.
//!
//! Values live contiguously in insertion order (until an erase swaps the
//! last value into the hole). A separate power-of-two bucket array maps
//! hashes to value indices using linear probing with robin-hood ordering.
//! Erase uses backward-shift deletion, so there are no tombstones and
//! probe chains only ever get shorter.
//!
//! Invariants (checked by [`DenseTable::check_invariants`]):
//! - every occupied bucket points at exactly one value and every value is
//!   pointed at by exactly one bucket;
//! - a bucket's stored distance and fingerprint agree with its key's hash;
//! - along any probe chain a bucket's distance is at most one more than its
//!   predecessor's, so lookups may stop at the first bucket that is
//!   "richer" than the probe;
//! - `len() <= max_bucket_capacity`.

use crate::bucket::{dist_dec, dist_inc, Bucket, BucketIndex, DIST_INC};
use crate::config::{validate_load_factor, TableConfig, DEFAULT_MAX_LOAD_FACTOR};
use crate::error::{Error, InvariantViolation, Result};
use crate::hashing::{bucket_idx_from_hash, dist_and_fingerprint_from_hash, mix};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::mem;
use core::ops::Range;
use hashbrown::hash_map::DefaultHashBuilder;

/// 2^(64 - 62) = 4 buckets on first allocation.
const INITIAL_SHIFTS: u8 = 64 - 2;

#[derive(Clone, Copy, Debug)]
enum Slot {
    Occupied {
        value_idx: usize,
        bucket_idx: usize,
    },
    Vacant {
        dist_and_fingerprint: u32,
        bucket_idx: usize,
    },
}

/// Hash table with dense storage. Doubles as a set when `V = ()`.
///
/// `S` builds the key hasher; `I` is the integer width used to address
/// values from buckets and caps the table at `I::MAX_BUCKETS` elements.
#[derive(Clone)]
pub struct DenseTable<K, V, S = DefaultHashBuilder, I = u32> {
    values: Vec<(K, V)>,
    buckets: Vec<Bucket<I>>,
    max_bucket_capacity: usize,
    max_load_factor: f32,
    shifts: u8,
    avalanching: bool,
    hasher: S,
}

impl<K, V> DenseTable<K, V> {
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl<K, V, S: Default, I: BucketIndex> Default for DenseTable<K, V, S, I> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S, I: BucketIndex> DenseTable<K, V, S, I> {
    /// Empty table; no buckets are allocated until the first insertion.
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            values: Vec::new(),
            buckets: Vec::new(),
            max_bucket_capacity: 0,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            shifts: INITIAL_SHIFTS,
            avalanching: false,
            hasher,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Largest number of elements the index width can address.
    pub const fn max_size() -> usize {
        I::MAX_BUCKETS
    }

    pub const fn max_bucket_count() -> usize {
        I::MAX_BUCKETS
    }

    pub fn load_factor(&self) -> f32 {
        if self.buckets.is_empty() {
            0.0
        } else {
            self.len() as f32 / self.bucket_count() as f32
        }
    }

    pub fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// The dense value array, in iteration order.
    #[inline]
    pub fn as_slice(&self) -> &[(K, V)] {
        &self.values
    }

    pub fn get_index(&self, idx: usize) -> Option<(&K, &V)> {
        self.values.get(idx).map(|(k, v)| (k, v))
    }

    /// # Panics
    /// Panics if `idx >= len()`.
    #[inline]
    pub(crate) fn value_at_mut(&mut self, idx: usize) -> &mut V {
        &mut self.values[idx].1
    }

    pub fn get_index_mut(&mut self, idx: usize) -> Option<(&K, &mut V)> {
        self.values.get_mut(idx).map(|(k, v)| (&*k, v))
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.values.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.values.iter_mut(),
        }
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.values.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.values.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut V> + ExactSizeIterator + '_ {
        self.values.iter_mut().map(|(_, v)| v)
    }

    /// Removes every element, keeping the bucket allocation.
    pub fn drain(&mut self) -> std::vec::Drain<'_, (K, V)> {
        self.clear_buckets();
        self.values.drain(..)
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.clear_buckets();
    }

    /// Gives up the index and returns the dense value array.
    pub fn into_values(self) -> Vec<(K, V)> {
        self.values
    }

    #[inline]
    fn next(&self, bucket_idx: usize) -> usize {
        if bucket_idx + 1 == self.bucket_count() {
            0
        } else {
            bucket_idx + 1
        }
    }

    /// Smallest shift the index width allows: beyond it the bucket count
    /// would exceed `I::MAX_BUCKETS`.
    fn min_shifts() -> u8 {
        (64 - I::MAX_BUCKETS.trailing_zeros()) as u8
    }

    fn calc_num_buckets(shifts: u8) -> usize {
        let n = 1usize
            .checked_shl(64 - u32::from(shifts))
            .unwrap_or(usize::MAX);
        n.min(I::MAX_BUCKETS)
    }

    fn capacity_for(&self, num_buckets: usize) -> usize {
        if num_buckets == I::MAX_BUCKETS {
            // every bucket may be used once the index width is exhausted
            num_buckets
        } else {
            (num_buckets as f32 * self.max_load_factor) as usize
        }
    }

    fn calc_shifts_for_size(&self, s: usize) -> u8 {
        let mut shifts = INITIAL_SHIFTS;
        while shifts > Self::min_shifts()
            && self.capacity_for(Self::calc_num_buckets(shifts)) < s
        {
            shifts -= 1;
        }
        shifts
    }

    fn allocate_buckets_from_shift(&mut self) {
        let num_buckets = Self::calc_num_buckets(self.shifts);
        self.buckets = vec![Bucket::default(); num_buckets];
        self.max_bucket_capacity = self.capacity_for(num_buckets);
    }

    fn ensure_buckets(&mut self) {
        if self.buckets.is_empty() {
            self.allocate_buckets_from_shift();
        }
    }

    fn clear_buckets(&mut self) {
        self.buckets.fill(Bucket::default());
    }

    #[inline]
    fn is_full(&self) -> bool {
        self.len() > self.max_bucket_capacity
    }

    fn place_and_shift_up(&mut self, mut bucket: Bucket<I>, mut place: usize) {
        while !self.buckets[place].is_empty() {
            bucket = mem::replace(&mut self.buckets[place], bucket);
            bucket.dist_and_fingerprint = dist_inc(bucket.dist_and_fingerprint);
            place = self.next(place);
        }
        self.buckets[place] = bucket;
    }
}

impl<K, V, S, I> DenseTable<K, V, S, I>
where
    K: Hash + Eq,
    S: BuildHasher,
    I: BucketIndex,
{
    /// Empty table with room for `capacity` elements before growing.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        let mut table = Self::with_hasher(hasher);
        if capacity != 0 {
            table.reserve(capacity);
        }
        table
    }

    pub fn with_config(config: TableConfig, hasher: S) -> Result<Self> {
        config.validate()?;
        let mut table = Self::with_hasher(hasher);
        table.max_load_factor = config.max_load_factor;
        table.avalanching = config.avalanching;
        if config.bucket_count != 0 {
            table.reserve(config.bucket_count);
        }
        Ok(table)
    }

    #[inline]
    fn mixed_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        let h = self.hasher.hash_one(q);
        if self.avalanching {
            h
        } else {
            mix(h)
        }
    }

    /// Walks the probe sequence for `key`. Stops at the matching bucket, or
    /// at the first bucket that is richer than the probe (which is where
    /// the key would be placed).
    fn probe<Q>(&self, hash: u64, key: &Q) -> Slot
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        debug_assert!(!self.buckets.is_empty());
        let mut dist_and_fingerprint = dist_and_fingerprint_from_hash(hash);
        let mut bucket_idx = bucket_idx_from_hash(hash, self.shifts);
        loop {
            let bucket = self.buckets[bucket_idx];
            if dist_and_fingerprint == bucket.dist_and_fingerprint {
                if self.values[bucket.value_idx()].0.borrow() == key {
                    return Slot::Occupied {
                        value_idx: bucket.value_idx(),
                        bucket_idx,
                    };
                }
            } else if dist_and_fingerprint > bucket.dist_and_fingerprint {
                return Slot::Vacant {
                    dist_and_fingerprint,
                    bucket_idx,
                };
            }
            dist_and_fingerprint = dist_inc(dist_and_fingerprint);
            bucket_idx = self.next(bucket_idx);
        }
    }

    fn next_while_less(&self, hash: u64) -> (u32, usize) {
        let mut dist_and_fingerprint = dist_and_fingerprint_from_hash(hash);
        let mut bucket_idx = bucket_idx_from_hash(hash, self.shifts);
        while dist_and_fingerprint < self.buckets[bucket_idx].dist_and_fingerprint {
            dist_and_fingerprint = dist_inc(dist_and_fingerprint);
            bucket_idx = self.next(bucket_idx);
        }
        (dist_and_fingerprint, bucket_idx)
    }

    fn clear_and_fill_buckets_from_values(&mut self) {
        self.clear_buckets();
        for value_idx in 0..self.values.len() {
            let hash = self.mixed_hash(&self.values[value_idx].0);
            let (dist_and_fingerprint, bucket_idx) = self.next_while_less(hash);
            // keys are unique already, no comparison needed
            self.place_and_shift_up(Bucket::new(dist_and_fingerprint, value_idx), bucket_idx);
        }
    }

    fn increase_size(&mut self) -> Result<()> {
        if self.max_bucket_capacity == I::MAX_BUCKETS {
            // roll back the value appended by the caller
            self.values.pop();
            log::debug!(
                "dense table overflow: {} buckets is the maximum for this index width",
                I::MAX_BUCKETS
            );
            return Err(Error::BucketOverflow {
                max_buckets: I::MAX_BUCKETS,
            });
        }
        self.shifts -= 1;
        self.allocate_buckets_from_shift();
        self.clear_and_fill_buckets_from_values();
        log::debug!(
            "dense table grew to {} buckets ({} values)",
            self.bucket_count(),
            self.len()
        );
        Ok(())
    }

    /// Appends the value, then links it at `bucket_idx` or rebuilds the
    /// index if the table just became full.
    fn place_element(
        &mut self,
        dist_and_fingerprint: u32,
        bucket_idx: usize,
        entry: (K, V),
    ) -> Result<usize> {
        self.values.push(entry);
        let value_idx = self.values.len() - 1;
        if self.is_full() {
            self.increase_size()?;
        } else {
            self.place_and_shift_up(Bucket::new(dist_and_fingerprint, value_idx), bucket_idx);
        }
        Ok(value_idx)
    }

    fn slot_for(&mut self, key: &K) -> (u64, Slot) {
        self.ensure_buckets();
        let hash = self.mixed_hash(key);
        (hash, self.probe(hash, key))
    }

    pub fn find_index<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.is_empty() {
            return None;
        }
        match self.probe(self.mixed_hash(q), q) {
            Slot::Occupied { value_idx, .. } => Some(value_idx),
            Slot::Vacant { .. } => None,
        }
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_index(q).map(|i| &self.values[i].1)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_index(q).and_then(|i| self.get_index(i))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let i = self.find_index(q)?;
        Some(&mut self.values[i].1)
    }

    pub fn at<Q>(&self, q: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).ok_or(Error::KeyNotFound)
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find_index(q).is_some()
    }

    pub fn count<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        usize::from(self.contains(q))
    }

    /// Dense-index range holding `q`: one element, or the empty range at
    /// `len()`.
    pub fn equal_range<Q>(&self, q: &Q) -> Range<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.find_index(q) {
            Some(i) => i..i + 1,
            None => self.len()..self.len(),
        }
    }

    /// Inserts `key` with the value produced by `make` unless the key is
    /// present. `make` only runs when a slot was found for a new element.
    ///
    /// Returns the dense index of the element and whether it was inserted.
    pub fn try_emplace<F>(&mut self, key: K, make: F) -> Result<(usize, bool)>
    where
        F: FnOnce() -> V,
    {
        match self.slot_for(&key).1 {
            Slot::Occupied { value_idx, .. } => Ok((value_idx, false)),
            Slot::Vacant {
                dist_and_fingerprint,
                bucket_idx,
            } => {
                let value = make();
                let idx = self.place_element(dist_and_fingerprint, bucket_idx, (key, value))?;
                Ok((idx, true))
            }
        }
    }

    /// Inserts unless the key is present; a rejected `value` is dropped.
    pub fn emplace(&mut self, key: K, value: V) -> Result<(usize, bool)> {
        self.try_emplace(key, || value)
    }

    /// Inserts, or overwrites the value of an existing key. Returns the
    /// dense index and the replaced value, if any.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> Result<(usize, Option<V>)> {
        match self.slot_for(&key).1 {
            Slot::Occupied { value_idx, .. } => {
                let old = mem::replace(&mut self.values[value_idx].1, value);
                Ok((value_idx, Some(old)))
            }
            Slot::Vacant {
                dist_and_fingerprint,
                bucket_idx,
            } => {
                let idx = self.place_element(dist_and_fingerprint, bucket_idx, (key, value))?;
                Ok((idx, None))
            }
        }
    }

    /// Backward-shift erase of the element linked from `bucket_idx`,
    /// followed by a swap-remove in the value array.
    fn do_erase(&mut self, mut bucket_idx: usize) -> (K, V) {
        let value_idx_to_remove = self.buckets[bucket_idx].value_idx();

        // pull successors back one slot until one sits in its home bucket
        let mut next_bucket_idx = self.next(bucket_idx);
        while self.buckets[next_bucket_idx].dist_and_fingerprint >= DIST_INC * 2 {
            let moved = self.buckets[next_bucket_idx];
            self.buckets[bucket_idx] = Bucket {
                dist_and_fingerprint: dist_dec(moved.dist_and_fingerprint),
                value_idx: moved.value_idx,
            };
            bucket_idx = next_bucket_idx;
            next_bucket_idx = self.next(next_bucket_idx);
        }
        self.buckets[bucket_idx] = Bucket::default();

        let last = self.values.len() - 1;
        let removed = self.values.swap_remove(value_idx_to_remove);
        if value_idx_to_remove != last {
            // the former last value moved into the hole; repoint its bucket
            let idx = self.bucket_of_value(last, &self.values[value_idx_to_remove].0);
            self.buckets[idx].value_idx = I::from_usize(value_idx_to_remove);
        }
        removed
    }

    fn bucket_of_value(&self, value_idx: usize, key: &K) -> usize {
        let hash = self.mixed_hash(key);
        let mut bucket_idx = bucket_idx_from_hash(hash, self.shifts);
        loop {
            let bucket = self.buckets[bucket_idx];
            if !bucket.is_empty() && bucket.value_idx() == value_idx {
                return bucket_idx;
            }
            bucket_idx = self.next(bucket_idx);
        }
    }

    /// Removes and returns the entry for `q`.
    pub fn extract<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.is_empty() {
            return None;
        }
        match self.probe(self.mixed_hash(q), q) {
            Slot::Occupied { bucket_idx, .. } => Some(self.do_erase(bucket_idx)),
            Slot::Vacant { .. } => None,
        }
    }

    /// Removes the entry for `q`; returns how many were removed (0 or 1).
    pub fn erase<Q>(&mut self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        usize::from(self.extract(q).is_some())
    }

    /// Removes the entry at dense index `idx`. The former last entry takes
    /// its place, so `idx` stays valid for continued iteration.
    pub fn remove_index(&mut self, idx: usize) -> Option<(K, V)> {
        if idx >= self.len() {
            return None;
        }
        let bucket_idx = self.bucket_of_value(idx, &self.values[idx].0);
        Some(self.do_erase(bucket_idx))
    }

    /// Removes the entries at dense indices `range`. Works from both ends
    /// towards the middle so that no more than `min(range.len(), len() -
    /// range.end)` entries are moved.
    ///
    /// # Panics
    /// Panics if the range is decreasing or extends past `len()`.
    pub fn erase_range(&mut self, range: Range<usize>) {
        let Range { start, end } = range;
        assert!(
            start <= end && end <= self.len(),
            "erase range {start}..{end} out of bounds for length {}",
            self.len()
        );
        let mid = start + (end - start).min(self.len() - end);
        for idx in start..mid {
            self.remove_index(idx);
        }
        let mut idx = end;
        while idx != mid {
            idx -= 1;
            self.remove_index(idx);
        }
    }

    /// Keeps only the entries for which `keep` returns true. Returns the
    /// number of removed entries.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let old_len = self.len();
        let mut idx = old_len;
        while idx > 0 {
            idx -= 1;
            let (k, v) = &mut self.values[idx];
            if !keep(k, v) {
                self.remove_index(idx);
            }
        }
        old_len - self.len()
    }

    /// Changes the growth threshold for the current bucket array. Raising it
    /// never rehashes; lowering it below the current load grows the bucket
    /// array right away so `len() <= capacity` keeps holding.
    pub fn set_max_load_factor(&mut self, ml: f32) -> Result<()> {
        validate_load_factor(ml)?;
        self.max_load_factor = ml;
        if !self.buckets.is_empty() {
            self.max_bucket_capacity = self.capacity_for(self.bucket_count());
            if self.len() > self.max_bucket_capacity {
                self.shifts = self.calc_shifts_for_size(self.len());
                self.allocate_buckets_from_shift();
                self.clear_and_fill_buckets_from_values();
                log::debug!(
                    "dense table grew to {} buckets after load factor change",
                    self.bucket_count()
                );
            }
        }
        Ok(())
    }

    /// Makes room for `additional` more elements without growing.
    pub fn reserve(&mut self, additional: usize) {
        let capa = self.len().saturating_add(additional).min(I::MAX_BUCKETS);
        self.values.reserve(capa - self.len());
        let shifts = self.calc_shifts_for_size(capa);
        if self.buckets.is_empty() || shifts < self.shifts {
            self.shifts = shifts;
            self.allocate_buckets_from_shift();
            self.clear_and_fill_buckets_from_values();
            log::trace!("dense table reserved {} buckets", self.bucket_count());
        }
    }

    /// Resizes the bucket array to fit `max(count, len())` elements. Unlike
    /// `reserve` this may shrink.
    pub fn rehash(&mut self, count: usize) {
        let count = count.min(I::MAX_BUCKETS);
        let shifts = self.calc_shifts_for_size(count.max(self.len()));
        if shifts != self.shifts {
            self.shifts = shifts;
            self.values.shrink_to_fit();
            self.allocate_buckets_from_shift();
            self.clear_and_fill_buckets_from_values();
            log::trace!("dense table rehashed to {} buckets", self.bucket_count());
        }
    }

    pub fn shrink_to_fit(&mut self) {
        self.rehash(0);
        self.values.shrink_to_fit();
    }

    /// Replaces the whole content with `values` and rebuilds the index.
    /// When keys repeat, the first occurrence wins.
    pub fn replace(&mut self, values: Vec<(K, V)>) -> Result<()> {
        if values.len() > I::MAX_BUCKETS {
            return Err(Error::TooManyElements {
                len: values.len(),
                max_size: I::MAX_BUCKETS,
            });
        }
        let shifts = self.calc_shifts_for_size(values.len());
        if self.buckets.is_empty() || shifts < self.shifts {
            self.shifts = shifts;
            self.allocate_buckets_from_shift();
        }
        self.clear_buckets();
        self.values = values;

        let mut value_idx = 0;
        while value_idx != self.values.len() {
            let key = &self.values[value_idx].0;
            match self.probe(self.mixed_hash(key), key) {
                Slot::Occupied { .. } => {
                    self.values.swap_remove(value_idx);
                }
                Slot::Vacant {
                    dist_and_fingerprint,
                    bucket_idx,
                } => {
                    self.place_and_shift_up(Bucket::new(dist_and_fingerprint, value_idx), bucket_idx);
                    value_idx += 1;
                }
            }
        }
        log::trace!(
            "dense table replaced content with {} values in {} buckets",
            self.len(),
            self.bucket_count()
        );
        Ok(())
    }

    /// Verifies the structural invariants listed in the module docs.
    pub fn check_invariants(&self) -> core::result::Result<(), InvariantViolation> {
        let n = self.buckets.len();
        if n == 0 {
            if !self.values.is_empty() {
                return Err(InvariantViolation::UnindexedValue(0));
            }
            return Ok(());
        }
        if !n.is_power_of_two() {
            return Err(InvariantViolation::BucketCountNotPowerOfTwo(n));
        }
        if self.len() > self.max_bucket_capacity {
            return Err(InvariantViolation::OverCapacity {
                len: self.len(),
                capacity: self.max_bucket_capacity,
            });
        }
        let mut seen = vec![false; self.len()];
        for (b, bucket) in self.buckets.iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }
            let value_idx = bucket.value_idx();
            if value_idx >= self.len() {
                return Err(InvariantViolation::DanglingBucket {
                    bucket: b,
                    value_idx,
                    len: self.len(),
                });
            }
            if mem::replace(&mut seen[value_idx], true) {
                return Err(InvariantViolation::SharedValue(value_idx));
            }
            let hash = self.mixed_hash(&self.values[value_idx].0);
            let home = bucket_idx_from_hash(hash, self.shifts);
            let steps = ((b + n - home) & (n - 1)) as u32;
            let expected = dist_and_fingerprint_from_hash(hash) + steps * DIST_INC;
            if bucket.dist_and_fingerprint != expected {
                return Err(InvariantViolation::StaleFingerprint(b));
            }
            let prev = self.buckets[(b + n - 1) & (n - 1)];
            if bucket.distance() > prev.distance() + 1 {
                return Err(InvariantViolation::ProbeOrder(b));
            }
        }
        match seen.iter().position(|s| !s) {
            Some(i) => Err(InvariantViolation::UnindexedValue(i)),
            None => Ok(()),
        }
    }
}

impl<K, V, S, I> PartialEq for DenseTable<K, V, S, I>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
    I: BucketIndex,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && other
                .iter()
                .all(|(k, v)| self.get(k).map_or(false, |mine| mine == v))
    }
}

impl<K, V, S, I> Eq for DenseTable<K, V, S, I>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
    I: BucketIndex,
{
}

impl<K: fmt::Debug, V: fmt::Debug, S, I: BucketIndex> fmt::Debug for DenseTable<K, V, S, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Keeps the first occurrence of each key.
///
/// # Panics
/// Panics on bucket overflow.
impl<K, V, S, I> Extend<(K, V)> for DenseTable<K, V, S, I>
where
    K: Hash + Eq,
    S: BuildHasher,
    I: BucketIndex,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve(lower);
        for (k, v) in iter {
            if let Err(e) = self.emplace(k, v) {
                panic!("{e}");
            }
        }
    }
}

impl<K, V, S, I> FromIterator<(K, V)> for DenseTable<K, V, S, I>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
    I: BucketIndex,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut table = Self::with_hasher(S::default());
        table.extend(iter);
        table
    }
}

/// Iterator over entries in dense order.
pub struct Iter<'a, K, V> {
    it: core::slice::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back().map(|(k, v)| (k, v))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            it: self.it.clone(),
        }
    }
}

/// Iterator over entries with mutable values. Keys stay immutable.
pub struct IterMut<'a, K, V> {
    it: core::slice::IterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, v)| (&*k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back().map(|(k, v)| (&*k, v))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

pub type IntoIter<K, V> = std::vec::IntoIter<(K, V)>;

impl<K, V, S, I> IntoIterator for DenseTable<K, V, S, I> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a, K, V, S, I: BucketIndex> IntoIterator for &'a DenseTable<K, V, S, I> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
