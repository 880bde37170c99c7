#![cfg(test)]

// Property tests for DenseTable kept inside the crate so the bucket-level
// invariant check runs after every step.

use crate::dense_table::DenseTable;
use crate::error::Error;
use core::hash::{BuildHasher, Hasher};
use hashbrown::hash_map::DefaultHashBuilder;
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Clone, Debug)]
enum Op {
    Emplace(u16, i32),
    Assign(u16, i32),
    Erase(u16),
    RemoveIndex(usize),
    EraseRange(usize, usize),
    Retain(u16),
    Rehash(usize),
    Reserve(usize),
    Clear,
}

fn arb_op(key_space: u16) -> impl Strategy<Value = Op> {
    let key = 0..key_space;
    prop_oneof![
        6 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::Emplace(k, v)),
        3 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::Assign(k, v)),
        4 => key.prop_map(Op::Erase),
        2 => any::<usize>().prop_map(Op::RemoveIndex),
        1 => (any::<usize>(), 0usize..8).prop_map(|(s, n)| Op::EraseRange(s, n)),
        1 => (2u16..7).prop_map(Op::Retain),
        1 => (0usize..300).prop_map(Op::Rehash),
        1 => (0usize..300).prop_map(Op::Reserve),
        1 => Just(Op::Clear),
    ]
}

/// Collapses every hash onto one home bucket.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> ConstHasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0x5a
    }
}

fn run_ops<S: BuildHasher>(
    mut sut: DenseTable<u16, i32, S>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<u16, i32> = HashMap::new();
    for op in ops {
        match op {
            Op::Emplace(k, v) => {
                let (idx, inserted) = sut.emplace(k, v).map_err(|e| TestCaseError::fail(e.to_string()))?;
                prop_assert_eq!(inserted, !model.contains_key(&k));
                model.entry(k).or_insert(v);
                prop_assert_eq!(sut.get_index(idx).map(|(k, _)| *k), Some(k));
            }
            Op::Assign(k, v) => {
                let (_, old) = sut.insert_or_assign(k, v).map_err(|e| TestCaseError::fail(e.to_string()))?;
                prop_assert_eq!(old, model.insert(k, v));
                prop_assert_eq!(sut.at(&k), Ok(&v));
            }
            Op::Erase(k) => {
                let expected = usize::from(model.remove(&k).is_some());
                prop_assert_eq!(sut.erase(&k), expected);
                prop_assert_eq!(sut.find_index(&k), None);
                prop_assert_eq!(sut.at(&k), Err(Error::KeyNotFound));
            }
            Op::RemoveIndex(i) => {
                if sut.is_empty() {
                    prop_assert!(sut.remove_index(i).is_none());
                } else {
                    let i = i % sut.len();
                    let (k, v) = sut.remove_index(i).ok_or_else(|| TestCaseError::fail("index in range"))?;
                    prop_assert_eq!(model.remove(&k), Some(v));
                }
            }
            Op::EraseRange(start, n) => {
                let start = if sut.is_empty() { 0 } else { start % sut.len() };
                let end = (start + n).min(sut.len());
                let doomed: Vec<u16> = sut.as_slice()[start..end].iter().map(|e| e.0).collect();
                sut.erase_range(start..end);
                for k in doomed {
                    model.remove(&k);
                }
            }
            Op::Retain(m) => {
                let removed = sut.retain(|k, _| k % m != 0);
                let before = model.len();
                model.retain(|k, _| k % m != 0);
                prop_assert_eq!(removed, before - model.len());
            }
            Op::Rehash(n) => sut.rehash(n),
            Op::Reserve(n) => {
                sut.reserve(n);
                let cap = (sut.bucket_count() as f32 * sut.max_load_factor()) as usize;
                prop_assert!(cap >= sut.len() + n);
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
        }
        if let Err(v) = sut.check_invariants() {
            return Err(TestCaseError::fail(v.to_string()));
        }
        prop_assert_eq!(sut.len(), model.len());
        for (k, v) in &model {
            prop_assert_eq!(sut.get(k), Some(v));
            prop_assert_eq!(sut.count(k), 1);
        }
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - Each key has at most one slot; emplace never overwrites, assign does.
// - Erase (by key, index, range, predicate) keeps every other key findable.
// - Robin-hood ordering, fingerprints and bucket/value links stay
//   consistent after every step, growth and explicit rehash included.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_matches_hashmap(ops in proptest::collection::vec(arb_op(512), 1..200)) {
        let sut: DenseTable<u16, i32, DefaultHashBuilder> = DenseTable::new();
        run_ops(sut, ops)?;
    }

    #[test]
    fn prop_matches_hashmap_small_keys(ops in proptest::collection::vec(arb_op(16), 1..120)) {
        let sut: DenseTable<u16, i32, DefaultHashBuilder> = DenseTable::new();
        run_ops(sut, ops)?;
    }

    // Every key shares one probe chain; distances grow with the table.
    #[test]
    fn prop_constant_hasher(ops in proptest::collection::vec(arb_op(48), 1..80)) {
        let sut = DenseTable::with_hasher(ConstBuildHasher);
        run_ops(sut, ops)?;
    }
}
