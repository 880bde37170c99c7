#![cfg(test)]

// Property tests for RbTree: unique trees against BTreeMap, multi trees
// against a sorted Vec that keeps equal keys in insertion order.

use crate::compare::Natural;
use crate::rb_tree::{NodeId, RbTree};
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(u8, u32),
    Assign(u8, u32),
    HintInsert(usize, u8, u32),
    RemoveKey(u8),
    RemoveNth(usize),
    ExtractReinsert(u8, u8),
    PopFirst,
    PopLast,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        5 => (any::<u8>(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => (any::<u8>(), any::<u32>()).prop_map(|(k, v)| Op::Assign(k, v)),
        2 => (any::<usize>(), any::<u8>(), any::<u32>()).prop_map(|(h, k, v)| Op::HintInsert(h, k, v)),
        3 => any::<u8>().prop_map(Op::RemoveKey),
        3 => any::<usize>().prop_map(Op::RemoveNth),
        1 => (any::<u8>(), any::<u8>()).prop_map(|(a, b)| Op::ExtractReinsert(a, b)),
        1 => Just(Op::PopFirst),
        1 => Just(Op::PopLast),
    ]
}

/// Position `n` (mod len + 1) as a hint; the extra slot is the end.
fn nth_hint<const U: bool>(t: &RbTree<u8, u32, Natural, U>, n: usize) -> Option<NodeId> {
    let n = n % (t.len() + 1);
    let mut cur = t.first();
    for _ in 0..n {
        cur = cur.and_then(|id| t.next(id));
    }
    cur
}

fn check<const U: bool>(t: &RbTree<u8, u32, Natural, U>) -> Result<(), TestCaseError> {
    match t.check_invariants() {
        Ok(_) => Ok(()),
        Err(v) => Err(TestCaseError::fail(v.to_string())),
    }
}

// Property: unique tree equivalence against BTreeMap.
// Invariants exercised across random operation sequences:
// - Red-black coloring, black height, parent links and cached bounds hold
//   after every insert and erase.
// - In-order iteration equals the model in both directions.
// - Hinted inserts behave like plain inserts whether the hint fits or not.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_unique_matches_btreemap(ops in proptest::collection::vec(arb_op(), 1..200)) {
        let mut sut: RbTree<u8, u32> = RbTree::new();
        let mut model: BTreeMap<u8, u32> = BTreeMap::new();
        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    let (id, inserted) = sut.insert(k, v);
                    prop_assert_eq!(inserted, !model.contains_key(&k));
                    model.entry(k).or_insert(v);
                    prop_assert_eq!(sut.get(id), Some((&k, &model[&k])));
                }
                Op::Assign(k, v) => {
                    let (_, old) = sut.insert_or_assign(k, v);
                    prop_assert_eq!(old, model.insert(k, v));
                }
                Op::HintInsert(h, k, v) => {
                    let hint = nth_hint(&sut, h);
                    let (_, inserted) = sut.insert_with_hint(hint, k, v);
                    prop_assert_eq!(inserted, !model.contains_key(&k));
                    model.entry(k).or_insert(v);
                }
                Op::RemoveKey(k) => {
                    let expected = usize::from(model.remove(&k).is_some());
                    prop_assert_eq!(sut.remove_key(&k), expected);
                    prop_assert!(sut.find(&k).is_none());
                }
                Op::RemoveNth(n) => {
                    if let Some(id) = nth_hint(&sut, n) {
                        let (k, v) = sut.remove(id).ok_or_else(|| TestCaseError::fail("live id"))?;
                        prop_assert_eq!(model.remove(&k), Some(v));
                        prop_assert!(sut.get(id).is_none());
                    }
                }
                Op::ExtractReinsert(a, b) => {
                    if let Some(mut node) = sut.extract_key(&a) {
                        let v = model.remove(&a).ok_or_else(|| TestCaseError::fail("model key"))?;
                        *node.key_mut() = b;
                        let ret = sut.insert_node(node);
                        prop_assert_eq!(ret.inserted, !model.contains_key(&b));
                        prop_assert_eq!(ret.node.is_some(), !ret.inserted);
                        if ret.inserted {
                            model.insert(b, v);
                        }
                    }
                }
                Op::PopFirst => {
                    let expected = model.pop_first();
                    prop_assert_eq!(sut.pop_first(), expected);
                }
                Op::PopLast => {
                    let expected = model.pop_last();
                    prop_assert_eq!(sut.pop_last(), expected);
                }
            }
            check(&sut)?;
            prop_assert_eq!(sut.len(), model.len());
            prop_assert!(sut.iter().eq(model.iter()));
            prop_assert!(sut.iter().rev().eq(model.iter().rev()));
        }
    }

    // Multi trees keep every insert; equal keys stay in insertion order.
    #[test]
    fn prop_multi_matches_sorted_vec(ops in proptest::collection::vec(arb_op(), 1..200)) {
        let mut sut: RbTree<u8, u32, Natural, false> = RbTree::new();
        let mut model: Vec<(u8, u32)> = Vec::new();
        let insert_model = |model: &mut Vec<(u8, u32)>, k: u8, v: u32| {
            let at = model.partition_point(|(mk, _)| *mk <= k);
            model.insert(at, (k, v));
        };
        for op in ops {
            match op {
                Op::Insert(k, v) | Op::Assign(k, v) => {
                    let (id, inserted) = sut.insert(k, v);
                    prop_assert!(inserted);
                    if let Some((next_key, _)) = sut.next(id).and_then(|n| sut.get(n)) {
                        prop_assert!(*next_key > k, "new entry goes after equal keys");
                    }
                    insert_model(&mut model, k, v);
                }
                Op::HintInsert(_, k, v) => {
                    // a hint may land anywhere among equal keys, so use the end
                    sut.insert_with_hint(None, k, v);
                    insert_model(&mut model, k, v);
                }
                Op::RemoveKey(k) => {
                    let before = model.len();
                    model.retain(|(mk, _)| *mk != k);
                    prop_assert_eq!(sut.remove_key(&k), before - model.len());
                }
                Op::RemoveNth(n) => {
                    if let Some(id) = nth_hint(&sut, n) {
                        let removed = sut.remove(id).ok_or_else(|| TestCaseError::fail("live id"))?;
                        let at = n % (model.len() + 1);
                        prop_assert_eq!(model.remove(at), removed);
                    }
                }
                Op::ExtractReinsert(a, b) => {
                    if let Some(mut node) = sut.extract_key(&a) {
                        let at = model.partition_point(|(mk, _)| *mk < a);
                        let (_, v) = model.remove(at);
                        prop_assert_eq!(*node.value(), v);
                        *node.key_mut() = b;
                        prop_assert!(sut.insert_node(node).inserted);
                        insert_model(&mut model, b, v);
                    }
                }
                Op::PopFirst => {
                    let expected = (!model.is_empty()).then(|| model.remove(0));
                    prop_assert_eq!(sut.pop_first(), expected);
                }
                Op::PopLast => {
                    prop_assert_eq!(sut.pop_last(), model.pop());
                }
            }
            check(&sut)?;
            prop_assert_eq!(sut.len(), model.len());
            prop_assert!(sut.iter().map(|(k, v)| (*k, *v)).eq(model.iter().copied()));
            if let Some(&(k, _)) = model.first() {
                prop_assert_eq!(sut.count(&k), model.iter().filter(|(mk, _)| *mk == k).count());
            }
        }
    }
}
