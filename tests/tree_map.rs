use assoc_engine::{Error, RbTree, Reversed, TreeMap, TreeMultiMap};

#[test]
fn insert_assigns_emplace_keeps() {
    let mut m = TreeMap::new();
    assert_eq!(m.insert(2, "b"), None);
    assert_eq!(m.insert(2, "B"), Some("b"));
    assert!(!m.emplace(2, "x"));
    assert!(m.emplace(1, "a"));
    assert_eq!(m.at(&2), Ok(&"B"));
    assert_eq!(m.at(&9), Err(Error::KeyNotFound));
    assert_eq!(m.iter().collect::<Vec<_>>(), vec![(&1, &"a"), (&2, &"B")]);
    m.check_invariants().unwrap();
}

#[test]
fn bounds_and_cursor_walk() {
    let m: TreeMap<u32, u32> = (0..50).map(|i| (i * 2, i)).collect();
    let lb = m.lower_bound(&7).unwrap();
    assert_eq!(m.node(lb), Some((&8, &4)));
    let ub = m.upper_bound(&8).unwrap();
    assert_eq!(m.node(ub), Some((&10, &5)));
    assert!(m.lower_bound(&99).is_none());

    let mut c = m.cursor_end();
    assert!(c.is_end());
    c.move_prev();
    assert_eq!(c.key(), Some(&98));
    c.move_next();
    assert!(c.is_end());
}

#[test]
fn remove_at_keeps_other_ids() {
    let mut m = TreeMap::new();
    let ids: Vec<_> = (0..20)
        .map(|i| m.insert_with_hint(None, i, i * 10).0)
        .collect();
    for id in ids.iter().step_by(3) {
        assert!(m.remove_at(*id).is_some());
    }
    for (i, id) in ids.iter().enumerate() {
        if i % 3 == 0 {
            assert!(m.node(*id).is_none());
        } else {
            assert_eq!(m.node(*id), Some((&i, &(i * 10))));
        }
    }
    m.check_invariants().unwrap();
}

#[test]
fn multimap_keeps_insertion_order_of_equal_keys() {
    let mut m = TreeMultiMap::new();
    m.insert("k", 1);
    m.insert("a", 0);
    m.insert("k", 2);
    m.insert("k", 3);
    assert_eq!(m.count("k"), 3);
    assert_eq!(m.get("k"), Some(&1));
    assert_eq!(m.range_of("k").map(|(_, v)| *v).collect::<Vec<_>>(), vec![1, 2, 3]);
    *m.get_mut("k").unwrap() = 10;
    assert_eq!(m.get("k"), Some(&10));
    assert_eq!(m.remove("k"), 3);
    assert_eq!(m.len(), 1);
    m.check_invariants().unwrap();
}

#[test]
fn extract_moves_node_between_maps() {
    let mut a: TreeMap<String, u8> = TreeMap::new();
    a.insert("one".to_string(), 1);
    let mut node = a.extract("one").unwrap();
    *node.value_mut() = 11;
    let mut b: TreeMap<String, u8> = TreeMap::new();
    let ret = b.insert_node(node);
    assert!(ret.inserted);
    assert!(a.is_empty());
    assert_eq!(b["one"], 11);
}

#[test]
fn reversed_comparator() {
    let mut m: TreeMap<i32, (), Reversed> = TreeMap::default();
    for k in [4, 1, 3] {
        m.insert(k, ());
    }
    assert_eq!(m.keys().copied().collect::<Vec<_>>(), vec![4, 3, 1]);
    assert_eq!(m.first_key_value(), Some((&4, &())));
}

#[test]
fn engine_cursor_and_hinted_node_insert() {
    let mut t: RbTree<u32, char> = RbTree::new();
    let (b, _) = t.insert(2, 'b');
    let (d, _) = t.insert(4, 'd');
    let mut c = t.cursor_back();
    assert_eq!(c.key(), Some(&4));
    c.move_next();
    assert!(c.is_end());

    // rekeyed to 3, the end hint still fits
    let mut node = t.extract(d).unwrap();
    assert!(!t.contains_id(d));
    *node.key_mut() = 3;
    let ret = t.insert_node_with_hint(None, node);
    assert!(ret.inserted);
    assert!(t.contains_id(ret.position));
    assert_eq!(t.prev(ret.position), Some(b));

    let dup = t.extract(b).map(|mut n| {
        *n.key_mut() = 3;
        n
    });
    let ret = t.insert_node_with_hint(t.first(), dup.unwrap());
    assert!(!ret.inserted);
    assert_eq!(ret.node.map(|n| n.into_parts()), Some((3, 'b')));
    assert_eq!(t.len(), 1);
    t.check_invariants().unwrap();
}
