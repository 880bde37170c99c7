use assoc_engine::{DenseMap, TableConfig, TreeMap};
use hashbrown::hash_map::DefaultHashBuilder;

#[test]
fn dense_erase_every_seventh_key() {
    let mut m: DenseMap<u32, u32> = DenseMap::new();
    for k in 1..=1000 {
        m.insert(k, k * 3);
    }
    assert_eq!(m.len(), 1000);
    let mut erased = 0;
    for k in (0..=1000).step_by(7) {
        if m.remove(&k).is_some() {
            erased += 1;
        }
    }
    assert_eq!(erased, 142);
    assert_eq!(m.len(), 1000 - erased);
    for k in 1..=1000 {
        if k % 7 == 0 {
            assert!(m.get(&k).is_none(), "{k} should be gone");
        } else {
            assert_eq!(m.get(&k), Some(&(k * 3)));
        }
    }
    m.check_invariants().unwrap();
}

#[test]
fn tree_traversal_both_directions() {
    let mut m = TreeMap::new();
    for k in (1..=1000u32).rev() {
        m.insert(k, ());
    }
    let forward: Vec<u32> = m.keys().copied().collect();
    assert_eq!(forward.len(), 1000);
    assert!(forward.windows(2).all(|w| w[0] < w[1]));

    // from end, stepping back reaches the last key, then walks to the first
    // and past it to end again
    let mut c = m.cursor_end();
    let mut backward = Vec::new();
    c.move_prev();
    while let Some(k) = c.key() {
        backward.push(*k);
        c.move_prev();
    }
    assert!(c.is_end());
    assert_eq!(backward.len(), 1000);
    assert_eq!(backward.first(), Some(&1000));
    assert_eq!(backward.last(), Some(&1));
    assert!(backward.windows(2).all(|w| w[0] > w[1]));
    m.check_invariants().unwrap();
}

#[test]
fn zero_buckets_grow_on_first_insert() {
    let cfg = TableConfig::new().bucket_count(0);
    let mut m: DenseMap<&str, i32> = DenseMap::with_config(cfg, DefaultHashBuilder::default()).unwrap();
    assert_eq!(m.bucket_count(), 0);
    m.insert("only", 1);
    assert!(m.bucket_count() > 0);
    assert_eq!(m.get("only"), Some(&1));
}
