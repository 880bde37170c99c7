use assoc_engine::{DenseMap, DenseTable, Error, TableConfig};
use hashbrown::hash_map::DefaultHashBuilder;

#[test]
fn insert_assign_and_at() {
    let mut m = DenseMap::new();
    assert_eq!(m.insert("k".to_string(), 1), None);
    assert_eq!(m.insert("k".to_string(), 2), Some(1));
    assert_eq!(m.at("k"), Ok(&2));
    assert_eq!(m.at("missing"), Err(Error::KeyNotFound));
    assert!(!m.emplace("k".to_string(), 3));
    assert_eq!(m["k"], 2);
}

#[test]
fn iteration_follows_insertion_until_erase() {
    let mut m: DenseMap<u32, char> = DenseMap::new();
    for (i, c) in "abcde".chars().enumerate() {
        m.insert(i as u32, c);
    }
    assert_eq!(m.values().collect::<String>(), "abcde");
    // erase swaps the last entry into the hole
    assert_eq!(m.remove(&1), Some('b'));
    assert_eq!(m.values().collect::<String>(), "aecd");
    assert_eq!(m.find_index(&4), Some(1));
    m.check_invariants().unwrap();
}

#[test]
fn equal_range_is_empty_or_single() {
    let m: DenseMap<u8, u8> = [(1, 10), (2, 20)].into_iter().collect();
    let r = m.equal_range(&2);
    assert_eq!(r.len(), 1);
    assert_eq!(m.get_index(r.start), Some((&2, &20)));
    let r = m.equal_range(&9);
    assert!(r.is_empty());
    assert_eq!(r.start, m.len());
}

#[test]
fn config_controls_buckets_and_load() {
    let cfg = TableConfig::new().bucket_count(100).max_load_factor(0.5);
    let mut m: DenseMap<u64, u64> = DenseMap::with_config(cfg, DefaultHashBuilder::default()).unwrap();
    assert_eq!(m.bucket_count(), 256);
    for i in 0..128 {
        m.insert(i, i);
    }
    assert_eq!(m.bucket_count(), 256);
    m.insert(128, 128);
    assert_eq!(m.bucket_count(), 512);
    assert!(m.load_factor() <= 0.5);

    let bad = TableConfig::new().max_load_factor(0.0);
    assert!(matches!(
        DenseMap::<u64, u64>::with_config(bad, DefaultHashBuilder::default()),
        Err(Error::InvalidLoadFactor(_))
    ));
}

#[test]
fn overflow_is_reported_and_rolled_back() {
    let mut m: DenseMap<u16, (), DefaultHashBuilder, u8> = DenseMap::default();
    for k in 0..256 {
        assert_eq!(m.try_insert(k, ()), Ok(None));
    }
    assert_eq!(DenseTable::<u16, (), DefaultHashBuilder, u8>::max_bucket_count(), 256);
    assert_eq!(m.try_insert(999, ()), Err(Error::BucketOverflow { max_buckets: 256 }));
    assert_eq!(m.len(), 256);
    assert!(!m.contains_key(&999));
    // overwriting an existing key needs no new bucket
    assert_eq!(m.try_insert(7, ()), Ok(Some(())));
    m.check_invariants().unwrap();
}

#[test]
#[should_panic(expected = "reached max bucket count")]
fn insert_panics_on_overflow() {
    let mut m: DenseMap<u16, (), DefaultHashBuilder, u8> = DenseMap::default();
    for k in 0..257 {
        m.insert(k, ());
    }
}

#[test]
fn swap_clear_and_entries() {
    let mut a: DenseMap<u8, u8> = [(1, 1)].into_iter().collect();
    let mut b: DenseMap<u8, u8> = [(2, 2), (3, 3)].into_iter().collect();
    a.swap(&mut b);
    assert_eq!(a.len(), 2);
    assert_eq!(b.into_entries(), vec![(1, 1)]);
    a.retain(|k, _| *k == 3);
    assert_eq!(a.iter().collect::<Vec<_>>(), vec![(&3, &3)]);
    a.clear();
    assert!(a.is_empty());
}

#[test]
fn replace_keeps_first_duplicate() {
    let mut m: DenseMap<&str, u8> = DenseMap::new();
    m.replace(vec![("x", 1), ("y", 2), ("x", 3)]).unwrap();
    assert_eq!(m.len(), 2);
    assert_eq!(m["x"], 1);
    m.check_invariants().unwrap();
}
