use assoc_engine::{TreeMap, TreeMultiSet};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn filled(seed: u64, n: usize) -> TreeMap<u64, u64> {
    lcg(seed).take(n).enumerate().map(|(i, x)| (x, i as u64)).collect()
}

fn bench_insert_random_100k(c: &mut Criterion) {
    c.bench_function("tree::insert_random_100k", |b| {
        b.iter_batched(
            TreeMap::<u64, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    m.insert(x, i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_sorted_hinted_100k(c: &mut Criterion) {
    c.bench_function("tree::insert_sorted_hinted_100k", |b| {
        b.iter_batched(
            TreeMap::<u64, u64>::new,
            |mut m| {
                // appending at the end makes the end hint always correct
                for i in 0..100_000u64 {
                    m.insert_with_hint(None, i, i);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_find_hit_10k(c: &mut Criterion) {
    let m = filled(5, 100_000);
    let probes: Vec<u64> = lcg(5).take(10_000).collect();
    c.bench_function("tree::find_hit_10k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for k in &probes {
                sum = sum.wrapping_add(*m.get(k).unwrap_or(&0));
            }
            black_box(sum)
        })
    });
}

fn bench_lower_bound_10k(c: &mut Criterion) {
    let m = filled(5, 100_000);
    let probes: Vec<u64> = lcg(77).take(10_000).collect();
    c.bench_function("tree::lower_bound_10k", |b| {
        b.iter(|| {
            let found = probes.iter().filter_map(|k| m.lower_bound(k)).count();
            black_box(found)
        })
    });
}

fn bench_remove_10k(c: &mut Criterion) {
    c.bench_function("tree::remove_10k_of_100k", |b| {
        b.iter_batched(
            || {
                let m = filled(9, 100_000);
                let doomed: Vec<u64> = lcg(9).step_by(10).take(10_000).collect();
                (m, doomed)
            },
            |(mut m, doomed)| {
                for k in &doomed {
                    let _ = m.remove(k);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_iterate(c: &mut Criterion) {
    let m = filled(13, 100_000);
    c.bench_function("tree::iter_100k", |b| {
        b.iter(|| black_box(m.values().fold(0u64, |acc, v| acc.wrapping_add(*v))))
    });
}

fn bench_multiset_repeats(c: &mut Criterion) {
    c.bench_function("tree_multi::insert_repeats_100k", |b| {
        b.iter_batched(
            TreeMultiSet::<u64>::new,
            |mut s| {
                for x in lcg(21).take(100_000) {
                    s.insert(x % 1024);
                }
                black_box(s)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_insert;
    config = bench_config();
    targets = bench_insert_random_100k, bench_insert_sorted_hinted_100k, bench_multiset_repeats
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_find_hit_10k,
              bench_lower_bound_10k,
              bench_remove_10k,
              bench_iterate
}
criterion_main!(benches_insert, benches_ops);
