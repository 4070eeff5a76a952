// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};

use canopy_tree::{Tree, TreeOptions};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_i64(&mut self) -> i64 {
        self.next_u64() as i64
    }
}

fn gen_random_values(count: usize) -> Vec<i64> {
    let mut rng = Rng::new(0xC0FF_EE00_5EED_1234);
    (0..count).map(|_| rng.next_i64()).collect()
}

fn build_tree(values: &[i64], options: TreeOptions) -> Tree<i64> {
    let mut tree = Tree::new(options);
    for &v in values {
        tree.insert(v);
    }
    tree
}

fn bench_insert(c: &mut Criterion) {
    const N: usize = 1_000;
    let random = gen_random_values(N);
    let sorted: Vec<i64> = (0..N as i64).collect();

    let mut group = c.benchmark_group("insert_1k");
    group.throughput(Throughput::Elements(N as u64));

    group.bench_function("avl_random", |b| {
        b.iter_batched(
            || random.clone(),
            |values| black_box(build_tree(&values, TreeOptions::default())),
            BatchSize::SmallInput,
        );
    });
    group.bench_function("avl_sorted", |b| {
        b.iter_batched(
            || sorted.clone(),
            |values| black_box(build_tree(&values, TreeOptions::default())),
            BatchSize::SmallInput,
        );
    });
    group.bench_function("bst_random", |b| {
        b.iter_batched(
            || random.clone(),
            |values| black_box(build_tree(&values, TreeOptions::empty())),
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_find(c: &mut Criterion) {
    const N: usize = 1_000;
    let values = gen_random_values(N);
    let probes: Vec<i64> = values.iter().step_by(7).copied().collect();

    let mut group = c.benchmark_group("find");
    group.throughput(Throughput::Elements(probes.len() as u64));
    group.bench_function("avl_hits", |b| {
        // Stats series are append-only, so probe a fresh tree per batch
        // instead of letting one tree accumulate samples forever.
        b.iter_batched(
            || build_tree(&values, TreeOptions::default()),
            |mut tree| {
                for v in &probes {
                    black_box(tree.find(v).is_ok());
                }
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_delete(c: &mut Criterion) {
    const N: usize = 1_000;
    let values = gen_random_values(N);

    let mut group = c.benchmark_group("delete_1k");
    group.throughput(Throughput::Elements(N as u64));
    group.bench_function("avl_all", |b| {
        b.iter_batched(
            || build_tree(&values, TreeOptions::default()),
            |mut tree| {
                for v in &values {
                    let _ = tree.delete(v);
                }
                black_box(tree.is_empty())
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_find, bench_delete);
criterion_main!(benches);
