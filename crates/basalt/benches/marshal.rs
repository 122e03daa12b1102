//! Marshaling throughput against the in-process backend.

use basalt::{Basalt, Env, Term};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn keep_set<'e>(env: &'e Env, n: usize) -> Vec<Term<'e>> {
    let ty = env.bool_type().unwrap();
    (0..n)
        .map(|i| {
            let decl = env.declare(&format!("p{}", i), ty).unwrap();
            env.make_constant(decl).unwrap()
        })
        .collect()
}

fn bench_sequence_marshal(c: &mut Criterion) {
    let basalt = Basalt::stub();
    let config = basalt.config().unwrap();
    let env = basalt.env(&config).unwrap();
    let terms = keep_set(&env, 1024);

    c.bench_function("gc_keep_set_1024", |b| {
        b.iter(|| env.gc(black_box(&terms)).unwrap())
    });

    c.bench_function("gc_keep_set_empty", |b| {
        b.iter(|| env.gc(black_box(&[])).unwrap())
    });
}

fn bench_term_construction(c: &mut Criterion) {
    let basalt = Basalt::stub();
    let config = basalt.config().unwrap();
    let env = basalt.env(&config).unwrap();
    let terms = keep_set(&env, 2);

    c.bench_function("make_and_chain_64", |b| {
        b.iter(|| {
            let mut acc = terms[0];
            for _ in 0..64 {
                acc = env.make_and(acc, terms[1]).unwrap();
            }
            black_box(acc)
        })
    });
}

criterion_group!(benches, bench_sequence_marshal, bench_term_construction);
criterion_main!(benches);
