//! Benchmarks for potential operations
//!
//! This benchmark suite measures the performance of the core operators:
//! - Product (combining tables)
//! - Fused sum-out and max-out
//! - Sequential versus rayon-parallel fused elimination
//! - Division, normalization and reordering

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use discrete_potentials::{algebra, parallel, PotentialRole, TablePotential, Variable};
use std::hint::black_box;

/// Variables `prefix0..prefixN`, each with `card` states
fn variables(prefix: &str, count: usize, card: usize) -> Vec<Variable> {
    (0..count)
        .map(|i| Variable::with_num_states(format!("{}{}", prefix, i), card))
        .collect()
}

/// Create a table with deterministic positive values
fn create_table(vars: Vec<Variable>, role: PotentialRole) -> TablePotential {
    let size: usize = vars.iter().map(Variable::num_states).product();
    let values: Vec<f64> = (0..size).map(|i| ((i % 97) as f64 + 1.0) / 97.0).collect();
    TablePotential::from_values(vars, role, values).unwrap()
}

/// A chain of pairwise tables x0-x1, x1-x2, ...
fn create_chain(length: usize, card: usize) -> (Vec<Variable>, Vec<TablePotential>) {
    let vars = variables("x", length, card);
    let tables = vars
        .windows(2)
        .map(|pair| create_table(pair.to_vec(), PotentialRole::JointProbability))
        .collect();
    (vars, tables)
}

/// Benchmark product operations
fn bench_multiply(c: &mut Criterion) {
    let mut group = c.benchmark_group("multiply");

    for card in [2, 5, 10, 20] {
        let (_, tables) = create_chain(4, card);
        let output = card.pow(4) as u64;

        group.throughput(Throughput::Elements(output));
        group.bench_with_input(BenchmarkId::new("chain4", card), &tables, |b, tables| {
            b.iter(|| {
                black_box(algebra::multiply(black_box(tables)));
            });
        });
    }

    group.finish();
}

/// Benchmark fused multiply-and-marginalize
fn bench_multiply_and_marginalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("multiply_and_marginalize");

    for card in [2, 5, 10, 20] {
        let (vars, tables) = create_chain(4, card);
        let keep = vec![vars[0].clone(), vars[3].clone()];
        let eliminate = vec![vars[1].clone(), vars[2].clone()];

        group.throughput(Throughput::Elements(card.pow(4) as u64));
        group.bench_with_input(BenchmarkId::new("fused", card), &tables, |b, tables| {
            b.iter(|| {
                black_box(
                    algebra::multiply_and_marginalize(tables, &keep, &eliminate).unwrap(),
                );
            });
        });

        group.bench_with_input(BenchmarkId::new("two_step", card), &tables, |b, tables| {
            b.iter(|| {
                let product = algebra::multiply(tables);
                black_box(algebra::marginalize(&product, &keep).unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark max-out with tie recording and the uniform policy form
fn bench_maximize(c: &mut Criterion) {
    let mut group = c.benchmark_group("maximize");

    for card in [5, 10, 20] {
        let vars = variables("d", 3, card);
        let utility = create_table(vars.clone(), PotentialRole::Utility);
        let keep = vec![vars[1].clone(), vars[2].clone()];

        group.throughput(Throughput::Elements(card.pow(3) as u64));
        group.bench_with_input(BenchmarkId::new("choices", card), &utility, |b, u| {
            b.iter(|| {
                black_box(algebra::multiply_and_maximize(&[u], &keep, &vars[0], 1e-5).unwrap());
            });
        });

        group.bench_with_input(BenchmarkId::new("uniform_policy", card), &utility, |b, u| {
            b.iter(|| {
                black_box(
                    algebra::multiply_and_maximize_uniformly(&[u], &keep, &vars[0], 1e-5)
                        .unwrap(),
                );
            });
        });
    }

    group.finish();
}

/// Benchmark sequential versus parallel fused elimination
fn bench_parallel(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_vs_sequential");
    group.sample_size(20);

    for card in [8, 16, 24] {
        let (vars, tables) = create_chain(5, card);
        let keep = vec![vars[0].clone(), vars[2].clone(), vars[4].clone()];
        let eliminate = vec![vars[1].clone(), vars[3].clone()];

        group.throughput(Throughput::Elements(card.pow(5) as u64));
        group.bench_with_input(BenchmarkId::new("sequential", card), &tables, |b, tables| {
            b.iter(|| {
                black_box(
                    algebra::multiply_and_marginalize(tables, &keep, &eliminate).unwrap(),
                );
            });
        });

        group.bench_with_input(BenchmarkId::new("parallel", card), &tables, |b, tables| {
            b.iter(|| {
                black_box(
                    parallel::par_multiply_and_marginalize(tables, &keep, &eliminate).unwrap(),
                );
            });
        });
    }

    group.finish();
}

/// Benchmark division, normalization and reordering
fn bench_table_maintenance(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_maintenance");

    for card in [5, 10, 20] {
        let vars = variables("y", 3, card);
        let cpt = create_table(vars.clone(), PotentialRole::ConditionalProbability);
        let separator = create_table(vec![vars[1].clone()], PotentialRole::JointProbability);
        let reversed: Vec<Variable> = vars.iter().rev().cloned().collect();

        group.throughput(Throughput::Elements(card.pow(3) as u64));
        group.bench_with_input(BenchmarkId::new("divide", card), &cpt, |b, p| {
            b.iter(|| {
                black_box(algebra::divide(p, &separator));
            });
        });

        group.bench_with_input(BenchmarkId::new("normalize", card), &cpt, |b, p| {
            b.iter(|| {
                black_box(algebra::normalize(p).unwrap());
            });
        });

        group.bench_with_input(BenchmarkId::new("reorder", card), &cpt, |b, p| {
            b.iter(|| {
                black_box(algebra::reorder(p, &reversed).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_multiply,
    bench_multiply_and_marginalize,
    bench_maximize,
    bench_parallel,
    bench_table_maintenance
);
criterion_main!(benches);
