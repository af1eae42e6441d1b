//! Criterion benchmarks for the seating planner.
//!
//! Uses synthetic events of growing size: families of four split over
//! tables of four, a couple per family and a feud between neighbours.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use u_seating::cp::SolverConfig;
use u_seating::seating::{ConstraintEncoder, IntegerEncoder, SeatingModel};
use u_seating::{EventData, PlannerConfig, SeatingPlanner};

// ===========================================================================
// Synthetic events
// ===========================================================================

/// `families` groups of four over `families` tables of four; each family
/// sits as two halves at two tables.
fn reunion(families: usize) -> EventData {
    let persons = families * 4;
    let mut data = EventData::unnamed(persons, vec![4; families]);
    for f in 0..families {
        let base = f * 4;
        data = data
            .with_group(format!("family-{f}"), (base..base + 4).collect())
            .with_couple(base, base + 1);
        if f + 1 < families {
            data = data.with_enemy(base + 3, base + 4);
        }
    }
    data
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.sample_size(10);

    for &families in &[4usize, 16, 64] {
        let model = SeatingModel::new(&reunion(families)).expect("valid event");
        group.bench_with_input(BenchmarkId::from_parameter(families * 4), &model, |b, m| {
            b.iter(|| black_box(IntegerEncoder.encode(black_box(m))))
        });
    }
    group.finish();
}

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve");
    group.sample_size(10);

    for &families in &[2usize, 4, 8] {
        let data = reunion(families);
        for backend in ["backtrack", "tabu"] {
            let planner = SeatingPlanner::new(
                PlannerConfig::new()
                    .with_solver(backend)
                    .with_search(SolverConfig::default().with_seed(42).with_time_limit_ms(5_000)),
            );
            group.bench_with_input(
                BenchmarkId::new(backend, families * 4),
                &(planner, data.clone()),
                |b, (p, d)| {
                    b.iter(|| {
                        let result = p.solve(black_box(d));
                        black_box(result)
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_solve);
criterion_main!(benches);
