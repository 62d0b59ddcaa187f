use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use tl_instruments::{MarketConditions, OptionContract, OptionType};
use tl_methods::{Lattice, LatticeParameters};
use tl_time::ymd;

fn parameters(steps: usize) -> LatticeParameters {
    let market = MarketConditions::new(0.04, 0.25, 100.0, 2.0, ymd(2024, 3, 15).unwrap());
    LatticeParameters::new(
        market,
        ymd(2023, 9, 20).unwrap(),
        ymd(2024, 9, 19).unwrap(),
        steps,
    )
    .expect("benchmark parameters should be valid")
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("lattice_build");
    for steps in [100usize, 500, 1000] {
        let params = parameters(steps);
        group.bench_with_input(BenchmarkId::from_parameter(steps), &params, |b, p| {
            b.iter(|| black_box(Lattice::build(*p).expect("lattice should build")))
        });
    }
    group.finish();
}

fn bench_american_put(c: &mut Criterion) {
    let put = OptionContract::american(OptionType::Put, 102.0, ymd(2024, 9, 19).unwrap());
    let mut group = c.benchmark_group("lattice_american_put");
    for steps in [100usize, 500, 1000] {
        let params = parameters(steps);
        group.bench_with_input(BenchmarkId::from_parameter(steps), &params, |b, p| {
            b.iter(|| {
                let lattice = Lattice::build(*p).expect("lattice should build");
                black_box(lattice.into_value(black_box(&put)).expect("valuation should succeed"))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build, bench_american_put);
criterion_main!(benches);
