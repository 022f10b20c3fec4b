//! Benchmarks for the per-tick regulator paths
//!
//! Run with: cargo bench --bench regulators

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use regul_core::control::{Ibsc, IbscCoefficients, IbscConfig, Pid, PidConfig, Tumblers};
use regul_core::math::{mix, saturate, Differentiator, TrapezoidIntegrator};

const DT: f64 = 0.002; // 500Hz

fn ibsc_config() -> IbscConfig {
    IbscConfig::new(IbscCoefficients::new(2.0, 1.0, 1.0, 0.5), DT).with_saturation(10.0)
}

/// Benchmark IBSC compute
fn bench_ibsc_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("IBSC");

    group.bench_function("compute", |b| {
        let mut ibsc = Ibsc::new(ibsc_config()).unwrap();
        b.iter(|| black_box(ibsc.compute(black_box(1.0), 0.5, 0.1)))
    });

    group.bench_function("compute with power shaping", |b| {
        let mut ibsc = Ibsc::new(ibsc_config().with_power_shaping(1.5, 0.8)).unwrap();
        b.iter(|| black_box(ibsc.compute(black_box(1.0), 0.5, 0.1)))
    });

    group.bench_function("compute_from_error", |b| {
        let config = ibsc_config().with_tumblers(Tumblers {
            take_error_modulus: true,
            ..Default::default()
        });
        let mut ibsc = Ibsc::new(config).unwrap();
        b.iter(|| black_box(ibsc.compute_from_error(black_box(0.5), 1.0, 0.1)))
    });

    group.finish();
}

/// Benchmark PID compute
fn bench_pid_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("PID");

    group.bench_function("P compute", |b| {
        let mut pid = Pid::new(PidConfig::p(10.0, DT, 100.0)).unwrap();
        b.iter(|| black_box(pid.compute(black_box(0.5), None)))
    });

    group.bench_function("PID compute", |b| {
        let config = PidConfig::new(10.0, 1.0, 0.5, DT, 100.0).with_integral_saturation(50.0);
        let mut pid = Pid::new(config).unwrap();
        b.iter(|| black_box(pid.compute(black_box(0.5), None)))
    });

    group.bench_function("PID compute with precomputed derivative", |b| {
        let config = PidConfig::new(10.0, 1.0, 0.5, DT, 100.0).with_integral_saturation(50.0);
        let mut pid = Pid::new(config).unwrap();
        b.iter(|| black_box(pid.compute(black_box(0.5), Some(0.2))))
    });

    group.finish();
}

/// Benchmark regulators over sequences of ticks
fn bench_tick_sequence(c: &mut Criterion) {
    let mut group = c.benchmark_group("Tick Sequence");

    for n in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("ibsc", n), n, |b, &n| {
            let mut ibsc = Ibsc::new(ibsc_config()).unwrap();

            b.iter(|| {
                for i in 0..n {
                    // Simulate a decaying error
                    let desired = 1.0;
                    let position = desired * (1.0 - (-0.1 * i as f64).exp());
                    black_box(ibsc.compute(desired, position, 0.0));
                }
                ibsc.reset();
            })
        });

        group.bench_with_input(BenchmarkId::new("pid", n), n, |b, &n| {
            let mut pid = Pid::new(PidConfig::new(10.0, 1.0, 0.5, DT, 100.0)).unwrap();

            b.iter(|| {
                for i in 0..n {
                    let error = (-0.1 * i as f64).exp();
                    black_box(pid.compute(error, None));
                }
                pid.reset();
            })
        });
    }

    group.finish();
}

/// Benchmark the shared primitives
fn bench_primitives(c: &mut Criterion) {
    let mut group = c.benchmark_group("Primitives");

    group.bench_function("saturate", |b| {
        b.iter(|| black_box(saturate(black_box(12.5), black_box(10.0))))
    });

    group.bench_function("mix", |b| {
        b.iter(|| black_box(mix(black_box(1.0), black_box(2.0), black_box(0.3))))
    });

    group.bench_function("differentiate", |b| {
        let mut diff = Differentiator::new(DT).unwrap();
        b.iter(|| black_box(diff.differentiate(black_box(0.7))))
    });

    group.bench_function("integrate", |b| {
        let mut integ = TrapezoidIntegrator::new(DT, true, 100.0).unwrap();
        b.iter(|| black_box(integ.integrate(black_box(0.7))))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_ibsc_compute,
    bench_pid_compute,
    bench_tick_sequence,
    bench_primitives,
);
criterion_main!(benches);
