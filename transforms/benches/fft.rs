use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use transforms::{Complex, FourierPlans, TransformRegistry};

pub fn bench_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_forward");

    fn runner(n: usize) -> impl FnMut() {
        let plans = TransformRegistry::global().acquire([n, n], false);
        let physical: Vec<f64> = (0..n * n).map(|i| (i + 1) as f64 / (n * n) as f64).collect();
        let mut spectral: Vec<Complex<f64>> = vec![Complex::new(0.0, 0.0); plans.spectral_len()];
        move || {
            plans.forward(&physical, &mut spectral);
            black_box(());
        }
    }

    for log_n in [5, 6, 7, 8, 9] {
        let n: usize = 1 << log_n;
        let id: BenchmarkId = BenchmarkId::from_parameter(format!("res: {n}x{n}"));
        let mut runner = runner(n);
        group.bench_with_input(id, &(), |b, _| b.iter(&mut runner));
    }

    group.finish();
}

pub fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_round_trip");

    fn runner(n: usize) -> impl FnMut() {
        let plans: std::sync::Arc<FourierPlans> = TransformRegistry::global().acquire([n, n], false);
        let mut physical: Vec<f64> = (0..n * n).map(|i| (i % 17) as f64).collect();
        let mut spectral: Vec<Complex<f64>> = vec![Complex::new(0.0, 0.0); plans.spectral_len()];
        move || {
            plans.forward(&physical, &mut spectral);
            plans.backward(&mut spectral, &mut physical);
            black_box(());
        }
    }

    for log_n in [5, 6, 7, 8] {
        let n: usize = 1 << log_n;
        let id: BenchmarkId = BenchmarkId::from_parameter(format!("res: {n}x{n}"));
        let mut runner = runner(n);
        group.bench_with_input(id, &(), |b, _| b.iter(&mut runner));
    }

    group.finish();
}

criterion_group!(benches, bench_forward, bench_round_trip);
criterion_main!(benches);
