//! Criterion benchmarks for fairml-reductions: grid sweep and exponentiated gradient.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use fairml_data::{Column, FeatureMatrix, Grouping};
use fairml_gbdt::GradientBoostingConfig;
use fairml_reductions::{
    ExponentiatedGradientConfig, GridSearchConfig, ParityKind, UtilityParity, coefficient_grid,
};

fn make_population(n_samples: usize, seed: u64) -> (FeatureMatrix, Vec<usize>, Grouping) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    let mut groups = Vec::with_capacity(n_samples);
    for _ in 0..n_samples {
        let group = usize::from(rng.r#gen::<f64>() < 0.4);
        let row: Vec<f64> = (0..8).map(|_| rng.r#gen::<f64>()).collect();
        let p = 0.2 + 0.5 * row[0] + if group == 1 { 0.2 } else { 0.0 };
        labels.push(usize::from(rng.r#gen::<f64>() < p));
        rows.push(row);
        groups.push(if group == 1 { "b" } else { "a" });
    }
    let names = (0..8).map(|f| format!("f{f}")).collect();
    let x = FeatureMatrix::new(names, rows).unwrap();
    (x, labels, Grouping::from_column("group", &Column::categorical(groups)))
}

fn bench_coefficient_grid(c: &mut Criterion) {
    c.bench_function("coefficient_grid_dim3_71", |b| {
        b.iter(|| coefficient_grid(3, 71, 2.0));
    });
}

fn bench_grid_search(c: &mut Criterion) {
    let (x, y, g) = make_population(500, 42);
    let dp = UtilityParity::load(ParityKind::DemographicParity, 0.01, &y, &g, None).unwrap();
    let estimator = GradientBoostingConfig::new(20).unwrap();
    let cfg = GridSearchConfig::new(21).unwrap();

    c.bench_function("grid_search_500x8_21points", |b| {
        b.iter(|| cfg.fit(&estimator, &dp, &x, &y).unwrap());
    });
}

fn bench_exponentiated_gradient(c: &mut Criterion) {
    let (x, y, g) = make_population(500, 42);
    let dp = UtilityParity::load(ParityKind::DemographicParity, 0.01, &y, &g, None).unwrap();
    let estimator = GradientBoostingConfig::new(20).unwrap();
    let cfg = ExponentiatedGradientConfig::new().with_max_iter(10);

    c.bench_function("expgrad_500x8_10iter", |b| {
        b.iter(|| cfg.fit(&estimator, &dp, &x, &y).unwrap());
    });
}

criterion_group!(
    benches,
    bench_coefficient_grid,
    bench_grid_search,
    bench_exponentiated_gradient
);
criterion_main!(benches);
