//! Criterion benchmarks for fairml-gbdt: boosting training and prediction.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use fairml_gbdt::GradientBoostingConfig;

fn make_classification(
    n_samples: usize,
    n_features: usize,
    seed: u64,
) -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let label = i % 2;
        labels.push(label);
        let row: Vec<f64> = (0..n_features)
            .map(|f| {
                let base = if f < 3 { label as f64 * 1.5 } else { 0.0 };
                base + rng.r#gen::<f64>() * 2.0
            })
            .collect();
        features.push(row);
    }
    let names: Vec<String> = (0..n_features).map(|f| format!("f{f}")).collect();
    (features, labels, names)
}

fn bench_gbdt_train(c: &mut Criterion) {
    let (features, labels, names) = make_classification(1000, 20, 42);
    let cfg = GradientBoostingConfig::new(50).unwrap();

    c.bench_function("gbdt_train_1000x20_50rounds", |b| {
        b.iter(|| cfg.fit(&features, &labels, None, &names).unwrap());
    });
}

fn bench_gbdt_train_weighted(c: &mut Criterion) {
    let (features, labels, names) = make_classification(1000, 20, 42);
    let weights: Vec<f64> = (0..features.len()).map(|i| (i % 5) as f64 * 0.5).collect();
    let cfg = GradientBoostingConfig::new(50).unwrap();

    c.bench_function("gbdt_train_weighted_1000x20_50rounds", |b| {
        b.iter(|| cfg.fit(&features, &labels, Some(&weights), &names).unwrap());
    });
}

fn bench_gbdt_predict_batch(c: &mut Criterion) {
    let (features, labels, names) = make_classification(1000, 20, 42);
    let cfg = GradientBoostingConfig::new(50).unwrap();
    let model = cfg.fit(&features, &labels, None, &names).unwrap().into_model();

    c.bench_function("gbdt_predict_batch_1000x20_50rounds", |b| {
        b.iter(|| model.predict_batch(&features).unwrap());
    });
}

criterion_group!(
    benches,
    bench_gbdt_train,
    bench_gbdt_train_weighted,
    bench_gbdt_predict_batch
);
criterion_main!(benches);
