//! Integration tests for the dominance filter and the reductions that feed it.

use fairml_data::{Column, FeatureMatrix, Grouping};
use fairml_gbdt::GradientBoostingConfig;
use fairml_reductions::{
    Constraint, ErrorDisparity, ErrorRate, ExponentiatedGradientConfig, GridSearchConfig,
    ParityKind, Predictor, UtilityParity, non_dominated,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn points(values: &[(f64, f64)]) -> Vec<ErrorDisparity> {
    values
        .iter()
        .map(|&(error, disparity)| ErrorDisparity { error, disparity })
        .collect()
}

/// Reference rule: `p` survives unless some `q` has `q.disparity <= p.disparity`
/// and `q.error < p.error`.
fn brute_force(candidates: &[ErrorDisparity]) -> Vec<usize> {
    (0..candidates.len())
        .filter(|&i| {
            let p = candidates[i];
            !candidates
                .iter()
                .any(|q| q.disparity <= p.disparity && q.error < p.error)
        })
        .collect()
}

/// Noisy labels: the positive rate rises with the score and is higher in group `b`.
fn noisy_population(n: usize, seed: u64) -> (FeatureMatrix, Vec<usize>, Grouping) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    let mut groups = Vec::with_capacity(n);
    for _ in 0..n {
        let group = usize::from(rng.r#gen::<f64>() < 0.5);
        let score = (rng.r#gen::<f64>() * 5.0).floor();
        let p = 0.1 + 0.1 * score + if group == 1 { 0.35 } else { 0.0 };
        rows.push(vec![group as f64, score]);
        labels.push(usize::from(rng.r#gen::<f64>() < p));
        groups.push(if group == 1 { "b" } else { "a" });
    }
    let x = FeatureMatrix::new(vec!["group".into(), "score".into()], rows).unwrap();
    (x, labels, Grouping::from_column("group", &Column::categorical(groups)))
}

// ---------------------------------------------------------------------------
// Dominance filter
// ---------------------------------------------------------------------------

#[test]
fn five_point_sweep_is_all_non_dominated() {
    let c = points(&[
        (0.10, 0.30),
        (0.12, 0.20),
        (0.09, 0.35),
        (0.20, 0.05),
        (0.15, 0.15),
    ]);
    // Each point has the lowest error among those at or below its disparity.
    assert_eq!(non_dominated(&c), vec![0, 1, 2, 3, 4]);
    assert_eq!(non_dominated(&c), brute_force(&c));
}

#[test]
fn added_point_is_dominated() {
    let c = points(&[
        (0.10, 0.30),
        (0.12, 0.20),
        (0.09, 0.35),
        (0.20, 0.05),
        (0.15, 0.15),
        (0.25, 0.25),
    ]);
    // (0.12, 0.20) has lower disparity and lower error than (0.25, 0.25).
    assert_eq!(non_dominated(&c), vec![0, 1, 2, 3, 4]);
}

#[test]
fn frontier_matches_reference_on_random_points() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for _ in 0..50 {
        let c: Vec<ErrorDisparity> = (0..20)
            .map(|_| ErrorDisparity {
                error: (rng.r#gen::<f64>() * 10.0).round() / 10.0,
                disparity: (rng.r#gen::<f64>() * 10.0).round() / 10.0,
            })
            .collect();
        let frontier = non_dominated(&c);
        assert!(!frontier.is_empty());
        assert_eq!(frontier, brute_force(&c));

        let mut sorted: Vec<ErrorDisparity> = frontier.iter().map(|&i| c[i]).collect();
        sorted.sort_by(|a, b| a.disparity.total_cmp(&b.disparity));
        assert!(sorted.windows(2).all(|w| w[1].error <= w[0].error));
    }
}

// ---------------------------------------------------------------------------
// Reductions
// ---------------------------------------------------------------------------

#[test]
fn grid_sweep_yields_a_frontier() {
    let (x, y, g) = noisy_population(400, 3);
    let dp = UtilityParity::load(ParityKind::DemographicParity, 0.01, &y, &g, None).unwrap();
    let estimator = GradientBoostingConfig::new(10).unwrap();
    let result = GridSearchConfig::new(15)
        .unwrap()
        .fit(&estimator, &dp, &x, &y)
        .unwrap();

    let error = ErrorRate::load(&y).unwrap();
    let candidates: Vec<ErrorDisparity> = result
        .predictors()
        .iter()
        .map(|p| {
            let preds: Vec<f64> = p
                .predict(&x)
                .unwrap()
                .into_iter()
                .map(|v| v as f64)
                .collect();
            let disparity = dp
                .gamma(&preds)
                .into_iter()
                .fold(f64::NEG_INFINITY, f64::max);
            ErrorDisparity {
                error: error.gamma(&preds),
                disparity,
            }
        })
        .collect();

    // Stored objectives agree with a fresh evaluation.
    for (p, c) in result.predictors().iter().zip(&candidates) {
        assert!((p.objective() - c.error).abs() < 1e-12);
    }
    let frontier = non_dominated(&candidates);
    assert!(!frontier.is_empty());
    assert_eq!(frontier, brute_force(&candidates));
}

/// Two control strata of 100 rows. In `young` group `b` has far more
/// positives than group `a` in every score bin; in `old` both groups share
/// the same positive rate per bin.
fn stratified_population() -> (FeatureMatrix, Vec<usize>, Grouping, Grouping) {
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    let mut groups = Vec::new();
    let mut strata = Vec::new();
    for stratum in 0..2usize {
        for group in 0..2usize {
            for bin in 0..5usize {
                let positives = match (stratum, group) {
                    (0, 0) => bin,
                    (0, _) => 6 + bin,
                    _ => 2 + bin,
                };
                for j in 0..10 {
                    rows.push(vec![group as f64, bin as f64, stratum as f64]);
                    labels.push(usize::from(j < positives));
                    groups.push(if group == 1 { "b" } else { "a" });
                    strata.push(if stratum == 0 { "young" } else { "old" });
                }
            }
        }
    }
    let x = FeatureMatrix::new(
        vec!["group".into(), "score".into(), "age".into()],
        rows,
    )
    .unwrap();
    (
        x,
        labels,
        Grouping::from_column("group", &Column::categorical(groups)),
        Grouping::from_column("age", &Column::categorical(strata)),
    )
}

/// Selection-rate gap between the two sensitive groups within each stratum,
/// in the stratum order of `control`.
fn stratum_gaps(selected: &[f64], sensitive: &Grouping, control: &Grouping) -> Vec<f64> {
    let mut sums = vec![[0.0_f64; 2]; control.n_levels()];
    let mut counts = vec![[0.0_f64; 2]; control.n_levels()];
    for ((&v, &g), &c) in selected.iter().zip(sensitive.codes()).zip(control.codes()) {
        sums[c][g] += v;
        counts[c][g] += 1.0;
    }
    sums.iter()
        .zip(&counts)
        .map(|(s, n)| (s[0] / n[0] - s[1] / n[1]).abs())
        .collect()
}

#[test]
fn exponentiated_gradient_equalizes_selection_within_strata() {
    let (x, y, g, control) = stratified_population();
    let dp = UtilityParity::load(
        ParityKind::DemographicParity,
        0.01,
        &y,
        &g,
        Some(&control),
    )
    .unwrap();
    assert_eq!(dp.n_events(), 2);

    let estimator = GradientBoostingConfig::new(10).unwrap().with_max_depth(3);
    let baseline = fairml_reductions::Estimator::fit(&estimator, &x, &y, None).unwrap();
    let base_selected: Vec<f64> = Predictor::predict(&baseline, &x)
        .unwrap()
        .into_iter()
        .map(|v| v as f64)
        .collect();
    let base_gaps = stratum_gaps(&base_selected, &g, &control);

    let model = ExponentiatedGradientConfig::new()
        .fit(&estimator, &dp, &x, &y)
        .unwrap();
    let proba = model.predict_proba(&x).unwrap();
    assert!(proba.iter().all(|p| (0.0..=1.0 + 1e-9).contains(p)));
    let mitigated_gaps = stratum_gaps(&proba, &g, &control);

    // Levels are sorted, so stratum 0 is `old` and stratum 1 is `young`.
    assert_eq!(control.levels(), &["old", "young"]);
    let (old, young) = (0, 1);
    assert!(base_gaps[young] > 0.5, "baseline gaps {base_gaps:?}");
    assert!(
        mitigated_gaps[young] < base_gaps[young] * 0.7,
        "baseline gaps {base_gaps:?}, mitigated gaps {mitigated_gaps:?}"
    );
    assert!(
        mitigated_gaps[old] <= base_gaps[old] + 0.1,
        "baseline gaps {base_gaps:?}, mitigated gaps {mitigated_gaps:?}"
    );
}
