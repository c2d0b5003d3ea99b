//! Logistic-loss gradient boosting with per-sample weights.

use rand::SeedableRng;
use rand::seq::index::sample;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefMutIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::GradientBoostingConfig;
use crate::error::GbdtError;
use crate::result::{BoostingResult, TrainingMetadata};
use crate::split::SplitParams;
use crate::tree::{GrowParams, RegressionTree};

/// Hessian floor so zero-weight rows never produce a zero denominator.
const MIN_HESSIAN: f64 = 1e-16;

/// Probability clamp for log-loss reporting.
const PROB_EPS: f64 = 1e-15;

/// A fitted gradient-boosted binary classifier.
///
/// The margin of a sample is `base_margin + learning_rate * Σ tree(x)`;
/// the positive-class probability is the logistic of the margin.
#[derive(Debug, Clone)]
pub struct GradientBoostedClassifier {
    pub(crate) trees: Vec<RegressionTree>,
    pub(crate) learning_rate: f64,
    pub(crate) base_margin: f64,
    pub(crate) n_features: usize,
    pub(crate) feature_names: Vec<String>,
}

pub(crate) fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}

/// Validate rows, labels and weights; return the resolved weight vector.
fn validate_inputs(
    features: &[Vec<f64>],
    labels: &[usize],
    sample_weights: Option<&[f64]>,
    feature_names: &[String],
) -> Result<Vec<f64>, GbdtError> {
    if features.is_empty() {
        return Err(GbdtError::EmptyDataset);
    }
    let n_samples = features.len();
    let n_features = features[0].len();
    if n_features == 0 {
        return Err(GbdtError::ZeroFeatures);
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(GbdtError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        for (feature_index, &val) in row.iter().enumerate() {
            if !val.is_finite() {
                return Err(GbdtError::NonFiniteValue {
                    sample_index,
                    feature_index,
                });
            }
        }
    }
    if feature_names.len() != n_features {
        return Err(GbdtError::FeatureNameCountMismatch {
            expected: n_features,
            got: feature_names.len(),
        });
    }

    if labels.len() != n_samples {
        return Err(GbdtError::LabelCountMismatch {
            n_samples,
            n_labels: labels.len(),
        });
    }
    if let Some((sample_index, &label)) = labels.iter().enumerate().find(|&(_, &l)| l > 1) {
        return Err(GbdtError::NonBinaryLabel {
            sample_index,
            label,
        });
    }

    let weights = match sample_weights {
        None => vec![1.0; n_samples],
        Some(w) => {
            if w.len() != n_samples {
                return Err(GbdtError::WeightCountMismatch {
                    n_samples,
                    n_weights: w.len(),
                });
            }
            if let Some((sample_index, &weight)) = w
                .iter()
                .enumerate()
                .find(|&(_, &v)| !(v.is_finite() && v >= 0.0))
            {
                return Err(GbdtError::InvalidSampleWeight {
                    sample_index,
                    weight,
                });
            }
            w.to_vec()
        }
    };
    if weights.iter().sum::<f64>() <= 0.0 {
        return Err(GbdtError::ZeroTotalWeight);
    }

    Ok(weights)
}

/// Weighted mean binary log-loss of `margins` against `labels`.
fn weighted_log_loss(margins: &[f64], labels: &[usize], weights: &[f64]) -> f64 {
    let mut total = 0.0;
    let mut weight_sum = 0.0;
    for ((&m, &y), &w) in margins.iter().zip(labels).zip(weights) {
        let p = sigmoid(m).clamp(PROB_EPS, 1.0 - PROB_EPS);
        let loss = if y == 1 { -p.ln() } else { -(1.0 - p).ln() };
        total += w * loss;
        weight_sum += w;
    }
    total / weight_sum
}

/// Train the boosted ensemble.
#[instrument(skip_all, fields(n_estimators = config.n_estimators, n_samples = features.len()))]
pub(crate) fn train(
    config: &GradientBoostingConfig,
    features: &[Vec<f64>],
    labels: &[usize],
    sample_weights: Option<&[f64]>,
    feature_names: &[String],
) -> Result<BoostingResult, GbdtError> {
    config.validate()?;
    let weights = validate_inputs(features, labels, sample_weights, feature_names)?;

    let n_samples = features.len();
    let n_features = features[0].len();
    let n_positive = labels.iter().filter(|&&y| y == 1).count();
    let n_rows_per_round = ((n_samples as f64) * config.subsample).ceil() as usize;

    info!(
        n_estimators = config.n_estimators,
        n_samples,
        n_features,
        n_positive,
        n_rows_per_round,
        "training gradient boosted classifier"
    );

    // Column-major layout for the split scan.
    let col_features: Vec<Vec<f64>> = (0..n_features)
        .map(|feat_idx| features.iter().map(|row| row[feat_idx]).collect())
        .collect();

    let grow = GrowParams {
        max_depth: config.max_depth,
        split: SplitParams {
            reg_lambda: config.reg_lambda,
            gamma: config.gamma,
            min_child_weight: config.min_child_weight,
        },
    };

    // base_score 0.5 has logit 0.
    let base_margin = 0.0;
    let mut margins = vec![base_margin; n_samples];
    let mut grad = vec![0.0; n_samples];
    let mut hess = vec![0.0; n_samples];
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let all_rows: Vec<usize> = (0..n_samples).collect();
    let mut trees = Vec::with_capacity(config.n_estimators);

    for round in 0..config.n_estimators {
        grad.par_iter_mut()
            .zip(hess.par_iter_mut())
            .enumerate()
            .for_each(|(i, (g, h))| {
                let p = sigmoid(margins[i]);
                let y = labels[i] as f64;
                *g = weights[i] * (p - y);
                *h = (weights[i] * p * (1.0 - p)).max(MIN_HESSIAN);
            });

        let rows = if n_rows_per_round < n_samples {
            let mut picked = sample(&mut rng, n_samples, n_rows_per_round).into_vec();
            picked.sort_unstable();
            picked
        } else {
            all_rows.clone()
        };

        let tree = RegressionTree::grow(&col_features, &grad, &hess, &rows, &grow);

        margins.par_iter_mut().enumerate().for_each(|(i, m)| {
            *m += config.learning_rate * tree.leaf_value(&features[i]);
        });
        trees.push(tree);

        debug!(
            round,
            train_loss = weighted_log_loss(&margins, labels, &weights),
            "boosting round complete"
        );
    }

    let final_train_loss = weighted_log_loss(&margins, labels, &weights);
    info!(final_train_loss, "gradient boosting complete");

    let model = GradientBoostedClassifier {
        trees,
        learning_rate: config.learning_rate,
        base_margin,
        n_features,
        feature_names: feature_names.to_vec(),
    };
    let metadata = TrainingMetadata {
        n_estimators: config.n_estimators,
        n_features,
        n_samples,
        n_positive,
        final_train_loss,
    };

    Ok(BoostingResult::new(model, metadata))
}
