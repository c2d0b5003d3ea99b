use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::node::FeatureIndex;

/// Regularization parameters that shape split gain and leaf values.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SplitParams {
    pub(crate) reg_lambda: f64,
    pub(crate) gamma: f64,
    pub(crate) min_child_weight: f64,
}

impl SplitParams {
    /// Optimal leaf value `-G / (H + λ)`.
    pub(crate) fn leaf_value(&self, grad_sum: f64, hess_sum: f64) -> f64 {
        -grad_sum / (hess_sum + self.reg_lambda)
    }

    /// Structure score `G² / (H + λ)`.
    fn score(&self, grad_sum: f64, hess_sum: f64) -> f64 {
        grad_sum * grad_sum / (hess_sum + self.reg_lambda)
    }
}

/// Result of finding the best split for a node.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    /// Feature used for the split.
    pub(crate) feature: FeatureIndex,
    /// Threshold value.
    pub(crate) threshold: f64,
    /// Loss reduction `0.5·(L + R − parent) − γ`.
    pub(crate) gain: f64,
    /// Sample indices going to the left child.
    pub(crate) left_indices: Vec<usize>,
    /// Sample indices going to the right child.
    pub(crate) right_indices: Vec<usize>,
}

/// Find the best split over all features.
///
/// Each feature is scanned in parallel: `(value, sample)` pairs are sorted,
/// gradient and hessian sums move left-to-right incrementally, and every
/// boundary between distinct values whose children both reach
/// `min_child_weight` is scored. Ties prefer the lower feature index so the
/// result does not depend on thread scheduling.
///
/// Returns `None` when no split has positive gain.
///
/// # Column-major layout
///
/// `features` is column-major: `features[feature_idx][sample_idx]`.
pub(crate) fn find_best_split(
    features: &[Vec<f64>],
    grad: &[f64],
    hess: &[f64],
    sample_indices: &[usize],
    params: &SplitParams,
) -> Option<SplitResult> {
    let n_samples = sample_indices.len();
    if n_samples < 2 || features.is_empty() {
        return None;
    }

    let grad_total: f64 = sample_indices.iter().map(|&si| grad[si]).sum();
    let hess_total: f64 = sample_indices.iter().map(|&si| hess[si]).sum();
    let parent_score = params.score(grad_total, hess_total);

    let best = (0..features.len())
        .into_par_iter()
        .filter_map(|feat_idx| {
            let feat_col = &features[feat_idx];
            let mut sorted: Vec<(f64, usize)> = sample_indices
                .iter()
                .map(|&si| (feat_col[si], si))
                .collect();
            sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

            let mut grad_left = 0.0;
            let mut hess_left = 0.0;
            let mut best: Option<(f64, f64)> = None;

            for i in 0..(n_samples - 1) {
                let (val_i, si) = sorted[i];
                grad_left += grad[si];
                hess_left += hess[si];

                let val_next = sorted[i + 1].0;
                if val_i == val_next {
                    continue;
                }

                let grad_right = grad_total - grad_left;
                let hess_right = hess_total - hess_left;
                if hess_left < params.min_child_weight || hess_right < params.min_child_weight {
                    continue;
                }

                let gain = 0.5
                    * (params.score(grad_left, hess_left) + params.score(grad_right, hess_right)
                        - parent_score)
                    - params.gamma;

                if best.is_none_or(|(g, _)| gain > g) {
                    best = Some((gain, (val_i + val_next) / 2.0));
                }
            }

            best.map(|(gain, threshold)| (gain, feat_idx, threshold))
        })
        .reduce_with(|a, b| {
            if b.0 > a.0 || (b.0 == a.0 && b.1 < a.1) {
                b
            } else {
                a
            }
        });

    let (gain, feat_idx, threshold) = best?;
    if gain <= 0.0 {
        return None;
    }

    let feat_col = &features[feat_idx];
    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = sample_indices
        .iter()
        .partition(|&&si| feat_col[si] <= threshold);

    Some(SplitResult {
        feature: FeatureIndex::new(feat_idx),
        threshold,
        gain,
        left_indices,
        right_indices,
    })
}

#[cfg(test)]
mod tests {
    use super::{SplitParams, find_best_split};

    const PARAMS: SplitParams = SplitParams {
        reg_lambda: 1.0,
        gamma: 0.0,
        min_child_weight: 0.0,
    };

    /// Gradients at margin 0 for logistic loss: p = 0.5, g = p - y, h = 0.25.
    fn logistic_stats(labels: &[usize]) -> (Vec<f64>, Vec<f64>) {
        let grad = labels.iter().map(|&y| 0.5 - y as f64).collect();
        let hess = vec![0.25; labels.len()];
        (grad, hess)
    }

    #[test]
    fn leaf_value_is_newton_step() {
        assert!((PARAMS.leaf_value(-2.0, 1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn separable_data_finds_correct_split() {
        let features = vec![vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]];
        let labels = [0, 0, 0, 1, 1, 1];
        let (grad, hess) = logistic_stats(&labels);
        let indices: Vec<usize> = (0..6).collect();

        let split = find_best_split(&features, &grad, &hess, &indices, &PARAMS)
            .expect("should find a split");
        assert_eq!(split.feature.index(), 0);
        assert!(split.threshold > 3.0 && split.threshold < 10.0);
        assert_eq!(split.left_indices, vec![0, 1, 2]);
        assert_eq!(split.right_indices, vec![3, 4, 5]);
        assert!(split.gain > 0.0);
    }

    #[test]
    fn informative_feature_preferred() {
        let features = vec![
            vec![5.0, 1.0, 5.0, 1.0, 5.0, 1.0],
            vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0],
        ];
        let labels = [0, 0, 0, 1, 1, 1];
        let (grad, hess) = logistic_stats(&labels);
        let indices: Vec<usize> = (0..6).collect();
        let split = find_best_split(&features, &grad, &hess, &indices, &PARAMS).unwrap();
        assert_eq!(split.feature.index(), 1);
    }

    #[test]
    fn constant_feature_returns_none() {
        let features = vec![vec![5.0, 5.0, 5.0, 5.0]];
        let (grad, hess) = logistic_stats(&[0, 0, 1, 1]);
        let indices: Vec<usize> = (0..4).collect();
        assert!(find_best_split(&features, &grad, &hess, &indices, &PARAMS).is_none());
    }

    #[test]
    fn min_child_weight_enforced() {
        // Each child would hold hessian 0.25, below the minimum of 1.0.
        let features = vec![vec![1.0, 10.0]];
        let (grad, hess) = logistic_stats(&[0, 1]);
        let params = SplitParams {
            min_child_weight: 1.0,
            ..PARAMS
        };
        assert!(find_best_split(&features, &grad, &hess, &[0, 1], &params).is_none());
    }

    #[test]
    fn zero_weight_rows_do_not_create_splits() {
        let features = vec![vec![1.0, 2.0, 3.0, 4.0]];
        let grad = vec![0.0; 4];
        let hess = vec![0.0; 4];
        let indices: Vec<usize> = (0..4).collect();
        assert!(find_best_split(&features, &grad, &hess, &indices, &PARAMS).is_none());
    }
}
