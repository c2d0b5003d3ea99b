//! Configuration builder for gradient boosting.

use crate::error::GbdtError;
use crate::result::BoostingResult;

/// Configuration for gradient-boosted binary classification.
///
/// Construct via [`GradientBoostingConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter          | Default |
/// |--------------------|---------|
/// | `learning_rate`    | 0.3     |
/// | `max_depth`        | 6       |
/// | `min_child_weight` | 1.0     |
/// | `reg_lambda`       | 1.0     |
/// | `gamma`            | 0.0     |
/// | `subsample`        | 1.0     |
/// | `seed`             | 42      |
#[derive(Debug, Clone)]
pub struct GradientBoostingConfig {
    pub(crate) n_estimators: usize,
    pub(crate) learning_rate: f64,
    pub(crate) max_depth: usize,
    pub(crate) min_child_weight: f64,
    pub(crate) reg_lambda: f64,
    pub(crate) gamma: f64,
    pub(crate) subsample: f64,
    pub(crate) seed: u64,
}

impl GradientBoostingConfig {
    /// Create a new config with the given number of boosting rounds.
    ///
    /// # Errors
    ///
    /// Returns [`GbdtError::InvalidEstimatorCount`] if `n_estimators` is zero.
    pub fn new(n_estimators: usize) -> Result<Self, GbdtError> {
        if n_estimators == 0 {
            return Err(GbdtError::InvalidEstimatorCount { n_estimators });
        }
        Ok(Self {
            n_estimators,
            learning_rate: 0.3,
            max_depth: 6,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            gamma: 0.0,
            subsample: 1.0,
            seed: 42,
        })
    }

    // --- Setters ---

    /// Set the shrinkage applied to every tree's output.
    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the maximum tree depth (root is depth 0).
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum hessian sum required in each child.
    #[must_use]
    pub fn with_min_child_weight(mut self, min_child_weight: f64) -> Self {
        self.min_child_weight = min_child_weight;
        self
    }

    /// Set the L2 regularization on leaf values.
    #[must_use]
    pub fn with_reg_lambda(mut self, reg_lambda: f64) -> Self {
        self.reg_lambda = reg_lambda;
        self
    }

    /// Set the minimum loss reduction required to split.
    #[must_use]
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Set the fraction of rows sampled (without replacement) per round.
    #[must_use]
    pub fn with_subsample(mut self, subsample: f64) -> Self {
        self.subsample = subsample;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // --- Getters ---

    /// Return the number of boosting rounds.
    #[must_use]
    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    /// Return the learning rate.
    #[must_use]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Return the maximum tree depth.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Return the minimum child hessian sum.
    #[must_use]
    pub fn min_child_weight(&self) -> f64 {
        self.min_child_weight
    }

    /// Return the L2 leaf regularization.
    #[must_use]
    pub fn reg_lambda(&self) -> f64 {
        self.reg_lambda
    }

    /// Return the minimum split loss reduction.
    #[must_use]
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Return the row subsample fraction.
    #[must_use]
    pub fn subsample(&self) -> f64 {
        self.subsample
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Train a boosted classifier.
    ///
    /// `features[sample_idx][feature_idx]`: row-major layout.
    /// `labels[sample_idx]`: 0 or 1.
    /// `sample_weights`: optional non-negative per-sample weights.
    /// `feature_names`: names for each feature column.
    ///
    /// # Errors
    ///
    /// | Variant                                  | When                                          |
    /// |------------------------------------------|-----------------------------------------------|
    /// | [`GbdtError::EmptyDataset`]              | `features` is empty                           |
    /// | [`GbdtError::ZeroFeatures`]              | rows have zero feature columns                |
    /// | [`GbdtError::FeatureCountMismatch`]      | rows have inconsistent lengths                |
    /// | [`GbdtError::FeatureNameCountMismatch`]  | `feature_names` length differs                |
    /// | [`GbdtError::NonFiniteValue`]            | any value is NaN or infinite                  |
    /// | [`GbdtError::LabelCountMismatch`]        | `labels` length differs                       |
    /// | [`GbdtError::NonBinaryLabel`]            | a label is not 0 or 1                         |
    /// | [`GbdtError::WeightCountMismatch`]       | `sample_weights` length differs               |
    /// | [`GbdtError::InvalidSampleWeight`]       | a weight is negative or non-finite            |
    /// | [`GbdtError::ZeroTotalWeight`]           | all weights are zero                          |
    /// | Parameter variants                       | a hyperparameter is out of range              |
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        sample_weights: Option<&[f64]>,
        feature_names: &[String],
    ) -> Result<BoostingResult, GbdtError> {
        crate::booster::train(self, features, labels, sample_weights, feature_names)
    }

    pub(crate) fn validate(&self) -> Result<(), GbdtError> {
        if self.max_depth == 0 {
            return Err(GbdtError::InvalidMaxDepth { max_depth: 0 });
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(GbdtError::InvalidLearningRate {
                learning_rate: self.learning_rate,
            });
        }
        for (name, value) in [
            ("reg_lambda", self.reg_lambda),
            ("gamma", self.gamma),
            ("min_child_weight", self.min_child_weight),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(GbdtError::InvalidRegularization { name, value });
            }
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(GbdtError::InvalidSubsample {
                fraction: self.subsample,
            });
        }
        Ok(())
    }
}
