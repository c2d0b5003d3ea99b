//! Prediction methods for the boosted classifier.

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::booster::{GradientBoostedClassifier, sigmoid};
use crate::error::GbdtError;
use crate::tree::RegressionTree;

impl GradientBoostedClassifier {
    /// Return the raw log-odds margin for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`GbdtError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_margin(&self, sample: &[f64]) -> Result<f64, GbdtError> {
        if sample.len() != self.n_features {
            return Err(GbdtError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let sum: f64 = self.trees.iter().map(|t| t.leaf_value(sample)).sum();
        Ok(self.base_margin + self.learning_rate * sum)
    }

    /// Return the positive-class probability for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`GbdtError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<f64, GbdtError> {
        Ok(sigmoid(self.predict_margin(sample)?))
    }

    /// Predict the class label (1 when the probability exceeds 0.5).
    ///
    /// # Errors
    ///
    /// Returns [`GbdtError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, GbdtError> {
        Ok(usize::from(self.predict_proba(sample)? > 0.5))
    }

    /// Predict class labels for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`GbdtError::PredictionFeatureMismatch`] if any sample has the wrong feature count.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, GbdtError> {
        features
            .into_par_iter()
            .map(|sample| self.predict(sample))
            .collect()
    }

    /// Return positive-class probabilities for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`GbdtError::PredictionFeatureMismatch`] if any sample has the wrong feature count.
    pub fn predict_proba_batch(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, GbdtError> {
        features
            .into_par_iter()
            .map(|sample| self.predict_proba(sample))
            .collect()
    }

    /// Return the number of features this model was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Borrow the fitted trees.
    #[must_use]
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Return the feature names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}
