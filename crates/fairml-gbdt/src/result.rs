//! Training result types for gradient boosting.

use crate::booster::GradientBoostedClassifier;

/// Metadata about the training run.
#[derive(Debug, Clone)]
pub struct TrainingMetadata {
    /// Number of boosting rounds.
    pub n_estimators: usize,
    /// Number of features in the dataset.
    pub n_features: usize,
    /// Number of training samples.
    pub n_samples: usize,
    /// Number of samples labelled 1.
    pub n_positive: usize,
    /// Weighted log-loss on the training set after the last round.
    pub final_train_loss: f64,
}

/// Result of gradient boosting: the fitted model plus training metadata.
#[derive(Debug)]
pub struct BoostingResult {
    model: GradientBoostedClassifier,
    metadata: TrainingMetadata,
}

impl BoostingResult {
    pub(crate) fn new(model: GradientBoostedClassifier, metadata: TrainingMetadata) -> Self {
        Self { model, metadata }
    }

    /// Borrow the fitted model.
    #[must_use]
    pub fn model(&self) -> &GradientBoostedClassifier {
        &self.model
    }

    /// Consume the result and return the fitted model.
    #[must_use]
    pub fn into_model(self) -> GradientBoostedClassifier {
        self.model
    }

    /// Return training metadata.
    #[must_use]
    pub fn metadata(&self) -> &TrainingMetadata {
        &self.metadata
    }
}
