/// Errors from gradient boosting operations.
#[derive(Debug, thiserror::Error)]
pub enum GbdtError {
    /// Returned when n_estimators is zero.
    #[error("n_estimators must be at least 1, got {n_estimators}")]
    InvalidEstimatorCount {
        /// The invalid n_estimators value provided.
        n_estimators: usize,
    },

    /// Returned when max_depth is zero.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The invalid max_depth value provided.
        max_depth: usize,
    },

    /// Returned when learning_rate is not a positive finite number.
    #[error("learning_rate must be positive and finite, got {learning_rate}")]
    InvalidLearningRate {
        /// The invalid learning rate.
        learning_rate: f64,
    },

    /// Returned when a regularization parameter is negative or non-finite.
    #[error("{name} must be non-negative and finite, got {value}")]
    InvalidRegularization {
        /// Parameter name (`reg_lambda`, `gamma`, `min_child_weight`).
        name: &'static str,
        /// The invalid value.
        value: f64,
    },

    /// Returned when subsample is not in (0.0, 1.0].
    #[error("subsample must be in (0.0, 1.0], got {fraction}")]
    InvalidSubsample {
        /// The invalid subsample fraction.
        fraction: f64,
    },

    /// Returned when the training dataset has zero samples.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when the training dataset has zero feature columns.
    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when a sample has a different number of features than expected.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when the number of feature names differs from the feature count.
    #[error("{got} feature names for {expected} features")]
    FeatureNameCountMismatch {
        /// The number of feature columns.
        expected: usize,
        /// The number of names provided.
        got: usize,
    },

    /// Returned when a sample has a different number of features at prediction time.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when labels and samples disagree in length.
    #[error("{n_labels} labels for {n_samples} samples")]
    LabelCountMismatch {
        /// Number of samples.
        n_samples: usize,
        /// Number of labels.
        n_labels: usize,
    },

    /// Returned when a label is neither 0 nor 1.
    #[error("label {label} at sample {sample_index} is not binary")]
    NonBinaryLabel {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The offending label.
        label: usize,
    },

    /// Returned when sample weights and samples disagree in length.
    #[error("{n_weights} sample weights for {n_samples} samples")]
    WeightCountMismatch {
        /// Number of samples.
        n_samples: usize,
        /// Number of weights.
        n_weights: usize,
    },

    /// Returned when a sample weight is negative or non-finite.
    #[error("sample weight {weight} at sample {sample_index} must be non-negative and finite")]
    InvalidSampleWeight {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The offending weight.
        weight: f64,
    },

    /// Returned when every sample weight is zero.
    #[error("sample weights sum to zero")]
    ZeroTotalWeight,
}
