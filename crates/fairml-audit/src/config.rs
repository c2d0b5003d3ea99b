//! Immutable settings shared by every audit stage.

use fairml_metrics::QualityMetric;
use fairml_reductions::ExponentiatedGradientConfig;

use crate::error::AuditError;

/// Settings of a fairness audit.
///
/// # Defaults
///
/// | Parameter                   | Default    |
/// |-----------------------------|------------|
/// | `control_feature`           | none       |
/// | `quality_metric`            | accuracy   |
/// | `num_of_mitigated_features` | 1          |
/// | `n_buckets`                 | 2          |
/// | `test_fraction`             | 0.3        |
/// | `seed`                      | 2          |
/// | `grid_size`                 | 71         |
/// | `grid_limit`                | 2.0        |
/// | `difference_bound`          | 0.01       |
#[derive(Debug, Clone)]
pub struct AuditConfig {
    sensitive_features: Vec<String>,
    control_feature: Option<String>,
    quality_metric: QualityMetric,
    num_of_mitigated_features: usize,
    n_buckets: usize,
    test_fraction: f64,
    seed: u64,
    grid_size: usize,
    grid_limit: f64,
    difference_bound: f64,
    exponentiated_gradient: ExponentiatedGradientConfig,
}

impl AuditConfig {
    /// Create a config auditing the given candidate sensitive attributes.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::NoCandidates`] if `sensitive_features` is empty.
    pub fn new(sensitive_features: Vec<String>) -> Result<Self, AuditError> {
        if sensitive_features.is_empty() {
            return Err(AuditError::NoCandidates);
        }
        Ok(Self {
            sensitive_features,
            control_feature: None,
            quality_metric: QualityMetric::Accuracy,
            num_of_mitigated_features: 1,
            n_buckets: 2,
            test_fraction: 0.3,
            seed: 2,
            grid_size: 71,
            grid_limit: 2.0,
            difference_bound: 0.01,
            exponentiated_gradient: ExponentiatedGradientConfig::new(),
        })
    }

    // --- Setters ---

    /// Set the attribute that stratifies fairness measurement.
    #[must_use]
    pub fn with_control_feature(mut self, control_feature: Option<String>) -> Self {
        self.control_feature = control_feature;
        self
    }

    /// Set the classifier quality metric reported next to fairness.
    #[must_use]
    pub fn with_quality_metric(mut self, quality_metric: QualityMetric) -> Self {
        self.quality_metric = quality_metric;
        self
    }

    /// Set how many of the most unfair attributes detection returns.
    #[must_use]
    pub fn with_num_of_mitigated_features(mut self, n: usize) -> Self {
        self.num_of_mitigated_features = n;
        self
    }

    /// Set the number of buckets numeric attributes are reduced to.
    #[must_use]
    pub fn with_n_buckets(mut self, n_buckets: usize) -> Self {
        self.n_buckets = n_buckets;
        self
    }

    /// Set the held-out fraction of the stratified split.
    #[must_use]
    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.test_fraction = test_fraction;
        self
    }

    /// Set the split seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of grid-search predictors.
    #[must_use]
    pub fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Set the largest multiplier coefficient of the grid.
    #[must_use]
    pub fn with_grid_limit(mut self, grid_limit: f64) -> Self {
        self.grid_limit = grid_limit;
        self
    }

    /// Set the allowed selection-rate deviation of the parity constraint.
    #[must_use]
    pub fn with_difference_bound(mut self, difference_bound: f64) -> Self {
        self.difference_bound = difference_bound;
        self
    }

    /// Set the exponentiated-gradient settings.
    #[must_use]
    pub fn with_exponentiated_gradient(mut self, config: ExponentiatedGradientConfig) -> Self {
        self.exponentiated_gradient = config;
        self
    }

    // --- Getters ---

    /// Return the candidate sensitive attributes.
    #[must_use]
    pub fn sensitive_features(&self) -> &[String] {
        &self.sensitive_features
    }

    /// Return the control attribute, if any.
    #[must_use]
    pub fn control_feature(&self) -> Option<&str> {
        self.control_feature.as_deref()
    }

    /// Return the quality metric.
    #[must_use]
    pub fn quality_metric(&self) -> QualityMetric {
        self.quality_metric
    }

    /// Return the number of attributes detection returns.
    #[must_use]
    pub fn num_of_mitigated_features(&self) -> usize {
        self.num_of_mitigated_features
    }

    /// Return the bucket count.
    #[must_use]
    pub fn n_buckets(&self) -> usize {
        self.n_buckets
    }

    /// Return the test fraction.
    #[must_use]
    pub fn test_fraction(&self) -> f64 {
        self.test_fraction
    }

    /// Return the split seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the grid size.
    #[must_use]
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Return the grid limit.
    #[must_use]
    pub fn grid_limit(&self) -> f64 {
        self.grid_limit
    }

    /// Return the parity difference bound.
    #[must_use]
    pub fn difference_bound(&self) -> f64 {
        self.difference_bound
    }

    /// Return the exponentiated-gradient settings.
    #[must_use]
    pub fn exponentiated_gradient(&self) -> &ExponentiatedGradientConfig {
        &self.exponentiated_gradient
    }

    pub(crate) fn validate(&self) -> Result<(), AuditError> {
        let checks: [(&'static str, &'static str, f64, bool); 6] = [
            (
                "num_of_mitigated_features",
                "at least 1",
                self.num_of_mitigated_features as f64,
                self.num_of_mitigated_features >= 1,
            ),
            (
                "n_buckets",
                "at least 1",
                self.n_buckets as f64,
                self.n_buckets >= 1,
            ),
            (
                "test_fraction",
                "in (0.0, 1.0)",
                self.test_fraction,
                self.test_fraction > 0.0 && self.test_fraction < 1.0,
            ),
            (
                "grid_size",
                "at least 1",
                self.grid_size as f64,
                self.grid_size >= 1,
            ),
            (
                "grid_limit",
                "positive and finite",
                self.grid_limit,
                self.grid_limit.is_finite() && self.grid_limit > 0.0,
            ),
            (
                "difference_bound",
                "non-negative and finite",
                self.difference_bound,
                self.difference_bound.is_finite() && self.difference_bound >= 0.0,
            ),
        ];
        match checks.into_iter().find(|&(_, _, _, ok)| !ok) {
            Some((name, requirement, value, _)) => Err(AuditError::InvalidParameter {
                name,
                requirement,
                value,
            }),
            None => Ok(()),
        }
    }
}
