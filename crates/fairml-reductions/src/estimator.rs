//! Capability traits for the base learner of a reduction.

use fairml_data::FeatureMatrix;
use fairml_gbdt::{GradientBoostedClassifier, GradientBoostingConfig};

use crate::error::ReductionError;

/// A fitted binary classifier.
pub trait Predictor: Send + Sync {
    /// Predict a 0/1 label for every row of `features`.
    ///
    /// # Errors
    ///
    /// Returns [`ReductionError::Estimator`] when the underlying model
    /// rejects the input.
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<usize>, ReductionError>;
}

/// An unfitted binary classifier that accepts per-row sample weights.
pub trait Estimator: Send + Sync {
    /// The fitted model type.
    type Model: Predictor;

    /// Fit a model to `labels` with optional non-negative `sample_weights`.
    ///
    /// # Errors
    ///
    /// Returns [`ReductionError::Estimator`] when training fails.
    fn fit(
        &self,
        features: &FeatureMatrix,
        labels: &[usize],
        sample_weights: Option<&[f64]>,
    ) -> Result<Self::Model, ReductionError>;
}

/// The classifier produced by one oracle call of a reduction.
///
/// When the reweighted problem has a single class there is nothing to
/// learn and the oracle returns that class for every row.
#[derive(Debug, Clone)]
pub enum Oracle<M> {
    /// A model fitted on the reweighted problem.
    Fitted(M),
    /// A constant predictor.
    Constant(usize),
}

impl<M: Predictor> Predictor for Oracle<M> {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<usize>, ReductionError> {
        match self {
            Oracle::Fitted(model) => model.predict(features),
            Oracle::Constant(label) => Ok(vec![*label; features.n_samples()]),
        }
    }
}

impl<M> Oracle<M> {
    /// Fit `estimator` on a reduced problem, or return a constant predictor
    /// when `labels` hold a single class.
    pub(crate) fn fit<E>(
        estimator: &E,
        features: &FeatureMatrix,
        labels: &[usize],
        sample_weights: &[f64],
    ) -> Result<Self, ReductionError>
    where
        E: Estimator<Model = M>,
    {
        match labels.first() {
            Some(&first) if labels.iter().all(|&y| y == first) => Ok(Oracle::Constant(first)),
            _ => Ok(Oracle::Fitted(estimator.fit(
                features,
                labels,
                Some(sample_weights),
            )?)),
        }
    }
}

/// Predictions of `model` as a 0/1 float vector.
pub(crate) fn predict_as_f64<P: Predictor + ?Sized>(
    model: &P,
    features: &FeatureMatrix,
) -> Result<Vec<f64>, ReductionError> {
    Ok(model
        .predict(features)?
        .into_iter()
        .map(|y| y as f64)
        .collect())
}

impl Estimator for GradientBoostingConfig {
    type Model = GradientBoostedClassifier;

    fn fit(
        &self,
        features: &FeatureMatrix,
        labels: &[usize],
        sample_weights: Option<&[f64]>,
    ) -> Result<Self::Model, ReductionError> {
        GradientBoostingConfig::fit(self, features.rows(), labels, sample_weights, features.names())
            .map(fairml_gbdt::BoostingResult::into_model)
            .map_err(|e| ReductionError::Estimator(Box::new(e)))
    }
}

impl Predictor for GradientBoostedClassifier {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<usize>, ReductionError> {
        self.predict_batch(features.rows())
            .map_err(|e| ReductionError::Estimator(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(values: &[f64]) -> FeatureMatrix {
        FeatureMatrix::new(
            vec!["x".into()],
            values.iter().map(|&v| vec![v]).collect(),
        )
        .unwrap()
    }

    #[test]
    fn single_class_gives_constant_oracle() {
        let config = GradientBoostingConfig::new(3).unwrap();
        let x = matrix(&[1.0, 2.0, 3.0]);
        let oracle = Oracle::fit(&config, &x, &[1, 1, 1], &[1.0, 2.0, 3.0]).unwrap();
        assert!(matches!(oracle, Oracle::Constant(1)));
        assert_eq!(oracle.predict(&matrix(&[9.0, 9.0])).unwrap(), vec![1, 1]);
    }

    #[test]
    fn two_classes_fit_the_estimator() {
        let config = GradientBoostingConfig::new(5)
            .unwrap()
            .with_min_child_weight(0.0);
        let x = matrix(&[1.0, 2.0, 3.0, 10.0, 11.0, 12.0]);
        let y = [0, 0, 0, 1, 1, 1];
        let oracle = Oracle::fit(&config, &x, &y, &[1.0; 6]).unwrap();
        assert!(matches!(oracle, Oracle::Fitted(_)));
        assert_eq!(oracle.predict(&x).unwrap(), y.to_vec());
    }

    #[test]
    fn estimator_errors_are_wrapped() {
        let config = GradientBoostingConfig::new(2).unwrap();
        let x = matrix(&[1.0, 2.0]);
        let err = Estimator::fit(&config, &x, &[0, 1], Some(&[0.0, 0.0])).unwrap_err();
        assert!(matches!(err, ReductionError::Estimator(_)));
    }
}
