//! Grid search over Lagrange multipliers.

use fairml_data::FeatureMatrix;
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::error::ReductionError;
use crate::estimator::{Estimator, Oracle, Predictor, predict_as_f64};
use crate::grid::coefficient_grid;
use crate::moment::{Constraint, ErrorRate};

/// Configuration for the grid-search reduction.
///
/// # Defaults
///
/// | Parameter           | Default |
/// |---------------------|---------|
/// | `grid_limit`        | 2.0     |
/// | `constraint_weight` | 0.5     |
#[derive(Debug, Clone)]
pub struct GridSearchConfig {
    grid_size: usize,
    grid_limit: f64,
    constraint_weight: f64,
    grid: Option<Vec<Vec<f64>>>,
}

impl GridSearchConfig {
    /// Create a config sweeping `grid_size` multiplier vectors.
    ///
    /// # Errors
    ///
    /// Returns [`ReductionError::InvalidParameter`] if `grid_size` is zero.
    pub fn new(grid_size: usize) -> Result<Self, ReductionError> {
        if grid_size == 0 {
            return Err(ReductionError::InvalidParameter {
                name: "grid_size",
                requirement: "at least 1",
                value: 0.0,
            });
        }
        Ok(Self {
            grid_size,
            grid_limit: 2.0,
            constraint_weight: 0.5,
            grid: None,
        })
    }

    // --- Setters ---

    /// Set the largest absolute coefficient on the grid.
    #[must_use]
    pub fn with_grid_limit(mut self, grid_limit: f64) -> Self {
        self.grid_limit = grid_limit;
        self
    }

    /// Set the weight of the worst constraint violation when choosing `best_idx`.
    #[must_use]
    pub fn with_constraint_weight(mut self, constraint_weight: f64) -> Self {
        self.constraint_weight = constraint_weight;
        self
    }

    /// Sweep explicit basis coefficients instead of the generated grid.
    #[must_use]
    pub fn with_grid(mut self, grid: Option<Vec<Vec<f64>>>) -> Self {
        self.grid = grid;
        self
    }

    // --- Getters ---

    /// Return the number of grid points.
    #[must_use]
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Return the grid limit.
    #[must_use]
    pub fn grid_limit(&self) -> f64 {
        self.grid_limit
    }

    /// Return the constraint weight.
    #[must_use]
    pub fn constraint_weight(&self) -> f64 {
        self.constraint_weight
    }

    fn validate(&self) -> Result<(), ReductionError> {
        if !(self.grid_limit.is_finite() && self.grid_limit > 0.0) {
            return Err(ReductionError::InvalidParameter {
                name: "grid_limit",
                requirement: "positive and finite",
                value: self.grid_limit,
            });
        }
        if !(0.0..=1.0).contains(&self.constraint_weight) {
            return Err(ReductionError::InvalidParameter {
                name: "constraint_weight",
                requirement: "in [0, 1]",
                value: self.constraint_weight,
            });
        }
        Ok(())
    }

    /// Train one predictor per grid point.
    ///
    /// Every grid point is turned into multipliers on `constraint`, which
    /// together with the error-rate objective define per-row costs; the
    /// estimator is fitted on the sign of the cost with its magnitude as
    /// sample weight. Grid points are trained in parallel and returned in
    /// grid order.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ReductionError::InvalidParameter`] | `grid_limit` or `constraint_weight` out of range |
    /// | [`ReductionError::LambdaDimension`] | an explicit grid point does not match the constraint basis |
    /// | [`ReductionError::LengthMismatch`] | `features`, `labels` and `constraint` disagree in rows |
    /// | [`ReductionError::EmptyInput`] / [`ReductionError::NonBinaryLabel`] | invalid labels |
    /// | [`ReductionError::Estimator`] | a fit or prediction fails |
    #[instrument(skip_all, fields(n_samples = labels.len(), grid_size = self.grid_size))]
    pub fn fit<E, C>(
        &self,
        estimator: &E,
        constraint: &C,
        features: &FeatureMatrix,
        labels: &[usize],
    ) -> Result<GridSearchResult<E::Model>, ReductionError>
    where
        E: Estimator,
        C: Constraint + ?Sized,
    {
        self.validate()?;
        let objective = ErrorRate::load(labels)?;
        let n = labels.len();
        for (what, got) in [
            ("features", features.n_samples()),
            ("constraint", constraint.n_samples()),
        ] {
            if got != n {
                return Err(ReductionError::LengthMismatch {
                    what,
                    expected: n,
                    got,
                });
            }
        }

        let basis_dim = constraint.grid_basis().len();
        let grid = match &self.grid {
            Some(grid) => {
                if let Some(bad) = grid.iter().find(|p| p.len() != basis_dim) {
                    return Err(ReductionError::LambdaDimension {
                        expected: basis_dim,
                        got: bad.len(),
                    });
                }
                grid.clone()
            }
            None => coefficient_grid(basis_dim, self.grid_size, self.grid_limit),
        };
        let objective_weights = objective.signed_weights();

        let predictors = grid
            .into_par_iter()
            .enumerate()
            .map(|(i, coefficients)| {
                let lambda = constraint.lambda_from_coefficients(&coefficients);
                let signed: Vec<f64> = constraint
                    .signed_weights(&lambda)
                    .iter()
                    .zip(&objective_weights)
                    .map(|(c, o)| c + o)
                    .collect();
                let reduced_labels: Vec<usize> =
                    signed.iter().map(|&w| usize::from(w > 0.0)).collect();
                let weights: Vec<f64> = signed.iter().map(|w| w.abs()).collect();

                let model = Oracle::fit(estimator, features, &reduced_labels, &weights)?;
                let preds = predict_as_f64(&model, features)?;
                let objective_value = objective.gamma(&preds);
                let gamma = constraint.gamma(&preds);
                debug!(
                    grid_point = i,
                    objective = objective_value,
                    max_violation = max_of(&gamma),
                    "grid point trained"
                );
                Ok(GridPredictor {
                    model,
                    lambda,
                    objective: objective_value,
                    gamma,
                })
            })
            .collect::<Result<Vec<_>, ReductionError>>()?;

        let objective_weight = 1.0 - self.constraint_weight;
        let best_idx = predictors
            .iter()
            .map(|p| objective_weight * p.objective + self.constraint_weight * max_of(&p.gamma))
            .enumerate()
            .fold((0, f64::INFINITY), |acc, (i, v)| if v < acc.1 { (i, v) } else { acc })
            .0;

        info!(
            n_predictors = predictors.len(),
            best_idx,
            "grid search complete"
        );

        Ok(GridSearchResult {
            predictors,
            best_idx,
        })
    }
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// One trained grid point.
#[derive(Debug, Clone)]
pub struct GridPredictor<M> {
    model: Oracle<M>,
    lambda: Vec<f64>,
    objective: f64,
    gamma: Vec<f64>,
}

impl<M> GridPredictor<M> {
    /// Return the trained model.
    #[must_use]
    pub fn model(&self) -> &Oracle<M> {
        &self.model
    }

    /// Return the multipliers the model was trained under.
    #[must_use]
    pub fn lambda(&self) -> &[f64] {
        &self.lambda
    }

    /// Return the training error rate.
    #[must_use]
    pub fn objective(&self) -> f64 {
        self.objective
    }

    /// Return the training constraint values.
    #[must_use]
    pub fn gamma(&self) -> &[f64] {
        &self.gamma
    }
}

impl<M: Predictor> Predictor for GridPredictor<M> {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<usize>, ReductionError> {
        self.model.predict(features)
    }
}

/// All predictors of a grid sweep, in grid order.
#[derive(Debug, Clone)]
pub struct GridSearchResult<M> {
    predictors: Vec<GridPredictor<M>>,
    best_idx: usize,
}

impl<M> GridSearchResult<M> {
    /// Return every trained grid point.
    #[must_use]
    pub fn predictors(&self) -> &[GridPredictor<M>] {
        &self.predictors
    }

    /// Consume the result and return its grid points.
    #[must_use]
    pub fn into_predictors(self) -> Vec<GridPredictor<M>> {
        self.predictors
    }

    /// Index of the point minimising the weighted objective/violation tradeoff.
    #[must_use]
    pub fn best_idx(&self) -> usize {
        self.best_idx
    }

    /// Return the tradeoff-optimal grid point.
    #[must_use]
    pub fn best(&self) -> &GridPredictor<M> {
        &self.predictors[self.best_idx]
    }
}

impl<M: Predictor> Predictor for GridSearchResult<M> {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<usize>, ReductionError> {
        self.best().predict(features)
    }
}

#[cfg(test)]
mod tests {
    use fairml_data::{Column, Grouping};
    use fairml_gbdt::GradientBoostingConfig;

    use super::*;
    use crate::moment::{ParityKind, UtilityParity};

    /// Two groups of five score bins with ten rows each. Group `a` has
    /// `k` positives in bin `k`, group `b` has `6 + k`, so an unconstrained
    /// fit selects nobody in `a` and everybody in `b`.
    fn binned_rows() -> (Vec<Vec<f64>>, Vec<usize>, Vec<&'static str>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        let mut groups = Vec::new();
        for group in 0..2usize {
            for bin in 0..5usize {
                let positives = if group == 1 { 6 + bin } else { bin };
                for j in 0..10 {
                    rows.push(vec![group as f64, bin as f64]);
                    labels.push(usize::from(j < positives));
                    groups.push(if group == 1 { "b" } else { "a" });
                }
            }
        }
        (rows, labels, groups)
    }

    fn data() -> (FeatureMatrix, Vec<usize>, Grouping) {
        let (rows, labels, groups) = binned_rows();
        let x = FeatureMatrix::new(vec!["g".into(), "bin".into()], rows).unwrap();
        (x, labels, Grouping::from_column("grp", &Column::categorical(groups)))
    }

    #[test]
    fn sweeps_grid_in_order() {
        let (x, y, g) = data();
        let dp = UtilityParity::load(ParityKind::DemographicParity, 0.01, &y, &g, None).unwrap();
        let est = GradientBoostingConfig::new(5).unwrap();
        let result = GridSearchConfig::new(11).unwrap().fit(&est, &dp, &x, &y).unwrap();

        assert_eq!(result.predictors().len(), 11);
        // First grid point is the unconstrained problem.
        assert!(result.predictors()[0].lambda().iter().all(|&l| l == 0.0));
        let expected = coefficient_grid(1, 11, 2.0);
        for (p, c) in result.predictors().iter().zip(&expected) {
            assert_eq!(p.lambda(), dp.lambda_from_coefficients(c).as_slice());
            assert_eq!(p.gamma().len(), dp.dim());
            assert!((0.0..=1.0).contains(&p.objective()));
        }
        assert!(result.best_idx() < 11);
    }

    #[test]
    fn large_multipliers_trade_error_for_parity() {
        let (x, y, g) = data();
        let dp = UtilityParity::load(ParityKind::DemographicParity, 0.01, &y, &g, None).unwrap();
        let est = GradientBoostingConfig::new(5).unwrap();
        let result = GridSearchConfig::new(21).unwrap().fit(&est, &dp, &x, &y).unwrap();

        let unconstrained = &result.predictors()[0];
        let min_violation = result
            .predictors()
            .iter()
            .map(|p| max_of(p.gamma()))
            .fold(f64::INFINITY, f64::min);
        assert!(min_violation < max_of(unconstrained.gamma()));
    }

    #[test]
    fn explicit_grid_checked_against_basis() {
        let (x, y, g) = data();
        let dp = UtilityParity::load(ParityKind::DemographicParity, 0.01, &y, &g, None).unwrap();
        let est = GradientBoostingConfig::new(2).unwrap();
        let err = GridSearchConfig::new(3)
            .unwrap()
            .with_grid(Some(vec![vec![0.0, 1.0]]))
            .fit(&est, &dp, &x, &y)
            .unwrap_err();
        assert!(matches!(
            err,
            ReductionError::LambdaDimension {
                expected: 1,
                got: 2
            }
        ));
    }

    #[test]
    fn invalid_parameters() {
        assert!(GridSearchConfig::new(0).is_err());
        let (x, y, g) = data();
        let dp = UtilityParity::load(ParityKind::DemographicParity, 0.01, &y, &g, None).unwrap();
        let est = GradientBoostingConfig::new(2).unwrap();
        let err = GridSearchConfig::new(3)
            .unwrap()
            .with_constraint_weight(1.5)
            .fit(&est, &dp, &x, &y)
            .unwrap_err();
        assert!(matches!(
            err,
            ReductionError::InvalidParameter {
                name: "constraint_weight",
                ..
            }
        ));
    }
}
