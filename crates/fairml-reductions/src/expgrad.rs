//! Exponentiated-gradient reduction for fair binary classification.

use fairml_data::FeatureMatrix;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

use crate::error::ReductionError;
use crate::estimator::{Estimator, Oracle, Predictor, predict_as_f64};
use crate::moment::{Constraint, ErrorRate};

/// Tolerance when comparing Lagrangian values and gaps.
const PRECISION: f64 = 1e-8;
/// Multiplier on the sample standard deviation when deriving `nu`.
const ACCURACY_MUL: f64 = 0.5;
/// First iteration at which regret is checked.
const REGRET_CHECK_START_T: usize = 5;
/// Growth factor between regret checks.
const REGRET_CHECK_INCREASE_T: f64 = 1.6;
/// Shrink `eta` when the best gap did not fall below this fraction of the last one.
const SHRINK_REGRET: f64 = 0.8;
/// Factor applied to `eta` on a failed regret check.
const SHRINK_ETA: f64 = 0.8;
/// Minimum number of iterations before the gap may stop the game.
const MIN_ITER: usize = 5;
/// Scalings of the averaged multipliers tried when bounding the gap from below.
const GAP_MULTIPLIERS: [f64; 4] = [1.0, 2.0, 5.0, 10.0];

/// Configuration for the exponentiated-gradient reduction.
///
/// # Defaults
///
/// | Parameter  | Default                    |
/// |------------|----------------------------|
/// | `eps`      | 0.01                       |
/// | `max_iter` | 50                         |
/// | `eta0`     | 2.0                        |
/// | `nu`       | derived from the first oracle |
/// | `seed`     | 42                         |
#[derive(Debug, Clone)]
pub struct ExponentiatedGradientConfig {
    eps: f64,
    max_iter: usize,
    eta0: f64,
    nu: Option<f64>,
    seed: u64,
}

impl Default for ExponentiatedGradientConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ExponentiatedGradientConfig {
    /// Create a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            eps: 0.01,
            max_iter: 50,
            eta0: 2.0,
            nu: None,
            seed: 42,
        }
    }

    // --- Setters ---

    /// Set the allowed constraint violation; the multiplier norm bound is `1 / eps`.
    #[must_use]
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Set the maximum number of game iterations.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the initial learning rate of the multiplier player.
    #[must_use]
    pub fn with_eta0(mut self, eta0: f64) -> Self {
        self.eta0 = eta0;
        self
    }

    /// Set the duality-gap stopping threshold explicitly.
    #[must_use]
    pub fn with_nu(mut self, nu: Option<f64>) -> Self {
        self.nu = nu;
        self
    }

    /// Set the seed of the randomized prediction.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // --- Getters ---

    /// Return the allowed constraint violation.
    #[must_use]
    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Return the maximum number of iterations.
    #[must_use]
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Return the initial learning rate.
    #[must_use]
    pub fn eta0(&self) -> f64 {
        self.eta0
    }

    /// Return the explicit stopping threshold, if set.
    #[must_use]
    pub fn nu(&self) -> Option<f64> {
        self.nu
    }

    /// Return the prediction seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn validate(&self) -> Result<(), ReductionError> {
        if !(self.eps.is_finite() && self.eps > 0.0) {
            return Err(ReductionError::InvalidParameter {
                name: "eps",
                requirement: "positive and finite",
                value: self.eps,
            });
        }
        if self.max_iter == 0 {
            return Err(ReductionError::InvalidParameter {
                name: "max_iter",
                requirement: "at least 1",
                value: 0.0,
            });
        }
        if !(self.eta0.is_finite() && self.eta0 > 0.0) {
            return Err(ReductionError::InvalidParameter {
                name: "eta0",
                requirement: "positive and finite",
                value: self.eta0,
            });
        }
        if let Some(nu) = self.nu
            && !(nu.is_finite() && nu >= 0.0)
        {
            return Err(ReductionError::InvalidParameter {
                name: "nu",
                requirement: "non-negative and finite",
                value: nu,
            });
        }
        Ok(())
    }

    /// Run the reduction on training data.
    ///
    /// `constraint` must be loaded on the same rows as `features` and
    /// `labels`. Each iteration maps the multipliers to per-row costs,
    /// fits `estimator` on the induced weighted problem, and moves the
    /// multipliers along the constraint violation of the best response.
    /// The returned mixture is the iterate with the smallest duality gap
    /// (latest on ties).
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ReductionError::InvalidParameter`] | a parameter is out of range |
    /// | [`ReductionError::LengthMismatch`] | `features`, `labels` and `constraint` disagree in rows |
    /// | [`ReductionError::EmptyInput`] / [`ReductionError::NonBinaryLabel`] | invalid labels |
    /// | [`ReductionError::Estimator`] | an oracle fit or prediction fails |
    #[instrument(skip_all, fields(n_samples = labels.len(), max_iter = self.max_iter))]
    pub fn fit<E, C>(
        &self,
        estimator: &E,
        constraint: &C,
        features: &FeatureMatrix,
        labels: &[usize],
    ) -> Result<ExponentiatedGradientModel<E::Model>, ReductionError>
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

        let b = 1.0 / self.eps;
        let mut lagrangian = Lagrangian {
            estimator,
            constraint,
            objective,
            features,
            bound: constraint.bound(),
            b,
            hs: Vec::new(),
            predictions: Vec::new(),
            errors: Vec::new(),
            gammas: Vec::new(),
            n_oracle_calls: 0,
        };

        let dim = constraint.dim();
        let mut theta = vec![0.0_f64; dim];
        let mut lambdas: Vec<Vec<f64>> = Vec::new();
        let mut lambda_sum = vec![0.0_f64; dim];
        let mut q_sum: Vec<f64> = Vec::new();
        let mut qs: Vec<Vec<f64>> = Vec::new();
        let mut gaps: Vec<f64> = Vec::new();
        let mut last_regret_checked = REGRET_CHECK_START_T as f64;
        let mut last_gap = f64::INFINITY;
        let mut nu = self.nu.unwrap_or(0.0);
        let mut eta = self.eta0 / b;

        for t in 0..self.max_iter {
            let exp_theta: Vec<f64> = theta.iter().map(|v| v.exp()).collect();
            let denom = 1.0 + exp_theta.iter().sum::<f64>();
            let lambda: Vec<f64> = exp_theta.iter().map(|e| b * e / denom).collect();
            for (s, l) in lambda_sum.iter_mut().zip(&lambda) {
                *s += l;
            }
            let lambda_eg: Vec<f64> = lambda_sum
                .iter()
                .map(|s| s / (t + 1) as f64)
                .collect();

            let h_idx = lagrangian.best_h(&lambda)?;

            if t == 0 && self.nu.is_none() {
                let abs_err: Vec<f64> = lagrangian.predictions[h_idx]
                    .iter()
                    .zip(labels)
                    .map(|(h, &y)| (h - y as f64).abs())
                    .collect();
                nu = ACCURACY_MUL * sample_std(&abs_err) / (n as f64).sqrt();
            }

            q_sum.resize(lagrangian.hs.len(), 0.0);
            q_sum[h_idx] += 1.0;
            let total: f64 = q_sum.iter().sum();
            let q: Vec<f64> = q_sum.iter().map(|v| v / total).collect();
            let gamma = lagrangian.gammas[h_idx].clone();

            let gap = lagrangian.eval_gap(&q, &lambda_eg, nu)?;
            gaps.push(gap);
            qs.push(q);
            lambdas.push(lambda);

            debug!(
                t,
                gap,
                eta,
                n_hypotheses = lagrangian.hs.len(),
                "exponentiated gradient iteration"
            );

            if gap < nu && t >= MIN_ITER {
                break;
            }

            if t as f64 >= last_regret_checked * REGRET_CHECK_INCREASE_T {
                let best_gap = gaps.iter().copied().fold(f64::INFINITY, f64::min);
                if best_gap > last_gap * SHRINK_REGRET {
                    eta *= SHRINK_ETA;
                }
                last_regret_checked = t as f64;
                last_gap = best_gap;
            }

            for ((th, g), bnd) in theta.iter_mut().zip(&gamma).zip(&lagrangian.bound) {
                *th += eta * (g - bnd);
            }
        }

        let min_gap = gaps.iter().copied().fold(f64::INFINITY, f64::min);
        let best_iter = gaps
            .iter()
            .rposition(|&g| g <= min_gap + PRECISION)
            .unwrap_or(gaps.len() - 1);

        let n_hypotheses = lagrangian.hs.len();
        let mut weights = qs.swap_remove(best_iter);
        weights.resize(n_hypotheses, 0.0);
        let lambda = lambdas.swap_remove(best_iter);

        info!(
            n_iter = gaps.len(),
            best_iter,
            best_gap = gaps[best_iter],
            n_hypotheses,
            n_oracle_calls = lagrangian.n_oracle_calls,
            "exponentiated gradient complete"
        );

        Ok(ExponentiatedGradientModel {
            predictors: lagrangian.hs,
            weights,
            lambda,
            best_gap: gaps[best_iter],
            best_iter,
            n_iter: gaps.len(),
            n_oracle_calls: lagrangian.n_oracle_calls,
            seed: self.seed,
        })
    }
}

/// Sample standard deviation (one degree of freedom removed).
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// State of the learner: every hypothesis seen so far with its training
/// error and constraint violations.
struct Lagrangian<'a, E: Estimator, C: Constraint + ?Sized> {
    estimator: &'a E,
    constraint: &'a C,
    objective: ErrorRate,
    features: &'a FeatureMatrix,
    bound: Vec<f64>,
    b: f64,
    hs: Vec<Oracle<E::Model>>,
    predictions: Vec<Vec<f64>>,
    errors: Vec<f64>,
    gammas: Vec<Vec<f64>>,
    n_oracle_calls: usize,
}

impl<E: Estimator, C: Constraint + ?Sized> Lagrangian<'_, E, C> {
    /// Fit the cost-sensitive best response to `lambda`.
    fn call_oracle(&mut self, lambda: &[f64]) -> Result<Oracle<E::Model>, ReductionError> {
        let n = self.objective.n_samples() as f64;
        let signed: Vec<f64> = self
            .objective
            .signed_weights()
            .iter()
            .zip(self.constraint.signed_weights(lambda))
            .map(|(o, c)| o + c)
            .collect();
        let reduced_labels: Vec<usize> = signed.iter().map(|&w| usize::from(w > 0.0)).collect();
        let abs_sum: f64 = signed.iter().map(|w| w.abs()).sum();
        let reduced_weights: Vec<f64> = signed.iter().map(|w| n * w.abs() / abs_sum).collect();
        self.n_oracle_calls += 1;
        Oracle::fit(self.estimator, self.features, &reduced_labels, &reduced_weights)
    }

    fn value(&self, idx: usize, lambda: &[f64]) -> f64 {
        self.errors[idx] + dot(&self.gammas[idx], lambda)
    }

    /// Return the index of the best hypothesis against `lambda`, storing a
    /// fresh oracle response only when it improves on every stored one.
    fn best_h(&mut self, lambda: &[f64]) -> Result<usize, ReductionError> {
        let h = self.call_oracle(lambda)?;
        let h_pred = predict_as_f64(&h, self.features)?;
        let h_error = self.objective.gamma(&h_pred);
        let h_gamma = self.constraint.gamma(&h_pred);
        let h_value = h_error + dot(&h_gamma, lambda);

        let (mut best_idx, best_value) = (0..self.hs.len())
            .map(|i| (i, self.value(i, lambda)))
            .fold((usize::MAX, f64::INFINITY), |acc, (i, v)| {
                if v < acc.1 { (i, v) } else { acc }
            });

        if h_value < best_value - PRECISION {
            best_idx = self.hs.len();
            self.hs.push(h);
            self.predictions.push(h_pred);
            self.errors.push(h_error);
            self.gammas.push(h_gamma);
        }
        Ok(best_idx)
    }

    /// Lagrangian value and its upper bound for mixture `q` at `lambda`.
    fn eval(&self, q: &[f64], lambda: &[f64]) -> (f64, f64) {
        let mut error = 0.0;
        let mut gamma = vec![0.0; self.bound.len()];
        for (i, &w) in q.iter().enumerate().filter(|&(_, &w)| w > 0.0) {
            error += w * self.errors[i];
            for (g, v) in gamma.iter_mut().zip(&self.gammas[i]) {
                *g += w * v;
            }
        }
        let projected = self.constraint.project_lambda(lambda);
        let violation: Vec<f64> = gamma.iter().zip(&self.bound).map(|(g, b)| g - b).collect();
        let l = error + dot(&projected, &violation);
        let max_violation = violation.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let l_high = if max_violation <= 0.0 {
            error
        } else {
            error + self.b * max_violation
        };
        (l, l_high)
    }

    /// Duality gap of mixture `q` against averaged multipliers `lambda_hat`.
    fn eval_gap(&mut self, q: &[f64], lambda_hat: &[f64], nu: f64) -> Result<f64, ReductionError> {
        let (l, l_high) = self.eval(q, lambda_hat);
        let mut l_low = l;
        let mut gap = (l - l_low).max(l_high - l);
        for mul in GAP_MULTIPLIERS {
            let scaled: Vec<f64> = lambda_hat.iter().map(|v| mul * v).collect();
            let idx = self.best_h(&scaled)?;
            let mut point = vec![0.0; idx + 1];
            point[idx] = 1.0;
            let (l_low_mul, _) = self.eval(&point, lambda_hat);
            l_low = l_low.min(l_low_mul);
            gap = (l - l_low).max(l_high - l);
            if gap > nu + PRECISION {
                break;
            }
        }
        Ok(gap)
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// A randomized mixture of classifiers returned by the exponentiated
/// gradient reduction.
#[derive(Debug, Clone)]
pub struct ExponentiatedGradientModel<M> {
    predictors: Vec<Oracle<M>>,
    weights: Vec<f64>,
    lambda: Vec<f64>,
    best_gap: f64,
    best_iter: usize,
    n_iter: usize,
    n_oracle_calls: usize,
    seed: u64,
}

impl<M: Predictor> ExponentiatedGradientModel<M> {
    /// Probability of predicting 1 for each row: `Σ w_t h_t(x)`.
    ///
    /// # Errors
    ///
    /// Returns [`ReductionError::Estimator`] if a component rejects the input.
    pub fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ReductionError> {
        let mut proba = vec![0.0; features.n_samples()];
        for (h, &w) in self.predictors.iter().zip(&self.weights) {
            if w <= 0.0 {
                continue;
            }
            for (p, y) in proba.iter_mut().zip(h.predict(features)?) {
                *p += w * y as f64;
            }
        }
        Ok(proba)
    }

    /// Return the mixture weights, one per stored hypothesis.
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Return the stored hypotheses.
    #[must_use]
    pub fn predictors(&self) -> &[Oracle<M>] {
        &self.predictors
    }

    /// Return the multipliers of the selected iterate.
    #[must_use]
    pub fn lambda(&self) -> &[f64] {
        &self.lambda
    }

    /// Return the duality gap of the selected iterate.
    #[must_use]
    pub fn best_gap(&self) -> f64 {
        self.best_gap
    }

    /// Return the zero-based index of the selected iterate.
    #[must_use]
    pub fn best_iter(&self) -> usize {
        self.best_iter
    }

    /// Return the number of iterations run.
    #[must_use]
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Return the number of oracle fits performed.
    #[must_use]
    pub fn n_oracle_calls(&self) -> usize {
        self.n_oracle_calls
    }
}

impl<M: Predictor> Predictor for ExponentiatedGradientModel<M> {
    /// Draw each label from the mixture probability with a seeded RNG, so
    /// repeated calls on the same rows agree.
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<usize>, ReductionError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        Ok(self
            .predict_proba(features)?
            .into_iter()
            .map(|p| usize::from(p >= rng.r#gen::<f64>()))
            .collect())
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

    fn biased_data() -> (FeatureMatrix, Vec<usize>, Grouping) {
        let (rows, labels, groups) = binned_rows();
        let x = FeatureMatrix::new(vec!["g".into(), "bin".into()], rows).unwrap();
        (x, labels, Grouping::from_column("grp", &Column::categorical(groups)))
    }

    fn selection_gap(pred: &[usize], g: &Grouping) -> f64 {
        let mut sel = [0.0; 2];
        let mut cnt = [0.0; 2];
        for (&p, &c) in pred.iter().zip(g.codes()) {
            sel[c] += p as f64;
            cnt[c] += 1.0;
        }
        (sel[0] / cnt[0] - sel[1] / cnt[1]).abs()
    }

    #[test]
    fn reduces_selection_rate_gap() {
        let (x, y, g) = biased_data();
        let estimator = GradientBoostingConfig::new(10).unwrap().with_max_depth(3);
        let dp = UtilityParity::load(ParityKind::DemographicParity, 0.01, &y, &g, None).unwrap();

        let baseline = Estimator::fit(&estimator, &x, &y, None).unwrap();
        let base_gap = selection_gap(&Predictor::predict(&baseline, &x).unwrap(), &g);

        let model = ExponentiatedGradientConfig::new()
            .fit(&estimator, &dp, &x, &y)
            .unwrap();
        let proba = model.predict_proba(&x).unwrap();
        let mut sel = [0.0; 2];
        for (&p, &c) in proba.iter().zip(g.codes()) {
            sel[c] += p / 50.0;
        }
        let mitigated_gap = (sel[0] - sel[1]).abs();

        assert!(base_gap > 0.9, "baseline gap {base_gap}");
        assert!(mitigated_gap < base_gap * 0.7, "mitigated gap {mitigated_gap}");
        assert!((model.weights().iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(model.n_iter() >= 1 && model.n_iter() <= 50);
    }

    #[test]
    fn prediction_is_reproducible() {
        let (x, y, g) = biased_data();
        let estimator = GradientBoostingConfig::new(5).unwrap();
        let dp = UtilityParity::load(ParityKind::DemographicParity, 0.01, &y, &g, None).unwrap();
        let model = ExponentiatedGradientConfig::new()
            .with_max_iter(8)
            .fit(&estimator, &dp, &x, &y)
            .unwrap();
        assert_eq!(model.predict(&x).unwrap(), model.predict(&x).unwrap());
        assert!(model.n_iter() <= 8);
    }

    #[test]
    fn invalid_parameters_rejected() {
        let (x, y, g) = biased_data();
        let estimator = GradientBoostingConfig::new(2).unwrap();
        let dp = UtilityParity::load(ParityKind::DemographicParity, 0.01, &y, &g, None).unwrap();
        let err = ExponentiatedGradientConfig::new()
            .with_eps(0.0)
            .fit(&estimator, &dp, &x, &y)
            .unwrap_err();
        assert!(matches!(err, ReductionError::InvalidParameter { name: "eps", .. }));
    }

    #[test]
    fn misaligned_constraint_rejected() {
        let (x, y, g) = biased_data();
        let estimator = GradientBoostingConfig::new(2).unwrap();
        let short = g.select(&(0..10).collect::<Vec<_>>());
        let dp = UtilityParity::load(ParityKind::DemographicParity, 0.01, &y[..10], &short, None)
            .unwrap();
        let err = ExponentiatedGradientConfig::new()
            .fit(&estimator, &dp, &x, &y)
            .unwrap_err();
        assert!(matches!(
            err,
            ReductionError::LengthMismatch {
                what: "constraint",
                ..
            }
        ));
    }

    #[test]
    fn sample_std_uses_one_degree_of_freedom() {
        assert!((sample_std(&[1.0, 2.0, 3.0, 4.0]) - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(sample_std(&[1.0]), 0.0);
    }
}
