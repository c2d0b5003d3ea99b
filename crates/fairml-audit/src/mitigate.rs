//! Demographic-parity mitigation of the baseline classifier.

use fairml_metrics::{Evaluation, evaluate};
use fairml_reductions::{
    ErrorDisparity, Estimator, GridSearchConfig, ParityKind, Predictor, UtilityParity,
    non_dominated,
};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::config::AuditConfig;
use crate::detect::FairnessResult;
use crate::error::AuditError;

/// Test-set outcome of the exponentiated-gradient mitigation.
#[derive(Debug, Clone, Serialize)]
pub struct MitigationReport {
    /// Evaluation of the mitigated predictions.
    pub evaluation: Evaluation,
    /// Randomized test-set predictions of the mitigated model.
    pub predictions: Vec<usize>,
    /// Iterations run by the reduction.
    pub n_iter: usize,
    /// Duality gap of the returned mixture.
    pub best_gap: f64,
    /// Classifiers with positive weight in the mixture.
    pub n_active_classifiers: usize,
}

/// One labelled model compared by the grid mitigation.
#[derive(Debug, Clone, Serialize)]
pub struct GridCandidate {
    /// `unmitigated` or `dominant_model_{i}`.
    pub label: String,
    /// Position in the sweep; `None` for the unmitigated baseline.
    pub grid_index: Option<usize>,
    /// Training error rate; `None` for the unmitigated baseline.
    pub error: Option<f64>,
    /// Worst training parity violation; `None` for the unmitigated baseline.
    pub disparity: Option<f64>,
    /// Test-set evaluation.
    pub evaluation: Evaluation,
    /// Test-set predictions.
    pub predictions: Vec<usize>,
}

/// Quality against fairness for one candidate, for plotting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeoffPoint {
    /// Candidate label.
    pub label: String,
    /// Mean quality metric across control strata.
    pub quality: f64,
    /// Demographic-parity difference.
    pub fairness: f64,
}

/// Outcome of the grid-search mitigation.
#[derive(Debug, Clone, Serialize)]
pub struct GridMitigationReport {
    /// Number of models in the sweep.
    pub n_predictors: usize,
    /// The unmitigated baseline followed by every non-dominated model.
    pub candidates: Vec<GridCandidate>,
    /// Label of the selected model.
    pub selected: String,
    /// Evaluation of the selected model.
    pub selected_evaluation: Evaluation,
    /// One point per candidate, in candidate order.
    pub tradeoff: Vec<TradeoffPoint>,
}

fn parity_constraint<M>(
    baseline: &FairnessResult<M>,
    config: &AuditConfig,
) -> Result<UtilityParity, AuditError> {
    let split = baseline.split();
    Ok(UtilityParity::load(
        ParityKind::DemographicParity,
        config.difference_bound(),
        &split.y_train,
        &split.a_train,
        split.cf_train.as_ref(),
    )?)
}

/// Retrain with the exponentiated-gradient reduction and evaluate on the
/// test rows of `baseline`'s split.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`AuditError::InvalidParameter`] | `config` is out of range |
/// | [`AuditError::Reduction`] | the reduction or a refit fails |
/// | [`AuditError::Metrics`] | evaluation fails |
#[instrument(skip_all, fields(sensitive_feature = baseline.sensitive_feature()))]
pub fn exponentiated_gradient<E: Estimator>(
    estimator: &E,
    baseline: &FairnessResult<E::Model>,
    config: &AuditConfig,
) -> Result<MitigationReport, AuditError> {
    config.validate()?;
    let split = baseline.split();
    let constraint = parity_constraint(baseline, config)?;
    let model =
        config
            .exponentiated_gradient()
            .fit(estimator, &constraint, &split.x_train, &split.y_train)?;

    let predictions = model.predict(&split.x_test)?;
    let evaluation = evaluate(
        split.cf_test.as_ref(),
        &split.a_test,
        &split.y_test,
        &predictions,
        config.quality_metric(),
    )?;
    info!(
        fairness = evaluation.fairness,
        baseline_fairness = baseline.fairness_metric(),
        "exponentiated gradient mitigation"
    );

    Ok(MitigationReport {
        evaluation,
        predictions,
        n_iter: model.n_iter(),
        best_gap: model.best_gap(),
        n_active_classifiers: model.weights().iter().filter(|&&w| w > 0.0).count(),
    })
}

/// Index of the smallest value, skipping NaN; the first one on ties.
fn argmin_defined(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if b <= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Sweep a grid of parity-constrained models, keep the Pareto frontier of
/// training error against training disparity, and select the frontier
/// model with the smallest demographic-parity difference on the test rows.
///
/// The unmitigated baseline is reported as the first candidate but is
/// never selected.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`AuditError::InvalidParameter`] | `config` is out of range |
/// | [`AuditError::Reduction`] | the sweep or a prediction fails |
/// | [`AuditError::Metrics`] | evaluation fails |
/// | [`AuditError::NoSelection`] | every frontier model has an undefined fairness score |
#[instrument(skip_all, fields(sensitive_feature = baseline.sensitive_feature(), grid_size = config.grid_size()))]
pub fn grid_search<E: Estimator>(
    estimator: &E,
    baseline: &FairnessResult<E::Model>,
    config: &AuditConfig,
) -> Result<GridMitigationReport, AuditError> {
    config.validate()?;
    let split = baseline.split();
    let constraint = parity_constraint(baseline, config)?;
    let sweep = GridSearchConfig::new(config.grid_size())?
        .with_grid_limit(config.grid_limit())
        .fit(estimator, &constraint, &split.x_train, &split.y_train)?;

    let points: Vec<ErrorDisparity> = sweep
        .predictors()
        .iter()
        .map(|p| {
            let disparity = p.gamma().iter().copied().fold(f64::NEG_INFINITY, f64::max);
            ErrorDisparity::new(p.objective(), disparity)
        })
        .collect();
    let frontier = non_dominated(&points);
    info!(
        n_predictors = points.len(),
        n_non_dominated = frontier.len(),
        "dominance filter"
    );

    let evaluate_test = |predictions: &[usize]| {
        evaluate(
            split.cf_test.as_ref(),
            &split.a_test,
            &split.y_test,
            predictions,
            config.quality_metric(),
        )
    };

    let mut candidates = vec![GridCandidate {
        label: "unmitigated".to_string(),
        grid_index: None,
        error: None,
        disparity: None,
        evaluation: baseline.evaluation().clone(),
        predictions: baseline.classifier().predict(&split.x_test)?,
    }];
    for (i, &idx) in frontier.iter().enumerate() {
        let label = format!("dominant_model_{i}");
        let predictions = sweep.predictors()[idx].predict(&split.x_test)?;
        let evaluation = evaluate_test(&predictions)?;
        debug!(
            label = %label,
            grid_index = idx,
            error = points[idx].error,
            disparity = points[idx].disparity,
            fairness = evaluation.fairness,
            "frontier model"
        );
        candidates.push(GridCandidate {
            label,
            grid_index: Some(idx),
            error: Some(points[idx].error),
            disparity: Some(points[idx].disparity),
            evaluation,
            predictions,
        });
    }

    let frontier_fairness: Vec<f64> = candidates[1..]
        .iter()
        .map(|c| c.evaluation.fairness)
        .collect();
    let selected_idx = 1 + argmin_defined(&frontier_fairness).ok_or(AuditError::NoSelection {
        n_frontier: frontier.len(),
    })?;
    let selected = candidates[selected_idx].label.clone();
    let selected_evaluation = evaluate_test(&candidates[selected_idx].predictions)?;
    info!(
        selected = %selected,
        fairness = selected_evaluation.fairness,
        quality = selected_evaluation.frame.mean_quality(),
        "grid search selected model"
    );

    let tradeoff = candidates
        .iter()
        .map(|c| TradeoffPoint {
            label: c.label.clone(),
            quality: c.evaluation.frame.mean_quality(),
            fairness: c.evaluation.fairness,
        })
        .collect();

    Ok(GridMitigationReport {
        n_predictors: points.len(),
        selected,
        selected_evaluation,
        candidates,
        tradeoff,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmin_skips_nan_and_keeps_first_tie() {
        assert_eq!(argmin_defined(&[0.3, f64::NAN, 0.1, 0.1]), Some(2));
        assert_eq!(argmin_defined(&[f64::NAN, 0.4]), Some(1));
        // Values at or above 1 remain selectable.
        assert_eq!(argmin_defined(&[1.5, 1.2]), Some(1));
    }

    #[test]
    fn argmin_of_undefined_values_is_none() {
        assert_eq!(argmin_defined(&[f64::NAN, f64::NAN]), None);
        assert_eq!(argmin_defined(&[]), None);
    }
}
