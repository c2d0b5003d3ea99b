//! Baseline training per candidate attribute and unfairness ranking.

use std::cmp::Ordering;

use fairml_data::{Grouping, SplitData, Table, one_hot, reduce_groups, stratified_split};
use fairml_metrics::{Evaluation, MetricFrame, evaluate};
use fairml_reductions::{Estimator, Predictor};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::config::AuditConfig;
use crate::error::{AuditError, ErrorKind};

/// Baseline classifier, split and evaluation for one sensitive attribute.
#[derive(Debug, Clone)]
pub struct FairnessResult<M> {
    sensitive_feature: String,
    classifier: M,
    split: SplitData,
    evaluation: Evaluation,
}

impl<M> FairnessResult<M> {
    /// Return the sensitive attribute.
    #[must_use]
    pub fn sensitive_feature(&self) -> &str {
        &self.sensitive_feature
    }

    /// Return the baseline classifier trained without the sensitive attribute.
    #[must_use]
    pub fn classifier(&self) -> &M {
        &self.classifier
    }

    /// Return the row-aligned train/test split.
    #[must_use]
    pub fn split(&self) -> &SplitData {
        &self.split
    }

    /// Return the test-set evaluation.
    #[must_use]
    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    /// Return the test-set metric frame.
    #[must_use]
    pub fn metric_frame(&self) -> &MetricFrame {
        &self.evaluation.frame
    }

    /// Return the demographic-parity difference on the test set.
    #[must_use]
    pub fn fairness_metric(&self) -> f64 {
        self.evaluation.fairness
    }

    /// Return the names of the features the classifier was trained on.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        self.split.x_train.names()
    }
}

/// Outcome of detection for one candidate attribute.
#[derive(Debug, Clone)]
pub enum Detection<M> {
    /// The baseline trained and produced a finite fairness score.
    Scored(FairnessResult<M>),
    /// The candidate could not be scored.
    Undefined {
        /// The candidate attribute.
        sensitive_feature: String,
        /// Why no score exists.
        reason: String,
        /// Classification of the failure.
        kind: ErrorKind,
    },
}

impl<M> Detection<M> {
    /// Return the candidate attribute.
    #[must_use]
    pub fn sensitive_feature(&self) -> &str {
        match self {
            Detection::Scored(result) => result.sensitive_feature(),
            Detection::Undefined {
                sensitive_feature, ..
            } => sensitive_feature,
        }
    }

    /// Return the fairness score, `None` when undefined.
    #[must_use]
    pub fn fairness(&self) -> Option<f64> {
        match self {
            Detection::Scored(result) => Some(result.fairness_metric()),
            Detection::Undefined { .. } => None,
        }
    }

    /// Summarise this detection at 1-based `rank`.
    #[must_use]
    pub fn entry(&self, rank: usize) -> RankingEntry {
        RankingEntry {
            rank,
            sensitive_feature: self.sensitive_feature().to_string(),
            fairness: self.fairness(),
            undefined_reason: match self {
                Detection::Scored(_) => None,
                Detection::Undefined { reason, .. } => Some(reason.clone()),
            },
        }
    }
}

/// One row of the unfairness ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    /// 1-based position, most unfair first.
    pub rank: usize,
    /// The candidate attribute.
    pub sensitive_feature: String,
    /// Demographic-parity difference, absent when undefined.
    pub fairness: Option<f64>,
    /// Failure description for undefined candidates.
    pub undefined_reason: Option<String>,
}

/// Train and evaluate a baseline classifier for one sensitive attribute.
///
/// The attribute (and the control attribute, if configured) is bucketized
/// into groups, removed from the features, and the remaining table is
/// one-hot encoded. One stratified split is computed on `labels` and
/// applied to features, labels and both groupings. The classifier is
/// trained on the training rows and evaluated on the test rows.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`AuditError::Data`] | unknown column, bad bucket count or split parameters, misaligned rows |
/// | [`AuditError::Reduction`] | the estimator fails to train or predict |
/// | [`AuditError::Metrics`] | evaluation fails |
#[instrument(skip_all, fields(sensitive_feature = %sensitive_feature))]
pub fn sensitive_train<E: Estimator>(
    estimator: &E,
    features: &Table,
    labels: &[usize],
    sensitive_feature: &str,
    config: &AuditConfig,
) -> Result<FairnessResult<E::Model>, AuditError> {
    let control = config
        .control_feature()
        .map(|name| {
            let bucketized = reduce_groups(features.column(name)?, config.n_buckets())?;
            Ok::<_, AuditError>(Grouping::from_column(name, &bucketized))
        })
        .transpose()?;
    let sensitive = Grouping::from_column(
        sensitive_feature,
        &reduce_groups(features.column(sensitive_feature)?, config.n_buckets())?,
    );
    let x = one_hot(&features.drop(sensitive_feature)?);

    let indices = stratified_split(labels, config.test_fraction(), config.seed())?;
    let split = SplitData::new(&indices, &x, labels, &sensitive, control.as_ref())?;

    let classifier = estimator.fit(&split.x_train, &split.y_train, None)?;
    let predictions = classifier.predict(&split.x_test)?;
    let evaluation = evaluate(
        split.cf_test.as_ref(),
        &split.a_test,
        &split.y_test,
        &predictions,
        config.quality_metric(),
    )?;

    Ok(FairnessResult {
        sensitive_feature: sensitive_feature.to_string(),
        classifier,
        split,
        evaluation,
    })
}

/// Most unfair first; undefined candidates last; ties keep input order.
fn by_unfairness<M>(a: &Detection<M>, b: &Detection<M>) -> Ordering {
    match (a.fairness(), b.fairness()) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Score every candidate attribute and rank them, most unfair first.
///
/// Candidates are trained independently and in parallel. A candidate that
/// fails, or whose fairness score is not finite, is kept as
/// [`Detection::Undefined`] after every scored candidate and logged with
/// `warn!`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`AuditError::InvalidParameter`] | `config` is out of range |
/// | [`AuditError::Data`] | the control attribute is not a column of `features` |
#[instrument(skip_all, fields(n_candidates = config.sensitive_features().len()))]
pub fn rank_candidates<E: Estimator>(
    estimator: &E,
    features: &Table,
    labels: &[usize],
    config: &AuditConfig,
) -> Result<Vec<Detection<E::Model>>, AuditError> {
    config.validate()?;
    if let Some(control) = config.control_feature() {
        features.column(control)?;
    }

    let mut detections: Vec<Detection<E::Model>> = config
        .sensitive_features()
        .par_iter()
        .map(
            |name| match sensitive_train(estimator, features, labels, name, config) {
                Ok(result) if result.fairness_metric().is_finite() => Detection::Scored(result),
                Ok(result) => {
                    let reason = format!("fairness metric is {}", result.fairness_metric());
                    warn!(sensitive_feature = %name, %reason, "candidate undefined");
                    Detection::Undefined {
                        sensitive_feature: name.clone(),
                        reason,
                        kind: ErrorKind::Input,
                    }
                }
                Err(e) => {
                    warn!(sensitive_feature = %name, error = %e, "candidate undefined");
                    Detection::Undefined {
                        sensitive_feature: name.clone(),
                        reason: e.to_string(),
                        kind: e.kind(),
                    }
                }
            },
        )
        .collect();
    detections.sort_by(by_unfairness);

    for (i, d) in detections.iter().enumerate() {
        info!(
            rank = i + 1,
            sensitive_feature = d.sensitive_feature(),
            fairness = ?d.fairness(),
            "unfairness ranking"
        );
    }
    Ok(detections)
}

/// Return the `num_of_mitigated_features` most unfair candidates.
///
/// # Errors
///
/// Same as [`rank_candidates`].
pub fn unfairness_recognition<E: Estimator>(
    estimator: &E,
    features: &Table,
    labels: &[usize],
    config: &AuditConfig,
) -> Result<Vec<Detection<E::Model>>, AuditError> {
    let mut detections = rank_candidates(estimator, features, labels, config)?;
    detections.truncate(config.num_of_mitigated_features());
    Ok(detections)
}
