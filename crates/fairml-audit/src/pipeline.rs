//! Detection followed by both mitigations on the most unfair attribute.

use fairml_data::{Table, binary_labels};
use fairml_metrics::{Evaluation, QualityMetric};
use fairml_reductions::Estimator;
use serde::Serialize;
use tracing::{info, instrument};

use crate::config::AuditConfig;
use crate::detect::{Detection, RankingEntry, rank_candidates};
use crate::error::AuditError;
use crate::mitigate::{GridMitigationReport, MitigationReport, exponentiated_gradient, grid_search};

/// Everything one audit run produced.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    /// Name of the label column.
    pub label_column: String,
    /// Every candidate attribute, most unfair first.
    pub ranking: Vec<RankingEntry>,
    /// The attribute that was mitigated.
    pub sensitive_feature: String,
    /// The control attribute, if any.
    pub control_feature: Option<String>,
    /// The quality metric reported next to fairness.
    pub quality_metric: QualityMetric,
    /// Test-set evaluation of the unmitigated baseline.
    pub baseline: Evaluation,
    /// Exponentiated-gradient mitigation outcome.
    pub exponentiated_gradient: MitigationReport,
    /// Grid-search mitigation outcome.
    pub grid_search: GridMitigationReport,
}

/// Run the whole audit on `dataset`.
///
/// Pops `label_column` as binary labels, ranks every candidate attribute,
/// and mitigates the most unfair one with both reductions. Both
/// mitigations reuse the split computed for that attribute during
/// detection.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`AuditError::InvalidParameter`] | `config` is out of range |
/// | [`AuditError::Data`] | missing or non-binary label column, unknown control column |
/// | [`AuditError::AllCandidatesUndefined`] | no candidate produced a fairness score; its kind is the first candidate's |
/// | any variant of [`exponentiated_gradient`] or [`grid_search`] | a mitigation fails |
#[instrument(skip_all, fields(label_column = label_column))]
pub fn full_auto_pipeline<E: Estimator>(
    estimator: &E,
    mut dataset: Table,
    label_column: &str,
    config: &AuditConfig,
) -> Result<AuditReport, AuditError> {
    config.validate()?;
    let labels = binary_labels(&dataset.pop(label_column)?)?;

    let detections = rank_candidates(estimator, &dataset, &labels, config)?;
    let ranking: Vec<RankingEntry> = detections
        .iter()
        .enumerate()
        .map(|(i, d)| d.entry(i + 1))
        .collect();
    let n_candidates = detections.len();
    let most_biased = match detections.into_iter().next() {
        Some(Detection::Scored(result)) => result,
        Some(Detection::Undefined { kind, .. }) => {
            return Err(AuditError::AllCandidatesUndefined { n_candidates, kind });
        }
        None => return Err(AuditError::NoCandidates),
    };
    info!(
        sensitive_feature = most_biased.sensitive_feature(),
        fairness = most_biased.fairness_metric(),
        "most biased attribute"
    );

    let exponentiated_gradient = exponentiated_gradient(estimator, &most_biased, config)?;
    let grid_search = grid_search(estimator, &most_biased, config)?;

    Ok(AuditReport {
        label_column: label_column.to_string(),
        ranking,
        sensitive_feature: most_biased.sensitive_feature().to_string(),
        control_feature: config.control_feature().map(str::to_string),
        quality_metric: config.quality_metric(),
        baseline: most_biased.evaluation().clone(),
        exponentiated_gradient,
        grid_search,
    })
}
