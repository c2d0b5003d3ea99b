//! Group-wise evaluation of a binary classifier's predictions.

use std::collections::BTreeMap;

use fairml_data::Grouping;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::confusion::{BinaryConfusion, check_binary};
use crate::error::MetricsError;
use crate::frame::{MetricFrame, MetricValues, StratumDifference};
use crate::quality::QualityMetric;

/// A metric frame together with its fairness scalar.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    /// The full metric structure.
    pub frame: MetricFrame,
    /// Mean demographic-parity difference across control strata.
    pub fairness: f64,
}

/// Metrics per group code, for the groups that own at least one row.
fn per_group(
    grouping: &Grouping,
    y_true: &[usize],
    y_pred: &[usize],
    rows: &[usize],
    metric: QualityMetric,
) -> BTreeMap<String, MetricValues> {
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); grouping.n_levels()];
    for &i in rows {
        members[grouping.codes()[i]].push(i);
    }
    members
        .into_iter()
        .enumerate()
        .filter(|(_, m)| !m.is_empty())
        .map(|(code, m)| {
            let cm = BinaryConfusion::from_rows(y_true, y_pred, m);
            (
                grouping.levels()[code].clone(),
                MetricValues::from_confusion(&cm, metric),
            )
        })
        .collect()
}

/// Evaluate predictions per sensitive group, optionally within control strata.
///
/// Computes the quality metric, selection rate and count overall, per
/// sensitive group and, with a control grouping, per control stratum and per
/// (control, sensitive) pair. The difference of each metric is taken
/// within every control stratum (or once over all rows), and the fairness
/// scalar is the mean selection-rate difference. The report is emitted as
/// `info!`/`debug!` events.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`MetricsError::Empty`] | `y_true` is empty |
/// | [`MetricsError::LengthMismatch`] | `y_pred`, `sensitive` or `control` differ in length from `y_true` |
/// | [`MetricsError::NonBinary`] | A label or prediction is not 0 or 1 |
#[instrument(skip_all, fields(sensitive = sensitive.name(), control = control.map(Grouping::name), metric = %metric))]
pub fn evaluate(
    control: Option<&Grouping>,
    sensitive: &Grouping,
    y_true: &[usize],
    y_pred: &[usize],
    metric: QualityMetric,
) -> Result<Evaluation, MetricsError> {
    let n = y_true.len();
    if n == 0 {
        return Err(MetricsError::Empty);
    }
    let aligned = |what: &'static str, got: usize| {
        if got == n {
            Ok(())
        } else {
            Err(MetricsError::LengthMismatch {
                what,
                expected: n,
                got,
            })
        }
    };
    aligned("y_pred", y_pred.len())?;
    aligned("sensitive grouping", sensitive.len())?;
    if let Some(control) = control {
        aligned("control grouping", control.len())?;
    }
    check_binary("y_true", y_true)?;
    check_binary("y_pred", y_pred)?;

    let all_rows: Vec<usize> = (0..n).collect();
    let overall = MetricValues::from_confusion(
        &BinaryConfusion::from_rows(y_true, y_pred, 0..n),
        metric,
    );
    let by_group = per_group(sensitive, y_true, y_pred, &all_rows, metric);

    let (overall_by_control, by_control_group, differences) = match control {
        None => {
            let diff = StratumDifference::across(None, by_group.values());
            (None, None, vec![diff])
        }
        Some(control) => {
            let mut strata: Vec<Vec<usize>> = vec![Vec::new(); control.n_levels()];
            for (i, &code) in control.codes().iter().enumerate() {
                strata[code].push(i);
            }

            let mut overall_by_control = BTreeMap::new();
            let mut by_control_group = BTreeMap::new();
            let mut differences = Vec::new();
            for (code, rows) in strata.iter().enumerate() {
                if rows.is_empty() {
                    continue;
                }
                let level = control.levels()[code].clone();
                let cm = BinaryConfusion::from_rows(y_true, y_pred, rows.iter().copied());
                overall_by_control.insert(level.clone(), MetricValues::from_confusion(&cm, metric));

                let groups = per_group(sensitive, y_true, y_pred, rows, metric);
                differences.push(StratumDifference::across(Some(level.clone()), groups.values()));
                by_control_group.insert(level, groups);
            }
            (Some(overall_by_control), Some(by_control_group), differences)
        }
    };

    let frame = MetricFrame {
        quality_metric: metric,
        sensitive_feature: sensitive.name().to_string(),
        control_feature: control.map(|c| c.name().to_string()),
        overall,
        overall_by_control,
        by_group,
        by_control_group,
        differences,
    };
    let fairness = frame.fairness_metric();

    report(&frame, fairness);

    Ok(Evaluation { frame, fairness })
}

fn report(frame: &MetricFrame, fairness: f64) {
    debug!(overall = ?frame.overall(), "overall metrics");
    if let Some(strata) = frame.overall_by_control() {
        for (level, values) in strata {
            debug!(control_level = %level, ?values, "overall metrics in stratum");
        }
    }
    for (group, values) in frame.by_group() {
        debug!(group = %group, ?values, "metrics by group");
    }
    for d in frame.differences() {
        debug!(
            control_level = d.control.as_deref().unwrap_or("<all>"),
            quality = d.quality,
            selection_rate = d.selection_rate,
            count = d.count,
            "difference"
        );
    }
    info!(
        sensitive_feature = frame.sensitive_feature(),
        control_feature = frame.control_feature().unwrap_or("<none>"),
        demographic_parity_difference = fairness,
        mean_quality = frame.mean_quality(),
        metric = %frame.quality_metric(),
        "fairness evaluation"
    );
}
