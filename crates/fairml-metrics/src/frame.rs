//! The structured result of a group-wise evaluation.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::confusion::BinaryConfusion;
use crate::quality::QualityMetric;

/// The three metrics evaluated for every slice of the data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricValues {
    /// Value of the configured quality metric.
    pub quality: f64,
    /// Fraction of rows predicted positive.
    pub selection_rate: f64,
    /// Number of rows in the slice.
    pub count: usize,
}

impl MetricValues {
    pub(crate) fn from_confusion(cm: &BinaryConfusion, metric: QualityMetric) -> Self {
        Self {
            quality: metric.score(cm),
            selection_rate: cm.selection_rate(),
            count: cm.count(),
        }
    }
}

/// Max-minus-min of each metric across the sensitive groups of one stratum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StratumDifference {
    /// Control level of the stratum, `None` when no control is configured.
    pub control: Option<String>,
    /// Spread of the quality metric.
    pub quality: f64,
    /// Spread of the selection rate (demographic-parity difference).
    pub selection_rate: f64,
    /// Spread of the group sizes.
    pub count: f64,
}

impl StratumDifference {
    pub(crate) fn across<'a>(
        control: Option<String>,
        groups: impl IntoIterator<Item = &'a MetricValues>,
    ) -> Self {
        let mut lo = [f64::INFINITY; 3];
        let mut hi = [f64::NEG_INFINITY; 3];
        let mut any = false;
        for v in groups {
            any = true;
            for (k, x) in [v.quality, v.selection_rate, v.count as f64]
                .into_iter()
                .enumerate()
            {
                lo[k] = lo[k].min(x);
                hi[k] = hi[k].max(x);
            }
        }
        let spread = |k: usize| if any { hi[k] - lo[k] } else { 0.0 };
        Self {
            control,
            quality: spread(0),
            selection_rate: spread(1),
            count: spread(2),
        }
    }
}

/// Overall, per-group and per-(control, group) metrics of one evaluation.
///
/// Produced fresh by [`crate::evaluate`] and never mutated afterwards.
/// Group keys are the grouping levels; only groups with at least one row
/// appear.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricFrame {
    pub(crate) quality_metric: QualityMetric,
    pub(crate) sensitive_feature: String,
    pub(crate) control_feature: Option<String>,
    pub(crate) overall: MetricValues,
    pub(crate) overall_by_control: Option<BTreeMap<String, MetricValues>>,
    pub(crate) by_group: BTreeMap<String, MetricValues>,
    pub(crate) by_control_group: Option<BTreeMap<String, BTreeMap<String, MetricValues>>>,
    pub(crate) differences: Vec<StratumDifference>,
}

impl MetricFrame {
    /// Return the quality metric evaluated.
    #[must_use]
    pub fn quality_metric(&self) -> QualityMetric {
        self.quality_metric
    }

    /// Return the sensitive attribute name.
    #[must_use]
    pub fn sensitive_feature(&self) -> &str {
        &self.sensitive_feature
    }

    /// Return the control attribute name, if any.
    #[must_use]
    pub fn control_feature(&self) -> Option<&str> {
        self.control_feature.as_deref()
    }

    /// Metrics over every row.
    #[must_use]
    pub fn overall(&self) -> &MetricValues {
        &self.overall
    }

    /// Metrics over every row of each control stratum.
    #[must_use]
    pub fn overall_by_control(&self) -> Option<&BTreeMap<String, MetricValues>> {
        self.overall_by_control.as_ref()
    }

    /// Metrics per sensitive group, over all control strata.
    #[must_use]
    pub fn by_group(&self) -> &BTreeMap<String, MetricValues> {
        &self.by_group
    }

    /// Metrics per sensitive group within each control stratum.
    #[must_use]
    pub fn by_control_group(&self) -> Option<&BTreeMap<String, BTreeMap<String, MetricValues>>> {
        self.by_control_group.as_ref()
    }

    /// Per-stratum differences; a single entry when no control is set.
    #[must_use]
    pub fn differences(&self) -> &[StratumDifference] {
        &self.differences
    }

    /// Mean selection-rate difference across strata.
    #[must_use]
    pub fn fairness_metric(&self) -> f64 {
        if self.differences.is_empty() {
            return 0.0;
        }
        self.differences.iter().map(|d| d.selection_rate).sum::<f64>()
            / self.differences.len() as f64
    }

    /// Mean of the overall quality metric across control strata, or the
    /// overall value when no control is set.
    #[must_use]
    pub fn mean_quality(&self) -> f64 {
        match &self.overall_by_control {
            Some(strata) if !strata.is_empty() => {
                strata.values().map(|v| v.quality).sum::<f64>() / strata.len() as f64
            }
            _ => self.overall.quality,
        }
    }
}
