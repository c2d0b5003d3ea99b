use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::confusion::BinaryConfusion;
use crate::error::MetricsError;

/// Classifier quality metric, selected by scorer name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityMetric {
    /// Fraction of correct predictions.
    Accuracy,
    /// Mean recall over present classes.
    BalancedAccuracy,
    /// Harmonic mean of precision and recall.
    F1,
    /// Positive predictive value.
    Precision,
    /// True positive rate.
    Recall,
    /// Intersection over union of the positive class.
    Jaccard,
}

impl QualityMetric {
    /// Every supported metric, in display order.
    pub const ALL: [QualityMetric; 6] = [
        QualityMetric::Accuracy,
        QualityMetric::BalancedAccuracy,
        QualityMetric::F1,
        QualityMetric::Precision,
        QualityMetric::Recall,
        QualityMetric::Jaccard,
    ];

    /// Return the scorer name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            QualityMetric::Accuracy => "accuracy",
            QualityMetric::BalancedAccuracy => "balanced_accuracy",
            QualityMetric::F1 => "f1",
            QualityMetric::Precision => "precision",
            QualityMetric::Recall => "recall",
            QualityMetric::Jaccard => "jaccard",
        }
    }

    /// Score a confusion matrix.
    #[must_use]
    pub fn score(self, cm: &BinaryConfusion) -> f64 {
        match self {
            QualityMetric::Accuracy => cm.accuracy(),
            QualityMetric::BalancedAccuracy => cm.balanced_accuracy(),
            QualityMetric::F1 => cm.f1(),
            QualityMetric::Precision => cm.precision(),
            QualityMetric::Recall => cm.recall(),
            QualityMetric::Jaccard => cm.jaccard(),
        }
    }
}

impl FromStr for QualityMetric {
    type Err = MetricsError;

    /// Parse a scorer name, accepting an optional `_score` suffix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        let key = key.strip_suffix("_score").unwrap_or(&key);
        Self::ALL
            .into_iter()
            .find(|m| m.name() == key)
            .ok_or_else(|| MetricsError::UnknownQualityMetric {
                name: s.to_string(),
                known: Self::ALL.map(QualityMetric::name).join(", "),
            })
    }
}

impl fmt::Display for QualityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names() {
        for metric in QualityMetric::ALL {
            assert_eq!(metric.name().parse::<QualityMetric>().unwrap(), metric);
        }
        assert_eq!(
            "F1_score".parse::<QualityMetric>().unwrap(),
            QualityMetric::F1
        );
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "roc_auc".parse::<QualityMetric>().unwrap_err();
        match err {
            MetricsError::UnknownQualityMetric { name, known } => {
                assert_eq!(name, "roc_auc");
                assert!(known.contains("balanced_accuracy"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
