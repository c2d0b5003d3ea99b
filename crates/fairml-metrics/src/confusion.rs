//! Binary confusion counts and the scores derived from them.

use std::fmt;

use crate::error::MetricsError;

/// Confusion counts for a binary classifier, positive class `1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinaryConfusion {
    tp: usize,
    fp: usize,
    tn: usize,
    fn_: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl BinaryConfusion {
    /// Count outcomes over the rows selected by `rows`.
    ///
    /// Labels are assumed validated as binary by the caller.
    pub(crate) fn from_rows(
        y_true: &[usize],
        y_pred: &[usize],
        rows: impl IntoIterator<Item = usize>,
    ) -> Self {
        let mut cm = Self::default();
        for i in rows {
            match (y_true[i], y_pred[i]) {
                (1, 1) => cm.tp += 1,
                (0, 1) => cm.fp += 1,
                (1, _) => cm.fn_ += 1,
                _ => cm.tn += 1,
            }
        }
        cm
    }

    /// Build a confusion matrix from true and predicted labels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`MetricsError::Empty`] | Zero labels provided |
    /// | [`MetricsError::LengthMismatch`] | `y_pred` differs in length from `y_true` |
    /// | [`MetricsError::NonBinary`] | A label or prediction is not 0 or 1 |
    pub fn from_labels(y_true: &[usize], y_pred: &[usize]) -> Result<Self, MetricsError> {
        if y_true.is_empty() {
            return Err(MetricsError::Empty);
        }
        if y_pred.len() != y_true.len() {
            return Err(MetricsError::LengthMismatch {
                what: "y_pred",
                expected: y_true.len(),
                got: y_pred.len(),
            });
        }
        check_binary("y_true", y_true)?;
        check_binary("y_pred", y_pred)?;
        Ok(Self::from_rows(y_true, y_pred, 0..y_true.len()))
    }

    /// Number of rows counted.
    #[must_use]
    pub fn count(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }

    /// Fraction of rows predicted positive.
    #[must_use]
    pub fn selection_rate(&self) -> f64 {
        ratio(self.tp + self.fp, self.count())
    }

    /// Proportion of correct predictions.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.count())
    }

    /// TP / (TP + FP), 0.0 when nothing is predicted positive.
    #[must_use]
    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    /// TP / (TP + FN), 0.0 when there are no positives.
    #[must_use]
    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    /// Harmonic mean of precision and recall, 0.0 when both are zero.
    #[must_use]
    pub fn f1(&self) -> f64 {
        ratio(2 * self.tp, 2 * self.tp + self.fp + self.fn_)
    }

    /// TP / (TP + FP + FN), 0.0 when the denominator is zero.
    #[must_use]
    pub fn jaccard(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp + self.fn_)
    }

    /// Mean per-class recall over the classes present in `y_true`.
    #[must_use]
    pub fn balanced_accuracy(&self) -> f64 {
        let recalls: Vec<f64> = [(self.tp, self.fn_), (self.tn, self.fp)]
            .into_iter()
            .filter(|&(hit, miss)| hit + miss > 0)
            .map(|(hit, miss)| ratio(hit, hit + miss))
            .collect();
        if recalls.is_empty() {
            0.0
        } else {
            recalls.iter().sum::<f64>() / recalls.len() as f64
        }
    }
}

pub(crate) fn check_binary(what: &'static str, values: &[usize]) -> Result<(), MetricsError> {
    match values.iter().enumerate().find(|&(_, &v)| v > 1) {
        Some((row_index, &value)) => Err(MetricsError::NonBinary {
            what,
            value,
            row_index,
        }),
        None => Ok(()),
    }
}

impl fmt::Display for BinaryConfusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>8} {:>7} {:>7}", "", "pred_0", "pred_1")?;
        writeln!(f, "{:>8} {:>7} {:>7}", "true_0", self.tn, self.fp)?;
        writeln!(f, "{:>8} {:>7} {:>7}", "true_1", self.fn_, self.tp)
    }
}
