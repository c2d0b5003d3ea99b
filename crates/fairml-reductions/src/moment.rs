//! Fairness constraints and the error-rate objective as moments over rows.

use fairml_data::Grouping;

use crate::error::ReductionError;

/// A vector of moment constraints loaded against a fixed set of rows.
///
/// Entries come in `+`/`-` halves: entry `k` of the first half bounds
/// `E[h | cell k] - E[h | event of k]` from above and entry `k` of the
/// second half bounds its negation.
pub trait Constraint: Send + Sync {
    /// Number of rows the constraint was loaded on.
    fn n_samples(&self) -> usize;

    /// Length of the gamma, bound and multiplier vectors.
    fn dim(&self) -> usize;

    /// Constraint values of a predictor given its per-row outputs in [0, 1].
    fn gamma(&self, predictions: &[f64]) -> Vec<f64>;

    /// Upper bound for every constraint entry.
    fn bound(&self) -> Vec<f64>;

    /// Per-row cost-sensitive weights induced by multipliers `lambda`.
    fn signed_weights(&self, lambda: &[f64]) -> Vec<f64>;

    /// Cancel opposing `+`/`-` multipliers.
    fn project_lambda(&self, lambda: &[f64]) -> Vec<f64>;

    /// Indices into the `+` half spanning the grid of multipliers.
    fn grid_basis(&self) -> Vec<usize>;

    /// Multipliers for a grid point: positive coefficients go to the `+`
    /// entry of their basis cell, negative ones to the `-` entry.
    fn lambda_from_coefficients(&self, coefficients: &[f64]) -> Vec<f64> {
        let half = self.dim() / 2;
        let mut lambda = vec![0.0; self.dim()];
        for (&cell, &c) in self.grid_basis().iter().zip(coefficients) {
            if c > 0.0 {
                lambda[cell] = c;
            } else if c < 0.0 {
                lambda[half + cell] = -c;
            }
        }
        lambda
    }
}

/// Which rows define the events of a utility-parity constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParityKind {
    /// Every row: equal selection rate across groups.
    DemographicParity,
    /// Rows labelled 1: equal true positive rate across groups.
    TruePositiveRateParity,
}

/// Parity of the mean prediction across sensitive groups within each event.
///
/// An event is a control stratum (or all rows without a control), further
/// restricted to positive labels for [`ParityKind::TruePositiveRateParity`].
/// A cell is an (event, sensitive group) pair with at least one row.
#[derive(Debug, Clone)]
pub struct UtilityParity {
    kind: ParityKind,
    difference_bound: f64,
    n_samples: usize,
    /// Cell of every row, `None` when the row belongs to no event.
    row_cell: Vec<Option<usize>>,
    /// Event of every cell.
    cell_event: Vec<usize>,
    cell_rows: Vec<usize>,
    event_rows: Vec<usize>,
}

impl UtilityParity {
    /// Load a parity constraint on training rows.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ReductionError::EmptyInput`] | `labels` is empty |
    /// | [`ReductionError::LengthMismatch`] | a grouping differs in length from `labels` |
    /// | [`ReductionError::NonBinaryLabel`] | a label is not 0 or 1 |
    /// | [`ReductionError::InvalidParameter`] | `difference_bound` is negative or non-finite |
    pub fn load(
        kind: ParityKind,
        difference_bound: f64,
        labels: &[usize],
        sensitive: &Grouping,
        control: Option<&Grouping>,
    ) -> Result<Self, ReductionError> {
        let n = labels.len();
        if n == 0 {
            return Err(ReductionError::EmptyInput);
        }
        if !(difference_bound.is_finite() && difference_bound >= 0.0) {
            return Err(ReductionError::InvalidParameter {
                name: "difference_bound",
                requirement: "non-negative and finite",
                value: difference_bound,
            });
        }
        check_len("sensitive grouping", n, sensitive.len())?;
        if let Some(control) = control {
            check_len("control grouping", n, control.len())?;
        }
        check_binary(labels)?;

        let n_strata = control.map_or(1, Grouping::n_levels);
        let n_groups = sensitive.n_levels();
        let stratum_of = |row: usize| control.map_or(0, |c| c.codes()[row]);
        let in_event = |row: usize| match kind {
            ParityKind::DemographicParity => true,
            ParityKind::TruePositiveRateParity => labels[row] == 1,
        };

        // Dense (stratum, group) counts, then compact to non-empty cells.
        let mut counts = vec![0usize; n_strata * n_groups];
        for row in (0..n).filter(|&r| in_event(r)) {
            counts[stratum_of(row) * n_groups + sensitive.codes()[row]] += 1;
        }
        let mut stratum_event = vec![None; n_strata];
        let mut dense_cell = vec![None; n_strata * n_groups];
        let mut cell_event = Vec::new();
        let mut cell_rows = Vec::new();
        let mut event_rows: Vec<usize> = Vec::new();
        for stratum in 0..n_strata {
            for group in 0..n_groups {
                let count = counts[stratum * n_groups + group];
                if count == 0 {
                    continue;
                }
                let event = *stratum_event[stratum].get_or_insert_with(|| {
                    event_rows.push(0);
                    event_rows.len() - 1
                });
                event_rows[event] += count;
                dense_cell[stratum * n_groups + group] = Some(cell_event.len());
                cell_event.push(event);
                cell_rows.push(count);
            }
        }

        let row_cell = (0..n)
            .map(|row| {
                if in_event(row) {
                    dense_cell[stratum_of(row) * n_groups + sensitive.codes()[row]]
                } else {
                    None
                }
            })
            .collect();

        Ok(Self {
            kind,
            difference_bound,
            n_samples: n,
            row_cell,
            cell_event,
            cell_rows,
            event_rows,
        })
    }

    /// Return the parity kind.
    #[must_use]
    pub fn kind(&self) -> ParityKind {
        self.kind
    }

    /// Return the number of (event, group) cells.
    #[must_use]
    pub fn n_cells(&self) -> usize {
        self.cell_event.len()
    }

    /// Return the number of events.
    #[must_use]
    pub fn n_events(&self) -> usize {
        self.event_rows.len()
    }

    /// Return the difference bound applied to every entry.
    #[must_use]
    pub fn difference_bound(&self) -> f64 {
        self.difference_bound
    }

    fn prob_event(&self, event: usize) -> f64 {
        self.event_rows[event] as f64 / self.n_samples as f64
    }

    fn prob_cell(&self, cell: usize) -> f64 {
        self.cell_rows[cell] as f64 / self.n_samples as f64
    }
}

impl Constraint for UtilityParity {
    fn n_samples(&self) -> usize {
        self.n_samples
    }

    fn dim(&self) -> usize {
        2 * self.n_cells()
    }

    fn gamma(&self, predictions: &[f64]) -> Vec<f64> {
        let mut cell_sum = vec![0.0; self.n_cells()];
        let mut event_sum = vec![0.0; self.n_events()];
        for (row, cell) in self.row_cell.iter().enumerate() {
            if let Some(cell) = *cell {
                cell_sum[cell] += predictions[row];
                event_sum[self.cell_event[cell]] += predictions[row];
            }
        }
        let plus: Vec<f64> = (0..self.n_cells())
            .map(|cell| {
                let event = self.cell_event[cell];
                cell_sum[cell] / self.cell_rows[cell] as f64
                    - event_sum[event] / self.event_rows[event] as f64
            })
            .collect();
        let minus = plus.iter().map(|g| -g);
        plus.iter().copied().chain(minus).collect()
    }

    fn bound(&self) -> Vec<f64> {
        vec![self.difference_bound; self.dim()]
    }

    fn signed_weights(&self, lambda: &[f64]) -> Vec<f64> {
        let half = self.n_cells();
        let net: Vec<f64> = (0..half).map(|c| lambda[c] - lambda[half + c]).collect();

        let mut lambda_event = vec![0.0; self.n_events()];
        for (cell, &v) in net.iter().enumerate() {
            lambda_event[self.cell_event[cell]] += v;
        }
        for (event, value) in lambda_event.iter_mut().enumerate() {
            *value /= self.prob_event(event);
        }

        let adjust: Vec<f64> = (0..half)
            .map(|cell| lambda_event[self.cell_event[cell]] - net[cell] / self.prob_cell(cell))
            .collect();

        self.row_cell
            .iter()
            .map(|cell| cell.map_or(0.0, |c| adjust[c]))
            .collect()
    }

    fn project_lambda(&self, lambda: &[f64]) -> Vec<f64> {
        let half = self.n_cells();
        let plus = (0..half).map(|c| (lambda[c] - lambda[half + c]).max(0.0));
        let minus = (0..half).map(|c| (lambda[half + c] - lambda[c]).max(0.0));
        plus.chain(minus).collect()
    }

    fn grid_basis(&self) -> Vec<usize> {
        // Every cell except the last group of each event.
        (0..self.n_cells())
            .filter(|&cell| {
                self.cell_event
                    .get(cell + 1)
                    .is_some_and(|&next| next == self.cell_event[cell])
            })
            .collect()
    }
}

/// The misclassification-rate objective.
#[derive(Debug, Clone)]
pub struct ErrorRate {
    labels: Vec<f64>,
}

impl ErrorRate {
    /// Load the objective on training labels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ReductionError::EmptyInput`] | `labels` is empty |
    /// | [`ReductionError::NonBinaryLabel`] | a label is not 0 or 1 |
    pub fn load(labels: &[usize]) -> Result<Self, ReductionError> {
        if labels.is_empty() {
            return Err(ReductionError::EmptyInput);
        }
        check_binary(labels)?;
        Ok(Self {
            labels: labels.iter().map(|&y| y as f64).collect(),
        })
    }

    /// Number of rows the objective was loaded on.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    /// Mean absolute difference between predictions and labels.
    #[must_use]
    pub fn gamma(&self, predictions: &[f64]) -> f64 {
        let total: f64 = predictions
            .iter()
            .zip(&self.labels)
            .map(|(h, y)| (y - h).abs())
            .sum();
        total / self.labels.len() as f64
    }

    /// Per-row weights `2y - 1`.
    #[must_use]
    pub fn signed_weights(&self) -> Vec<f64> {
        self.labels.iter().map(|y| 2.0 * y - 1.0).collect()
    }
}

fn check_len(what: &'static str, expected: usize, got: usize) -> Result<(), ReductionError> {
    if expected == got {
        Ok(())
    } else {
        Err(ReductionError::LengthMismatch {
            what,
            expected,
            got,
        })
    }
}

fn check_binary(labels: &[usize]) -> Result<(), ReductionError> {
    match labels.iter().enumerate().find(|&(_, &y)| y > 1) {
        Some((row_index, &label)) => Err(ReductionError::NonBinaryLabel { row_index, label }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use fairml_data::Column;

    use super::*;

    fn grouping(name: &str, levels: &[&str]) -> Grouping {
        Grouping::from_column(name, &Column::categorical(levels.iter().copied()))
    }

    #[test]
    fn demographic_parity_gamma() {
        let sex = grouping("sex", &["f", "f", "m", "m"]);
        let dp = UtilityParity::load(ParityKind::DemographicParity, 0.01, &[0, 1, 0, 1], &sex, None)
            .unwrap();
        assert_eq!(dp.n_cells(), 2);
        assert_eq!(dp.dim(), 4);

        // f selects 1/2, m selects 2/2, overall 3/4.
        let g = dp.gamma(&[1.0, 0.0, 1.0, 1.0]);
        assert!((g[0] - (0.5 - 0.75)).abs() < 1e-12);
        assert!((g[1] - (1.0 - 0.75)).abs() < 1e-12);
        assert!((g[2] + g[0]).abs() < 1e-12);
        assert!((g[3] + g[1]).abs() < 1e-12);
    }

    #[test]
    fn signed_weights_match_closed_form() {
        // 3 f rows, 1 m row; lambda+ on f only.
        let sex = grouping("sex", &["f", "f", "f", "m"]);
        let dp = UtilityParity::load(ParityKind::DemographicParity, 0.01, &[0, 0, 1, 1], &sex, None)
            .unwrap();
        let w = dp.signed_weights(&[1.0, 0.0, 0.0, 0.0]);
        // lambda_event = 1 / 1, lambda_cell(f) = 1 / 0.75.
        let expected_f = 1.0 - 1.0 / 0.75;
        assert!((w[0] - expected_f).abs() < 1e-12);
        assert!((w[3] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn true_positive_rate_parity_ignores_negatives() {
        let sex = grouping("sex", &["f", "f", "m", "m"]);
        let labels = [1, 0, 1, 0];
        let tpr = UtilityParity::load(ParityKind::TruePositiveRateParity, 0.0, &labels, &sex, None)
            .unwrap();
        assert_eq!(tpr.n_events(), 1);
        // Negatives carry no weight.
        let w = tpr.signed_weights(&[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(w[1], 0.0);
        assert_eq!(w[3], 0.0);
        // Predictions on negatives do not move gamma.
        assert_eq!(tpr.gamma(&[1.0, 0.0, 1.0, 0.0]), tpr.gamma(&[1.0, 1.0, 1.0, 1.0]));
    }

    #[test]
    fn control_strata_become_events() {
        let age = grouping("age", &["old", "old", "old", "young", "young", "young"]);
        let sex = grouping("sex", &["f", "m", "m", "f", "f", "m"]);
        let dp = UtilityParity::load(
            ParityKind::DemographicParity,
            0.01,
            &[0, 1, 0, 1, 0, 1],
            &sex,
            Some(&age),
        )
        .unwrap();
        assert_eq!(dp.n_events(), 2);
        assert_eq!(dp.n_cells(), 4);
        // One basis cell per event (all groups but the last).
        assert_eq!(dp.grid_basis(), vec![0, 2]);

        // A predictor equal within each stratum has zero gamma.
        let g = dp.gamma(&[1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
        assert!(g.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn signed_weights_sum_to_zero_within_event() {
        let sex = grouping("sex", &["a", "b", "b", "c", "c", "c"]);
        let dp = UtilityParity::load(ParityKind::DemographicParity, 0.01, &[0; 6], &sex, None)
            .unwrap();
        let w = dp.signed_weights(&[0.3, 0.0, 1.2, 0.0, 0.5, 0.1]);
        assert!(w.iter().sum::<f64>().abs() < 1e-9);
    }

    #[test]
    fn project_lambda_cancels_opposites() {
        let sex = grouping("sex", &["f", "m"]);
        let dp = UtilityParity::load(ParityKind::DemographicParity, 0.01, &[0, 1], &sex, None)
            .unwrap();
        assert_eq!(dp.project_lambda(&[3.0, 1.0, 1.0, 2.0]), vec![2.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn lambda_from_coefficients_splits_sign() {
        let sex = grouping("sex", &["a", "b", "c"]);
        let dp = UtilityParity::load(ParityKind::DemographicParity, 0.01, &[0, 1, 0], &sex, None)
            .unwrap();
        assert_eq!(dp.grid_basis(), vec![0, 1]);
        assert_eq!(
            dp.lambda_from_coefficients(&[0.5, -1.5]),
            vec![0.5, 0.0, 0.0, 0.0, 1.5, 0.0]
        );
    }

    #[test]
    fn error_rate() {
        let obj = ErrorRate::load(&[1, 0, 1, 0]).unwrap();
        assert!((obj.gamma(&[1.0, 1.0, 0.0, 0.0]) - 0.5).abs() < 1e-12);
        assert_eq!(obj.signed_weights(), vec![1.0, -1.0, 1.0, -1.0]);
    }

    #[test]
    fn load_errors() {
        let sex = grouping("sex", &["f", "m"]);
        assert!(matches!(
            UtilityParity::load(ParityKind::DemographicParity, 0.01, &[0], &sex, None),
            Err(ReductionError::LengthMismatch { .. })
        ));
        assert!(matches!(
            UtilityParity::load(ParityKind::DemographicParity, 0.01, &[0, 3], &sex, None),
            Err(ReductionError::NonBinaryLabel { row_index: 1, label: 3 })
        ));
        assert!(matches!(
            ErrorRate::load(&[]),
            Err(ReductionError::EmptyInput)
        ));
    }
}
