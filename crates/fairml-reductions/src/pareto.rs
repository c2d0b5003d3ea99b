//! Pareto filtering of candidate models by error and disparity.

use serde::Serialize;

/// Training error and demographic-parity disparity of one candidate model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorDisparity {
    /// Misclassification rate.
    pub error: f64,
    /// Demographic-parity disparity.
    pub disparity: f64,
}

impl ErrorDisparity {
    /// Create a new pair.
    #[must_use]
    pub fn new(error: f64, disparity: f64) -> Self {
        Self { error, disparity }
    }
}

/// Indices of the non-dominated candidates, in input order.
///
/// Candidate `p` is kept when its error is no larger than the smallest
/// error among all candidates (itself included) whose disparity does not
/// exceed `p`'s. Exact duplicates are all kept. A candidate with a NaN
/// coordinate compares false and is dropped; NaN errors of the others are
/// skipped when taking the minimum.
#[must_use]
pub fn non_dominated(candidates: &[ErrorDisparity]) -> Vec<usize> {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, p)| {
            let min_error = candidates
                .iter()
                .filter(|q| q.disparity <= p.disparity)
                .map(|q| q.error)
                .fold(f64::INFINITY, f64::min);
            p.error <= min_error
        })
        .map(|(i, _)| i)
        .collect()
}
