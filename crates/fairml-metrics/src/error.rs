/// Errors from metric evaluation.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Returned when a quality metric name is not recognised.
    #[error("unknown quality metric '{name}' (expected one of: {known})")]
    UnknownQualityMetric {
        /// The name that was requested.
        name: String,
        /// Comma-separated list of supported names.
        known: String,
    },

    /// Returned when two row-aligned inputs disagree in length.
    #[error("{what} has {got} rows, expected {expected}")]
    LengthMismatch {
        /// Which input is misaligned.
        what: &'static str,
        /// Expected number of rows (length of `y_true`).
        expected: usize,
        /// Actual number of rows.
        got: usize,
    },

    /// Returned when there are no rows to evaluate.
    #[error("cannot evaluate metrics on zero rows")]
    Empty,

    /// Returned when a label or prediction is neither 0 nor 1.
    #[error("{what} value {value} at row {row_index} is not binary")]
    NonBinary {
        /// `"y_true"` or `"y_pred"`.
        what: &'static str,
        /// The offending value.
        value: usize,
        /// The zero-based row index.
        row_index: usize,
    },
}
