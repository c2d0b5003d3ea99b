/// Errors from reduction-based mitigation.
#[derive(Debug, thiserror::Error)]
pub enum ReductionError {
    /// Returned when the base estimator fails to fit or predict.
    #[error("base estimator failed: {0}")]
    Estimator(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Returned when two row-aligned inputs disagree in length.
    #[error("{what} has {got} rows, expected {expected}")]
    LengthMismatch {
        /// Which input is misaligned.
        what: &'static str,
        /// Expected number of rows.
        expected: usize,
        /// Actual number of rows.
        got: usize,
    },

    /// Returned when a constraint is loaded on zero rows.
    #[error("cannot load a constraint on zero rows")]
    EmptyInput,

    /// Returned when a label is neither 0 nor 1.
    #[error("label {label} at row {row_index} is not binary")]
    NonBinaryLabel {
        /// The zero-based row index.
        row_index: usize,
        /// The offending label.
        label: usize,
    },

    /// Returned when a mitigator parameter is out of range.
    #[error("{name} must be {requirement}, got {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable requirement.
        requirement: &'static str,
        /// The invalid value.
        value: f64,
    },

    /// Returned when a multiplier vector does not match the constraint.
    #[error("multiplier vector has {got} entries, constraint has {expected}")]
    LambdaDimension {
        /// Number of constraint entries.
        expected: usize,
        /// Number of multipliers provided.
        got: usize,
    },
}
