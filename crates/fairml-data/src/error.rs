/// Errors from table manipulation, bucketization and splitting.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// Returned when a column is added whose length differs from the table's row count.
    #[error("column \"{name}\" has {got} rows, expected {expected}")]
    ColumnLengthMismatch {
        /// Name of the offending column.
        name: String,
        /// Row count of the table.
        expected: usize,
        /// Row count of the column.
        got: usize,
    },

    /// Returned when a column name is added twice.
    #[error("duplicate column \"{name}\"")]
    DuplicateColumn {
        /// The duplicated column name.
        name: String,
    },

    /// Returned when a column lookup fails.
    #[error("unknown column \"{name}\"")]
    UnknownColumn {
        /// The requested column name.
        name: String,
    },

    /// Returned when a label column holds something other than 0/1.
    #[error("label column is not binary: row {row_index} holds \"{value}\"")]
    NonBinaryLabel {
        /// Zero-based row of the first offending value.
        row_index: usize,
        /// The offending value, rendered as text.
        value: String,
    },

    /// Returned when the requested bucket count is zero.
    #[error("bucket count must be at least 1, got {n_buckets}")]
    InvalidBucketCount {
        /// The invalid bucket count.
        n_buckets: usize,
    },

    /// Returned when a feature row has a different width than the header.
    #[error("row {row_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// Number of feature names.
        expected: usize,
        /// Width of the offending row.
        got: usize,
        /// Zero-based index of the offending row.
        row_index: usize,
    },

    /// Returned when the test fraction is not in (0.0, 1.0).
    #[error("test_fraction must be in (0.0, 1.0), got {fraction}")]
    InvalidTestFraction {
        /// The invalid fraction.
        fraction: f64,
    },

    /// Returned when the split would leave the train or test side empty.
    #[error("splitting {n_samples} samples with {n_test} test samples leaves a side empty")]
    EmptySplit {
        /// Number of samples to split.
        n_samples: usize,
        /// Resolved number of test samples.
        n_test: usize,
    },

    /// Returned when a class is too small to appear on both sides of a stratified split.
    #[error("class {class} has only {count} samples, need at least 2 for a stratified split")]
    TooFewSamplesForSplit {
        /// The class label with insufficient samples.
        class: usize,
        /// Number of samples of that class.
        count: usize,
    },

    /// Returned when parallel arrays handed to a split disagree in length.
    #[error("{what} has {got} rows, expected {expected}")]
    MisalignedRows {
        /// Which array was misaligned.
        what: &'static str,
        /// Expected row count (from the labels).
        expected: usize,
        /// Actual row count.
        got: usize,
    },
}
