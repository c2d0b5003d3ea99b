//! I/O error types for fairml-io.

use std::path::PathBuf;

use fairml_audit::AuditError;
use fairml_data::DataError;
use fairml_metrics::MetricsError;

/// Errors from file I/O, CSV parsing, settings loading and report writing.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when an input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the CSV file has a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a data row has a different number of cells than the header.
    #[error("inconsistent row length in {path}: row {row_index} has {got} cells, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Number of header cells.
        expected: usize,
        /// Number of cells in this row.
        got: usize,
    },

    /// Returned when the settings file cannot be read.
    #[error("cannot read settings file {path}")]
    SettingsRead {
        /// Path to the settings file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the settings file is not valid YAML of the expected shape.
    #[error("invalid settings in {path}")]
    SettingsParse {
        /// Path to the settings file.
        path: PathBuf,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },

    /// Returned when a dataset name has no entry in the settings file.
    #[error("unknown dataset \"{name}\" (configured: {known})")]
    UnknownDataset {
        /// The requested dataset name.
        name: String,
        /// Comma-separated configured names.
        known: String,
    },

    /// Returned when a dataset delimiter is not a single ASCII character.
    #[error("invalid delimiter {delimiter:?} for dataset \"{name}\": must be one ASCII character")]
    InvalidDelimiter {
        /// The dataset name.
        name: String,
        /// The configured delimiter.
        delimiter: char,
    },

    /// Returned when a dataset entry does not name any candidate attribute.
    #[error("dataset \"{name}\" has no optional_sensitive_features")]
    MissingSensitiveFeatures {
        /// The dataset name.
        name: String,
    },

    /// Returned when the experiment name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid experiment name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidExperimentName {
        /// The invalid name.
        name: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Directory path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a report cannot be serialized.
    #[error("cannot serialize report for {path}")]
    Serialize {
        /// Destination path.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when a report file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Table construction or label encoding failed.
    #[error(transparent)]
    Data(#[from] DataError),

    /// The configured quality metric name is unknown.
    #[error(transparent)]
    Metrics(#[from] MetricsError),

    /// The merged settings do not form a valid audit configuration.
    #[error(transparent)]
    Audit(#[from] AuditError),
}
