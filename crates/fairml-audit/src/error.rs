//! Error types for fairml-audit.

use fairml_data::DataError;
use fairml_metrics::MetricsError;
use fairml_reductions::ReductionError;

/// Errors from detection, mitigation and the audit pipeline.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// Returned when no candidate sensitive attribute is configured.
    #[error("no candidate sensitive attributes configured")]
    NoCandidates,

    /// Returned when an audit parameter is out of range.
    #[error("{name} must be {requirement}, got {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable requirement.
        requirement: &'static str,
        /// The invalid value.
        value: f64,
    },

    /// Returned when every candidate attribute failed to produce a fairness score.
    #[error("all {n_candidates} candidate attributes are undefined")]
    AllCandidatesUndefined {
        /// Number of candidates tried.
        n_candidates: usize,
        /// Classification of the first candidate's failure.
        kind: ErrorKind,
    },

    /// Returned when no frontier model of the grid sweep has a defined fairness score.
    #[error("none of the {n_frontier} non-dominated models has a defined fairness score")]
    NoSelection {
        /// Size of the non-dominated frontier.
        n_frontier: usize,
    },

    /// Table, bucketization or split failure.
    #[error(transparent)]
    Data(#[from] DataError),

    /// Metric evaluation failure.
    #[error(transparent)]
    Metrics(#[from] MetricsError),

    /// Training or reduction failure.
    #[error(transparent)]
    Reduction(#[from] ReductionError),
}

/// Coarse classification of an [`AuditError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A configured name or parameter is invalid.
    Configuration,
    /// The data handed to a stage is malformed.
    Input,
    /// The grid frontier yields no selectable model.
    Selection,
    /// A classifier failed to train.
    Training,
}

impl AuditError {
    /// Classify the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuditError::NoCandidates => ErrorKind::Input,
            AuditError::InvalidParameter { .. } => ErrorKind::Configuration,
            AuditError::AllCandidatesUndefined { kind, .. } => *kind,
            AuditError::NoSelection { .. } => ErrorKind::Selection,
            AuditError::Data(
                DataError::UnknownColumn { .. }
                | DataError::InvalidBucketCount { .. }
                | DataError::InvalidTestFraction { .. },
            ) => ErrorKind::Configuration,
            AuditError::Data(_) => ErrorKind::Input,
            AuditError::Metrics(MetricsError::UnknownQualityMetric { .. }) => {
                ErrorKind::Configuration
            }
            AuditError::Metrics(_) => ErrorKind::Input,
            AuditError::Reduction(
                ReductionError::InvalidParameter { .. } | ReductionError::LambdaDimension { .. },
            ) => ErrorKind::Configuration,
            AuditError::Reduction(ReductionError::Estimator(_)) => ErrorKind::Training,
            AuditError::Reduction(_) => ErrorKind::Input,
        }
    }
}
