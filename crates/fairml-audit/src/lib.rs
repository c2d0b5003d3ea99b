//! Fairness audit of a binary classifier over candidate sensitive attributes.
//!
//! The audit runs in stages that all share one [`AuditConfig`]:
//!
//! 1. [`rank_candidates`] / [`unfairness_recognition`] train a baseline
//!    classifier per candidate attribute (with the attribute removed from
//!    the features) and rank the attributes by their demographic-parity
//!    difference on held-out rows.
//! 2. [`exponentiated_gradient`] and [`grid_search`] retrain under a
//!    demographic-parity constraint on the split of the most unfair
//!    attribute and evaluate the mitigated models on the same test rows.
//! 3. [`full_auto_pipeline`] chains the stages and returns an
//!    [`AuditReport`].

mod config;
mod detect;
mod error;
mod mitigate;
mod pipeline;

pub use config::AuditConfig;
pub use detect::{
    Detection, FairnessResult, RankingEntry, rank_candidates, sensitive_train,
    unfairness_recognition,
};
pub use error::{AuditError, ErrorKind};
pub use mitigate::{
    GridCandidate, GridMitigationReport, MitigationReport, TradeoffPoint, exponentiated_gradient,
    grid_search,
};
pub use pipeline::{AuditReport, full_auto_pipeline};
