//! Classification quality metrics grouped by sensitive and control
//! attributes, and the demographic-parity summary built on them.
//!
//! [`evaluate`] produces a [`MetricFrame`] holding overall, per-group and
//! per-(control, group) values of the configured quality metric, the
//! selection rate and the group count, plus the max-minus-min difference
//! of each metric within every control stratum. The fairness scalar is
//! the mean selection-rate difference across strata.

mod confusion;
mod error;
mod evaluate;
mod frame;
mod quality;

pub use confusion::BinaryConfusion;
pub use error::MetricsError;
pub use evaluate::{Evaluation, evaluate};
pub use frame::{MetricFrame, MetricValues, StratumDifference};
pub use quality::QualityMetric;
