//! Tabular data model for fairness auditing.
//!
//! Pure data manipulation with no I/O. Provides named columns and tables,
//! percentile bucketization of numeric attributes, group codes for
//! sensitive/control attributes, one-hot encoding into a feature matrix,
//! and a stratified train/test split computed once and applied to every
//! row-aligned array.

mod bucket;
mod column;
mod encode;
mod error;
mod grouping;
mod split;

pub use bucket::{percentile, reduce_groups};
pub use column::{Column, Table, binary_labels};
pub use encode::{FeatureMatrix, one_hot};
pub use error::DataError;
pub use grouping::Grouping;
pub use split::{SplitData, SplitIndices, stratified_split};
