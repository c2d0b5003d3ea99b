//! Gradient-boosted decision trees for binary classification.
//!
//! Logistic-loss boosting over second-order regression trees (exact
//! split search, L2 leaf regularization, minimum child weight, optional
//! row subsampling), with optional per-sample weights so the classifier
//! can serve as the base learner of fairness reductions.

mod booster;
mod config;
mod error;
mod node;
mod predict;
mod result;
mod split;
mod tree;

pub use booster::GradientBoostedClassifier;
pub use config::GradientBoostingConfig;
pub use error::GbdtError;
pub use node::{FeatureIndex, Node, NodeIndex};
pub use result::{BoostingResult, TrainingMetadata};
pub use tree::RegressionTree;
