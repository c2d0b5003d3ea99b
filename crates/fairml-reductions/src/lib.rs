//! Reduction-based mitigation of demographic-parity bias.
//!
//! A fairness constraint is expressed as a vector of moments ([`Constraint`])
//! over the training rows. Both mitigators reduce constrained learning to a
//! sequence of weighted binary classification problems solved by any
//! [`Estimator`]:
//!
//! - [`ExponentiatedGradientConfig`] runs the exponentiated-gradient game
//!   between the learner and the Lagrange multipliers and returns a
//!   randomized mixture of classifiers.
//! - [`GridSearchConfig`] sweeps a fixed grid of multipliers and returns one
//!   classifier per grid point.
//!
//! [`non_dominated`] filters `(error, disparity)` pairs to their Pareto
//! frontier.

mod error;
mod estimator;
mod expgrad;
mod grid;
mod grid_search;
mod moment;
mod pareto;

pub use error::ReductionError;
pub use estimator::{Estimator, Oracle, Predictor};
pub use expgrad::{ExponentiatedGradientConfig, ExponentiatedGradientModel};
pub use grid::coefficient_grid;
pub use grid_search::{GridPredictor, GridSearchConfig, GridSearchResult};
pub use moment::{Constraint, ErrorRate, ParityKind, UtilityParity};
pub use pareto::{ErrorDisparity, non_dominated};
