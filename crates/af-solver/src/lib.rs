//! Bounded nonlinear least-squares fitting of isotherm models.
//!
//! This crate provides a Levenberg-Marquardt solver with per-parameter box
//! constraints, a finite-difference Jacobian, and the post-processing that
//! turns a solver run into a `FitOutcome`: residual sum of squares plus
//! parameter standard errors estimated from the Jacobian at the optimum.
//!
//! Fitting one model to one experiment never fails the caller: every solver
//! error is folded into `FitOutcome::Failed` with NaN parameter arrays.

pub mod covariance;
pub mod error;
pub mod fit;
pub mod jacobian;
pub mod lm;
pub mod outcome;

pub use error::{SolverError, SolverResult};
pub use fit::fit_model;
pub use lm::{lm_solve, LmConfig, LmSolution};
pub use outcome::FitOutcome;
