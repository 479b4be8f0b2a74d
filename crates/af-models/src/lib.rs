//! Adsorption isotherm model registry.
//!
//! Each model is a pure function `f(P; θ) -> q` predicting equilibrium uptake
//! at pressure P for a fixed-order parameter vector θ. The registry is a
//! closed enum plus a case-insensitive by-name lookup; there is no state.

pub mod error;
pub mod registry;

pub use error::{ModelError, ModelResult};
pub use registry::IsothermModel;
