//! Per-fit outcome type.

use nalgebra::DMatrix;

/// Result of fitting one model to one experiment.
///
/// Both variants carry parameter and standard-error vectors of the model's
/// arity, so wide-table assembly can emit columns without caring whether the
/// fit succeeded. A failed fit carries NaN everywhere.
#[derive(Debug, Clone)]
pub enum FitOutcome {
    Converged {
        /// Optimal parameters in descriptor order
        params: Vec<f64>,
        /// Standard error per parameter; NaN when the covariance estimate
        /// was unavailable (singular normal equations)
        std_errors: Vec<f64>,
        /// Covariance matrix `(JtJ)^-1 * s^2`, when available
        covariance: Option<DMatrix<f64>>,
        /// Residual sum of squares at the optimum
        lss: f64,
    },
    Failed {
        /// NaN vector of descriptor arity
        params: Vec<f64>,
        /// NaN vector of descriptor arity
        std_errors: Vec<f64>,
        /// Always NaN
        lss: f64,
        reason: String,
    },
}

impl FitOutcome {
    pub fn failed(param_count: usize, reason: String) -> Self {
        FitOutcome::Failed {
            params: vec![f64::NAN; param_count],
            std_errors: vec![f64::NAN; param_count],
            lss: f64::NAN,
            reason,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, FitOutcome::Converged { .. })
    }

    pub fn params(&self) -> &[f64] {
        match self {
            FitOutcome::Converged { params, .. } => params,
            FitOutcome::Failed { params, .. } => params,
        }
    }

    pub fn std_errors(&self) -> &[f64] {
        match self {
            FitOutcome::Converged { std_errors, .. } => std_errors,
            FitOutcome::Failed { std_errors, .. } => std_errors,
        }
    }

    /// Residual sum of squares; NaN for failed fits.
    pub fn lss(&self) -> f64 {
        match self {
            FitOutcome::Converged { lss, .. } => *lss,
            FitOutcome::Failed { lss, .. } => *lss,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            FitOutcome::Converged { .. } => None,
            FitOutcome::Failed { reason, .. } => Some(reason),
        }
    }
}
