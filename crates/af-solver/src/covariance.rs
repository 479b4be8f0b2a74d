//! Covariance and standard-error estimation at the optimum.

use nalgebra::{DMatrix, DVector};

/// Estimate the parameter covariance `(JtJ)^-1 * s^2` with
/// `s^2 = lss / max(1, n - p)`.
///
/// Returns `None` when the normal equations are singular; the caller keeps
/// the fitted parameters and reports NaN standard errors in that case.
pub fn covariance_estimate(
    jacobian: &DMatrix<f64>,
    residuals: &DVector<f64>,
) -> Option<DMatrix<f64>> {
    let n = residuals.len();
    let p = jacobian.ncols();
    let jtj = jacobian.transpose() * jacobian;
    let inverse = jtj.try_inverse()?;

    let lss = residuals.norm_squared();
    let dof = (n.saturating_sub(p)).max(1) as f64;
    Some(inverse * (lss / dof))
}

/// Per-parameter standard errors from the covariance diagonal.
///
/// A negative diagonal entry (numerical noise in a near-singular system)
/// produces NaN for that parameter rather than a panic.
pub fn standard_errors(covariance: &DMatrix<f64>) -> Vec<f64> {
    (0..covariance.nrows())
        .map(|i| covariance[(i, i)].sqrt())
        .collect()
}
