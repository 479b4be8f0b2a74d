//! Finite difference Jacobian computation.

use crate::error::SolverResult;
use nalgebra::{DMatrix, DVector};

/// Compute the Jacobian using forward finite differences, staying inside the
/// box `[lower, upper]`.
///
/// For each column j, perturbs x[j] by a scaled epsilon and computes
/// (f(x+e) - f(x))/e. When the forward step would leave the box the
/// perturbation flips sign, which keeps the evaluation in the feasible
/// region at the cost of a backward difference for that column.
pub fn bounded_forward_jacobian<F>(
    x: &DVector<f64>,
    f_x: &DVector<f64>,
    lower: &DVector<f64>,
    upper: &DVector<f64>,
    mut f: F,
    epsilon: f64,
) -> SolverResult<DMatrix<f64>>
where
    F: FnMut(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let n = x.len();
    let m = f_x.len();

    let mut jac = DMatrix::zeros(m, n);

    for j in 0..n {
        let mut dx = epsilon * x[j].abs().max(1.0);
        if x[j] + dx > upper[j] && x[j] - dx >= lower[j] {
            dx = -dx;
        }

        let mut x_perturbed = x.clone();
        x_perturbed[j] += dx;

        let f_perturbed = f(&x_perturbed)?;
        let df = (f_perturbed - f_x) / dx;

        for i in 0..m {
            jac[(i, j)] = df[i];
        }
    }

    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unbounded(n: usize) -> (DVector<f64>, DVector<f64>) {
        (
            DVector::from_element(n, f64::NEG_INFINITY),
            DVector::from_element(n, f64::INFINITY),
        )
    }

    #[test]
    fn jacobian_linear() {
        // f(x) = 2*x, J = 2
        let f = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, 2.0 * x[0]))
        };

        let x = DVector::from_element(1, 3.0);
        let f_x = f(&x).unwrap();
        let (lo, hi) = unbounded(1);
        let jac = bounded_forward_jacobian(&x, &f_x, &lo, &hi, f, 1e-7).unwrap();

        assert!((jac[(0, 0)] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn jacobian_quadratic() {
        // f(x) = x^2, J = 2*x
        let f = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] * x[0]))
        };

        let x = DVector::from_element(1, 3.0);
        let f_x = f(&x).unwrap();
        let (lo, hi) = unbounded(1);
        let jac = bounded_forward_jacobian(&x, &f_x, &lo, &hi, f, 1e-7).unwrap();

        assert!((jac[(0, 0)] - 6.0).abs() < 1e-5);
    }

    #[test]
    fn perturbation_flips_at_upper_bound() {
        // x sits exactly on the upper bound; the forward step must go inward
        let f = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            assert!(x[0] <= 5.0 + 1e-12, "evaluated outside the box");
            Ok(DVector::from_element(1, x[0] * x[0]))
        };

        let x = DVector::from_element(1, 5.0);
        let f_x = f(&x).unwrap();
        let lo = DVector::from_element(1, 0.0);
        let hi = DVector::from_element(1, 5.0);
        let jac = bounded_forward_jacobian(&x, &f_x, &lo, &hi, f, 1e-7).unwrap();

        assert!((jac[(0, 0)] - 10.0).abs() < 1e-4);
    }
}
