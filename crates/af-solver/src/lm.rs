//! Box-constrained Levenberg-Marquardt solver.

use crate::error::{SolverError, SolverResult};
use crate::jacobian::bounded_forward_jacobian;
use nalgebra::{DMatrix, DVector};
use tracing::trace;

/// Relative perturbation for finite-difference Jacobians.
const JACOBIAN_EPSILON: f64 = 1.49e-8;

/// Floor applied to the damping diagonal so a parameter with zero curvature
/// cannot make the damped normal equations singular.
const DIAG_FLOOR: f64 = 1e-12;

/// Levenberg-Marquardt solver configuration.
#[derive(Clone, Copy, Debug)]
pub struct LmConfig {
    /// Budget of residual function evaluations (Jacobian columns included)
    pub max_evaluations: usize,
    /// Relative cost-reduction tolerance
    pub ftol: f64,
    /// Step-size tolerance relative to the iterate norm
    pub xtol: f64,
    /// Gradient infinity-norm tolerance
    pub gtol: f64,
    /// Initial damping factor
    pub lambda_init: f64,
    /// Damping growth factor on rejected steps
    pub lambda_up: f64,
    /// Damping shrink factor on accepted steps
    pub lambda_down: f64,
    /// Damping ceiling; exceeding it counts as divergence
    pub lambda_max: f64,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_evaluations: 1000,
            ftol: 1e-12,
            xtol: 1e-12,
            gtol: 1e-12,
            lambda_init: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            lambda_max: 1e15,
        }
    }
}

/// Converged solver state.
#[derive(Debug)]
pub struct LmSolution {
    /// Solution vector, inside the box
    pub x: DVector<f64>,
    /// Residual vector at the solution
    pub residuals: DVector<f64>,
    /// Jacobian of the residuals at the solution
    pub jacobian: DMatrix<f64>,
    /// Residual function evaluations spent
    pub evaluations: usize,
    /// Outer iterations performed
    pub iterations: usize,
}

fn clamp_to_box(x: &mut DVector<f64>, lower: &DVector<f64>, upper: &DVector<f64>) {
    for i in 0..x.len() {
        x[i] = x[i].clamp(lower[i], upper[i]);
    }
}

/// Solve the damped normal equations `(JtJ + lambda*D) dx = -g`.
///
/// LU first; singular or near-singular systems fall back to an SVD
/// pseudo-inverse with a relative singular-value threshold.
fn solve_damped_step(
    jtj: &DMatrix<f64>,
    gradient: &DVector<f64>,
    lambda: f64,
) -> SolverResult<DVector<f64>> {
    let n = jtj.nrows();
    let mut damped = jtj.clone();
    for i in 0..n {
        damped[(i, i)] += lambda * jtj[(i, i)].max(DIAG_FLOOR);
    }

    let rhs = -gradient;
    match damped.clone().lu().solve(&rhs) {
        Some(step) => Ok(step),
        None => {
            let svd = damped.svd(true, true);
            let threshold = 1e-12 * svd.singular_values.max();
            svd.solve(&rhs, threshold).map_err(|_| SolverError::Numeric {
                what: "damped normal equations are severely ill-conditioned".to_string(),
            })
        }
    }
}

/// Minimize `||r(x)||^2` subject to `lower <= x <= upper`.
///
/// The starting point is clamped into the box and every trial iterate is
/// projected back onto it, so the residual function is only ever evaluated
/// at feasible points. Identical inputs produce identical outputs; the
/// solver holds no global state and consults no RNG.
pub fn lm_solve<F>(
    residual_fn: F,
    x0: DVector<f64>,
    lower: &DVector<f64>,
    upper: &DVector<f64>,
    config: &LmConfig,
) -> SolverResult<LmSolution>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let n = x0.len();
    if lower.len() != n || upper.len() != n {
        return Err(SolverError::ProblemSetup {
            what: format!(
                "bounds length {}/{} does not match {} parameters",
                lower.len(),
                upper.len(),
                n
            ),
        });
    }

    let evaluations = std::cell::Cell::new(0usize);
    let budget = config.max_evaluations.max(1);
    let eval = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
        if evaluations.get() >= budget {
            return Err(SolverError::ConvergenceFailed {
                what: format!("function evaluation budget {} exhausted", budget),
            });
        }
        evaluations.set(evaluations.get() + 1);
        let r = residual_fn(x)?;
        if r.iter().any(|v| !v.is_finite()) {
            return Err(SolverError::Numeric {
                what: "residual vector contains non-finite values".to_string(),
            });
        }
        Ok(r)
    };

    let mut x = x0;
    clamp_to_box(&mut x, lower, upper);

    let mut r = eval(&x)?;
    let mut cost = r.norm_squared();
    let mut lambda = config.lambda_init;

    for iter in 0..budget {
        let jac = bounded_forward_jacobian(&x, &r, lower, upper, &eval, JACOBIAN_EPSILON)?;
        let gradient = jac.transpose() * &r;
        if gradient.amax() < config.gtol {
            return Ok(LmSolution {
                x,
                residuals: r,
                jacobian: jac,
                evaluations: evaluations.get(),
                iterations: iter,
            });
        }
        let jtj = jac.transpose() * &jac;

        // Inner damping loop: grow lambda until a step reduces the cost
        loop {
            let step = solve_damped_step(&jtj, &gradient, lambda)?;
            let mut x_trial = &x + &step;
            clamp_to_box(&mut x_trial, lower, upper);
            let actual_step = &x_trial - &x;

            // Trial evaluation failures (domain errors, non-finite residuals)
            // reject the step just like a cost increase would.
            let trial = eval(&x_trial);
            let accepted = match trial {
                Ok(r_trial) => {
                    let cost_trial = r_trial.norm_squared();
                    if cost_trial < cost {
                        let reduction = cost - cost_trial;
                        let step_norm = actual_step.norm();
                        x = x_trial;
                        r = r_trial;
                        cost = cost_trial;
                        lambda = (lambda * config.lambda_down).max(1e-12);
                        trace!(iter, cost, lambda, "step accepted");

                        if reduction <= config.ftol * cost.max(f64::MIN_POSITIVE)
                            || step_norm <= config.xtol * (x.norm() + config.xtol)
                        {
                            let jac = bounded_forward_jacobian(
                                &x,
                                &r,
                                lower,
                                upper,
                                &eval,
                                JACOBIAN_EPSILON,
                            )?;
                            return Ok(LmSolution {
                                x,
                                residuals: r,
                                jacobian: jac,
                                evaluations: evaluations.get(),
                                iterations: iter + 1,
                            });
                        }
                        true
                    } else {
                        false
                    }
                }
                Err(SolverError::ConvergenceFailed { what }) => {
                    return Err(SolverError::ConvergenceFailed { what });
                }
                Err(_) => false,
            };

            if accepted {
                break;
            }

            // Near the optimum no damped step can reduce the cost any
            // further; once the proposed steps shrink below xtol the current
            // iterate is the solution.
            if actual_step.norm() <= config.xtol * (x.norm() + config.xtol) {
                return Ok(LmSolution {
                    x,
                    residuals: r,
                    jacobian: jac,
                    evaluations: evaluations.get(),
                    iterations: iter + 1,
                });
            }

            lambda *= config.lambda_up;
            if lambda > config.lambda_max {
                return Err(SolverError::ConvergenceFailed {
                    what: "damping factor diverged without finding a descent step".to_string(),
                });
            }
        }
    }

    Err(SolverError::ConvergenceFailed {
        what: format!("no convergence within {} function evaluations", budget),
    })
}
