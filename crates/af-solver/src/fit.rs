//! Single-fit entry point: one model, one experiment.

use crate::covariance::{covariance_estimate, standard_errors};
use crate::error::{SolverError, SolverResult};
use crate::lm::{lm_solve, LmConfig};
use crate::outcome::FitOutcome;
use af_core::ensure_all_finite;
use af_models::IsothermModel;
use nalgebra::DVector;
use tracing::trace;

/// Fit `model` to one experiment's (pressure, uptake) series.
///
/// `initial`, `lower` and `upper` are in the model's parameter order and
/// must all have the descriptor arity; `max_evaluations` bounds the number
/// of residual evaluations including those spent on Jacobians.
///
/// This function never returns an error: solver exceptions, model domain
/// errors and convergence failures all fold into `FitOutcome::Failed` so a
/// single bad cell in a bulk run cannot abort the batch.
pub fn fit_model(
    model: IsothermModel,
    pressure: &[f64],
    uptake: &[f64],
    initial: &[f64],
    lower: &[f64],
    upper: &[f64],
    max_evaluations: usize,
) -> FitOutcome {
    match try_fit(model, pressure, uptake, initial, lower, upper, max_evaluations) {
        Ok(outcome) => outcome,
        Err(err) => {
            trace!(model = %model, error = %err, "fit failed");
            FitOutcome::failed(model.param_count(), err.to_string())
        }
    }
}

fn try_fit(
    model: IsothermModel,
    pressure: &[f64],
    uptake: &[f64],
    initial: &[f64],
    lower: &[f64],
    upper: &[f64],
    max_evaluations: usize,
) -> SolverResult<FitOutcome> {
    let p = model.param_count();
    if initial.len() != p || lower.len() != p || upper.len() != p {
        return Err(SolverError::ProblemSetup {
            what: format!("parameter vectors must have length {} for {}", p, model),
        });
    }
    if pressure.len() != uptake.len() || pressure.len() < 2 {
        return Err(SolverError::ProblemSetup {
            what: format!(
                "need at least 2 paired measurements, got {}/{}",
                pressure.len(),
                uptake.len()
            ),
        });
    }
    ensure_all_finite(pressure, "pressure")?;
    ensure_all_finite(uptake, "uptake")?;

    let pressure = pressure.to_vec();
    let uptake = uptake.to_vec();
    let residual = move |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
        let predicted = model.evaluate(&pressure, x.as_slice())?;
        Ok(DVector::from_iterator(
            uptake.len(),
            uptake.iter().zip(&predicted).map(|(&u, &f)| u - f),
        ))
    };

    let config = LmConfig {
        max_evaluations,
        ..LmConfig::default()
    };
    let solution = lm_solve(
        residual,
        DVector::from_column_slice(initial),
        &DVector::from_column_slice(lower),
        &DVector::from_column_slice(upper),
        &config,
    )?;

    let lss = solution.residuals.norm_squared();
    let covariance = covariance_estimate(&solution.jacobian, &solution.residuals);
    let std_errors = match &covariance {
        Some(cov) => standard_errors(cov),
        None => vec![f64::NAN; p],
    };

    Ok(FitOutcome::Converged {
        params: solution.x.as_slice().to_vec(),
        std_errors,
        covariance,
        lss,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn langmuir_series(k: f64, qsat: f64, pressures: &[f64]) -> Vec<f64> {
        pressures
            .iter()
            .map(|&p| qsat * (k * p) / (1.0 + k * p))
            .collect()
    }

    #[test]
    fn recovers_exact_langmuir_parameters() {
        let pressure = [0.0, 1.0, 2.0, 5.0, 10.0];
        let uptake = langmuir_series(0.5, 2.0, &pressure);

        let outcome = fit_model(
            IsothermModel::Langmuir,
            &pressure,
            &uptake,
            &[1e-3, 1.0],
            &[1e-6, 0.0],
            &[10.0, 100.0],
            1000,
        );

        match outcome {
            FitOutcome::Converged {
                params,
                std_errors,
                lss,
                ..
            } => {
                assert!((params[0] - 0.5).abs() < 1e-6, "k = {}", params[0]);
                assert!((params[1] - 2.0).abs() < 1e-6, "qsat = {}", params[1]);
                assert!(lss < 1e-20, "lss = {lss:e}");
                assert!(std_errors.iter().all(|e| e.is_finite()));
            }
            FitOutcome::Failed { reason, .. } => panic!("fit failed: {reason}"),
        }
    }

    #[test]
    fn temkin_on_zero_pressures_fails_cleanly() {
        let pressure = [0.0, 0.0, 0.0];
        let uptake = [0.1, 0.2, 0.3];

        let outcome = fit_model(
            IsothermModel::Temkin,
            &pressure,
            &uptake,
            &[1.0, 1.0],
            &[0.0, 0.0],
            &[100.0, 100.0],
            1000,
        );

        match outcome {
            FitOutcome::Failed {
                params,
                std_errors,
                lss,
                ..
            } => {
                assert_eq!(params.len(), 2);
                assert!(params.iter().all(|v| v.is_nan()));
                assert!(std_errors.iter().all(|v| v.is_nan()));
                assert!(lss.is_nan());
            }
            FitOutcome::Converged { .. } => panic!("expected a domain failure"),
        }
    }

    #[test]
    fn two_points_pin_down_a_two_parameter_model() {
        let pressure = [1.0, 4.0];
        let uptake = langmuir_series(0.5, 2.0, &pressure);
        let outcome = fit_model(
            IsothermModel::Langmuir,
            &pressure,
            &uptake,
            &[1.0, 1.0],
            &[1e-6, 0.0],
            &[100.0, 100.0],
            1000,
        );
        assert!(outcome.is_converged());
        assert!(outcome.lss() < 1e-16);
    }

    #[test]
    fn mismatched_series_lengths_fail() {
        let outcome = fit_model(
            IsothermModel::Langmuir,
            &[1.0, 2.0],
            &[0.1],
            &[1.0, 1.0],
            &[0.0, 0.0],
            &[100.0, 100.0],
            100,
        );
        assert!(!outcome.is_converged());
    }

    #[test]
    fn single_point_experiment_fails() {
        let outcome = fit_model(
            IsothermModel::Langmuir,
            &[1.0],
            &[0.1],
            &[1.0, 1.0],
            &[0.0, 0.0],
            &[100.0, 100.0],
            100,
        );
        assert!(!outcome.is_converged());
    }

    #[test]
    fn identical_inputs_identical_outputs() {
        let pressure = [0.5, 1.0, 2.0, 4.0, 8.0, 16.0];
        let uptake = langmuir_series(0.8, 3.5, &pressure);
        let fit = || {
            fit_model(
                IsothermModel::Langmuir,
                &pressure,
                &uptake,
                &[1.0, 1.0],
                &[1e-6, 0.0],
                &[100.0, 100.0],
                1000,
            )
        };
        let (a, b) = (fit(), fit());
        assert_eq!(a.params(), b.params());
        assert_eq!(a.std_errors(), b.std_errors());
        assert_eq!(a.lss().to_bits(), b.lss().to_bits());
    }
}
