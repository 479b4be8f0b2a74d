//! Settings validation and parameter-vector assembly.

use crate::error::{FitError, FitResult};
use crate::settings::{FitSettings, ModelSettings};
use af_models::IsothermModel;

const DEFAULT_INITIAL: f64 = 1.0;
const DEFAULT_MIN: f64 = 0.0;
const DEFAULT_MAX: f64 = 100.0;

/// One model's configuration with parameter vectors assembled in descriptor
/// order, validated and ready for the solver.
#[derive(Debug, Clone)]
pub struct ResolvedModelConfig {
    pub model: IsothermModel,
    pub initial: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// The validated run configuration: models in reporting order plus the
/// shared evaluation budget.
#[derive(Debug, Clone)]
pub struct ResolvedConfigs {
    pub models: Vec<ResolvedModelConfig>,
    pub max_evaluations: usize,
}

/// Validate settings and assemble per-model parameter vectors.
///
/// Unknown model names and bound violations surface here, before any
/// fitting starts.
pub fn resolve_configs(settings: &FitSettings) -> FitResult<ResolvedConfigs> {
    let mut models = Vec::with_capacity(settings.models.len());
    for model_settings in &settings.models {
        models.push(resolve_model(model_settings)?);
    }
    Ok(ResolvedConfigs {
        models,
        max_evaluations: settings.max_iterations.max(1),
    })
}

fn resolve_model(settings: &ModelSettings) -> FitResult<ResolvedModelConfig> {
    let model = IsothermModel::from_name(&settings.model)?;

    let names = model.param_names();
    let mut initial = Vec::with_capacity(names.len());
    let mut lower = Vec::with_capacity(names.len());
    let mut upper = Vec::with_capacity(names.len());

    for &param in names {
        let init = settings.initial.get(param).copied().unwrap_or(DEFAULT_INITIAL);
        let min = settings.min.get(param).copied().unwrap_or(DEFAULT_MIN);
        let max = settings.max.get(param).copied().unwrap_or(DEFAULT_MAX);

        let invalid = |what: String| FitError::InvalidBounds {
            model: model.name().to_string(),
            param: param.to_string(),
            what,
        };

        if !min.is_finite() || !max.is_finite() || !init.is_finite() {
            return Err(invalid(format!(
                "all values must be finite (initial={init}, min={min}, max={max})"
            )));
        }
        if min > max {
            return Err(invalid(format!("min {min} exceeds max {max}")));
        }
        if init < min || init > max {
            return Err(invalid(format!(
                "initial {init} lies outside [{min}, {max}]"
            )));
        }

        initial.push(init);
        lower.push(min);
        upper.push(max);
    }

    Ok(ResolvedModelConfig {
        model,
        initial,
        lower,
        upper,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::FitSettings;

    fn settings_for(model: ModelSettings) -> FitSettings {
        FitSettings {
            models: vec![model],
            ..FitSettings::default()
        }
    }

    #[test]
    fn defaults_fill_missing_parameters() {
        let configs = resolve_configs(&settings_for(ModelSettings::named("Langmuir"))).unwrap();
        let cfg = &configs.models[0];
        assert_eq!(cfg.initial, [1.0, 1.0]);
        assert_eq!(cfg.lower, [0.0, 0.0]);
        assert_eq!(cfg.upper, [100.0, 100.0]);
    }

    #[test]
    fn configured_values_override_defaults() {
        let mut model = ModelSettings::named("Sips");
        model.initial.insert("n".to_string(), 2.0);
        model.max.insert("n".to_string(), 5.0);
        let configs = resolve_configs(&settings_for(model)).unwrap();
        let cfg = &configs.models[0];
        // Sips parameter order: k, qsat, n
        assert_eq!(cfg.initial, [1.0, 1.0, 2.0]);
        assert_eq!(cfg.upper, [100.0, 100.0, 5.0]);
    }

    #[test]
    fn unknown_model_is_rejected() {
        let err = resolve_configs(&settings_for(ModelSettings::named("BET"))).unwrap_err();
        assert!(matches!(err, FitError::Model(_)));
    }

    #[test]
    fn min_above_max_is_rejected() {
        let mut model = ModelSettings::named("Langmuir");
        model.min.insert("k".to_string(), 10.0);
        model.max.insert("k".to_string(), 1.0);
        model.initial.insert("k".to_string(), 5.0);
        let err = resolve_configs(&settings_for(model)).unwrap_err();
        assert!(matches!(err, FitError::InvalidBounds { .. }));
    }

    #[test]
    fn non_finite_bound_is_rejected() {
        let mut model = ModelSettings::named("Langmuir");
        model.max.insert("qsat".to_string(), f64::INFINITY);
        let err = resolve_configs(&settings_for(model)).unwrap_err();
        assert!(matches!(err, FitError::InvalidBounds { .. }));
    }

    #[test]
    fn initial_outside_box_is_rejected() {
        let mut model = ModelSettings::named("Langmuir");
        model.initial.insert("k".to_string(), 200.0);
        let err = resolve_configs(&settings_for(model)).unwrap_err();
        assert!(matches!(err, FitError::InvalidBounds { .. }));
    }

    #[test]
    fn evaluation_budget_has_floor_of_one() {
        let mut settings = FitSettings::default();
        settings.max_iterations = 0;
        let configs = resolve_configs(&settings).unwrap();
        assert_eq!(configs.max_evaluations, 1);
    }
}
