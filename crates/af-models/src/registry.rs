//! The closed set of isotherm models.

use crate::error::{ModelError, ModelResult};

/// Theoretical adsorption isotherm models supported by the fitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsothermModel {
    /// Monolayer adsorption on a finite set of identical sites:
    /// `q = qsat * kP / (1 + kP)`
    Langmuir,
    /// Langmuir/Freundlich hybrid for heterogeneous surfaces:
    /// `q = qsat * k*P^n / (1 + k*P^n)`
    Sips,
    /// Multilayer adsorption on heterogeneous surfaces:
    /// `q = (k*P)^(1/n)`
    Freundlich,
    /// Heat of adsorption decreasing linearly with coverage:
    /// `q = b * ln(k*P)`, defined only for `k*P > 0`
    Temkin,
}

impl IsothermModel {
    pub const ALL: [IsothermModel; 4] = [
        IsothermModel::Langmuir,
        IsothermModel::Sips,
        IsothermModel::Freundlich,
        IsothermModel::Temkin,
    ];

    /// Canonical model name as used in configuration and result columns.
    pub fn name(&self) -> &'static str {
        match self {
            IsothermModel::Langmuir => "Langmuir",
            IsothermModel::Sips => "Sips",
            IsothermModel::Freundlich => "Freundlich",
            IsothermModel::Temkin => "Temkin",
        }
    }

    /// Parameter names in the order the solver and result columns use them.
    pub fn param_names(&self) -> &'static [&'static str] {
        match self {
            IsothermModel::Langmuir => &["k", "qsat"],
            IsothermModel::Sips => &["k", "qsat", "n"],
            IsothermModel::Freundlich => &["k", "n"],
            IsothermModel::Temkin => &["k", "b"],
        }
    }

    pub fn param_count(&self) -> usize {
        self.param_names().len()
    }

    /// Functional form, for display.
    pub fn formula(&self) -> &'static str {
        match self {
            IsothermModel::Langmuir => "q = qsat * kP / (1 + kP)",
            IsothermModel::Sips => "q = qsat * k*P^n / (1 + k*P^n)",
            IsothermModel::Freundlich => "q = (k*P)^(1/n)",
            IsothermModel::Temkin => "q = b * ln(k*P)",
        }
    }

    /// Case-insensitive lookup by configuration name.
    pub fn from_name(name: &str) -> ModelResult<Self> {
        match name.trim().to_uppercase().as_str() {
            "LANGMUIR" => Ok(IsothermModel::Langmuir),
            "SIPS" => Ok(IsothermModel::Sips),
            "FREUNDLICH" => Ok(IsothermModel::Freundlich),
            "TEMKIN" => Ok(IsothermModel::Temkin),
            _ => Err(ModelError::UnknownModel {
                name: name.to_string(),
            }),
        }
    }

    /// Predicted uptake at a single pressure.
    pub fn evaluate_at(&self, pressure: f64, params: &[f64]) -> ModelResult<f64> {
        self.check_arity(params.len())?;
        match self {
            IsothermModel::Langmuir => {
                let (k, qsat) = (params[0], params[1]);
                let kp = k * pressure;
                Ok(qsat * (kp / (1.0 + kp)))
            }
            IsothermModel::Sips => {
                let (k, qsat, n) = (params[0], params[1], params[2]);
                let kpn = k * pressure.powf(n);
                Ok(qsat * (kpn / (1.0 + kpn)))
            }
            IsothermModel::Freundlich => {
                let (k, n) = (params[0], params[1]);
                Ok((k * pressure).powf(1.0 / n))
            }
            IsothermModel::Temkin => {
                let (k, b) = (params[0], params[1]);
                let kp = k * pressure;
                if kp <= 0.0 {
                    return Err(ModelError::Domain {
                        model: self.name(),
                        what: "log argument k*P must be positive",
                    });
                }
                Ok(b * kp.ln())
            }
        }
    }

    /// Predicted uptake over a pressure array.
    pub fn evaluate(&self, pressure: &[f64], params: &[f64]) -> ModelResult<Vec<f64>> {
        self.check_arity(params.len())?;
        pressure
            .iter()
            .map(|&p| self.evaluate_at(p, params))
            .collect()
    }

    fn check_arity(&self, got: usize) -> ModelResult<()> {
        let expected = self.param_count();
        if got != expected {
            return Err(ModelError::ParameterCount {
                model: self.name(),
                expected,
                got,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for IsothermModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
