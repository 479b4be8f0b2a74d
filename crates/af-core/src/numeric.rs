use crate::AfError;

/// Floating point type used throughout the system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, AfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(AfError::NonFinite { what, value: v })
    }
}

/// Check a whole slice at once; reports the first offending value.
pub fn ensure_all_finite(values: &[Real], what: &'static str) -> Result<(), AfError> {
    for &v in values {
        if !v.is_finite() {
            return Err(AfError::NonFinite { what, value: v });
        }
    }
    Ok(())
}

/// Smallest finite value in a slice, skipping NaN. None when nothing is finite.
pub fn finite_min(values: &[Real]) -> Option<Real> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            Some(m) if m <= v => Some(m),
            _ => Some(v),
        })
}

/// Largest finite value in a slice, skipping NaN.
pub fn finite_max(values: &[Real]) -> Option<Real> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            Some(m) if m >= v => Some(m),
            _ => Some(v),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn finite_min_skips_nan() {
        assert_eq!(finite_min(&[Real::NAN, 3.0, 1.0]), Some(1.0));
        assert_eq!(finite_min(&[Real::NAN, Real::NAN]), None);
        assert_eq!(finite_max(&[Real::NAN, 3.0, 1.0]), Some(3.0));
    }

    #[test]
    fn finite_min_first_wins_on_ties() {
        // fold keeps the earliest of equal values; selection tie-breaks rely on it
        assert_eq!(finite_min(&[2.0, 2.0, 5.0]), Some(2.0));
    }
}
