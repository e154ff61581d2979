// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Chaotic one dimensional maps.
//! Stateless building blocks used as mixers by the hybrid generators.

use crate::error::{Error, Result};

/// Tent map. Maps [0, 1] onto itself for 1 < mu < 2.
pub fn tent(x: f64, mu: f64) -> f64 {
    if x < 0.5 {
        mu * x
    } else {
        mu * (1.0 - x)
    }
}

/// Logistic map. Chaotic for r close to 4.
pub fn logistic(x: f64, r: f64) -> f64 {
    r * x * (1.0 - x)
}

/// Gauss (mouse) map.
/// The result is not confined to [0, 1), callers reduce it with `rem_euclid(1.0)`.
pub fn gauss(x: f64, alpha: f64, beta: f64) -> f64 {
    (-alpha * x * x).exp() + beta
}

/// Chebyshev map of the given degree, defined on [-1, 1].
/// Scaled by 0.99 so the trajectory never sits exactly on the boundary.
pub fn chebyshev(x: f64, degree: u32) -> f64 {
    0.99 * (degree as f64 * x.clamp(-1.0, 1.0).acos()).cos()
}

/// Control parameters of the maps used by the generators.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ChaosParams {
    pub tent_mu: f64,
    pub logistic_r: f64,
    pub gauss_alpha: f64,
    pub gauss_beta: f64,
    pub chebyshev_degree: u32,
}

impl Default for ChaosParams {
    fn default() -> Self {
        ChaosParams {
            tent_mu: 1.7,
            logistic_r: 3.99,
            gauss_alpha: 0.3,
            gauss_beta: -0.7,
            chebyshev_degree: 4,
        }
    }
}

impl ChaosParams {
    /// Parameters of the standalone gauss map generator.
    /// Steeper than the default so a single trajectory spreads over [0, 1).
    pub fn gauss_map() -> Self {
        ChaosParams {
            gauss_alpha: 4.9,
            gauss_beta: -0.5,
            ..ChaosParams::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tent_mu > 1.0 && self.tent_mu < 2.0) {
            return Err(Error::invalid(format!(
                "tent mu must lie in (1, 2), got {}",
                self.tent_mu
            )));
        }
        if !(self.logistic_r > 3.57 && self.logistic_r <= 4.0) {
            return Err(Error::invalid(format!(
                "logistic r must lie in (3.57, 4], got {}",
                self.logistic_r
            )));
        }
        if !(self.gauss_alpha > 0.0) {
            return Err(Error::invalid(format!(
                "gauss alpha must be positive, got {}",
                self.gauss_alpha
            )));
        }
        if !(self.gauss_beta > -1.0 && self.gauss_beta < 1.0) {
            return Err(Error::invalid(format!(
                "gauss beta must lie in (-1, 1), got {}",
                self.gauss_beta
            )));
        }
        if self.chebyshev_degree < 2 {
            return Err(Error::invalid(format!(
                "chebyshev degree must be at least 2, got {}",
                self.chebyshev_degree
            )));
        }
        Ok(())
    }
}

/// Starting point of a map trajectory in (0, 1) derived from an integer seed.
/// Never returns exactly 0, which is a fixed point of every map used here.
pub fn unit_seed(seed: u64) -> f64 {
    ((seed % 1_000_000) as f64 + 0.5) / 1_000_000.0
}

/// Keep a trajectory inside the open unit interval.
/// Floating point rounding can push a logistic orbit onto 0 or 1, from which
/// it never leaves. In that case the orbit restarts at `fallback`.
pub fn keep_in_unit(x: f64, fallback: f64) -> f64 {
    if x > 0.0 && x < 1.0 {
        x
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tent_is_piecewise_linear() {
        assert_eq!(tent(0.25, 1.5), 0.375);
        assert_eq!(tent(0.75, 1.5), 0.375);
        assert_eq!(tent(0.5, 1.7), 1.7 * 0.5);
    }

    #[test]
    fn tent_stays_in_unit_interval() {
        let mut x = unit_seed(123_456);
        for _ in 0..10_000 {
            x = tent(x, 1.7);
            assert!((0.0..=1.0).contains(&x));
        }
    }

    #[test]
    fn logistic_values() {
        assert_eq!(logistic(0.5, 4.0), 1.0);
        assert_eq!(logistic(0.0, 3.99), 0.0);
        assert!((logistic(0.25, 3.99) - 0.7481249999999999).abs() < 1e-12);
    }

    #[test]
    fn gauss_needs_reduction() {
        let g = gauss(0.9, 0.3, -0.7);
        assert!(g < 1.0 && g > -1.0);
        assert!((0.0..1.0).contains(&g.rem_euclid(1.0)));
        assert!((gauss(0.0, 4.9, -0.5) - 0.5).abs() < 1e-15);
    }

    #[test]
    fn chebyshev_stays_bounded() {
        let mut y = 0.3;
        for _ in 0..1000 {
            y = chebyshev(y, 4);
            assert!((-0.99..=0.99).contains(&y));
        }
        assert!((chebyshev(1.0, 2) - 0.99).abs() < 1e-12);
    }

    #[test]
    fn maps_are_pure() {
        assert_eq!(tent(0.3, 1.7), tent(0.3, 1.7));
        assert_eq!(gauss(0.3, 0.3, -0.7), gauss(0.3, 0.3, -0.7));
    }

    #[test]
    fn params_validation() {
        assert!(ChaosParams::default().validate().is_ok());
        assert!(ChaosParams::gauss_map().validate().is_ok());
        let bad_mu = ChaosParams {
            tent_mu: 0.5,
            ..ChaosParams::default()
        };
        assert!(matches!(bad_mu.validate(), Err(Error::InvalidParameter(_))));
        let bad_beta = ChaosParams {
            gauss_beta: 1.0,
            ..ChaosParams::default()
        };
        assert!(bad_beta.validate().is_err());
        let bad_alpha = ChaosParams {
            gauss_alpha: f64::NAN,
            ..ChaosParams::default()
        };
        assert!(bad_alpha.validate().is_err());
    }

    #[test]
    fn unit_seed_is_never_zero() {
        for seed in [0u64, 1_000_000, 2_000_000, 999_999] {
            let x = unit_seed(seed);
            assert!(x > 0.0 && x < 1.0);
        }
    }
}
