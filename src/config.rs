// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Sweep configuration.
//!
//! | Option | Default |
//! |--------|---------|
//! | `m_initial` | 100 |
//! | `m_multiplier` | 10 |
//! | `m_limit` | 10^11 |
//! | `alpha` | 0.05 |
//! | `n` | 1000 |
//! | `reseed_fraction` | 0.01 |
//! | `chi_squared_bins` | 10 |
//! | `timing_repetitions` | 100 |
//! | `batches` | 1 |
//! | `seed_policy` | wall clock |
//! | `output_dir` | `results` |
//! | `algorithms` | hybrid, switch, switch_shift, switch_mask_shift |
//! | `chaos` | tent mu 1.7, logistic r 3.99, gauss 0.3 / -0.7 (gauss map 4.9 / -0.5), chebyshev degree 4 |

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::registry::{Algorithm, ChaosSettings, DEFAULT_SELECTION};
use crate::rngs::{self, Entropy};
use crate::sequence::DEFAULT_RESEED_FRACTION;
use crate::stats::{DEFAULT_ALPHA, DEFAULT_BINS};

/// Largest batch index whose tuning parameter 5 * 10^i fits in 64 bits.
pub const MAX_BATCH_INDEX: u32 = 18;

/// Where generator seeds come from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SeedPolicy {
    /// A new wall clock seed for every case, reseeds read the clock too.
    WallClock,
    /// Every case starts from this seed, reseeds come from a seeded stream.
    Fixed(u64),
}

impl SeedPolicy {
    pub fn case_seed(self) -> u64 {
        match self {
            SeedPolicy::WallClock => rngs::wall_clock_seed(),
            SeedPolicy::Fixed(seed) => seed,
        }
    }

    pub fn entropy(self, seed: u64) -> Entropy {
        match self {
            SeedPolicy::WallClock => Entropy::WallClock,
            SeedPolicy::Fixed(_) => Entropy::seeded(seed),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub m_initial: u64,
    pub m_multiplier: u64,
    pub m_limit: u64,
    pub alpha: f64,
    pub n: usize,
    pub reseed_fraction: f64,
    pub chi_squared_bins: usize,
    /// Generation calls averaged for the elapsed time of one case.
    pub timing_repetitions: u32,
    /// Independent sweep runs, batch `i` uses tuning parameter 5 * 10^i.
    pub batches: u32,
    pub seed_policy: SeedPolicy,
    pub output_dir: PathBuf,
    pub algorithms: Vec<Algorithm>,
    pub chaos: ChaosSettings,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            m_initial: 100,
            m_multiplier: 10,
            m_limit: 100_000_000_000,
            alpha: DEFAULT_ALPHA,
            n: 1000,
            reseed_fraction: DEFAULT_RESEED_FRACTION,
            chi_squared_bins: DEFAULT_BINS,
            timing_repetitions: 100,
            batches: 1,
            seed_policy: SeedPolicy::WallClock,
            output_dir: PathBuf::from("results"),
            algorithms: DEFAULT_SELECTION.to_vec(),
            chaos: ChaosSettings::default(),
        }
    }
}

impl SweepConfig {
    /// Check every option before the sweep starts.
    pub fn validate(&self) -> Result<()> {
        if self.m_initial == 0 || self.m_initial == u64::MAX {
            return Err(Error::invalid(format!(
                "m_initial must lie in [1, u64::MAX), got {}",
                self.m_initial
            )));
        }
        if self.m_multiplier < 2 {
            return Err(Error::invalid(format!(
                "m_multiplier must be at least 2, got {}",
                self.m_multiplier
            )));
        }
        if self.m_limit < self.m_initial || self.m_limit == u64::MAX {
            return Err(Error::invalid(format!(
                "m_limit must lie in [m_initial, u64::MAX), got {}",
                self.m_limit
            )));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(Error::invalid(format!(
                "alpha must lie in (0, 1), got {}",
                self.alpha
            )));
        }
        if self.n == 0 || self.n as u64 > u32::MAX as u64 {
            return Err(Error::invalid(format!(
                "n must lie in [1, {}], got {}",
                u32::MAX,
                self.n
            )));
        }
        if !(self.reseed_fraction > 0.0 && self.reseed_fraction <= 1.0) {
            return Err(Error::invalid(format!(
                "reseed fraction must lie in (0, 1], got {}",
                self.reseed_fraction
            )));
        }
        if self.chi_squared_bins < 2 {
            return Err(Error::invalid("chi squared test needs at least 2 bins"));
        }
        if self.timing_repetitions == 0 {
            return Err(Error::invalid("timing repetitions must be at least 1"));
        }
        if self.batches == 0 || self.batches > MAX_BATCH_INDEX + 1 {
            return Err(Error::invalid(format!(
                "batches must lie in [1, {}], got {}",
                MAX_BATCH_INDEX + 1,
                self.batches
            )));
        }
        if self.algorithms.is_empty() {
            return Err(Error::invalid("no generators selected"));
        }
        self.chaos.validate()?;
        // The smallest modulus gives the shortest worst case period.
        if let Some(alg) = self.algorithms.iter().find(|alg| alg.reseeds()) {
            if (self.reseed_fraction * self.m_initial as f64).round() < 1.0 {
                return Err(Error::invalid(format!(
                    "{} would reseed with period round({} * {}) = 0",
                    alg, self.reseed_fraction, self.m_initial
                )));
            }
        }
        Ok(())
    }

    /// Geometric progression m_initial, m_initial * r, ... up to m_limit.
    pub fn moduli(&self) -> impl Iterator<Item = u64> {
        let multiplier = self.m_multiplier;
        let limit = self.m_limit;
        std::iter::successors(Some(self.m_initial), move |&m| m.checked_mul(multiplier))
            .take_while(move |&m| m <= limit)
    }

    /// Tuning parameter of batch `batch`: 5 * 10^batch.
    pub fn tuning_param(batch: u32) -> Result<u64> {
        10u64
            .checked_pow(batch)
            .and_then(|p| p.checked_mul(5))
            .ok_or_else(|| Error::invalid(format!("batch index {} is too large", batch)))
    }

    pub fn store_path(&self, batch: u32) -> PathBuf {
        self.output_dir.join(format!("test_{}.jsonl", batch))
    }

    pub fn report_path(&self, batch: u32) -> PathBuf {
        self.output_dir.join(format!("report_{}.txt", batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hprng::LinearKind;

    #[test]
    fn defaults_are_valid() {
        let config = SweepConfig::default();
        config.validate().unwrap();
        let moduli: Vec<u64> = config.moduli().collect();
        assert_eq!(moduli.first(), Some(&100));
        assert_eq!(moduli.last(), Some(&100_000_000_000));
        assert_eq!(moduli.len(), 10);
    }

    #[test]
    fn moduli_stop_on_overflow() {
        let config = SweepConfig {
            m_initial: 1 << 40,
            m_multiplier: 1 << 20,
            m_limit: u64::MAX - 1,
            ..SweepConfig::default()
        };
        let moduli: Vec<u64> = config.moduli().collect();
        assert_eq!(moduli, vec![1 << 40, 1 << 60]);
    }

    #[test]
    fn tuning_param_scales_once() {
        assert_eq!(SweepConfig::tuning_param(0).unwrap(), 5);
        assert_eq!(SweepConfig::tuning_param(3).unwrap(), 5000);
        assert_eq!(
            SweepConfig::tuning_param(MAX_BATCH_INDEX).unwrap(),
            5_000_000_000_000_000_000
        );
        assert!(SweepConfig::tuning_param(MAX_BATCH_INDEX + 1).is_err());
    }

    #[test]
    fn rejects_out_of_range_options() {
        let base = SweepConfig::default();
        let cases = [
            SweepConfig {
                m_initial: 0,
                ..base.clone()
            },
            SweepConfig {
                m_multiplier: 1,
                ..base.clone()
            },
            SweepConfig {
                m_limit: 10,
                ..base.clone()
            },
            SweepConfig {
                alpha: 1.0,
                ..base.clone()
            },
            SweepConfig {
                n: 0,
                ..base.clone()
            },
            SweepConfig {
                reseed_fraction: 0.0,
                ..base.clone()
            },
            SweepConfig {
                timing_repetitions: 0,
                ..base.clone()
            },
            SweepConfig {
                batches: 20,
                ..base.clone()
            },
            SweepConfig {
                algorithms: vec![],
                ..base.clone()
            },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(Error::InvalidParameter(_))),
                "{:?} passed validation",
                config
            );
        }
    }

    #[test]
    fn rejects_out_of_range_chaos_parameters() {
        let mut config = SweepConfig::default();
        config.chaos.hybrid.logistic_r = 3.0;
        assert!(matches!(config.validate(), Err(Error::InvalidParameter(_))));
        let mut config = SweepConfig::default();
        config.chaos.gauss_map.gauss_beta = 1.0;
        assert!(matches!(config.validate(), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn rejects_zero_reseed_period_only_for_switching_generators() {
        let config = SweepConfig {
            m_initial: 10,
            ..SweepConfig::default()
        };
        assert!(config.validate().is_err());
        let config = SweepConfig {
            algorithms: vec![Algorithm::Linear(LinearKind::Hybrid), Algorithm::Pcg32],
            ..config
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn fixed_policy_is_reproducible() {
        let policy = SeedPolicy::Fixed(11);
        assert_eq!(policy.case_seed(), 11);
        let mut a = policy.entropy(11);
        let mut b = policy.entropy(11);
        assert_eq!(a.next_seed(), b.next_seed());
    }

    #[test]
    fn paths_per_batch() {
        let config = SweepConfig::default();
        assert_eq!(config.store_path(2), PathBuf::from("results/test_2.jsonl"));
        assert_eq!(config.report_path(0), PathBuf::from("results/report_0.txt"));
    }
}
