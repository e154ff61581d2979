// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Goodness of fit tests against the uniform distribution on [0, 1).

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::error::{Error, Result};
use crate::strings;

/// Significance level used when none is configured.
pub const DEFAULT_ALPHA: f64 = 0.05;
/// Number of equal width bins of the chi squared test.
pub const DEFAULT_BINS: usize = 10;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestKind {
    KolmogorovSmirnov,
    ChiSquared,
}

impl TestKind {
    pub fn name(self) -> &'static str {
        match self {
            TestKind::KolmogorovSmirnov => strings::TEST_NAMES[0],
            TestKind::ChiSquared => strings::TEST_NAMES[1],
        }
    }
}

/// Result of one hypothesis test.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
    /// Uniformity was rejected, `p_value < alpha`.
    pub rejected: bool,
}

impl TestOutcome {
    fn decide(statistic: f64, p_value: f64, alpha: f64) -> Self {
        let p_value = p_value.clamp(0.0, 1.0);
        TestOutcome {
            statistic,
            p_value,
            rejected: p_value < alpha,
        }
    }
}

fn check_inputs(sample: &[f64], alpha: f64) -> Result<()> {
    if sample.is_empty() {
        return Err(Error::invalid("cannot test an empty sample"));
    }
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(Error::invalid(format!(
            "significance level must lie in (0, 1), got {}",
            alpha
        )));
    }
    Ok(())
}

/// Get p value for given degrees of freedom and chi squared value.
fn chi_squared_p_value(df: u32, chi_squared: f64) -> Result<f64> {
    let chi_squared_dist =
        ChiSquared::new(df as f64).map_err(|e| Error::Statistics(e.to_string()))?;
    Ok(chi_squared_dist.sf(chi_squared))
}

/// Survival function of the Kolmogorov distribution, P(K > lambda).
/// Uses the theta function series below 1.18 and the alternating series
/// above, both converge within four terms there.
fn kolmogorov_sf(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    if lambda < 1.18 {
        let y = (-PI * PI / (8.0 * lambda * lambda)).exp();
        let cdf = (2.0 * PI).sqrt() / lambda
            * (y + y.powi(9) + y.powi(25) + y.powi(49));
        1.0 - cdf
    } else {
        let x = (-2.0 * lambda * lambda).exp();
        2.0 * (x - x.powi(4) + x.powi(9) - x.powi(16))
    }
}

/// Maximum distance between the empirical CDF of `sample` and the uniform CDF.
pub fn ks_statistic(sample: &[f64]) -> f64 {
    let mut sorted = sample.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len() as f64;
    sorted
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let x = x.clamp(0.0, 1.0);
            let d_plus = (i as f64 + 1.0) / n - x;
            let d_minus = x - i as f64 / n;
            d_plus.max(d_minus)
        })
        .fold(0.0, f64::max)
}

/// Two sided one sample Kolmogorov-Smirnov test against U[0, 1).
/// The p value is the asymptotic one with Stephens' small sample correction.
pub fn kolmogorov_smirnov(sample: &[f64], alpha: f64) -> Result<TestOutcome> {
    check_inputs(sample, alpha)?;
    let d = ks_statistic(sample);
    let sqrt_n = (sample.len() as f64).sqrt();
    let lambda = (sqrt_n + 0.12 + 0.11 / sqrt_n) * d;
    Ok(TestOutcome::decide(d, kolmogorov_sf(lambda), alpha))
}

/// Count how many values fall in each of `bins` equal width bins of [0, 1).
/// Values of exactly 1.0 land in the last bin.
pub fn histogram(sample: &[f64], bins: usize) -> Vec<usize> {
    let mut counts = vec![0usize; bins];
    for &v in sample {
        // `as` maps NaN and negatives to bin 0
        let idx = ((v * bins as f64) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
}

/// Pearson's chi squared test of `sample` against equal expected bin counts.
/// Empty bins are fine, the statistic only divides by the expected count.
pub fn chi_squared(sample: &[f64], bins: usize, alpha: f64) -> Result<TestOutcome> {
    check_inputs(sample, alpha)?;
    if bins < 2 {
        return Err(Error::invalid(format!(
            "chi squared test needs at least 2 bins, got {}",
            bins
        )));
    }
    let expected: f64 = sample.len() as f64 / bins as f64;
    let mut chi_squared: f64 = 0.0;
    for value in histogram(sample, bins) {
        chi_squared += (value as f64 - expected).powi(2) / expected;
    }
    let p = chi_squared_p_value(bins as u32 - 1, chi_squared)?;
    Ok(TestOutcome::decide(chi_squared, p, alpha))
}
