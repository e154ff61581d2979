// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Requests handed to generators and the sequences they return.

use serde::{Deserialize, Serialize};

use crate::conditioning;
use crate::error::{Error, Result};

/// Reseed fraction used when a request does not name one.
pub const DEFAULT_RESEED_FRACTION: f64 = 0.01;

/// Parameters of one generation call. Validated on construction,
/// immutable afterwards.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SequenceRequest {
    m: u64,
    n: usize,
    a: u64,
    w: Option<f64>,
}

impl SequenceRequest {
    /// Build a request for `n` values in `[0, m]` with tuning parameter `a`.
    pub fn new(m: u64, n: usize, a: u64) -> Result<Self> {
        if m == 0 {
            return Err(Error::invalid("modulus must be at least 1"));
        }
        if m == u64::MAX {
            return Err(Error::invalid("modulus must be below u64::MAX"));
        }
        if n == 0 {
            return Err(Error::invalid("sample size must be at least 1"));
        }
        if n as u64 > u32::MAX as u64 {
            return Err(Error::invalid(format!(
                "sample size {} exceeds {}",
                n,
                u32::MAX
            )));
        }
        Ok(SequenceRequest { m, n, a, w: None })
    }

    /// Set the worst case period as a fraction of the modulus.
    pub fn with_reseed_fraction(mut self, w: f64) -> Result<Self> {
        if !(w > 0.0 && w <= 1.0) {
            return Err(Error::invalid(format!(
                "reseed fraction must lie in (0, 1], got {}",
                w
            )));
        }
        self.w = Some(w);
        Ok(self)
    }

    pub fn m(&self) -> u64 {
        self.m
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn a(&self) -> u64 {
        self.a
    }

    pub fn reseed_fraction(&self) -> f64 {
        self.w.unwrap_or(DEFAULT_RESEED_FRACTION)
    }

    /// `m + 1`, the size of the output range.
    pub fn range(&self) -> u128 {
        self.m as u128 + 1
    }

    /// Number of draws between two reseeds: `round(w * m)`.
    /// A period of zero would reseed forever and is rejected.
    pub fn reseed_period(&self) -> Result<u64> {
        let period = (self.reseed_fraction() * self.m as f64).round();
        if period < 1.0 {
            return Err(Error::invalid(format!(
                "reseed period round({} * {}) is zero",
                self.reseed_fraction(),
                self.m
            )));
        }
        Ok(period as u64)
    }
}

/// Generator output, every value in `[0, m]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSequence {
    m: u64,
    values: Vec<u64>,
}

impl RawSequence {
    /// Every value must lie in `[0, m]`, generators guarantee it.
    pub(crate) fn new(m: u64, values: Vec<u64>) -> Self {
        debug_assert!(values.iter().all(|&v| v <= m));
        RawSequence { m, values }
    }

    pub fn m(&self) -> u64 {
        self.m
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Divide every value by `m + 1`.
    /// Consumes the raw sequence, a normalized sequence can not be normalized again.
    pub fn normalize(self) -> NormalizedSequence {
        let m = self.m;
        NormalizedSequence(
            self.values
                .into_iter()
                .map(|v| conditioning::normalize_value(v, m))
                .collect(),
        )
    }
}

/// Sample in `[0, 1)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedSequence(Vec<f64>);

impl NormalizedSequence {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Common capability of every registered generator.
pub trait SequenceGenerator {
    /// Produce exactly `request.n()` values in `[0, request.m()]`.
    /// Rejects invalid parameters before the first draw.
    fn generate(&mut self, request: &SequenceRequest) -> Result<RawSequence>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_requests() {
        assert!(matches!(
            SequenceRequest::new(0, 10, 5),
            Err(Error::InvalidParameter(_))
        ));
        assert!(SequenceRequest::new(10, 0, 5).is_err());
        assert!(SequenceRequest::new(u64::MAX, 10, 5).is_err());
        assert!(SequenceRequest::new(u64::MAX - 1, 10, 5).is_ok());
    }

    #[test]
    fn reseed_fraction_bounds() {
        let req = SequenceRequest::new(100, 10, 5).unwrap();
        assert!(req.with_reseed_fraction(0.0).is_err());
        assert!(req.with_reseed_fraction(-0.1).is_err());
        assert!(req.with_reseed_fraction(1.5).is_err());
        assert!(req.with_reseed_fraction(f64::NAN).is_err());
        assert!(req.with_reseed_fraction(1.0).is_ok());
    }

    #[test]
    fn reseed_period_rounds() {
        let req = SequenceRequest::new(1000, 10, 5).unwrap();
        assert_eq!(req.reseed_period().unwrap(), 10);
        let req = req.with_reseed_fraction(0.0015).unwrap();
        assert_eq!(req.reseed_period().unwrap(), 2);
        let req = SequenceRequest::new(10, 10, 5)
            .unwrap()
            .with_reseed_fraction(0.01)
            .unwrap();
        assert!(matches!(
            req.reseed_period(),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn normalize_divides_by_range() {
        let raw = RawSequence::new(9, vec![0, 1, 5, 9]);
        let normalized = raw.normalize();
        assert_eq!(normalized.as_slice(), &[0.0, 0.1, 0.5, 0.9]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn out_of_range_value_is_caught() {
        RawSequence::new(1, vec![0, 1, 2]);
    }

    #[test]
    fn normalize_huge_modulus_stays_below_one() {
        let m = u64::MAX - 1;
        let normalized = RawSequence::new(m, vec![m, 0]).normalize();
        assert!(normalized.as_slice()[0] < 1.0);
        assert_eq!(normalized.as_slice()[1], 0.0);
    }
}
