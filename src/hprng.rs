// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Hybrid PRNGs.
//!
//! A single accumulator `x` is driven by a fixed arithmetic or bitwise
//! recurrence in `x`, the tuning parameter `a` and the sample size `n`, and
//! reduced into `[0, m]` on every step. The `switch` variants replace `x`
//! with fresh entropy once per worst case period `round(w * m)`. The chaos
//! variants mix one or two chaotic map trajectories into the accumulator.
//!
//! Products like `x * a` are evaluated exactly in 128 bit before the
//! reduction. Shifts of those exact values are applied after reduction,
//! `(v << k) mod M == ((v mod M) << k) mod M`. Rotations operate on the
//! value wrapped to 64 bits.

use crate::conditioning::{unit_to_bits, unit_to_range};
use crate::error::Result;
use crate::maps::{self, ChaosParams};
use crate::rngs::Entropy;
use crate::sequence::{RawSequence, SequenceGenerator, SequenceRequest};

/// Reseed bookkeeping shared by all switching variants.
struct Reseeder {
    period: Option<u64>,
}

impl Reseeder {
    fn new(request: &SequenceRequest, enabled: bool) -> Result<Self> {
        let period = if enabled {
            Some(request.reseed_period()?)
        } else {
            None
        };
        Ok(Reseeder { period })
    }

    /// True when draw `i` starts a new period, including the first draw.
    fn due(&self, i: u64) -> bool {
        matches!(self.period, Some(p) if i % p == 0)
    }
}

/// `(v << shift) mod range` for an arbitrarily large `v` already reduced
/// below `range`.
fn shl_mod(v: u128, shift: u32, range: u128) -> u128 {
    ((v % range) << shift) % range
}

/// Linear recurrences of the hybrid family.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LinearKind {
    Hybrid,
    Switch,
    Shift,
    SwitchShift,
    ShiftRotate,
    SwitchShiftRotate,
    SwitchShiftRotateAlt,
    Xor,
    Mask,
    MaskAlt,
    MaskShift,
    MaskShiftAlt,
    SwitchMaskShift,
    /// Earlier revision of `SwitchMaskShift` shifting by one bit.
    SwitchMaskShiftShl1,
}

impl LinearKind {
    pub fn reseeds(self) -> bool {
        matches!(
            self,
            LinearKind::Switch
                | LinearKind::SwitchShift
                | LinearKind::SwitchShiftRotate
                | LinearKind::SwitchShiftRotateAlt
                | LinearKind::SwitchMaskShift
                | LinearKind::SwitchMaskShiftShl1
        )
    }

    /// One step of the recurrence, returns the next `x` in `[0, range)`.
    /// `n` is the requested sample size.
    fn step(self, x: u64, a: u64, n: u64, range: u128) -> u64 {
        let x = x as u128;
        let a = a as u128;
        let n_sq = (n as u128) * (n as u128);
        let next = match self {
            LinearKind::Hybrid | LinearKind::Switch => (n_sq + a * x) % range,
            LinearKind::Shift | LinearKind::SwitchShift => shl_mod(n_sq + x * a, 5, range),
            LinearKind::ShiftRotate | LinearKind::SwitchShiftRotate => {
                let v = ((n_sq + x * a) as u64) << 5;
                v.rotate_left(7) as u128 % range
            }
            LinearKind::SwitchShiftRotateAlt => {
                let v = ((x * a) as u64) << 5;
                (n_sq + v.rotate_left(7) as u128) % range
            }
            LinearKind::Xor => (n_sq ^ (x * a)) % range,
            LinearKind::Mask => (n_sq + (x ^ a)) % range,
            LinearKind::MaskAlt => (n_sq + (x ^ n as u128)) % range,
            LinearKind::MaskShift | LinearKind::SwitchMaskShift => {
                shl_mod(n_sq + (x ^ a), 5, range)
            }
            LinearKind::MaskShiftAlt => shl_mod(n_sq + (x ^ n as u128), 5, range),
            LinearKind::SwitchMaskShiftShl1 => shl_mod(n_sq + (x ^ a), 1, range),
        };
        // range <= 2**64 so the reduced value fits
        next as u64
    }
}

/// Generator for every member of the linear hybrid family.
#[derive(Debug, Clone)]
pub struct LinearHybrid {
    kind: LinearKind,
    x: u64,
    entropy: Entropy,
}

impl LinearHybrid {
    pub fn new(kind: LinearKind, seed: u64, entropy: Entropy) -> Self {
        LinearHybrid {
            kind,
            x: seed,
            entropy,
        }
    }
}

impl SequenceGenerator for LinearHybrid {
    fn generate(&mut self, request: &SequenceRequest) -> Result<RawSequence> {
        let reseeder = Reseeder::new(request, self.kind.reseeds())?;
        let range = request.range();
        let n = request.n() as u64;
        let mut values = Vec::with_capacity(request.n());
        for i in 0..n {
            if reseeder.due(i) {
                self.x = self.entropy.next_seed();
            }
            self.x = self.kind.step(self.x, request.a(), n, range);
            values.push(self.x);
        }
        Ok(RawSequence::new(request.m(), values))
    }
}

/// Hybrids mixing chaotic map output into the linear accumulator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChaosKind {
    TentHybrid,
    TentHybrid2,
    GaussHybrid,
    GaussHybrid2,
    /// Tent and logistic trajectories, the logistic state also selects a rotation.
    ChaosHprng,
}

#[derive(Debug, Clone)]
pub struct ChaosHybrid {
    kind: ChaosKind,
    params: ChaosParams,
    x: u64,
    primary: f64,
    secondary: f64,
    entropy: Entropy,
}

impl ChaosHybrid {
    pub fn new(kind: ChaosKind, params: ChaosParams, seed: u64, entropy: Entropy) -> Self {
        let primary = maps::unit_seed(seed);
        let secondary = maps::unit_seed(seed.rotate_left(32));
        ChaosHybrid {
            kind,
            params,
            x: seed,
            primary,
            secondary,
            entropy,
        }
    }

    fn next_primary(&self) -> f64 {
        let p = &self.params;
        match self.kind {
            ChaosKind::TentHybrid | ChaosKind::TentHybrid2 | ChaosKind::ChaosHprng => {
                maps::tent(self.primary, p.tent_mu)
            }
            ChaosKind::GaussHybrid | ChaosKind::GaussHybrid2 => {
                maps::gauss(self.primary, p.gauss_alpha, p.gauss_beta).rem_euclid(1.0)
            }
        }
    }

    fn step(&mut self, a: u64, n: u64, range: u128) -> u64 {
        let lin_n = match self.kind {
            ChaosKind::TentHybrid2 | ChaosKind::GaussHybrid2 => n as u128,
            _ => (n as u128) * (n as u128),
        };
        let acc = lin_n + (self.x as u128) * (a as u128);
        let chaos = unit_to_bits(self.primary) as u128;
        let next = match self.kind {
            ChaosKind::ChaosHprng => {
                let rot = (self.secondary * 64.0) as u32 % 64;
                let v = ((acc as u64) ^ chaos as u64).rotate_left(rot)
                    ^ unit_to_bits(self.secondary);
                v as u128 % range
            }
            _ => (acc ^ chaos) % range,
        };
        let fallback = maps::unit_seed(next as u64);
        self.primary = maps::keep_in_unit(self.next_primary(), fallback);
        if self.kind == ChaosKind::ChaosHprng {
            self.secondary = maps::keep_in_unit(
                maps::logistic(self.secondary, self.params.logistic_r),
                fallback,
            );
        }
        next as u64
    }
}

impl SequenceGenerator for ChaosHybrid {
    fn generate(&mut self, request: &SequenceRequest) -> Result<RawSequence> {
        self.params.validate()?;
        let reseeder = Reseeder::new(request, true)?;
        let range = request.range();
        let n = request.n() as u64;
        let mut values = Vec::with_capacity(request.n());
        for i in 0..n {
            if reseeder.due(i) {
                self.x = self.entropy.next_seed();
            }
            self.x = self.step(request.a(), n, range);
            values.push(self.x);
        }
        Ok(RawSequence::new(request.m(), values))
    }
}

/// Generators that read a single map trajectory directly.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MapKind {
    Tent,
    Gauss,
    Chebyshev,
}

#[derive(Debug, Clone)]
pub struct ChaoticMap {
    kind: MapKind,
    params: ChaosParams,
    state: f64,
}

impl ChaoticMap {
    pub fn new(kind: MapKind, params: ChaosParams, seed: u64) -> Self {
        let mut params = params;
        let unit = maps::unit_seed(seed);
        let state = match kind {
            MapKind::Tent => unit,
            MapKind::Gauss => {
                // Perturb the steepness by the starting point so neighbouring
                // seeds do not share an orbit.
                params.gauss_alpha += unit * 0.001;
                unit
            }
            // Chebyshev orbits live on [-1, 1].
            MapKind::Chebyshev => 2.0 * unit - 1.0,
        };
        ChaoticMap {
            kind,
            params,
            state,
        }
    }

    /// Advance the trajectory and return its value mapped to [0, 1].
    fn next_unit(&mut self) -> f64 {
        let p = &self.params;
        match self.kind {
            MapKind::Tent => {
                self.state = maps::tent(self.state, p.tent_mu);
                self.state
            }
            MapKind::Gauss => {
                self.state = maps::gauss(self.state, p.gauss_alpha, p.gauss_beta).rem_euclid(1.0);
                self.state
            }
            MapKind::Chebyshev => {
                self.state = maps::chebyshev(self.state, p.chebyshev_degree);
                (self.state + 1.0) / 2.0
            }
        }
    }
}

impl SequenceGenerator for ChaoticMap {
    fn generate(&mut self, request: &SequenceRequest) -> Result<RawSequence> {
        self.params.validate()?;
        let m = request.m();
        let values = (0..request.n())
            .map(|_| unit_to_range(self.next_unit(), m))
            .collect();
        Ok(RawSequence::new(m, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn request(m: u64, n: usize, a: u64) -> SequenceRequest {
        SequenceRequest::new(m, n, a).unwrap()
    }

    #[test]
    fn hybrid_matches_hand_computation() {
        // x1 = (3**2 + 5 * 7) % 11 = 0, x2 = (9 + 0) % 11 = 9, x3 = (9 + 45) % 11 = 10
        let mut g = LinearHybrid::new(LinearKind::Hybrid, 7, Entropy::seeded(0));
        let seq = g.generate(&request(10, 3, 5)).unwrap();
        assert_eq!(seq.values(), &[0, 9, 10]);
    }

    #[test]
    fn hybrid_multiplies_without_wrapping() {
        let x = u64::MAX;
        let a = u64::MAX;
        let m = 1_000_000_007u64;
        let expected = ((1u128 + x as u128 * a as u128) % (m as u128 + 1)) as u64;
        let mut g = LinearHybrid::new(LinearKind::Hybrid, x, Entropy::seeded(0));
        let seq = g.generate(&request(m, 1, a)).unwrap();
        assert_eq!(seq.values(), &[expected]);
    }

    #[test]
    fn shift_equals_exact_shift_then_reduce() {
        let x = 123_456_789_012u64;
        let a = 50u64;
        let m = 999u64;
        let v = 4u128 + x as u128 * a as u128;
        let expected = ((v << 5) % 1000) as u64;
        let mut g = LinearHybrid::new(LinearKind::Shift, x, Entropy::seeded(0));
        assert_eq!(g.generate(&request(m, 2, a)).unwrap().values()[0], expected);
    }

    #[test]
    fn mask_variants() {
        // mask: (4 + (6 ^ 5)) % 11 = 7, mask_alt: (4 + (6 ^ 2)) % 11 = 8
        let mut g = LinearHybrid::new(LinearKind::Mask, 6, Entropy::seeded(0));
        assert_eq!(g.generate(&request(10, 2, 5)).unwrap().values()[0], 7);
        let mut g = LinearHybrid::new(LinearKind::MaskAlt, 6, Entropy::seeded(0));
        assert_eq!(g.generate(&request(10, 2, 5)).unwrap().values()[0], 8);
        // mask_shift: ((4 + 3) << 5) % 11 = 224 % 11 = 4
        let mut g = LinearHybrid::new(LinearKind::MaskShift, 6, Entropy::seeded(0));
        assert_eq!(g.generate(&request(10, 2, 5)).unwrap().values()[0], 4);
        // shl1: ((4 + 3) << 1) % 11 = 3
        let mut g = LinearHybrid::new(LinearKind::SwitchMaskShiftShl1, 6, Entropy::seeded(0));
        let req = request(10, 2, 5).with_reseed_fraction(0.1).unwrap();
        let mut e = Entropy::seeded(0);
        let x0 = e.next_seed();
        let expected = (((4 + (x0 ^ 5) as u128) << 1) % 11) as u64;
        assert_eq!(g.generate(&req).unwrap().values()[0], expected);
    }

    #[test]
    fn xor_uses_full_product() {
        let x = u64::MAX;
        let a = 3u64;
        let m = (1u64 << 40) - 1;
        let expected = ((4u128 ^ (x as u128 * 3)) % (1u128 << 40)) as u64;
        let mut g = LinearHybrid::new(LinearKind::Xor, x, Entropy::seeded(0));
        assert_eq!(g.generate(&request(m, 2, a)).unwrap().values()[0], expected);
    }

    #[test]
    fn rotate_wraps_at_64_bits() {
        let x = 0x0123_4567_89ab_cdefu64;
        let a = 5u64;
        let m = u64::MAX - 1;
        let v = (((1u128 + x as u128 * 5) as u64) << 5).rotate_left(7);
        let expected = (v as u128 % (m as u128 + 1)) as u64;
        let mut g = LinearHybrid::new(LinearKind::ShiftRotate, x, Entropy::seeded(0));
        assert_eq!(g.generate(&request(m, 1, a)).unwrap().values()[0], expected);
    }

    #[test]
    fn switch_reseeds_every_period() {
        // period round(0.5 * 4) = 2: reseed before draws 0, 2 and 4
        let req = request(4, 5, 5).with_reseed_fraction(0.5).unwrap();
        let mut g = LinearHybrid::new(LinearKind::Switch, 0, Entropy::seeded(9));
        let seq = g.generate(&req).unwrap();

        let mut e = Entropy::seeded(9);
        let n_sq = 25u128;
        let mut x = 0u64;
        let mut expected = vec![];
        for i in 0..5u64 {
            if i % 2 == 0 {
                x = e.next_seed();
            }
            x = ((n_sq + 5 * x as u128) % 5) as u64;
            expected.push(x);
        }
        assert_eq!(seq.values(), expected.as_slice());
    }

    #[test]
    fn switch_rejects_zero_period() {
        let req = request(10, 5, 5).with_reseed_fraction(0.01).unwrap();
        for kind in [
            LinearKind::Switch,
            LinearKind::SwitchShift,
            LinearKind::SwitchMaskShift,
        ] {
            let mut g = LinearHybrid::new(kind, 1, Entropy::seeded(0));
            assert!(matches!(g.generate(&req), Err(Error::InvalidParameter(_))));
        }
        // non switching variants ignore the fraction
        let mut g = LinearHybrid::new(LinearKind::Hybrid, 1, Entropy::seeded(0));
        assert!(g.generate(&req).is_ok());
    }

    #[test]
    fn chaos_hybrids_reject_bad_params() {
        let params = ChaosParams {
            tent_mu: 2.5,
            ..ChaosParams::default()
        };
        let mut g = ChaosHybrid::new(ChaosKind::TentHybrid, params, 1, Entropy::seeded(0));
        assert!(matches!(
            g.generate(&request(1000, 10, 5)),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn chaos_hybrids_are_deterministic_and_bounded() {
        for kind in [
            ChaosKind::TentHybrid,
            ChaosKind::TentHybrid2,
            ChaosKind::GaussHybrid,
            ChaosKind::GaussHybrid2,
            ChaosKind::ChaosHprng,
        ] {
            let req = request(10_000, 2000, 50);
            let mut g1 = ChaosHybrid::new(kind, ChaosParams::default(), 77, Entropy::seeded(77));
            let mut g2 = ChaosHybrid::new(kind, ChaosParams::default(), 77, Entropy::seeded(77));
            let s1 = g1.generate(&req).unwrap();
            let s2 = g2.generate(&req).unwrap();
            assert_eq!(s1, s2);
            assert!(s1.values().iter().all(|&v| v <= 10_000));
        }
    }

    #[test]
    fn tent_hybrid_mixes_map_output() {
        // The accumulator is replaced by fresh entropy before draw 0.
        let params = ChaosParams::default();
        let req = request(1 << 40, 1, 5);
        let mut g = ChaosHybrid::new(ChaosKind::TentHybrid, params, 3, Entropy::seeded(4));
        let mut e = Entropy::seeded(4);
        let x = e.next_seed();
        let t = maps::unit_seed(3);
        let expected = ((1u128 + x as u128 * 5) ^ unit_to_bits(t) as u128) % ((1u128 << 40) + 1);
        assert_eq!(g.generate(&req).unwrap().values(), &[expected as u64]);
    }

    #[test]
    fn chaotic_maps_cover_the_range() {
        for kind in [MapKind::Tent, MapKind::Gauss, MapKind::Chebyshev] {
            let params = if kind == MapKind::Gauss {
                ChaosParams::gauss_map()
            } else {
                ChaosParams::default()
            };
            let mut g = ChaoticMap::new(kind, params, 4242);
            let seq = g.generate(&request(9, 1000, 0)).unwrap();
            assert_eq!(seq.len(), 1000);
            assert!(seq.values().iter().all(|&v| v <= 9));
            let distinct: std::collections::HashSet<_> = seq.values().iter().collect();
            assert!(distinct.len() > 1, "{:?} collapsed", kind);
        }
    }
}
