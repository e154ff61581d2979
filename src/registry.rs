// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Closed registry of every generator the sweep can test.
//! Adding a generator means adding a variant here; the sweep itself never
//! changes.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::hprng::{ChaosHybrid, ChaosKind, ChaoticMap, LinearHybrid, LinearKind, MapKind};
use crate::maps::ChaosParams;
use crate::rngs::{self, Entropy, Reduced};
use crate::sequence::SequenceGenerator;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Algorithm {
    Linear(LinearKind),
    Chaos(ChaosKind),
    Map(MapKind),
    MersenneTwister,
    Pcg32,
    XorShift128,
    XorShift128Plus,
    Well512a,
    SplitMix64,
    Randu,
    Reference,
}

/// Name of every registered generator, in registry order.
const NAMES: [(&str, Algorithm); 30] = [
    ("hybrid", Algorithm::Linear(LinearKind::Hybrid)),
    ("switch", Algorithm::Linear(LinearKind::Switch)),
    ("shift", Algorithm::Linear(LinearKind::Shift)),
    ("switch_shift", Algorithm::Linear(LinearKind::SwitchShift)),
    ("shift_rotate", Algorithm::Linear(LinearKind::ShiftRotate)),
    ("switch_shift_rotate", Algorithm::Linear(LinearKind::SwitchShiftRotate)),
    ("switch_shift_rotate_alt", Algorithm::Linear(LinearKind::SwitchShiftRotateAlt)),
    ("xor", Algorithm::Linear(LinearKind::Xor)),
    ("mask", Algorithm::Linear(LinearKind::Mask)),
    ("mask_alt", Algorithm::Linear(LinearKind::MaskAlt)),
    ("mask_shift", Algorithm::Linear(LinearKind::MaskShift)),
    ("mask_shift_alt", Algorithm::Linear(LinearKind::MaskShiftAlt)),
    ("switch_mask_shift", Algorithm::Linear(LinearKind::SwitchMaskShift)),
    ("switch_mask_shift_shl1", Algorithm::Linear(LinearKind::SwitchMaskShiftShl1)),
    ("tent_hybrid", Algorithm::Chaos(ChaosKind::TentHybrid)),
    ("tent_hybrid_2", Algorithm::Chaos(ChaosKind::TentHybrid2)),
    ("gauss_hybrid", Algorithm::Chaos(ChaosKind::GaussHybrid)),
    ("gauss_hybrid_2", Algorithm::Chaos(ChaosKind::GaussHybrid2)),
    ("chaos_hprng", Algorithm::Chaos(ChaosKind::ChaosHprng)),
    ("tent_map", Algorithm::Map(MapKind::Tent)),
    ("gauss_map", Algorithm::Map(MapKind::Gauss)),
    ("chebyshev_map", Algorithm::Map(MapKind::Chebyshev)),
    ("mt19937", Algorithm::MersenneTwister),
    ("pcg32", Algorithm::Pcg32),
    ("xorshift128", Algorithm::XorShift128),
    ("xorshift128plus", Algorithm::XorShift128Plus),
    ("well512a", Algorithm::Well512a),
    ("splitmix64", Algorithm::SplitMix64),
    ("randu", Algorithm::Randu),
    ("reference", Algorithm::Reference),
];

/// Generators swept when none are selected: the plain hybrid and the
/// switching variants it is compared against.
pub const DEFAULT_SELECTION: [Algorithm; 4] = [
    Algorithm::Linear(LinearKind::Hybrid),
    Algorithm::Linear(LinearKind::Switch),
    Algorithm::Linear(LinearKind::SwitchShift),
    Algorithm::Linear(LinearKind::SwitchMaskShift),
];

/// Map parameters of the chaos based generators.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ChaosSettings {
    /// Used by the chaos hybrids and the tent and Chebyshev maps.
    pub hybrid: ChaosParams,
    /// Used by the standalone Gauss map.
    pub gauss_map: ChaosParams,
}

impl Default for ChaosSettings {
    fn default() -> Self {
        ChaosSettings {
            hybrid: ChaosParams::default(),
            gauss_map: ChaosParams::gauss_map(),
        }
    }
}

impl ChaosSettings {
    pub fn validate(&self) -> Result<(), Error> {
        self.hybrid.validate()?;
        self.gauss_map.validate()
    }
}

impl Algorithm {
    pub fn all() -> impl Iterator<Item = Algorithm> {
        NAMES.iter().map(|&(_, alg)| alg)
    }

    pub fn name(self) -> &'static str {
        NAMES
            .iter()
            .find(|&&(_, alg)| alg == self)
            .map(|&(name, _)| name)
            .unwrap_or("unknown")
    }

    /// True when draws depend on wall clock reseeding unless the entropy
    /// source is seeded.
    pub fn reseeds(self) -> bool {
        match self {
            Algorithm::Linear(kind) => kind.reseeds(),
            Algorithm::Chaos(_) => true,
            _ => false,
        }
    }

    /// Build a fresh generator with the default map parameters.
    pub fn instantiate(self, seed: u64, entropy: Entropy) -> Box<dyn SequenceGenerator> {
        self.instantiate_with(&ChaosSettings::default(), seed, entropy)
    }

    /// Build a fresh generator. State is derived from `seed` only, the
    /// switching variants draw their reseeds from `entropy`.
    pub fn instantiate_with(
        self,
        chaos: &ChaosSettings,
        seed: u64,
        entropy: Entropy,
    ) -> Box<dyn SequenceGenerator> {
        match self {
            Algorithm::Linear(kind) => Box::new(LinearHybrid::new(kind, seed, entropy)),
            Algorithm::Chaos(kind) => {
                Box::new(ChaosHybrid::new(kind, chaos.hybrid, seed, entropy))
            }
            Algorithm::Map(kind) => {
                let params = match kind {
                    MapKind::Gauss => chaos.gauss_map,
                    _ => chaos.hybrid,
                };
                Box::new(ChaoticMap::new(kind, params, seed))
            }
            Algorithm::MersenneTwister => Box::new(Reduced::<rngs::mt::Mt19937>::new(seed)),
            Algorithm::Pcg32 => Box::new(Reduced::<rngs::pcg::Pcg32>::new(seed)),
            Algorithm::XorShift128 => Box::new(Reduced::<rngs::xorshift::XORShift128>::new(seed)),
            Algorithm::XorShift128Plus => {
                Box::new(Reduced::<rngs::xorshift::XorShift128Plus>::new(seed))
            }
            Algorithm::Well512a => Box::new(Reduced::<rngs::well::Well512a>::new(seed)),
            Algorithm::SplitMix64 => Box::new(Reduced::<rngs::splitmix::SplitMix64>::new(seed)),
            Algorithm::Randu => Box::new(Reduced::<rngs::lcg::Randu>::new(seed)),
            Algorithm::Reference => Box::new(Reduced::<rngs::ReferenceRand>::new(seed)),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    /// Accepts registry names, with spaces or dashes in place of underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace([' ', '-'], "_");
        NAMES
            .iter()
            .find(|&&(name, _)| name == key)
            .map(|&(_, alg)| alg)
            .ok_or_else(|| Error::invalid(format!("unknown generator {:?}", s)))
    }
}
