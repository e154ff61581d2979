// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Implementation of the published word-stream PRNGs.
//! All implement the RNG interface. `Reduced` turns any of them into a
//! sequence generator over `[0, m]`.

use rand::{RngCore, SeedableRng};

use crate::conditioning::rs_random_int;
use crate::error::Result;
use crate::sequence::{RawSequence, SequenceGenerator, SequenceRequest};

/// General trait for PRNGs
pub trait RNG {
    /// Initialize with specified seed.
    fn new(seed: u64) -> Self;
    /// Generate u32 and advance the state one step.
    fn next_u32(&mut self) -> u32;
    /// Generate u64 and advance the state one step.
    /// For generators that dont support full u64 might advance
    /// state more than one step.
    fn next(&mut self) -> u64;
    /// Advance the generator state by the specified amount of steps.
    fn advance(&mut self, delta: usize) {
        for _ in 0..delta {
            let _ = self.next_u32();
        }
    }
    /// Reset to inital state, equivalent to replacing with ::new(seed).
    fn reseed(&mut self, seed: u64);
}

/// Source of fresh state for generators that reseed during a run.
#[derive(Debug, Clone)]
pub enum Entropy {
    /// Nanoseconds since the unix epoch. Not reproducible between runs.
    WallClock,
    /// Deterministic stream derived from a seed.
    Seeded(splitmix::SplitMix64),
}

impl Entropy {
    pub fn seeded(seed: u64) -> Self {
        Entropy::Seeded(splitmix::SplitMix64::new(seed))
    }

    pub fn next_seed(&mut self) -> u64 {
        match self {
            Entropy::WallClock => wall_clock_seed(),
            Entropy::Seeded(rng) => rng.next(),
        }
    }
}

/// Current time in nanoseconds, truncated to 64 bits.
pub fn wall_clock_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(5489)
}

/// Expand a 64 bit seed into `K` state words that are not all zero.
fn expand_seed<const K: usize>(seed: u64) -> [u32; K] {
    let mut sm = splitmix::SplitMix64::new(seed);
    let mut words = [0u32; K];
    for w in words.iter_mut() {
        *w = sm.next_u32();
    }
    if words.iter().all(|&w| w == 0) {
        words[0] = 1;
    }
    words
}

/// Reduces the output of a word-stream RNG into `[0, m]` without bias.
#[derive(Debug, Clone)]
pub struct Reduced<R: RNG> {
    rng: R,
}

impl<R: RNG> Reduced<R> {
    pub fn new(seed: u64) -> Self {
        Reduced { rng: R::new(seed) }
    }
}

impl<R: RNG> SequenceGenerator for Reduced<R> {
    fn generate(&mut self, request: &SequenceRequest) -> Result<RawSequence> {
        // m < u64::MAX is guaranteed by the request.
        let upper = request.m() + 1;
        let values = (0..request.n())
            .map(|_| rs_random_int(&mut self.rng, 0, upper))
            .collect();
        Ok(RawSequence::new(request.m(), values))
    }
}

/// The rand crates standard generator, used as a baseline.
pub struct ReferenceRand {
    rng: rand::rngs::StdRng,
}

impl RNG for ReferenceRand {
    fn new(seed: u64) -> Self {
        ReferenceRand {
            rng: rand::rngs::StdRng::seed_from_u64(seed),
        }
    }

    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = rand::rngs::StdRng::seed_from_u64(seed);
    }
}

/// SplitMix64, also used to expand seeds for the other generators.
pub mod splitmix {
    use super::RNG;

    const GOLDEN_GAMMA: u64 = 0x9e3779b97f4a7c15;

    #[derive(Debug, Copy, Clone)]
    pub struct SplitMix64 {
        state: u64,
    }

    impl RNG for SplitMix64 {
        fn new(seed: u64) -> Self {
            SplitMix64 { state: seed }
        }

        fn next_u32(&mut self) -> u32 {
            (self.next() >> 32) as u32
        }

        fn next(&mut self) -> u64 {
            self.state = self.state.wrapping_add(GOLDEN_GAMMA);
            let mut z = self.state;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
            z ^ (z >> 31)
        }

        fn advance(&mut self, delta: usize) {
            self.state = self
                .state
                .wrapping_add(GOLDEN_GAMMA.wrapping_mul(delta as u64));
        }

        fn reseed(&mut self, seed: u64) {
            self.state = seed;
        }
    }
}

/// Mersenne Twister MT19937, 32 bit variant.
pub mod mt {
    use super::RNG;

    const N: usize = 624;
    const M: usize = 397;
    const MATRIX_A: u32 = 0x9908b0df;
    const UPPER_MASK: u32 = 0x80000000;
    const LOWER_MASK: u32 = 0x7fffffff;

    #[derive(Debug, Clone)]
    pub struct Mt19937 {
        state: [u32; N],
        index: usize,
    }

    impl Mt19937 {
        /// Standard `init_genrand` seeding.
        pub fn from_u32(seed: u32) -> Self {
            let mut state = [0u32; N];
            state[0] = seed;
            for i in 1..N {
                let prev = state[i - 1];
                state[i] = 1812433253u32
                    .wrapping_mul(prev ^ (prev >> 30))
                    .wrapping_add(i as u32);
            }
            Mt19937 { state, index: N }
        }

        /// Regenerate all N words at once.
        /// Amortized over the next N draws.
        fn twist(&mut self) {
            for i in 0..N {
                let y = (self.state[i] & UPPER_MASK) | (self.state[(i + 1) % N] & LOWER_MASK);
                let mut v = self.state[(i + M) % N] ^ (y >> 1);
                if y & 1 != 0 {
                    v ^= MATRIX_A;
                }
                self.state[i] = v;
            }
            self.index = 0;
        }
    }

    fn temper(mut y: u32) -> u32 {
        y ^= y >> 11;
        y ^= (y << 7) & 0x9d2c5680;
        y ^= (y << 15) & 0xefc60000;
        y ^ (y >> 18)
    }

    impl RNG for Mt19937 {
        /// Only the low 32 bits of the seed are used.
        fn new(seed: u64) -> Self {
            Mt19937::from_u32(seed as u32)
        }

        fn next_u32(&mut self) -> u32 {
            if self.index >= N {
                self.twist();
            }
            let y = self.state[self.index];
            self.index += 1;
            temper(y)
        }

        fn next(&mut self) -> u64 {
            let a: u64 = self.next_u32() as u64;
            let b: u64 = self.next_u32() as u64;
            (a << 32) | b
        }

        fn reseed(&mut self, seed: u64) {
            *self = Mt19937::from_u32(seed as u32);
        }
    }
}

/// Permuted congruential generator, PCG-XSH-RR 64/32.
pub mod pcg {
    use super::RNG;

    const MULTIPLIER: u64 = 6_364_136_223_846_793_005;
    const DEFAULT_STREAM: u64 = 54;

    #[derive(Debug, Copy, Clone)]
    pub struct Pcg32 {
        state: u64,
        inc: u64,
    }

    impl Pcg32 {
        /// `pcg32_srandom_r(initstate, initseq)`.
        pub fn with_stream(seed: u64, stream: u64) -> Self {
            let mut rng = Pcg32 {
                state: 0,
                inc: (stream << 1) | 1,
            };
            rng.step();
            rng.state = rng.state.wrapping_add(seed);
            rng.step();
            rng
        }

        fn step(&mut self) {
            self.state = self.state.wrapping_mul(MULTIPLIER).wrapping_add(self.inc);
        }
    }

    impl RNG for Pcg32 {
        fn new(seed: u64) -> Self {
            Pcg32::with_stream(seed, DEFAULT_STREAM)
        }

        fn next_u32(&mut self) -> u32 {
            let old = self.state;
            self.step();
            let xorshifted = (((old >> 18) ^ old) >> 27) as u32;
            let rot = (old >> 59) as u32;
            xorshifted.rotate_right(rot)
        }

        fn next(&mut self) -> u64 {
            let a: u64 = self.next_u32() as u64;
            let b: u64 = self.next_u32() as u64;
            (a << 32) | b
        }

        fn reseed(&mut self, seed: u64) {
            *self = Pcg32::new(seed);
        }
    }
}

// Xorshift PRNGs
pub mod xorshift {
    use super::{expand_seed, RNG};

    /// Marsaglia's xorshift128 on four 32 bit words.
    #[derive(Debug, Copy, Clone)]
    pub struct XORShift128 {
        state: [u32; 4],
    }

    impl RNG for XORShift128 {
        fn new(seed: u64) -> Self {
            XORShift128 {
                state: expand_seed(seed),
            }
        }

        fn next_u32(&mut self) -> u32 {
            let mut t: u32 = self.state[3];
            let s: u32 = self.state[0];
            self.state[3] = self.state[2];
            self.state[2] = self.state[1];
            self.state[1] = s;
            t ^= t << 11;
            t ^= t >> 8;
            self.state[0] = t ^ s ^ (s >> 19);
            self.state[0]
        }

        fn next(&mut self) -> u64 {
            let a: u64 = self.next_u32() as u64;
            let b: u64 = self.next_u32() as u64;
            (a << 32) | b
        }

        fn reseed(&mut self, seed: u64) {
            self.state = expand_seed(seed);
        }
    }

    /// Vigna's xorshift128+ with shift triple (23, 18, 5).
    #[derive(Debug, Copy, Clone)]
    pub struct XorShift128Plus {
        state: [u64; 2],
    }

    impl XorShift128Plus {
        /// Start from raw state. An all zero state is replaced since
        /// it is a fixed point.
        pub fn from_state(state: [u64; 2]) -> Self {
            if state == [0, 0] {
                XorShift128Plus { state: [1, 0] }
            } else {
                XorShift128Plus { state }
            }
        }
    }

    impl RNG for XorShift128Plus {
        fn new(seed: u64) -> Self {
            let w: [u32; 4] = expand_seed(seed);
            XorShift128Plus::from_state([
                (w[0] as u64) << 32 | w[1] as u64,
                (w[2] as u64) << 32 | w[3] as u64,
            ])
        }

        fn next_u32(&mut self) -> u32 {
            (self.next() >> 32) as u32
        }

        fn next(&mut self) -> u64 {
            let mut s1 = self.state[0];
            let s0 = self.state[1];
            let result = s0.wrapping_add(s1);
            self.state[0] = s0;
            s1 ^= s1 << 23;
            self.state[1] = s1 ^ s0 ^ (s1 >> 18) ^ (s0 >> 5);
            result
        }

        fn reseed(&mut self, seed: u64) {
            *self = XorShift128Plus::new(seed);
        }
    }
}

/// WELL family generators.
pub mod well {
    use super::{expand_seed, RNG};

    const R: usize = 16;
    const M1: usize = 13;
    const M2: usize = 9;
    const MAT4_MASK: u32 = 0xda442d24;

    /// WELL512a by Panneton, L'Ecuyer and Matsumoto.
    #[derive(Debug, Copy, Clone)]
    pub struct Well512a {
        state: [u32; R],
        index: usize,
    }

    impl Well512a {
        pub fn from_state(state: [u32; R]) -> Self {
            Well512a { state, index: 0 }
        }
    }

    impl RNG for Well512a {
        fn new(seed: u64) -> Self {
            Well512a::from_state(expand_seed(seed))
        }

        fn next_u32(&mut self) -> u32 {
            let i = self.index;
            let z0 = self.state[(i + R - 1) % R];
            let v0 = self.state[i];
            let vm1 = self.state[(i + M1) % R];
            let vm2 = self.state[(i + M2) % R];
            let z1 = (v0 ^ (v0 << 16)) ^ (vm1 ^ (vm1 << 15));
            let z2 = vm2 ^ (vm2 >> 11);
            let new_v1 = z1 ^ z2;
            self.state[i] = new_v1;
            let new_v0 = (z0 ^ (z0 << 2))
                ^ (z1 ^ (z1 << 18))
                ^ (z2 << 28)
                ^ (new_v1 ^ ((new_v1 << 5) & MAT4_MASK));
            self.index = (i + R - 1) % R;
            self.state[self.index] = new_v0;
            new_v0
        }

        fn next(&mut self) -> u64 {
            let a: u64 = self.next_u32() as u64;
            let b: u64 = self.next_u32() as u64;
            (a << 32) | b
        }

        fn reseed(&mut self, seed: u64) {
            *self = Well512a::new(seed);
        }
    }
}

// Linear congruential generators
pub mod lcg {
    use super::RNG;
    /// Ill concieved early LCG, that fails the spectral test badly.
    /// Only has output space of 0-2**31-1.
    /// The .next() method uses three RANDU calls to fill the 64 bit output space,
    /// The .next_u32() method uses two RANDU calls.
    #[derive(Debug, Copy, Clone)]
    pub struct Randu {
        state: u32,
    }

    impl RNG for Randu {
        /// RANDU needs an odd seed, the lowest bit is forced on.
        fn new(seed: u64) -> Self {
            Randu {
                state: (seed as u32 & 0x7fffffff) | 1,
            }
        }

        fn next_u32(&mut self) -> u32 {
            let a: u32 = self.next_small();
            let b: u32 = self.next_small();
            a << 15 | (b & 0xffff)
        }

        fn next(&mut self) -> u64 {
            let a: u64 = self.next_small() as u64;
            let b: u64 = self.next_small() as u64;
            let c: u64 = self.next_small() as u64;
            (a << 42) | ((b & 0x3fffff) << 20) | (c & 0xfffff)
        }

        fn advance(&mut self, delta: usize) {
            for _ in 0..delta {
                let _ = self.next_small();
            }
        }

        fn reseed(&mut self, seed: u64) {
            *self = Randu::new(seed);
        }
    }
    impl Randu {
        /// Generate a number in the original reduced output space of 0 to 2**31 - 1.
        pub fn next_small(&mut self) -> u32 {
            self.state = self.state.wrapping_mul(65539) & 0x7fffffff;
            self.state
        }
    }
}
