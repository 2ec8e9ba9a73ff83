// Deterministic, portable pseudo-random number generator.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding.
// Hand-rolled with zero external RNG dependencies so that a given seed yields
// the same output on every platform and compiler version.
//
// This crate is the only source of randomness for brick map generation. The
// generator never reaches for OS entropy or a global RNG: callers construct a
// `BrickRng` (seeded from a fixed value in tests, from the clock in the CLI)
// and pass it in. Two runs with the same seed and the same request produce
// the same map.
//
// On top of the raw generator this crate provides the two sampling helpers
// the placement generator needs: `choose_index()` for a uniform pick from a
// candidate list, and `sample_indices()` for drawing distinct catalog entries
// without replacement.
//
// **Critical constraint: determinism.** Every method on `BrickRng` must produce
// identical output given the same prior state. Do not use floating-point
// arithmetic in the core generator, stdlib PRNG, or any other source of
// non-determinism in this module.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ PRNG.
///
/// Each generation run owns its own `BrickRng`, so concurrent runs never share
/// a random stream.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BrickRng {
    s: [u64; 4],
}

impl BrickRng {
    /// Create a new PRNG seeded from a `u64`.
    ///
    /// Uses SplitMix64 to expand the seed into the 256-bit internal state.
    /// Two `BrickRng` instances created with the same seed will produce
    /// identical output sequences.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Generate a `u32` by taking the upper 32 bits of a `u64`.
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Generate a uniform random integer in `[low, high)`.
    ///
    /// Uses rejection sampling to avoid modulo bias.
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        let threshold = range.wrapping_neg() % range; // = (2^64 - range) % range
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Generate a uniform random `usize` in `[low, high)`.
    ///
    /// Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Pick a uniform index into a collection of length `len`.
    ///
    /// Returns `None` for an empty collection instead of panicking, so the
    /// caller can turn "nothing to choose from" into its own outcome.
    pub fn choose_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.range_usize(0, len))
        }
    }

    /// Draw `count` distinct indices from `0..len`, uniformly and without
    /// replacement, in draw order.
    ///
    /// Partial Fisher-Yates: only the first `count` slots are shuffled.
    /// Returns `None` when `count > len`.
    pub fn sample_indices(&mut self, len: usize, count: usize) -> Option<Vec<usize>> {
        if count > len {
            return None;
        }
        let mut pool: Vec<usize> = (0..len).collect();
        for i in 0..count {
            let j = self.range_usize(i, len);
            pool.swap(i, j);
        }
        pool.truncate(count);
        Some(pool)
    }
}

/// SplitMix64, used only for seeding xoshiro256++ from a single `u64`.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
