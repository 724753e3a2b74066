//! Deterministic random source for a single trial.
//!
//! Every random decision in a trial (hit rolls, crit rolls, damage ranges)
//! draws from one [`RandomSource`] owned by that trial. Given the same seed the
//! sequence of draws is identical, which makes any trial replayable from its
//! `(master_seed, trial_index)` pair.
//!
//! # Determinism
//!
//! Draw order is part of the contract: the engine always rolls hit before
//! resist before crit, and only rolls what the outcome category requires.

/// Source of uniform random draws.
pub trait RandomSource: Send {
    /// Next raw 32-bit value.
    fn next_u32(&mut self) -> u32;

    /// Uniform draw in `[0.0, 1.0)` with 53 bits of precision.
    fn next_f64(&mut self) -> f64 {
        let high = (self.next_u32() >> 5) as u64; // 27 bits
        let low = (self.next_u32() >> 6) as u64; // 26 bits
        ((high << 26) | low) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform draw in `[min, max)`. Returns `min` for an empty range.
    fn roll(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        min + (max - min) * self.next_f64()
    }

    /// Returns `true` with probability `chance` (clamped to `[0, 1]`).
    ///
    /// Always consumes exactly one draw, even for certain outcomes, so the
    /// draw sequence does not depend on the chance value.
    fn chance(&mut self, chance: f64) -> bool {
        self.next_f64() < chance.clamp(0.0, 1.0)
    }
}

/// PCG random number generator (Permuted Congruential Generator).
///
/// Uses the PCG-XSH-RR variant: 64 bits of state, 32 bits of output per step.
///
/// # Properties
///
/// - **Deterministic**: same seed, same sequence
/// - **Fast**: one multiply, one xorshift, one rotate
/// - **Small state**: 64 bits, cheap to create one per trial
///
/// # References
///
/// - PCG paper: <https://www.pcg-random.org/>
#[derive(Clone, Debug)]
pub struct PcgRng {
    state: u64,
    draws: u64,
}

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    /// Creates a generator whose sequence is fully determined by `seed`.
    pub fn seeded(seed: u64) -> Self {
        let mut rng = Self {
            state: 0,
            draws: 0,
        };
        // Standard PCG seeding: step once, add the seed, step again.
        rng.step();
        rng.state = rng.state.wrapping_add(seed);
        rng.step();
        rng.draws = 0;
        rng
    }

    /// Number of values drawn since seeding.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    #[inline]
    fn step(&mut self) {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
        self.draws += 1;
    }

    #[inline]
    fn output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RandomSource for PcgRng {
    fn next_u32(&mut self) -> u32 {
        let old = self.state;
        self.step();
        Self::output(old)
    }
}

/// Derives the seed of one trial from the batch's master seed.
///
/// Mixing uses SplitMix64-style constants followed by an avalanche step, so
/// neighbouring trial indices produce unrelated sequences. Re-running a single
/// trial only needs `(master_seed, trial_index)`.
pub fn trial_seed(master_seed: u64, trial_index: u64) -> u64 {
    let mut hash = master_seed;

    hash ^= trial_index.wrapping_add(1).wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= hash >> 30;
    hash = hash.wrapping_mul(0xbf58476d1ce4e5b9);
    hash ^= hash >> 27;
    hash = hash.wrapping_mul(0x94d049bb133111eb);
    hash ^= hash >> 31;

    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = PcgRng::seeded(42);
        let mut b = PcgRng::seeded(42);
        for _ in 0..256 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = PcgRng::seeded(1);
        let mut b = PcgRng::seeded(2);
        let same = (0..64).filter(|_| a.next_u32() == b.next_u32()).count();
        assert!(same < 4);
    }

    #[test]
    fn unit_draws_stay_in_range() {
        let mut rng = PcgRng::seeded(7);
        for _ in 0..10_000 {
            let value = rng.next_f64();
            assert!((0.0..1.0).contains(&value), "draw {value} out of range");
        }
    }

    #[test]
    fn roll_respects_bounds_and_empty_ranges() {
        let mut rng = PcgRng::seeded(9);
        for _ in 0..1000 {
            let value = rng.roll(38.0, 47.0);
            assert!((38.0..47.0).contains(&value));
        }
        assert_eq!(rng.roll(5.0, 5.0), 5.0);
    }

    #[test]
    fn chance_always_consumes_one_draw() {
        let mut rng = PcgRng::seeded(3);
        let before = rng.draws();
        assert!(!rng.chance(0.0));
        assert!(rng.chance(1.0));
        assert_eq!(rng.draws() - before, 4, "each chance() is one f64 = two u32 draws");
    }

    #[test]
    fn trial_seeds_are_distinct_and_stable() {
        let seeds: Vec<u64> = (0..100).map(|i| trial_seed(1234, i)).collect();
        let mut unique = seeds.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), seeds.len());
        assert_eq!(trial_seed(1234, 17), seeds[17]);
    }
}
