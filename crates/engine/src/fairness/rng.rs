use rand::rngs::{OsRng, StdRng};
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Source of uniform randomness for the selection strategies.
pub trait RandomSource {
    /// Uniform integer in `[0, upper)`. `upper` must be non-zero.
    fn next_index(&mut self, upper: usize) -> usize;

    /// Uniform float in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

/// Cryptographically secure source seeded from the operating system.
#[derive(Debug)]
pub struct SecureRandom {
    rng: StdRng,
}

impl SecureRandom {
    pub fn new() -> Result<Self> {
        let rng = StdRng::from_rng(OsRng)?;
        Ok(Self { rng })
    }
}

impl RandomSource for SecureRandom {
    fn next_index(&mut self, upper: usize) -> usize {
        self.rng.gen_range(0..upper)
    }

    fn next_unit(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }
}

const LCG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const LCG_INCREMENT: u64 = 1_442_695_040_888_963_407;
const SEED_HEX_DIGITS: usize = 16;

/// Reproducible source for published-seed draws.
///
/// A 64-bit linear congruential generator with Knuth's MMIX constants. The
/// initial state is the leading run of hex digits of the seed (at most 16);
/// a seed without a hex prefix is hashed with SHA-256 and its first eight
/// bytes are used instead. Anyone holding the seed can replay the draw.
/// Not suitable where unpredictability matters.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    state: u64,
}

impl SeededRandom {
    pub fn from_seed(seed: &str) -> Self {
        Self {
            state: initial_state(seed),
        }
    }

    fn step(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT);
        self.state
    }
}

impl RandomSource for SeededRandom {
    fn next_index(&mut self, upper: usize) -> usize {
        debug_assert!(upper > 0, "next_index called with an empty range");
        // High bits of an LCG have the longest period.
        let high = self.step() >> 32;
        ((high as u128 * upper as u128) >> 32) as usize
    }

    fn next_unit(&mut self) -> f64 {
        (self.step() >> 11) as f64 / (1u64 << 53) as f64
    }
}

fn initial_state(seed: &str) -> u64 {
    let prefix: String = seed
        .trim()
        .chars()
        .take_while(char::is_ascii_hexdigit)
        .take(SEED_HEX_DIGITS)
        .collect();

    match u64::from_str_radix(&prefix, 16) {
        Ok(state) => state,
        Err(_) => {
            let digest = Sha256::digest(seed.as_bytes());
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&digest[..8]);
            u64::from_le_bytes(bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SeededRandom::from_seed("9f86d081884c7d65");
        let mut b = SeededRandom::from_seed("9f86d081884c7d65");
        for upper in 1..200 {
            assert_eq!(a.next_index(upper), b.next_index(upper));
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = SeededRandom::from_seed("1");
        let mut b = SeededRandom::from_seed("2");
        let left: Vec<usize> = (0..16).map(|_| a.next_index(1000)).collect();
        let right: Vec<usize> = (0..16).map(|_| b.next_index(1000)).collect();
        assert_ne!(left, right);
    }

    #[test]
    fn test_only_the_hex_prefix_matters() {
        assert_eq!(initial_state("ff"), 255);
        assert_eq!(initial_state("ffzz"), 255);
        assert_eq!(
            initial_state("0123456789abcdef0123"),
            initial_state("0123456789abcdef")
        );
    }

    #[test]
    fn test_non_hex_seed_is_hashed() {
        assert_eq!(initial_state("spring-draw"), initial_state("spring-draw"));
        assert_ne!(initial_state("spring-draw"), initial_state("summer-draw"));
    }

    #[test]
    fn test_values_stay_in_range() {
        let mut seeded = SeededRandom::from_seed("abc");
        let mut secure = SecureRandom::new().unwrap();
        for upper in 1..500 {
            assert!(seeded.next_index(upper) < upper);
            assert!(secure.next_index(upper) < upper);
        }
        for _ in 0..500 {
            let unit = seeded.next_unit();
            assert!((0.0..1.0).contains(&unit));
            let unit = secure.next_unit();
            assert!((0.0..1.0).contains(&unit));
        }
    }

    #[test]
    fn test_seeded_indices_spread_evenly() {
        let mut rng = SeededRandom::from_seed("c0ffee");
        let mut buckets = [0usize; 4];
        for _ in 0..40_000 {
            buckets[rng.next_index(4)] += 1;
        }
        for count in buckets {
            assert!((9_000..=11_000).contains(&count), "bucket count {}", count);
        }
    }
}
