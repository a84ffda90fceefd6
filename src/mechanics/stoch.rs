/// Stochastic mechanics: WyRand helpers for mutation noise and jitter.
/// Callers own their generator; every draw takes `&mut WyRand`.
use bevy_prng::WyRand;
use rand_core::{RngCore, SeedableRng};

/// Seeded generator, same seeding as the rest of the crate.
#[inline]
pub fn seeded(seed: u64) -> WyRand {
    WyRand::from_seed(seed.to_le_bytes())
}

/// Uniform in [0, 1) from the top 53 bits.
#[inline]
pub fn unit(rng: &mut WyRand) -> f64 {
    ((rng.next_u64() >> 11) as f64) / ((1u64 << 53) as f64)
}

/// Uniform in [lo, hi).
#[inline]
pub fn uniform(rng: &mut WyRand, lo: f64, hi: f64) -> f64 {
    lo + (hi - lo) * unit(rng)
}

/// Symmetric jitter in [-amount, amount).
#[inline]
pub fn jitter(rng: &mut WyRand, amount: f64) -> f64 {
    let a = amount.abs();
    uniform(rng, -a, a)
}
