//! Interval and learning-delay jitter.
//!
//! Every draw comes from a caller-supplied seeded generator, so the same card
//! answered the same way always lands on the same day.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generator for one answer of one card.
pub fn card_rng(card_id: i64, reps: u32) -> StdRng {
    StdRng::seed_from_u64((card_id as u64).wrapping_add(reps as u64))
}

/// Generator shared by everything ordered randomly on a given day.
pub fn day_rng(today: u32) -> StdRng {
    StdRng::seed_from_u64(today as u64)
}

/// Inclusive range an interval of `ivl` days may be fuzzed into.
pub fn fuzz_range(ivl: u32) -> (u32, u32) {
    if ivl < 2 {
        return (1, 1);
    }
    if ivl == 2 {
        return (2, 3);
    }
    let fuzz = if ivl < 7 {
        (ivl as f64 * 0.25) as u32
    } else if ivl < 30 {
        ((ivl as f64 * 0.15) as u32).max(2)
    } else {
        ((ivl as f64 * 0.05) as u32).max(4)
    };
    let fuzz = fuzz.max(1);
    (ivl - fuzz, ivl + fuzz)
}

pub fn fuzzed_interval(ivl: u32, rng: &mut impl Rng) -> u32 {
    let (min, max) = fuzz_range(ivl);
    rng.gen_range(min..=max)
}

/// Extra seconds added to a learning delay: up to a quarter of the delay,
/// never more than five minutes.
pub fn learning_jitter(delay_secs: u32, rng: &mut impl Rng) -> u32 {
    let max_extra = (delay_secs / 4).min(300).max(1);
    rng.gen_range(0..max_extra)
}
