//! Randomized action-sequence generator.

use super::actions::ActionKind;
use super::rng::RandomSource;

/// Draws `n` actions, each independently uniform over the four kinds.
///
/// Repeats are expected; there is no de-duplication and no distribution
/// guarantee beyond uniform-per-draw. `n = 0` yields an empty sequence and
/// the session completes immediately.
pub fn generate(n: usize, rng: &mut dyn RandomSource) -> Vec<ActionKind> {
    (0..n)
        .map(|_| match (rng.next_f64() * 4.0) as u32 + 1 {
            1 => ActionKind::Move,
            2 => ActionKind::Scroll,
            3 => ActionKind::Click,
            _ => ActionKind::Wait,
        })
        .collect()
}
