//! Strategies for the MRF weight between iterations.

use core::fmt;

/// Produces the beta stored for the next iteration.
pub trait BetaSchedule: fmt::Debug + Send + Sync {
    /// Beta for iteration `iteration` (1-based), given the previous value.
    fn next_beta(&self, iteration: usize, previous: f64) -> f64;
}

/// Keeps beta at its initial value.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedBeta;

impl BetaSchedule for FixedBeta {
    fn next_beta(&self, _iteration: usize, previous: f64) -> f64 {
        previous
    }
}
