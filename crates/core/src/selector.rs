// SPDX-License-Identifier: Apache-2.0

use rand::Rng;

use crate::error::Error;
use crate::registry::AnalyzerSnapshot;

/// Picks one analyzer from `candidates` by weighted random draw.
///
/// Candidates are expected to already be filtered down to the healthy
/// subset; this function renormalizes their weights (they need not sum to
/// 1.0) and draws against a fresh `rng` each call, so a failover simply
/// means the next call observes a smaller candidate set and a different
/// effective distribution. Returns [`Error::NoAnalyzerAvailable`] if
/// `candidates` is empty or every weight is zero.
pub fn select<R: Rng + ?Sized>(
    candidates: &[AnalyzerSnapshot],
    rng: &mut R,
) -> Result<&AnalyzerSnapshot, Error> {
    let total_weight: f64 = candidates.iter().map(|c| c.weight).sum();
    if candidates.is_empty() || total_weight <= 0.0 {
        return Err(Error::NoAnalyzerAvailable);
    }

    let draw = rng.gen_range(0.0..total_weight);
    let mut cumulative = 0.0;
    for candidate in candidates {
        cumulative += candidate.weight;
        if draw < cumulative {
            return Ok(candidate);
        }
    }

    // Floating-point rounding can leave `draw` a hair above the final
    // cumulative sum; fall back to the last candidate rather than erroring.
    candidates.last().ok_or(Error::NoAnalyzerAvailable)
}
