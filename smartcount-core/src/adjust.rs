//! Proportional duration redistribution.
//!
//! Changing one section's length pushes the opposite change onto every
//! section after it, split in proportion to their current lengths, so the
//! program keeps its total length. Sections never go below zero; when the
//! tail cannot absorb a change the total is allowed to drift instead of
//! failing.

use crate::program::Program;
use crate::time::{clamp_to_duration, round_half_up, SecondsExt};
use tracing::{debug, warn};

/// Change the duration of section `index` by `delta_seconds` and rebalance
/// the sections after it.
///
/// The adjusted section is clamped at zero, and the amount it actually
/// changed by (not the requested delta) is what the tail absorbs. Each tail
/// section receives a rounded share; the rounding residual goes to the last
/// section. Sections before `index` are never touched.
///
/// The total never shrinks. It grows only when the last section is left
/// at zero: an all-zero tail that cannot give time back, a tail drained
/// before it could absorb a growth, or a rounding overshoot larger than
/// what the last section has left.
///
/// An out-of-range `index` returns the program unchanged.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn adjust_duration(program: &Program, index: usize, delta_seconds: i64) -> Program {
    let Some(target) = program.section(index) else {
        warn!(
            "Ignoring duration adjustment for section {} (program has {} sections)",
            index,
            program.len()
        );
        return program.clone();
    };

    let old = target.duration_seconds.as_signed_secs();
    let new = old.saturating_add(delta_seconds).max(0);
    let actual_change = new - old;

    let mut adjusted = program.clone();
    adjusted.set_duration(index, clamp_to_duration(new));

    let tail_start = index + 1;
    let tail: Vec<i64> = program
        .sections()
        .iter()
        .skip(tail_start)
        .map(|s| s.duration_seconds.as_signed_secs())
        .collect();

    if tail.is_empty() {
        debug!(
            "Section {} changed by {}s with no later sections to rebalance",
            index, actual_change
        );
        return adjusted;
    }

    let to_distribute = actual_change.saturating_neg();
    let tail_total = tail.iter().fold(0_i64, |acc, d| acc.saturating_add(*d));

    if tail_total == 0 && to_distribute < 0 {
        debug!(
            "Later sections are all empty; section {} grows by {}s without rebalancing",
            index, actual_change
        );
        return adjusted;
    }

    let even_share = 1.0 / tail.len() as f64;
    let mut distributed: i64 = 0;

    for (offset, duration) in tail.iter().copied().enumerate() {
        let proportion = if tail_total > 0 {
            duration as f64 / tail_total as f64
        } else {
            even_share
        };
        let change = round_half_up(to_distribute as f64 * proportion);
        let updated = duration.saturating_add(change).max(0);

        distributed = distributed.saturating_add(updated - duration);
        adjusted.set_duration(tail_start + offset, clamp_to_duration(updated));
    }

    let residual = to_distribute.saturating_sub(distributed);
    if residual != 0 {
        let last = adjusted.last_index();
        let current = adjusted
            .section(last)
            .map_or(0, |s| s.duration_seconds.as_signed_secs());
        adjusted.set_duration(last, clamp_to_duration(current.saturating_add(residual)));
    }

    debug!(
        "Section {} changed by {}s, redistributed {}s over {} later sections (residual {}s)",
        index,
        actual_change,
        to_distribute,
        tail.len(),
        residual
    );

    adjusted
}
