//! Active-section resolution.
//!
//! Maps a wall-clock instant, the run state and the program to the section
//! that is currently active and how far into it the effective elapsed time
//! is. Everything here is a pure function of its inputs, so the result does
//! not depend on how often it is evaluated.

use crate::program::Program;
use crate::run_state::RunState;
use crate::time::{clamp_to_duration, SecondsExt, MILLIS_PER_SECOND};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

/// Derived view of the program at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSectionView {
    /// Index of the active section
    pub active_index: usize,
    /// Whole seconds of effective (unpaused) time since start; 0 before start
    pub elapsed_seconds: i64,
    /// Seconds into the active section, clamped to its duration
    pub seconds_into_section: u64,
    /// Progress through the active section in `[0, 1]`
    pub progress_fraction: f64,
    /// Scheduled (or projected, before start) start instant of each section
    pub section_start_times: Vec<DateTime<Utc>>,
    /// Scheduled end of the whole program; `None` before start
    pub end_time: Option<DateTime<Utc>>,
    /// Seconds of program time left
    pub remaining_seconds: u64,
    pub is_started: bool,
    pub is_paused: bool,
    /// Effective elapsed time has reached the total program length
    pub is_overrun: bool,
}

impl ActiveSectionView {
    /// Start instant of the active section
    #[must_use]
    pub fn active_start_time(&self) -> Option<DateTime<Utc>> {
        self.section_start_times.get(self.active_index).copied()
    }
}

/// Resolve the active section at `now`.
#[must_use]
pub fn resolve_active_section(
    now: DateTime<Utc>,
    run_state: &RunState,
    program: &Program,
) -> ActiveSectionView {
    let total = program.total_duration_seconds();

    let (Some(started_at), Some(elapsed_ms)) =
        (run_state.started_at, run_state.effective_elapsed_ms(now))
    else {
        return ActiveSectionView {
            active_index: 0,
            elapsed_seconds: 0,
            seconds_into_section: 0,
            progress_fraction: 0.0,
            section_start_times: section_start_times(now, program),
            end_time: None,
            remaining_seconds: total,
            is_started: false,
            is_paused: false,
            is_overrun: false,
        };
    };

    let elapsed = elapsed_ms.div_euclid(MILLIS_PER_SECOND);
    let active_index = active_index_at(elapsed, program);

    let offset = program.offset_of(active_index).as_signed_secs();
    let duration = program
        .section(active_index)
        .map_or(0, |s| s.duration_seconds.as_signed_secs());
    let seconds_into_section = clamp_to_duration(elapsed.saturating_sub(offset).clamp(0, duration));

    let base = shift(started_at, pause_delta(run_state.total_pause_ms));
    let total_signed = total.as_signed_secs();

    ActiveSectionView {
        active_index,
        elapsed_seconds: elapsed,
        seconds_into_section,
        progress_fraction: progress(seconds_into_section, duration),
        section_start_times: section_start_times(base, program),
        end_time: Some(shift(base, seconds_delta(total_signed))),
        remaining_seconds: clamp_to_duration(total_signed.saturating_sub(elapsed)),
        is_started: true,
        is_paused: run_state.is_paused(),
        is_overrun: elapsed >= total_signed,
    }
}

/// Index of the section whose window `[offset, offset + duration)` contains
/// `elapsed_seconds`.
///
/// Negative elapsed time maps to the first section and elapsed time past the
/// end maps to the last one. Zero-length sections have an empty window and
/// are never selected by the walk.
#[must_use]
pub fn active_index_at(elapsed_seconds: i64, program: &Program) -> usize {
    if elapsed_seconds < 0 {
        return 0;
    }

    let mut acc: i64 = 0;
    for (i, section) in program.sections().iter().enumerate() {
        let end = acc.saturating_add(section.duration_seconds.as_signed_secs());
        if elapsed_seconds >= acc && elapsed_seconds < end {
            return i;
        }
        acc = end;
    }

    program.last_index()
}

/// Start instant of every section when the timeline begins at `base`
#[must_use]
pub fn section_start_times(base: DateTime<Utc>, program: &Program) -> Vec<DateTime<Utc>> {
    let mut acc: i64 = 0;
    program
        .sections()
        .iter()
        .map(|section| {
            let start = shift(base, seconds_delta(acc));
            acc = acc.saturating_add(section.duration_seconds.as_signed_secs());
            start
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn progress(seconds_into_section: u64, duration: i64) -> f64 {
    if duration <= 0 {
        return 0.0;
    }
    (seconds_into_section as f64 / duration as f64).clamp(0.0, 1.0)
}

fn seconds_delta(secs: i64) -> TimeDelta {
    TimeDelta::try_seconds(secs).unwrap_or(TimeDelta::MAX)
}

fn pause_delta(pause_ms: u64) -> TimeDelta {
    TimeDelta::try_milliseconds(i64::try_from(pause_ms).unwrap_or(i64::MAX))
        .unwrap_or(TimeDelta::MAX)
}

fn shift(base: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    base.checked_add_signed(delta)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
