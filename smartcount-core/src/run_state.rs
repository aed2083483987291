use chrono::{DateTime, Utc};
use serde::Serialize;

/// Start and pause bookkeeping for a running program.
///
/// Transitions are pure: each returns a new state and leaves `self` untouched.
/// The paused flag is derived from `paused_at`, so a pause can never be
/// "active" without a recorded start instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    /// When the program was started; `None` before start
    pub started_at: Option<DateTime<Utc>>,
    /// When the current pause began; `None` while running or not started
    pub paused_at: Option<DateTime<Utc>>,
    /// Milliseconds spent in completed pauses (excludes an in-progress pause)
    pub total_pause_ms: u64,
}

impl RunState {
    /// A state that has not been started
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the program has been started
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Whether the program is currently paused
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Start the program at `now`. Starting an already started program is a no-op.
    #[must_use]
    pub fn start(&self, now: DateTime<Utc>) -> Self {
        if self.is_started() {
            return self.clone();
        }
        Self {
            started_at: Some(now),
            paused_at: None,
            total_pause_ms: 0,
        }
    }

    /// Pause a running program, or resume a paused one.
    ///
    /// Resuming folds the completed pause into `total_pause_ms`; a pause that
    /// appears to end before it began (clock skew) contributes nothing.
    /// Toggling before start is a no-op.
    #[must_use]
    pub fn pause_toggle(&self, now: DateTime<Utc>) -> Self {
        if !self.is_started() {
            return self.clone();
        }
        match self.paused_at {
            Some(paused_at) => {
                let pause_ms = u64::try_from((now - paused_at).num_milliseconds()).unwrap_or(0);
                Self {
                    started_at: self.started_at,
                    paused_at: None,
                    total_pause_ms: self.total_pause_ms.saturating_add(pause_ms),
                }
            }
            None => Self {
                started_at: self.started_at,
                paused_at: Some(now),
                total_pause_ms: self.total_pause_ms,
            },
        }
    }

    /// A fresh, not-started state
    #[must_use]
    pub fn restart() -> Self {
        Self::default()
    }

    /// Milliseconds of active (unpaused) time since start, as seen at `now`.
    ///
    /// While paused the pause instant is used instead of `now`, so the value
    /// freezes. Returns `None` before start. May be negative if `now`
    /// precedes the start instant.
    #[must_use]
    pub fn effective_elapsed_ms(&self, now: DateTime<Utc>) -> Option<i64> {
        let started_at = self.started_at?;
        let reference = self.paused_at.unwrap_or(now);
        let pause_ms = i64::try_from(self.total_pause_ms).unwrap_or(i64::MAX);
        Some(
            (reference - started_at)
                .num_milliseconds()
                .saturating_sub(pause_ms),
        )
    }

    /// Milliseconds of the pause in progress at `now`, or 0 when not paused
    #[must_use]
    pub fn current_pause_ms(&self, now: DateTime<Utc>) -> u64 {
        self.paused_at
            .map_or(0, |paused_at| {
                u64::try_from((now - paused_at).num_milliseconds()).unwrap_or(0)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_new_is_not_started() {
        let state = RunState::new();
        assert!(!state.is_started());
        assert!(!state.is_paused());
        assert_eq!(state.total_pause_ms, 0);
        assert_eq!(state.effective_elapsed_ms(t0()), None);
    }

    #[test]
    fn test_start() {
        let state = RunState::new().start(t0());
        assert_eq!(state.started_at, Some(t0()));
        assert!(!state.is_paused());
        assert_eq!(state.total_pause_ms, 0);
    }

    #[test]
    fn test_start_twice_keeps_original_start() {
        let state = RunState::new().start(t0());
        let again = state.start(t0() + Duration::seconds(30));
        assert_eq!(again, state);
    }

    #[test]
    fn test_pause_toggle_before_start_is_noop() {
        let state = RunState::new();
        assert_eq!(state.pause_toggle(t0()), state);
    }

    #[test]
    fn test_pause_and_resume_accumulates() {
        let state = RunState::new().start(t0());
        let paused = state.pause_toggle(t0() + Duration::seconds(60));
        assert!(paused.is_paused());
        assert_eq!(paused.paused_at, Some(t0() + Duration::seconds(60)));
        assert_eq!(paused.total_pause_ms, 0);

        let resumed = paused.pause_toggle(t0() + Duration::seconds(70));
        assert!(!resumed.is_paused());
        assert_eq!(resumed.paused_at, None);
        assert_eq!(resumed.total_pause_ms, 10_000);

        let paused_again = resumed.pause_toggle(t0() + Duration::seconds(100));
        let resumed_again = paused_again.pause_toggle(t0() + Duration::milliseconds(102_500));
        assert_eq!(resumed_again.total_pause_ms, 12_500);
    }

    #[test]
    fn test_resume_with_clock_skew_adds_nothing() {
        let paused = RunState::new()
            .start(t0())
            .pause_toggle(t0() + Duration::seconds(60));
        let resumed = paused.pause_toggle(t0() + Duration::seconds(50));
        assert_eq!(resumed.total_pause_ms, 0);
    }

    #[test]
    fn test_effective_elapsed_excludes_pauses() {
        let state = RunState::new()
            .start(t0())
            .pause_toggle(t0() + Duration::seconds(60))
            .pause_toggle(t0() + Duration::seconds(70));
        assert_eq!(
            state.effective_elapsed_ms(t0() + Duration::seconds(100)),
            Some(90_000)
        );
    }

    #[test]
    fn test_effective_elapsed_freezes_while_paused() {
        let paused = RunState::new()
            .start(t0())
            .pause_toggle(t0() + Duration::seconds(45));
        assert_eq!(
            paused.effective_elapsed_ms(t0() + Duration::seconds(50)),
            Some(45_000)
        );
        assert_eq!(
            paused.effective_elapsed_ms(t0() + Duration::seconds(500)),
            Some(45_000)
        );
    }

    #[test]
    fn test_current_pause_ms() {
        let state = RunState::new().start(t0());
        assert_eq!(state.current_pause_ms(t0() + Duration::seconds(5)), 0);
        let paused = state.pause_toggle(t0() + Duration::seconds(5));
        assert_eq!(paused.current_pause_ms(t0() + Duration::seconds(8)), 3000);
    }

    #[test]
    fn test_restart() {
        let state = RunState::new()
            .start(t0())
            .pause_toggle(t0() + Duration::seconds(5));
        let restarted = RunState::restart();
        assert_ne!(restarted, state);
        assert_eq!(restarted, RunState::new());
    }
}
