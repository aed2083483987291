use crate::adjust::adjust_duration;
use crate::clock::{resolve_active_section, ActiveSectionView};
use crate::editor::{active_index_after_delete, add_section, delete_section};
use crate::error::{CoreError, Result};
use crate::program::Program;
use crate::run_state::RunState;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Default nudge size for interactive adjustments, in seconds
pub const DEFAULT_ADJUST_STEP_SECONDS: u64 = 30;

/// Direction of an interactive nudge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudgeDirection {
    Up,
    Down,
}

/// Input events accepted by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the program (no-op when already started)
    Start,
    /// Pause a running program or resume a paused one
    PauseToggle,
    /// Reset run state and restore the default program
    Restart,
    /// Change a section's duration by an arbitrary amount
    Adjust { index: usize, delta_seconds: i64 },
    /// Change a section's duration by one configured step
    Nudge {
        index: usize,
        direction: NudgeDirection,
    },
    /// Append a section
    AddSection {
        title: String,
        duration_minutes: i64,
    },
    /// Remove a section
    DeleteSection { index: usize },
}

/// Events emitted by the controller
#[derive(Debug, Clone)]
pub enum ClockEvent {
    /// The program was started
    Started { at: DateTime<Utc> },
    /// The program was paused
    Paused {
        at: DateTime<Utc>,
        elapsed_seconds: i64,
    },
    /// The program was resumed after `pause_ms` milliseconds
    Resumed { at: DateTime<Utc>, pause_ms: u64 },
    /// Run state and program were reset
    Restarted,
    /// The section list changed (adjust, add or delete)
    ProgramChanged { program: Program },
    /// The active section moved
    SectionChanged { from: usize, to: usize },
    /// Elapsed time reached the end of the program
    Overrun { elapsed_seconds: i64 },
    /// Regular evaluation result, after every tick and mutation
    Tick { view: ActiveSectionView },
    /// A command was rejected
    Error { message: String },
}

/// Owns the program and its run state and re-derives the active section.
///
/// Every mutation goes through [`apply`](Self::apply) and is followed by an
/// immediate evaluation, so observers never see a stale view.
pub struct CountdownController {
    program: Program,
    default_program: Program,
    run_state: RunState,
    active_index: usize,
    overrun_reported: bool,
    adjust_step_seconds: u64,
    event_tx: broadcast::Sender<ClockEvent>,
}

impl CountdownController {
    /// Create a controller for `default_program`, which is also what restart restores
    #[must_use]
    pub fn new(default_program: Program, adjust_step_seconds: u64) -> Self {
        let (event_tx, _) = broadcast::channel(64);

        Self {
            program: default_program.clone(),
            default_program,
            run_state: RunState::new(),
            active_index: 0,
            overrun_reported: false,
            adjust_step_seconds,
            event_tx,
        }
    }

    /// Subscribe to clock events
    pub fn subscribe(&self) -> broadcast::Receiver<ClockEvent> {
        self.event_tx.subscribe()
    }

    /// Current program
    #[must_use]
    pub const fn program(&self) -> &Program {
        &self.program
    }

    /// Current run state
    #[must_use]
    pub const fn run_state(&self) -> &RunState {
        &self.run_state
    }

    /// Active index as of the last evaluation (or delete renumbering)
    #[must_use]
    pub const fn active_index(&self) -> usize {
        self.active_index
    }

    /// Step used by [`Command::Nudge`]
    #[must_use]
    pub const fn adjust_step_seconds(&self) -> u64 {
        self.adjust_step_seconds
    }

    /// Resolve the view at `now` without emitting events
    #[must_use]
    pub fn view(&self, now: DateTime<Utc>) -> ActiveSectionView {
        resolve_active_section(now, &self.run_state, &self.program)
    }

    /// Apply a command at `now` and re-evaluate.
    ///
    /// # Errors
    ///
    /// Returns the editor's error if a section edit is rejected, or
    /// [`CoreError::InvalidInput`] for a nudge that is not allowed. State is
    /// unchanged on error.
    pub fn apply(&mut self, command: Command, now: DateTime<Utc>) -> Result<ActiveSectionView> {
        match command {
            Command::Start => self.start(now),
            Command::PauseToggle => self.pause_toggle(now),
            Command::Restart => self.restart(),
            Command::Adjust {
                index,
                delta_seconds,
            } => {
                let program = adjust_duration(&self.program, index, delta_seconds);
                self.replace_program(program);
            }
            Command::Nudge { index, direction } => {
                let delta_seconds = self.nudge_delta(index, direction)?;
                let program = adjust_duration(&self.program, index, delta_seconds);
                self.replace_program(program);
            }
            Command::AddSection {
                title,
                duration_minutes,
            } => {
                let program = add_section(&self.program, &title, duration_minutes)?;
                self.replace_program(program);
            }
            Command::DeleteSection { index } => {
                let len_before = self.program.len();
                let program = delete_section(&self.program, index)?;
                self.active_index = active_index_after_delete(self.active_index, index, len_before);
                self.replace_program(program);
            }
        }

        Ok(self.evaluate(now))
    }

    /// Periodic re-evaluation
    pub fn tick(&mut self, now: DateTime<Utc>) -> ActiveSectionView {
        self.evaluate(now)
    }

    /// Emit an error event
    pub fn emit_error(&self, message: String) {
        let _ = self.event_tx.send(ClockEvent::Error { message });
    }

    fn start(&mut self, now: DateTime<Utc>) {
        if self.run_state.is_started() {
            debug!("Start ignored: program already running");
            return;
        }
        self.run_state = self.run_state.start(now);
        info!(
            "Program \"{}\" started ({} sections, {}s)",
            self.program.title,
            self.program.len(),
            self.program.total_duration_seconds()
        );
        let _ = self.event_tx.send(ClockEvent::Started { at: now });
    }

    fn pause_toggle(&mut self, now: DateTime<Utc>) {
        if !self.run_state.is_started() {
            debug!("Pause ignored: program not started");
            return;
        }

        let was_paused = self.run_state.is_paused();
        let pause_ms = self.run_state.current_pause_ms(now);
        self.run_state = self.run_state.pause_toggle(now);

        if was_paused {
            info!("Resumed after {}ms pause", pause_ms);
            let _ = self
                .event_tx
                .send(ClockEvent::Resumed { at: now, pause_ms });
        } else {
            let elapsed_seconds = self.view(now).elapsed_seconds;
            info!("Paused at {}s elapsed", elapsed_seconds);
            let _ = self.event_tx.send(ClockEvent::Paused {
                at: now,
                elapsed_seconds,
            });
        }
    }

    fn restart(&mut self) {
        self.run_state = RunState::restart();
        self.program = self.default_program.clone();
        self.active_index = 0;
        self.overrun_reported = false;
        info!("Program restarted");
        let _ = self.event_tx.send(ClockEvent::Restarted);
        let _ = self.event_tx.send(ClockEvent::ProgramChanged {
            program: self.program.clone(),
        });
    }

    fn nudge_delta(&self, index: usize, direction: NudgeDirection) -> Result<i64> {
        let section = self
            .program
            .section(index)
            .ok_or(CoreError::SectionIndexOutOfRange {
                index,
                len: self.program.len(),
            })?;
        let step = i64::try_from(self.adjust_step_seconds).unwrap_or(i64::MAX);

        match direction {
            NudgeDirection::Up => Ok(step),
            NudgeDirection::Down if section.can_shrink(self.adjust_step_seconds) => Ok(-step),
            NudgeDirection::Down => Err(CoreError::InvalidInput {
                reason: format!(
                    "section \"{}\" is too short to shrink by {}s",
                    section.title, self.adjust_step_seconds
                ),
            }),
        }
    }

    fn replace_program(&mut self, program: Program) {
        if program == self.program {
            return;
        }
        self.program = program;
        let _ = self.event_tx.send(ClockEvent::ProgramChanged {
            program: self.program.clone(),
        });
    }

    fn evaluate(&mut self, now: DateTime<Utc>) -> ActiveSectionView {
        let view = self.view(now);

        if view.active_index != self.active_index {
            info!(
                "Active section {} -> {}",
                self.active_index, view.active_index
            );
            let _ = self.event_tx.send(ClockEvent::SectionChanged {
                from: self.active_index,
                to: view.active_index,
            });
            self.active_index = view.active_index;
        }

        if view.is_overrun && !self.overrun_reported {
            info!("Program overran at {}s elapsed", view.elapsed_seconds);
            let _ = self.event_tx.send(ClockEvent::Overrun {
                elapsed_seconds: view.elapsed_seconds,
            });
        }
        self.overrun_reported = view.is_overrun;

        debug!(
            "Evaluated: section={} into={}s progress={:.3} paused={}",
            view.active_index, view.seconds_into_section, view.progress_fraction, view.is_paused
        );

        let _ = self.event_tx.send(ClockEvent::Tick { view: view.clone() });
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::Section;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        t0() + Duration::seconds(secs)
    }

    fn program(durations: &[u64]) -> Program {
        let sections = durations
            .iter()
            .enumerate()
            .map(|(i, d)| Section::new(format!("Section {}", i + 1), *d))
            .collect();
        Program::new("Test", sections).unwrap()
    }

    fn drain(rx: &mut broadcast::Receiver<ClockEvent>) -> Vec<ClockEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_start_emits_started_and_tick() {
        let mut controller = CountdownController::new(program(&[120, 120]), 30);
        let mut rx = controller.subscribe();

        let view = controller.apply(Command::Start, t0()).unwrap();
        assert!(view.is_started);

        let events = drain(&mut rx);
        assert!(matches!(events[0], ClockEvent::Started { at } if at == t0()));
        assert!(matches!(events.last(), Some(ClockEvent::Tick { .. })));
    }

    #[test]
    fn test_start_twice_keeps_first_start() {
        let mut controller = CountdownController::new(program(&[120]), 30);
        controller.apply(Command::Start, t0()).unwrap();
        controller.apply(Command::Start, at(50)).unwrap();
        assert_eq!(controller.run_state().started_at, Some(t0()));
    }

    #[test]
    fn test_tick_emits_section_change() {
        let mut controller = CountdownController::new(program(&[120, 120, 120]), 30);
        controller.apply(Command::Start, t0()).unwrap();
        let mut rx = controller.subscribe();

        let view = controller.tick(at(150));
        assert_eq!(view.active_index, 1);
        assert_eq!(controller.active_index(), 1);

        let events = drain(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, ClockEvent::SectionChanged { from: 0, to: 1 })));
    }

    #[test]
    fn test_pause_and_resume_events() {
        let mut controller = CountdownController::new(program(&[120, 120, 120]), 30);
        controller.apply(Command::Start, t0()).unwrap();
        let mut rx = controller.subscribe();

        controller.apply(Command::PauseToggle, at(60)).unwrap();
        controller.apply(Command::PauseToggle, at(70)).unwrap();

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(
            e,
            ClockEvent::Paused { elapsed_seconds: 60, .. }
        )));
        assert!(events
            .iter()
            .any(|e| matches!(e, ClockEvent::Resumed { pause_ms: 10_000, .. })));

        let view = controller.tick(at(100));
        assert_eq!(view.elapsed_seconds, 90);
    }

    #[test]
    fn test_pause_before_start_is_ignored() {
        let mut controller = CountdownController::new(program(&[120]), 30);
        let view = controller.apply(Command::PauseToggle, t0()).unwrap();
        assert!(!view.is_paused);
        assert!(!controller.run_state().is_started());
    }

    #[test]
    fn test_adjust_rebalances_and_emits_program_changed() {
        let mut controller = CountdownController::new(program(&[120, 120, 120]), 30);
        let mut rx = controller.subscribe();

        controller
            .apply(
                Command::Adjust {
                    index: 0,
                    delta_seconds: -30,
                },
                t0(),
            )
            .unwrap();
        assert_eq!(controller.program().durations(), vec![90, 135, 135]);

        let events = drain(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, ClockEvent::ProgramChanged { .. })));
    }

    #[test]
    fn test_nudge_uses_configured_step() {
        let mut controller = CountdownController::new(program(&[120, 120, 120]), 60);
        controller
            .apply(
                Command::Nudge {
                    index: 0,
                    direction: NudgeDirection::Up,
                },
                t0(),
            )
            .unwrap();
        assert_eq!(controller.program().durations(), vec![180, 90, 90]);
    }

    #[test]
    fn test_nudge_down_refused_for_short_section() {
        let mut controller = CountdownController::new(program(&[30, 120]), 30);
        let result = controller.apply(
            Command::Nudge {
                index: 0,
                direction: NudgeDirection::Down,
            },
            t0(),
        );
        assert!(matches!(result, Err(CoreError::InvalidInput { .. })));
        assert_eq!(controller.program().durations(), vec![30, 120]);
    }

    #[test]
    fn test_add_section_rejected_leaves_program() {
        let mut controller = CountdownController::new(program(&[120]), 30);
        let result = controller.apply(
            Command::AddSection {
                title: String::new(),
                duration_minutes: 5,
            },
            t0(),
        );
        assert!(matches!(result, Err(CoreError::InvalidInput { .. })));
        assert_eq!(controller.program().len(), 1);
    }

    #[test]
    fn test_add_section_extends_running_program() {
        let mut controller = CountdownController::new(program(&[60]), 30);
        controller.apply(Command::Start, t0()).unwrap();
        assert!(controller.tick(at(90)).is_overrun);

        let view = controller
            .apply(
                Command::AddSection {
                    title: "Extra".into(),
                    duration_minutes: 1,
                },
                at(90),
            )
            .unwrap();
        assert!(!view.is_overrun);
        assert_eq!(view.active_index, 1);
        assert_eq!(view.seconds_into_section, 30);
    }

    #[test]
    fn test_delete_last_section_rejected() {
        let mut controller = CountdownController::new(program(&[120]), 30);
        let result = controller.apply(Command::DeleteSection { index: 0 }, t0());
        assert!(matches!(result, Err(CoreError::LastSection)));
        assert_eq!(controller.program().len(), 1);
    }

    #[test]
    fn test_delete_earlier_section_renumbers_active() {
        let mut controller = CountdownController::new(program(&[60, 60, 60]), 30);
        controller.apply(Command::Start, t0()).unwrap();
        controller.tick(at(130));
        assert_eq!(controller.active_index(), 2);

        let view = controller
            .apply(Command::DeleteSection { index: 0 }, at(130))
            .unwrap();
        assert_eq!(controller.program().len(), 2);
        // 130 s into a [60, 60] program is past the end
        assert_eq!(view.active_index, 1);
        assert!(view.is_overrun);
    }

    #[test]
    fn test_overrun_reported_once() {
        let mut controller = CountdownController::new(program(&[60]), 30);
        controller.apply(Command::Start, t0()).unwrap();
        let mut rx = controller.subscribe();

        controller.tick(at(61));
        controller.tick(at(62));

        let overruns = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, ClockEvent::Overrun { .. }))
            .count();
        assert_eq!(overruns, 1);
    }

    #[test]
    fn test_restart_restores_default_program() {
        let mut controller = CountdownController::new(program(&[120, 120, 120]), 30);
        controller.apply(Command::Start, t0()).unwrap();
        controller
            .apply(
                Command::Adjust {
                    index: 0,
                    delta_seconds: 60,
                },
                at(10),
            )
            .unwrap();
        controller.tick(at(200));

        let view = controller.apply(Command::Restart, at(300)).unwrap();
        assert!(!view.is_started);
        assert_eq!(view.active_index, 0);
        assert_eq!(controller.program().durations(), vec![120, 120, 120]);
        assert_eq!(controller.run_state(), &RunState::new());
    }

    #[test]
    fn test_emit_error() {
        let controller = CountdownController::new(program(&[120]), 30);
        let mut rx = controller.subscribe();
        controller.emit_error("boom".into());
        assert!(matches!(
            rx.try_recv(),
            Ok(ClockEvent::Error { message }) if message == "boom"
        ));
    }
}
