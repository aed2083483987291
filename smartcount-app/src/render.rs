//! Terminal rendering of the countdown board.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use smartcount_core::{format_hms, ActiveSectionView, ClockEvent, Program};
use std::fmt::{self, Write};
use tracing::debug;

const LOG_TARGET: &str = "smartcount::render";

const BAR_WIDTH: usize = 20;

/// Latest program and view, rebuilt from the clock's event stream
pub struct Board {
    program: Program,
    view: Option<ActiveSectionView>,
    dirty: bool,
}

impl Board {
    pub const fn new(program: Program) -> Self {
        Self {
            program,
            view: None,
            dirty: true,
        }
    }

    /// Fold one event into the board.
    ///
    /// Returns text to print: error and overrun notices immediately, and the
    /// whole board on the first tick after anything visible changed.
    pub fn handle<Tz>(&mut self, event: ClockEvent, tz: &Tz) -> Option<String>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        match event {
            ClockEvent::Tick { view } => {
                self.view = Some(view);
                if self.dirty {
                    self.dirty = false;
                    return self.render(tz);
                }
                None
            }
            ClockEvent::ProgramChanged { program } => {
                debug!(target: LOG_TARGET, "Program now has {} sections", program.len());
                self.program = program;
                self.dirty = true;
                None
            }
            ClockEvent::Overrun { elapsed_seconds } => {
                self.dirty = true;
                Some(format!(
                    "Time is up: {} elapsed of {} planned",
                    format_hms(u64::try_from(elapsed_seconds).unwrap_or(0)),
                    format_hms(self.program.total_duration_seconds())
                ))
            }
            ClockEvent::Error { message } => Some(format!("error: {message}")),
            ClockEvent::Started { .. }
            | ClockEvent::Paused { .. }
            | ClockEvent::Resumed { .. }
            | ClockEvent::Restarted
            | ClockEvent::SectionChanged { .. } => {
                self.dirty = true;
                None
            }
        }
    }

    /// The board as of the last tick
    pub fn render<Tz>(&self, tz: &Tz) -> Option<String>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        self.view
            .as_ref()
            .map(|view| render_board(&self.program, view, tz))
    }

    /// JSON snapshot of the program and the last view
    pub fn to_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct Snapshot<'a> {
            program: &'a Program,
            view: Option<&'a ActiveSectionView>,
        }

        serde_json::to_string_pretty(&Snapshot {
            program: &self.program,
            view: self.view.as_ref(),
        })
    }
}

/// Render the section list with start times, durations and progress
pub fn render_board<Tz>(program: &Program, view: &ActiveSectionView, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let state = if !view.is_started {
        "not started"
    } else if view.is_paused {
        "paused"
    } else if view.is_overrun {
        "overrun"
    } else {
        "running"
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}  [{}]  elapsed {}  remaining {}  ends {}",
        program.title,
        state,
        format_hms(u64::try_from(view.elapsed_seconds).unwrap_or(0)),
        format_hms(view.remaining_seconds),
        view.end_time
            .map_or_else(|| "--:--".to_string(), |t| clock_time(t, tz))
    );

    for (i, section) in program.sections().iter().enumerate() {
        let active = view.is_started && i == view.active_index;
        let start = view
            .section_start_times
            .get(i)
            .map_or_else(|| "--:--".to_string(), |t| clock_time(*t, tz));

        let _ = write!(
            out,
            "{} {:>2}. {}  {}  {}",
            if active { ">" } else { " " },
            i + 1,
            start,
            format_hms(section.duration_seconds),
            section.title
        );
        if !section.presenters.is_empty() {
            let _ = write!(out, " ({})", section.presenters.join(", "));
        }
        if active {
            let _ = write!(
                out,
                "  {} {}",
                progress_bar(view.progress_fraction),
                format_hms(view.seconds_into_section)
            );
        }
        out.push('\n');
    }

    out
}

fn clock_time<Tz>(instant: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    instant.with_timezone(tz).format("%H:%M").to_string()
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn progress_bar(fraction: f64) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}
