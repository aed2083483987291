//! Structural edits to a program: adding and deleting sections.

use crate::error::{CoreError, Result};
use crate::program::{Program, Section};
use crate::time::SECONDS_PER_MINUTE;
use tracing::info;

/// Append a new section of `duration_minutes` minutes.
///
/// The title is trimmed; the new section has no presenters.
///
/// # Errors
///
/// Returns [`CoreError::InvalidInput`] if the title is blank or the duration
/// is not positive. The input program is never modified.
pub fn add_section(program: &Program, title: &str, duration_minutes: i64) -> Result<Program> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CoreError::InvalidInput {
            reason: "section title must not be empty".into(),
        });
    }
    if duration_minutes <= 0 {
        return Err(CoreError::InvalidInput {
            reason: format!("section duration must be positive, got {duration_minutes} minutes"),
        });
    }

    let seconds = u64::try_from(duration_minutes.saturating_mul(SECONDS_PER_MINUTE))
        .map_err(|_| CoreError::InvalidInput {
            reason: format!("section duration of {duration_minutes} minutes is out of range"),
        })?;

    let mut updated = program.clone();
    updated.push(Section::new(title, seconds));
    info!("Added section \"{}\" ({}s)", title, seconds);
    Ok(updated)
}

/// Remove the section at `index`.
///
/// # Errors
///
/// Returns [`CoreError::LastSection`] if the program only has one section, or
/// [`CoreError::SectionIndexOutOfRange`] if `index` does not exist.
pub fn delete_section(program: &Program, index: usize) -> Result<Program> {
    let mut updated = program.clone();
    let removed = updated.remove(index)?;
    info!("Deleted section {} \"{}\"", index, removed.title);
    Ok(updated)
}

/// The tracked active index after deleting section `deleted` from a program
/// that had `len_before` sections.
///
/// Deleting an earlier section shifts the active one down by one. Deleting
/// the active section when it was also the last one moves the index back so
/// it stays in bounds. In every other case the index is unchanged and the
/// next clock evaluation settles it.
#[must_use]
pub const fn active_index_after_delete(active: usize, deleted: usize, len_before: usize) -> usize {
    let shifted = deleted < active;
    let was_last = deleted == active && active + 1 == len_before;
    if active > 0 && (shifted || was_last) {
        active - 1
    } else {
        active
    }
}
