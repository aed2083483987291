//! Time and duration conversion utilities.
//!
//! Section durations are stored as unsigned seconds while the clock and the
//! duration adjuster work with signed offsets. These helpers make the
//! conversions explicit and saturating instead of truncating.

/// Milliseconds per second.
pub const MILLIS_PER_SECOND: i64 = 1000;

/// Seconds per minute.
pub const SECONDS_PER_MINUTE: i64 = 60;

/// Extension trait for saturating second conversions.
pub trait SecondsExt {
    /// Convert to a signed second count, saturating at `i64::MAX`.
    fn as_signed_secs(&self) -> i64;
}

impl SecondsExt for u64 {
    fn as_signed_secs(&self) -> i64 {
        i64::try_from(*self).unwrap_or(i64::MAX)
    }
}

/// Convert a signed second count back to a duration, clamping negatives to zero.
#[must_use]
pub fn clamp_to_duration(secs: i64) -> u64 {
    u64::try_from(secs).unwrap_or(0)
}

/// Round to the nearest integer, with exact halves rounding toward positive infinity.
///
/// `2.5` rounds to `3` and `-2.5` rounds to `-2`. This differs from
/// [`f64::round`], which rounds halves away from zero.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Format a second count as `HH:MM:SS`.
///
/// Hours are not wrapped at 24, so very long programs stay readable.
#[must_use]
pub fn format_hms(total_secs: u64) -> String {
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    format!("{h:02}:{m:02}:{s:02}")
}
