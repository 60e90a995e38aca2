//! Scoring module - line clear points, level and gravity curve

use crate::types::{
    BASE_FALL_INTERVAL_SECS, FALL_INTERVAL_STEP_SECS, LINES_PER_LEVEL, LINE_SCORES,
    MIN_FALL_INTERVAL_SECS,
};

/// Points for clearing `lines` rows in one lock at `level` (1-based).
///
/// ```
/// use tetris_ng_core::scoring::line_clear_score;
///
/// assert_eq!(line_clear_score(1, 1), 100);
/// assert_eq!(line_clear_score(4, 3), 2400);
/// assert_eq!(line_clear_score(0, 9), 0);
/// ```
pub fn line_clear_score(lines: usize, level: u32) -> u32 {
    LINE_SCORES
        .get(lines)
        .copied()
        .unwrap_or(0)
        .saturating_mul(level)
}

/// Level reached after `lines` cumulative cleared rows.
pub fn level_for_lines(lines: u32) -> u32 {
    1 + lines / LINES_PER_LEVEL
}

/// Seconds between gravity steps at `level`.
pub fn fall_interval(level: u32) -> f64 {
    let steps = level.saturating_sub(1) as f64;
    (BASE_FALL_INTERVAL_SECS - FALL_INTERVAL_STEP_SECS * steps).max(MIN_FALL_INTERVAL_SECS)
}
