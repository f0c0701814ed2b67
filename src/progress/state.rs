//! Progress values and their derived percent.

use serde::{Deserialize, Serialize};

/// Percent value meaning "no determinate percent".
pub const NO_PERCENT: i32 = -1;

/// Progress of one task.
///
/// `percent` is derived from `progress` and `progress_max` on construction and
/// cannot be set on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    progress: i32,
    progress_max: i32,
    indeterminate: bool,
    percent: i32,
}

impl ProgressState {
    /// Build a state, deriving its percent.
    pub fn new(progress_max: i32, progress: i32, indeterminate: bool) -> Self {
        Self {
            progress,
            progress_max,
            indeterminate,
            percent: percent_of(progress_max, progress),
        }
    }

    /// Spinner state: no known total.
    pub fn indeterminate() -> Self {
        Self::new(0, 0, true)
    }

    /// Determinate state from wide values, narrowed to `i32`.
    ///
    /// Values outside the `i32` range wrap; callers must stay within it.
    pub fn determinate(progress_max: i64, progress: i64) -> Self {
        Self::new(progress_max as i32, progress as i32, false)
    }

    /// Completed units.
    pub fn progress(&self) -> i32 {
        self.progress
    }

    /// Total units, 0 if unknown.
    pub fn progress_max(&self) -> i32 {
        self.progress_max
    }

    /// Spinner mode.
    pub fn is_indeterminate(&self) -> bool {
        self.indeterminate
    }

    /// Derived percent in `[-1, 100]` for well-formed input; `-1` when there is
    /// no total.
    pub fn percent(&self) -> i32 {
        self.percent
    }

    /// The pair that decides whether the worker needs an update.
    pub fn forward_key(&self) -> ForwardKey {
        ForwardKey {
            percent: self.percent,
            indeterminate: self.indeterminate,
        }
    }
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::new(0, 0, false)
    }
}

impl std::fmt::Display for ProgressState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.indeterminate {
            write!(f, "indeterminate")
        } else if self.percent == NO_PERCENT {
            write!(f, "{}/?", self.progress)
        } else {
            write!(f, "{}/{} ({}%)", self.progress, self.progress_max, self.percent)
        }
    }
}

/// Observable summary of a [`ProgressState`]; equal keys mean the worker would
/// show the same thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForwardKey {
    /// Derived percent.
    pub percent: i32,
    /// Spinner mode.
    pub indeterminate: bool,
}

/// `100 * progress / progress_max` with integer division, or `-1` when the
/// total is unknown.
pub fn percent_of(progress_max: i32, progress: i32) -> i32 {
    if progress_max == 0 {
        return NO_PERCENT;
    }
    // 64-bit intermediate: 100 * i32::MAX does not fit in i32.
    (100 * i64::from(progress) / i64::from(progress_max)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_integer_division() {
        assert_eq!(percent_of(100, 10), 10);
        assert_eq!(percent_of(3, 1), 33);
        assert_eq!(percent_of(3, 2), 66);
        assert_eq!(percent_of(102, 50), 49);
        assert_eq!(percent_of(100, 49), 49);
        assert_eq!(percent_of(7, 7), 100);
    }

    #[test]
    fn test_unknown_total() {
        assert_eq!(percent_of(0, 0), NO_PERCENT);
        assert_eq!(percent_of(0, 5), NO_PERCENT);
        assert_eq!(ProgressState::indeterminate().percent(), NO_PERCENT);
    }

    #[test]
    fn test_large_values_do_not_overflow() {
        assert_eq!(percent_of(i32::MAX, i32::MAX), 100);
        assert_eq!(percent_of(i32::MAX, i32::MAX / 2), 49);
    }

    #[test]
    fn test_no_validation_of_inputs() {
        // Callers are trusted; out-of-range values are stored as given.
        let state = ProgressState::new(10, 20, false);
        assert_eq!(state.progress(), 20);
        assert_eq!(state.percent(), 200);
    }

    #[test]
    fn test_determinate_narrows() {
        let state = ProgressState::determinate(1_000, 250);
        assert_eq!(state.progress_max(), 1_000);
        assert_eq!(state.progress(), 250);
        assert!(!state.is_indeterminate());
        assert_eq!(state.percent(), 25);
    }

    #[test]
    fn test_forward_key_ignores_raw_values() {
        let a = ProgressState::new(100, 49, false);
        let b = ProgressState::new(102, 50, false);
        assert_ne!(a, b);
        assert_eq!(a.forward_key(), b.forward_key());

        let spinner = ProgressState::indeterminate();
        let unknown = ProgressState::new(0, 5, false);
        assert_eq!(spinner.percent(), unknown.percent());
        assert_ne!(spinner.forward_key(), unknown.forward_key());
    }

    #[test]
    fn test_default_state() {
        let state = ProgressState::default();
        assert_eq!(state.percent(), NO_PERCENT);
        assert!(!state.is_indeterminate());
    }

    #[test]
    fn test_display() {
        assert_eq!(ProgressState::new(100, 10, false).to_string(), "10/100 (10%)");
        assert_eq!(ProgressState::new(0, 4, false).to_string(), "4/?");
        assert_eq!(ProgressState::indeterminate().to_string(), "indeterminate");
    }
}
