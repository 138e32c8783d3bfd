//! Core data types for the Pomodoro Timer.
//!
//! This module defines the data structures shared between the timer
//! manager and its collaborators:
//! - Timer identifiers and lifecycle status
//! - Immutable timer views handed to the presentation layer
//! - Application configuration with validation

pub mod config;

use std::borrow::Borrow;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use config::{AppConfig, ConfigError};

/// Number of characters shown when an id is displayed in tables.
pub const SHORT_ID_LEN: usize = 6;

/// Length of a generated id.
const ID_LEN: usize = 8;

// ============================================================================
// TimerId
// ============================================================================

/// Opaque identifier of a timer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(String);

impl TimerId {
    /// Generates a fresh random id (8 lowercase hex characters).
    #[must_use]
    pub fn generate() -> Self {
        Self(short_uuid())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the abbreviated form used in tables.
    #[must_use]
    pub fn short(&self) -> &str {
        let end = self.0.len().min(SHORT_ID_LEN);
        &self.0[..end]
    }

    /// Returns true if `prefix` is a non-empty prefix of this id.
    #[must_use]
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        !prefix.is_empty() && self.0.starts_with(prefix)
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for TimerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TimerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Returns the first 8 hex characters of a v4 UUID.
pub(crate) fn short_uuid() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(ID_LEN);
    id
}

// ============================================================================
// TimerStatus
// ============================================================================

/// Lifecycle state of a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    /// Counting down
    Running,
    /// Frozen until resumed
    Paused,
    /// Reached zero (terminal)
    Completed,
    /// Deleted before reaching zero (terminal)
    Cancelled,
}

impl TimerStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
            TimerStatus::Completed => "completed",
            TimerStatus::Cancelled => "cancelled",
        }
    }

    /// Returns true for running or paused timers.
    pub fn is_active(&self) -> bool {
        matches!(self, TimerStatus::Running | TimerStatus::Paused)
    }

    /// Returns true once the timer can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TimerStatus::Completed | TimerStatus::Cancelled)
    }
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TimerView
// ============================================================================

/// Point-in-time copy of a timer, safe to hand to renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerView {
    /// Timer id
    pub id: TimerId,
    /// Display title
    pub title: String,
    /// Time left at the instant the view was taken
    pub remaining: Duration,
    /// Duration fixed at creation
    pub total: Duration,
    /// Lifecycle state
    pub status: TimerStatus,
    /// Todo completed when this timer completes
    pub linked_todo: Option<String>,
}

impl TimerView {
    /// Time already counted down.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.total.saturating_sub(self.remaining)
    }

    /// Fraction of the duration already elapsed, in `[0.0, 1.0]`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.total.is_zero() {
            return 1.0;
        }
        (self.elapsed().as_secs_f64() / self.total.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Remaining time rounded up to whole seconds.
    ///
    /// Rounding up keeps a timer from showing `00:00` while it is still
    /// counting down its last fraction of a second.
    #[must_use]
    pub fn remaining_secs(&self) -> u64 {
        ceil_secs(self.remaining)
    }

    /// Returns true for running or paused timers.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Whole seconds in `duration`, rounding any fraction up.
#[must_use]
pub fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------------
    // TimerId Tests
    // ------------------------------------------------------------------------

    mod timer_id_tests {
        use super::*;

        #[test]
        fn test_generate_is_hex_of_fixed_length() {
            let id = TimerId::generate();
            assert_eq!(id.as_str().len(), 8);
            assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        }

        #[test]
        fn test_generate_is_unique_enough() {
            let a = TimerId::generate();
            let b = TimerId::generate();
            assert_ne!(a, b);
        }

        #[test]
        fn test_short() {
            let id = TimerId::from("abcdef12");
            assert_eq!(id.short(), "abcdef");

            let tiny = TimerId::from("ab");
            assert_eq!(tiny.short(), "ab");
        }

        #[test]
        fn test_matches_prefix() {
            let id = TimerId::from("abcdef12");
            assert!(id.matches_prefix("abc"));
            assert!(id.matches_prefix("abcdef12"));
            assert!(!id.matches_prefix("abd"));
            assert!(!id.matches_prefix(""));
        }

        #[test]
        fn test_serialize_transparent() {
            let id = TimerId::from("abcdef12");
            assert_eq!(serde_json::to_string(&id).unwrap(), "\"abcdef12\"");
        }
    }

    // ------------------------------------------------------------------------
    // TimerStatus Tests
    // ------------------------------------------------------------------------

    mod timer_status_tests {
        use super::*;

        #[test]
        fn test_as_str() {
            assert_eq!(TimerStatus::Running.as_str(), "running");
            assert_eq!(TimerStatus::Paused.as_str(), "paused");
            assert_eq!(TimerStatus::Completed.as_str(), "completed");
            assert_eq!(TimerStatus::Cancelled.as_str(), "cancelled");
        }

        #[test]
        fn test_is_active_and_terminal_are_disjoint() {
            for status in [
                TimerStatus::Running,
                TimerStatus::Paused,
                TimerStatus::Completed,
                TimerStatus::Cancelled,
            ] {
                assert_ne!(status.is_active(), status.is_terminal());
            }
        }

        #[test]
        fn test_serialize_deserialize() {
            let json = serde_json::to_string(&TimerStatus::Cancelled).unwrap();
            assert_eq!(json, "\"cancelled\"");

            let status: TimerStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(status, TimerStatus::Cancelled);
        }
    }

    // ------------------------------------------------------------------------
    // TimerView Tests
    // ------------------------------------------------------------------------

    mod timer_view_tests {
        use super::*;

        fn view(remaining: Duration, total: Duration) -> TimerView {
            TimerView {
                id: TimerId::from("abcdef12"),
                title: "Focus".to_string(),
                remaining,
                total,
                status: TimerStatus::Running,
                linked_todo: None,
            }
        }

        #[test]
        fn test_progress() {
            let v = view(Duration::from_secs(15 * 60), Duration::from_secs(20 * 60));
            assert!((v.progress() - 0.25).abs() < f64::EPSILON);
            assert_eq!(v.elapsed(), Duration::from_secs(5 * 60));
        }

        #[test]
        fn test_progress_bounds() {
            let fresh = view(Duration::from_secs(60), Duration::from_secs(60));
            assert_eq!(fresh.progress(), 0.0);

            let done = view(Duration::ZERO, Duration::from_secs(60));
            assert_eq!(done.progress(), 1.0);
        }

        #[test]
        fn test_remaining_secs_rounds_up() {
            let v = view(Duration::from_millis(1500), Duration::from_secs(60));
            assert_eq!(v.remaining_secs(), 2);

            let exact = view(Duration::from_secs(3), Duration::from_secs(60));
            assert_eq!(exact.remaining_secs(), 3);
        }

        #[test]
        fn test_ceil_secs() {
            assert_eq!(ceil_secs(Duration::ZERO), 0);
            assert_eq!(ceil_secs(Duration::from_nanos(1)), 1);
            assert_eq!(ceil_secs(Duration::from_millis(59_001)), 60);
        }
    }
}
