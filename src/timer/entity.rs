//! Timer entity and its state machine.
//!
//! A [`Timer`] is plain data plus transition rules. It never runs on its
//! own: the manager passes in the current instant and decides when to
//! call each transition.
//!
//! Elapsed time is computed from timestamps rather than decremented per
//! tick:
//!
//! ```text
//! elapsed   = accumulated + (now - started_at)   while running
//! remaining = total - elapsed                    clamped at zero
//! ```
//!
//! `accumulated` holds the time counted in earlier running stretches, so a
//! pause/resume cycle never counts the paused interval.

use std::time::{Duration, Instant};

use super::error::TimerError;
use crate::types::{TimerId, TimerStatus, TimerView};

/// State-machine record for one countdown.
#[derive(Debug, Clone)]
pub struct Timer {
    id: TimerId,
    title: String,
    total: Duration,
    linked_todo: Option<String>,
    status: TimerStatus,
    /// Creation order, used to sort snapshots.
    seq: u64,
    /// Anchor of the current running stretch.
    started_at: Instant,
    /// Set while paused.
    paused_at: Option<Instant>,
    /// Elapsed time from stretches before `started_at`.
    accumulated: Duration,
}

impl Timer {
    /// Creates a timer that starts running at `now`.
    pub fn new(
        id: TimerId,
        title: String,
        total: Duration,
        linked_todo: Option<String>,
        seq: u64,
        now: Instant,
    ) -> Self {
        Self {
            id,
            title,
            total,
            linked_todo,
            status: TimerStatus::Running,
            seq,
            started_at: now,
            paused_at: None,
            accumulated: Duration::ZERO,
        }
    }

    pub fn id(&self) -> &TimerId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn linked_todo(&self) -> Option<&str> {
        self.linked_todo.as_deref()
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Instant the timer was paused, if it is paused.
    pub fn paused_at(&self) -> Option<Instant> {
        self.paused_at
    }

    /// Time counted down so far, never more than the total.
    pub fn elapsed(&self, now: Instant) -> Duration {
        let elapsed = match self.status {
            TimerStatus::Running => {
                self.accumulated + now.saturating_duration_since(self.started_at)
            }
            _ => self.accumulated,
        };
        elapsed.min(self.total)
    }

    /// Time left, in `[0, total]`.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.total.saturating_sub(self.elapsed(now))
    }

    /// True when a running timer has reached zero but not yet completed.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.status == TimerStatus::Running && self.remaining(now).is_zero()
    }

    /// RUNNING → PAUSED.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidState`] unless the timer is running
    /// with time left.
    pub fn pause(&mut self, now: Instant) -> Result<(), TimerError> {
        if self.status != TimerStatus::Running || self.is_expired(now) {
            return Err(self.invalid("pause"));
        }
        self.accumulated = self.elapsed(now);
        self.paused_at = Some(now);
        self.status = TimerStatus::Paused;
        Ok(())
    }

    /// PAUSED → RUNNING, re-anchored at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidState`] unless the timer is paused.
    pub fn resume(&mut self, now: Instant) -> Result<(), TimerError> {
        if self.status != TimerStatus::Paused {
            return Err(self.invalid("resume"));
        }
        self.started_at = now;
        self.paused_at = None;
        self.status = TimerStatus::Running;
        Ok(())
    }

    /// RUNNING or PAUSED → CANCELLED.
    ///
    /// Returns false, leaving the timer untouched, if it is already terminal.
    pub fn cancel(&mut self, now: Instant) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.accumulated = self.elapsed(now);
        self.paused_at = None;
        self.status = TimerStatus::Cancelled;
        true
    }

    /// RUNNING → COMPLETED once the countdown has reached zero.
    ///
    /// Returns true only for the call that performs the transition.
    pub fn complete(&mut self, now: Instant) -> bool {
        if !self.is_expired(now) {
            return false;
        }
        self.accumulated = self.total;
        self.status = TimerStatus::Completed;
        true
    }

    /// Copies the timer state as seen at `now`.
    pub fn view(&self, now: Instant) -> TimerView {
        TimerView {
            id: self.id.clone(),
            title: self.title.clone(),
            remaining: self.remaining(now),
            total: self.total,
            status: self.status,
            linked_todo: self.linked_todo.clone(),
        }
    }

    fn invalid(&self, operation: &'static str) -> TimerError {
        TimerError::InvalidState {
            id: self.id.clone(),
            status: self.status,
            operation,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::error::ErrorKind;

    const MIN: Duration = Duration::from_secs(60);

    fn create_timer(minutes: u32, now: Instant) -> Timer {
        Timer::new(
            TimerId::from("abcdef12"),
            "Focus".to_string(),
            MIN * minutes,
            None,
            0,
            now,
        )
    }

    mod countdown_tests {
        use super::*;

        #[test]
        fn test_new_timer_is_running_with_full_time() {
            let t0 = Instant::now();
            let timer = create_timer(25, t0);

            assert_eq!(timer.status(), TimerStatus::Running);
            assert_eq!(timer.remaining(t0), MIN * 25);
            assert_eq!(timer.elapsed(t0), Duration::ZERO);
        }

        #[test]
        fn test_remaining_follows_clock() {
            let t0 = Instant::now();
            let timer = create_timer(25, t0);

            assert_eq!(timer.remaining(t0 + MIN * 5), MIN * 20);
        }

        #[test]
        fn test_remaining_clamped_at_zero() {
            let t0 = Instant::now();
            let timer = create_timer(1, t0);

            assert_eq!(timer.remaining(t0 + MIN * 10), Duration::ZERO);
            assert_eq!(timer.elapsed(t0 + MIN * 10), MIN);
            assert!(timer.is_expired(t0 + MIN));
        }

        #[test]
        fn test_clock_before_anchor_does_not_underflow() {
            let t0 = Instant::now();
            let timer = create_timer(1, t0 + MIN);

            assert_eq!(timer.remaining(t0), MIN);
        }
    }

    mod transition_tests {
        use super::*;

        #[test]
        fn test_pause_freezes_remaining() {
            let t0 = Instant::now();
            let mut timer = create_timer(25, t0);

            timer.pause(t0 + MIN * 5).unwrap();

            assert_eq!(timer.status(), TimerStatus::Paused);
            assert_eq!(timer.paused_at(), Some(t0 + MIN * 5));
            assert_eq!(timer.remaining(t0 + MIN * 5), MIN * 20);
            assert_eq!(timer.remaining(t0 + MIN * 15), MIN * 20);
        }

        #[test]
        fn test_resume_does_not_count_paused_time() {
            let t0 = Instant::now();
            let mut timer = create_timer(25, t0);

            timer.pause(t0 + MIN * 5).unwrap();
            timer.resume(t0 + MIN * 12).unwrap();

            assert_eq!(timer.status(), TimerStatus::Running);
            assert_eq!(timer.remaining(t0 + MIN * 12), MIN * 20);
            assert_eq!(timer.remaining(t0 + MIN * 13), MIN * 19);
        }

        #[test]
        fn test_pause_resume_without_elapsed_time_is_drift_free() {
            let t0 = Instant::now();
            let mut timer = create_timer(25, t0);
            let at = t0 + Duration::from_millis(1234);
            let before = timer.remaining(at);

            for _ in 0..10 {
                timer.pause(at).unwrap();
                timer.resume(at).unwrap();
            }

            assert_eq!(timer.remaining(at), before);
        }

        #[test]
        fn test_pause_twice_is_invalid() {
            let t0 = Instant::now();
            let mut timer = create_timer(25, t0);

            timer.pause(t0).unwrap();
            let err = timer.pause(t0).unwrap_err();

            assert_eq!(err.kind(), ErrorKind::InvalidState);
        }

        #[test]
        fn test_resume_running_is_invalid() {
            let t0 = Instant::now();
            let mut timer = create_timer(25, t0);

            let err = timer.resume(t0).unwrap_err();
            assert_eq!(
                err,
                TimerError::InvalidState {
                    id: TimerId::from("abcdef12"),
                    status: TimerStatus::Running,
                    operation: "resume",
                }
            );
        }

        #[test]
        fn test_pause_expired_is_invalid() {
            let t0 = Instant::now();
            let mut timer = create_timer(1, t0);

            let err = timer.pause(t0 + MIN).unwrap_err();

            assert_eq!(err.kind(), ErrorKind::InvalidState);
            assert_eq!(timer.status(), TimerStatus::Running);
        }

        #[test]
        fn test_complete_only_once() {
            let t0 = Instant::now();
            let mut timer = create_timer(1, t0);

            assert!(!timer.complete(t0 + MIN / 2));
            assert!(timer.complete(t0 + MIN));
            assert!(!timer.complete(t0 + MIN * 2));

            assert_eq!(timer.status(), TimerStatus::Completed);
            assert_eq!(timer.remaining(t0 + MIN * 2), Duration::ZERO);
        }

        #[test]
        fn test_paused_timer_never_completes() {
            let t0 = Instant::now();
            let mut timer = create_timer(1, t0);

            timer.pause(t0 + MIN / 2).unwrap();

            assert!(!timer.is_expired(t0 + MIN * 5));
            assert!(!timer.complete(t0 + MIN * 5));
        }

        #[test]
        fn test_cancel_running_and_paused() {
            let t0 = Instant::now();

            let mut running = create_timer(25, t0);
            assert!(running.cancel(t0 + MIN));
            assert_eq!(running.status(), TimerStatus::Cancelled);
            assert_eq!(running.remaining(t0 + MIN * 10), MIN * 24);

            let mut paused = create_timer(25, t0);
            paused.pause(t0 + MIN).unwrap();
            assert!(paused.cancel(t0 + MIN * 2));
            assert_eq!(paused.status(), TimerStatus::Cancelled);
            assert_eq!(paused.paused_at(), None);
        }

        #[test]
        fn test_terminal_states_are_final() {
            let t0 = Instant::now();
            let mut timer = create_timer(1, t0);

            assert!(timer.complete(t0 + MIN));
            assert!(!timer.cancel(t0 + MIN));
            assert!(timer.pause(t0 + MIN).is_err());
            assert!(timer.resume(t0 + MIN).is_err());
            assert_eq!(timer.status(), TimerStatus::Completed);

            let mut cancelled = create_timer(1, t0);
            assert!(cancelled.cancel(t0));
            assert!(!cancelled.complete(t0 + MIN * 2));
            assert_eq!(cancelled.status(), TimerStatus::Cancelled);
        }

        #[test]
        fn test_view_copies_state() {
            let t0 = Instant::now();
            let timer = Timer::new(
                TimerId::from("abcdef12"),
                "Write report".to_string(),
                MIN * 10,
                Some("t1".to_string()),
                3,
                t0,
            );

            let view = timer.view(t0 + MIN * 4);

            assert_eq!(view.id.as_str(), "abcdef12");
            assert_eq!(view.title, "Write report");
            assert_eq!(view.remaining, MIN * 6);
            assert_eq!(view.total, MIN * 10);
            assert_eq!(view.status, TimerStatus::Running);
            assert_eq!(view.linked_todo.as_deref(), Some("t1"));
        }
    }
}
