//! Timer manager error types.
//!
//! Every error here is reported back to the caller as a value; none of
//! them stops the manager or other timers.

use std::fmt;

use thiserror::Error;

use crate::types::{TimerId, TimerStatus};

/// Coarse classification of a [`TimerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown timer id
    NotFound,
    /// Operation not valid for the timer's current state
    InvalidState,
    /// Non-positive or malformed duration
    InvalidDuration,
    /// Notification or linked-todo update failed
    ExternalSideEffectFailure,
}

/// Side effect fired when a timer completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SideEffect {
    /// Desktop notification
    Notification,
    /// Marking the linked todo complete
    LinkedTodo,
}

impl fmt::Display for SideEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SideEffect::Notification => f.write_str("notification"),
            SideEffect::LinkedTodo => f.write_str("linked todo update"),
        }
    }
}

/// Errors returned by the timer manager.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// No timer has this id (or id prefix).
    #[error("Timer with ID '{0}' not found")]
    NotFound(String),

    /// The prefix matches more than one timer.
    #[error("Timer ID '{0}' is ambiguous, type more characters")]
    AmbiguousId(String),

    /// The operation does not apply to the timer's current state.
    #[error("Cannot {operation} timer '{id}': it is {status}")]
    InvalidState {
        id: TimerId,
        status: TimerStatus,
        operation: &'static str,
    },

    /// The requested duration is zero, negative, or too large.
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    /// A completion side effect failed. The timer still completed.
    #[error("{effect} failed: {message}")]
    SideEffect {
        effect: SideEffect,
        message: String,
    },
}

impl TimerError {
    /// Returns the error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::AmbiguousId(_) => ErrorKind::NotFound,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::InvalidDuration(_) => ErrorKind::InvalidDuration,
            Self::SideEffect { .. } => ErrorKind::ExternalSideEffectFailure,
        }
    }

    /// Returns true if the error is recoverable and the manager continues.
    ///
    /// All timer errors are recoverable.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        true
    }

    /// Returns true for failures of completion side effects.
    #[must_use]
    pub fn is_side_effect(&self) -> bool {
        matches!(self, Self::SideEffect { .. })
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "Run 'status' to see the IDs of current timers",
            Self::AmbiguousId(_) => "Use a longer ID prefix",
            Self::InvalidState { .. } => "Only running timers can be paused and only paused timers resumed",
            Self::InvalidDuration(_) => "Give the duration as a positive number of minutes",
            Self::SideEffect { .. } => "The timer completed; check notification settings or the todo list",
        }
    }
}
