//! Events emitted by the timer manager.

use std::time::Duration;

use super::error::TimerError;
use crate::todo::TodoCompletion;
use crate::types::TimerId;

/// Timer events for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// A timer was added and is running
    Started {
        id: TimerId,
        title: String,
        total: Duration,
    },
    /// A timer was paused
    Paused { id: TimerId, remaining: Duration },
    /// A timer was resumed
    Resumed { id: TimerId, remaining: Duration },
    /// A timer was deleted before completing
    Cancelled { id: TimerId },
    /// A timer reached zero and its side effects ran
    Completed(CompletionReport),
}

impl TimerEvent {
    /// Id of the timer the event refers to.
    #[must_use]
    pub fn timer_id(&self) -> &TimerId {
        match self {
            TimerEvent::Started { id, .. }
            | TimerEvent::Paused { id, .. }
            | TimerEvent::Resumed { id, .. }
            | TimerEvent::Cancelled { id } => id,
            TimerEvent::Completed(report) => &report.id,
        }
    }
}

/// Outcome of one timer completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReport {
    /// Completed timer
    pub id: TimerId,
    /// Timer title
    pub title: String,
    /// Timer duration
    pub total: Duration,
    /// Linked todo id, if any
    pub linked_todo: Option<String>,
    /// Result of marking the linked todo complete
    pub todo: Option<TodoCompletion>,
    /// Side effects that failed; the completion itself still stands
    pub warnings: Vec<TimerError>,
}

impl CompletionReport {
    /// Returns true if every side effect succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
