//! Concurrent countdown timers.
//!
//! This module provides:
//! - The [`Timer`] entity and its state machine
//! - The [`TimerManager`] owning every timer of the process
//! - Clock sources, events and errors used by both

pub mod clock;
pub mod entity;
pub mod error;
pub mod event;
pub mod manager;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entity::Timer;
pub use error::{ErrorKind, SideEffect, TimerError};
pub use event::{CompletionReport, TimerEvent};
pub use manager::{
    minutes_to_duration, ExpiredTimer, TimerManager, COMPLETION_TITLE, DEFAULT_TICK_INTERVAL,
    DEFAULT_TITLE, MIN_TICK_INTERVAL,
};
