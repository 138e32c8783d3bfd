//! pomo library
//!
//! This library provides the core functionality for the pomo CLI.
//! It includes:
//! - Concurrent timer manager with pause, resume, cancel and completion
//! - Persisted todo list whose items complete with their linked timer
//! - Completion notifications through a pluggable sink
//! - CLI command parsing, dispatch, sessions and display utilities
//! - Type definitions for configuration and timer snapshots

pub mod cli;
pub mod notification;
pub mod timer;
pub mod todo;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{AppConfig, ConfigError, TimerId, TimerStatus, TimerView};

pub use timer::{
    Clock, CompletionReport, ErrorKind, ManualClock, SystemClock, TimerError, TimerEvent,
    TimerManager,
};

pub use todo::{
    MockTodoStore, Storage, Todo, TodoCompletion, TodoCounts, TodoError, TodoManager, TodoStore,
};

pub use notification::{
    DesktopNotifier, MockNotifier, NotificationError, Notifier, SilentNotifier,
};
