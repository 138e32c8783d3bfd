//! Interactive command dispatcher.
//!
//! Parses one input line into a [`Command`] and executes it against the
//! timer manager and the todo list. Every outcome, including rejected
//! commands, comes back as a [`Reply`] for the session to print.

use std::sync::Arc;

use thiserror::Error;

use super::display::Display;
use crate::timer::{minutes_to_duration, TimerError, TimerManager};
use crate::todo::{TodoError, TodoManager};
use crate::types::TimerStatus;

// ============================================================================
// Command
// ============================================================================

/// A parsed interactive command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `add <minutes> [title]`
    Add { minutes: i64, title: Option<String> },
    /// `task <minutes> <title>`: todo plus linked timer
    Task { minutes: i64, title: String },
    /// `todo <title>`
    Todo { title: String },
    /// `list`
    List,
    /// `status`
    Status,
    /// `done <id>`
    Done { id: String },
    /// `del <id>`
    Delete { id: String },
    /// `pause <id>`
    Pause { id: String },
    /// `resume <id>`
    Resume { id: String },
    /// `clear`
    Clear,
    /// `help`
    Help,
    /// `quit`, `q` or `exit`
    Quit,
}

/// Errors produced while parsing an input line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Missing arguments.
    #[error("Usage: {0}")]
    Usage(&'static str),

    /// The minutes argument is not an integer.
    #[error("Minutes must be a number, got '{0}'")]
    InvalidNumber(String),

    /// The command word is not known.
    #[error("Unknown command: {0}. Type 'help' for available commands.")]
    UnknownCommand(String),
}

impl Command {
    /// Parses one input line. Blank lines yield `Ok(None)`.
    ///
    /// The command word is case-insensitive; titles keep their case.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] for unknown commands, missing arguments
    /// or malformed numbers.
    pub fn parse(line: &str) -> Result<Option<Self>, DispatchError> {
        let line = line.trim();
        let Some(word) = line.split_whitespace().next() else {
            return Ok(None);
        };
        let rest = line[word.len()..].trim();
        let command = word.to_lowercase();

        let parsed = match command.as_str() {
            "quit" | "q" | "exit" => Self::Quit,
            "help" => Self::Help,
            "list" => Self::List,
            "status" => Self::Status,
            "clear" => Self::Clear,
            "add" => {
                let (minutes, title) = split_first(rest).ok_or(DispatchError::Usage(
                    "add <minutes> [title]",
                ))?;
                Self::Add {
                    minutes: parse_minutes(minutes)?,
                    title: (!title.is_empty()).then(|| title.to_string()),
                }
            }
            "task" => {
                let usage = DispatchError::Usage("task <minutes> <title>");
                let (minutes, title) = split_first(rest).ok_or(usage.clone())?;
                if title.is_empty() {
                    return Err(usage);
                }
                Self::Task {
                    minutes: parse_minutes(minutes)?,
                    title: title.to_string(),
                }
            }
            "todo" => {
                if rest.is_empty() {
                    return Err(DispatchError::Usage("todo <title>"));
                }
                Self::Todo {
                    title: rest.to_string(),
                }
            }
            "done" => Self::Done {
                id: single_id(rest, "done <id>")?,
            },
            "del" => Self::Delete {
                id: single_id(rest, "del <id>")?,
            },
            "pause" => Self::Pause {
                id: single_id(rest, "pause <id>")?,
            },
            "resume" => Self::Resume {
                id: single_id(rest, "resume <id>")?,
            },
            _ => return Err(DispatchError::UnknownCommand(word.to_string())),
        };
        Ok(Some(parsed))
    }
}

/// Splits off the first whitespace-separated token.
fn split_first(text: &str) -> Option<(&str, &str)> {
    let first = text.split_whitespace().next()?;
    Some((first, text[first.len()..].trim()))
}

fn single_id(rest: &str, usage: &'static str) -> Result<String, DispatchError> {
    rest.split_whitespace()
        .next()
        .map(String::from)
        .ok_or(DispatchError::Usage(usage))
}

fn parse_minutes(text: &str) -> Result<i64, DispatchError> {
    text.parse()
        .map_err(|_| DispatchError::InvalidNumber(text.to_string()))
}

// ============================================================================
// Reply
// ============================================================================

/// Outcome of one command, ready to print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The command took effect
    Success(String),
    /// Nothing changed, but there is something to say
    Info(String),
    /// The command was rejected
    Error(String),
    /// A full screen of text (tables, help)
    Screen(String),
    /// Leave the session
    Quit,
}

impl Reply {
    /// Prints the reply. `Quit` prints nothing.
    pub fn show(&self) {
        match self {
            Reply::Success(message) => Display::show_success(message),
            Reply::Info(message) => Display::show_info(message),
            Reply::Error(message) => Display::show_error(message),
            Reply::Screen(text) => {
                println!();
                println!("{}", text);
            }
            Reply::Quit => {}
        }
    }

    fn from_timer_error(err: &TimerError) -> Self {
        Reply::Error(format!("{} ({})", err, err.suggestion()))
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Executes interactive commands.
#[derive(Clone)]
pub struct Dispatcher {
    timers: TimerManager,
    todos: Arc<TodoManager>,
}

impl Dispatcher {
    pub fn new(timers: TimerManager, todos: Arc<TodoManager>) -> Self {
        Self { timers, todos }
    }

    /// Parses and executes one input line. Blank lines yield `None`.
    pub fn handle_line(&self, line: &str) -> Option<Reply> {
        match Command::parse(line) {
            Ok(Some(command)) => Some(self.execute(command)),
            Ok(None) => None,
            Err(e) => Some(Reply::Error(e.to_string())),
        }
    }

    /// Executes a parsed command.
    pub fn execute(&self, command: Command) -> Reply {
        tracing::debug!("Executing {:?}", command);
        match command {
            Command::Add { minutes, title } => self.add_timer(minutes, title.as_deref()),
            Command::Task { minutes, title } => self.add_task(minutes, &title),
            Command::Todo { title } => self.add_todo(&title),
            Command::List => Reply::Screen(format!(
                "{}\n{}",
                Display::render_todo_table(&self.todos.list_all(), true),
                Display::render_counts(&self.todos.count())
            )),
            Command::Status => Reply::Screen(format!(
                "{}\n{}",
                Display::render_timer_table(&self.timers.snapshot()),
                Display::render_todo_table(&self.todos.list_pending(), false)
            )),
            Command::Done { id } => match self.todos.complete(&id) {
                Ok(todo) => Reply::Success(format!("Todo '{}' marked as complete", todo.title)),
                Err(e) => Reply::Error(e.to_string()),
            },
            Command::Delete { id } => self.delete(&id),
            Command::Pause { id } => match self.timers.pause(&id) {
                Ok(view) => Reply::Success(format!(
                    "Timer '{}' paused ({} left)",
                    view.title,
                    Display::format_duration(view.remaining)
                )),
                Err(e) => Reply::from_timer_error(&e),
            },
            Command::Resume { id } => match self.timers.resume(&id) {
                Ok(view) => Reply::Success(format!(
                    "Timer '{}' resumed ({} left)",
                    view.title,
                    Display::format_duration(view.remaining)
                )),
                Err(e) => Reply::from_timer_error(&e),
            },
            Command::Clear => self.clear(),
            Command::Help => Reply::Screen(Display::render_help()),
            Command::Quit => Reply::Quit,
        }
    }

    fn add_timer(&self, minutes: i64, title: Option<&str>) -> Reply {
        let added = self
            .timers
            .add_minutes(minutes, title.unwrap_or_default(), None)
            .and_then(|id| self.timers.get(id.as_str()));
        match added {
            Ok(view) => Reply::Success(format!(
                "Timer '{}' ({}m) started [ID: {}]",
                view.title,
                minutes,
                view.id.short()
            )),
            Err(e) => Reply::from_timer_error(&e),
        }
    }

    fn add_task(&self, minutes: i64, title: &str) -> Reply {
        // Validate before touching the todo list so a bad duration leaves
        // no orphaned todo behind.
        let duration = match minutes_to_duration(minutes) {
            Ok(duration) => duration,
            Err(e) => return Reply::from_timer_error(&e),
        };

        let todo = match self.todos.add(title, u32::try_from(minutes).ok()) {
            Ok(todo) => todo,
            Err(e) => return Reply::Error(e.to_string()),
        };
        match self.timers.add(duration, &todo.title, Some(todo.id.clone())) {
            Ok(id) => Reply::Success(format!(
                "Todo '{}' created with {}m timer [ID: {}, timer {}]",
                todo.title,
                minutes,
                Display::short_id(&todo.id),
                id.short()
            )),
            Err(e) => Reply::from_timer_error(&e),
        }
    }

    fn add_todo(&self, title: &str) -> Reply {
        match self.todos.add(title, None) {
            Ok(todo) => Reply::Success(format!(
                "Todo '{}' created [ID: {}]",
                todo.title,
                Display::short_id(&todo.id)
            )),
            Err(e) => Reply::Error(e.to_string()),
        }
    }

    /// Deletes a timer, or a todo if no timer matches.
    fn delete(&self, id: &str) -> Reply {
        if let Ok(view) = self.timers.get(id) {
            if view.status == TimerStatus::Cancelled {
                return Reply::Info(format!("Timer '{}' already cancelled", view.title));
            }
        }

        match self.timers.delete(id) {
            Ok(view) if view.status == TimerStatus::Completed => {
                Reply::Info(format!("Timer '{}' already completed", view.title))
            }
            Ok(view) => Reply::Success(format!("Timer '{}' removed", view.title)),
            Err(TimerError::NotFound(_)) => match self.todos.delete(id) {
                Ok(todo) => Reply::Success(format!("Todo '{}' deleted", todo.title)),
                Err(TodoError::NotFound(_)) => {
                    Reply::Error(format!("Item with ID '{}' not found", id))
                }
                Err(e) => Reply::Error(e.to_string()),
            },
            Err(e) => Reply::from_timer_error(&e),
        }
    }

    fn clear(&self) -> Reply {
        let timers = self.timers.clear_finished();
        match self.todos.clear_completed() {
            Ok(todos) => Reply::Success(format!(
                "Cleared {} completed todo(s) and {} finished timer(s)",
                todos, timers
            )),
            Err(e) => Reply::Error(e.to_string()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
