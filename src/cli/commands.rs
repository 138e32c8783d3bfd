//! Command definitions for the pomo CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// ============================================================================
// CLI Structure
// ============================================================================

/// pomo - terminal pomodoro timer with parallel timers and todos
#[derive(Parser, Debug)]
#[command(
    name = "pomo",
    version,
    about = "Terminal pomodoro timer with parallel timers and todos",
    long_about = "A terminal pomodoro timer.\n\
                  Run several countdowns at once and link them to todo items that \
                  complete automatically when their timer finishes.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute (defaults to interactive mode)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding todos.json
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Configuration file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Disable desktop notifications
    #[arg(long, global = true)]
    pub no_notify: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start a single pomodoro timer (classic mode)
    Start(StartArgs),

    /// Interactive mode with multiple timers and todos
    Run,

    /// Manage todo items
    #[command(subcommand)]
    Todo(TodoCommands),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Todo subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum TodoCommands {
    /// Add a new todo item
    Add(TodoAddArgs),

    /// List todos
    List {
        /// Show completed todos too
        #[arg(short, long)]
        all: bool,
    },

    /// Mark a todo as complete
    Done {
        /// Todo ID (or prefix)
        id: String,
    },

    /// Delete a todo
    Delete {
        /// Todo ID (or prefix)
        id: String,
    },

    /// Remove all completed todos
    Clear,
}

// ============================================================================
// Arguments
// ============================================================================

/// Arguments for the start command
#[derive(Args, Debug, Clone, Default)]
pub struct StartArgs {
    /// Duration in minutes (defaults to the configured length)
    #[arg(allow_negative_numbers = true)]
    pub minutes: Option<i64>,

    /// Session title
    #[arg(short, long, value_parser = validate_title)]
    pub title: Option<String>,
}

/// Arguments for `todo add`
#[derive(Args, Debug, Clone)]
pub struct TodoAddArgs {
    /// Todo title
    #[arg(value_parser = validate_title)]
    pub title: String,

    /// Associated timer in minutes (1-1440)
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u32).range(1..=1440)
    )]
    pub timer: Option<u32>,

    /// Only record the timer length; do not start it now
    #[arg(long, requires = "timer")]
    pub no_start: bool,
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Maximum title length in characters.
const MAX_TITLE_LEN: usize = 100;

/// Validates a timer or todo title.
///
/// - Must not be blank
/// - Must not exceed 100 characters
fn validate_title(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("Title cannot be empty".to_string());
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LEN
        ));
    }
    Ok(trimmed.to_string())
}

// ============================================================================
// Tests
// ============================================================================
