//! Display utilities for the pomo CLI.
//!
//! This module provides formatted output for:
//! - Timer and todo tables
//! - The interactive dashboard, welcome and help screens
//! - Completion banners
//! - Success, info, warning and error lines
//!
//! `render_*` functions build the text; `show_*` functions print it.
//! Rendering only reads snapshots and never touches timer state.

use std::time::Duration;

use crate::timer::CompletionReport;
use crate::todo::{Todo, TodoCounts};
use crate::types::{ceil_secs, TimerStatus, TimerView, SHORT_ID_LEN};

/// Cells in a progress bar.
pub const PROGRESS_BAR_WIDTH: usize = 20;

/// Titles longer than this are truncated in tables.
const TITLE_WIDTH: usize = 28;

const RULE: &str = "──────────────────────────────────────────────────────────────────────";

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    // ------------------------------------------------------------------------
    // Formatting helpers
    // ------------------------------------------------------------------------

    /// Formats a duration as `MM:SS`, rounding partial seconds up.
    ///
    /// Minutes are not wrapped into hours, so 90 minutes is `90:00`.
    pub fn format_duration(duration: Duration) -> String {
        let (minutes, seconds) = Self::format_time(ceil_secs(duration));
        format!("{:02}:{:02}", minutes, seconds)
    }

    /// Builds a bar of `=` (elapsed) and `.` (remaining) cells.
    pub fn progress_bar(progress: f64) -> String {
        let filled = ((PROGRESS_BAR_WIDTH as f64) * progress.clamp(0.0, 1.0)) as usize;
        let filled = filled.min(PROGRESS_BAR_WIDTH);
        format!(
            "{}{}",
            "=".repeat(filled),
            ".".repeat(PROGRESS_BAR_WIDTH - filled)
        )
    }

    /// Status column text for a timer.
    pub fn status_label(view: &TimerView) -> &'static str {
        match view.status {
            TimerStatus::Paused => "PAUSED",
            TimerStatus::Completed => "DONE",
            TimerStatus::Cancelled => "CANCELLED",
            TimerStatus::Running => match view.remaining_secs() {
                0..=10 => "ENDING",
                11..=60 => "FINAL",
                _ => "RUNNING",
            },
        }
    }

    // ------------------------------------------------------------------------
    // Tables
    // ------------------------------------------------------------------------

    /// Renders a table of timers.
    pub fn render_timer_table(timers: &[TimerView]) -> String {
        let mut out = String::new();
        out.push_str("<*> Timers\n");
        out.push_str(RULE);
        out.push('\n');
        out.push_str(&format!(
            "{:<8}{:<30}{:<22}{:>7}  {}\n",
            "ID", "Title", "Progress", "Time", "Status"
        ));

        if timers.is_empty() {
            out.push_str("  No active timers\n");
            return out;
        }

        for view in timers {
            out.push_str(&format!(
                "{:<8}{:<30}{:<22}{:>7}  {}\n",
                view.id.short(),
                truncate(&view.title, TITLE_WIDTH),
                Self::progress_bar(view.progress()),
                Self::format_duration(view.remaining),
                Self::status_label(view)
            ));
        }
        out
    }

    /// Renders a table of todos. Completed todos are only listed when
    /// `show_completed` is set.
    pub fn render_todo_table(todos: &[Todo], show_completed: bool) -> String {
        let title = if show_completed {
            "All Todos"
        } else {
            "Pending Todos"
        };

        let mut out = String::new();
        out.push_str(title);
        out.push('\n');
        out.push_str(RULE);
        out.push('\n');
        out.push_str(&format!("{:<8}{:<6}{:<30}{:>6}\n", "ID", "Done", "Title", "Timer"));

        let shown: Vec<&Todo> = todos
            .iter()
            .filter(|todo| show_completed || !todo.completed)
            .collect();
        if shown.is_empty() {
            out.push_str("  No todos\n");
            return out;
        }

        for todo in shown {
            let check = if todo.completed { "[v]" } else { "[ ]" };
            let timer = todo
                .timer_minutes
                .map_or_else(|| "-".to_string(), |m| format!("{}m", m));
            out.push_str(&format!(
                "{:<8}{:<6}{:<30}{:>6}\n",
                Self::short_id(&todo.id),
                check,
                truncate(&todo.title, TITLE_WIDTH),
                timer
            ));
        }
        out
    }

    /// Renders the todo totals line.
    pub fn render_counts(counts: &TodoCounts) -> String {
        format!(
            "Total: {} | Pending: {} | Completed: {}",
            counts.total, counts.pending, counts.completed
        )
    }

    // ------------------------------------------------------------------------
    // Screens
    // ------------------------------------------------------------------------

    /// Active timers, pending todos and the command line reminder.
    pub fn render_dashboard(timers: &[TimerView], todos: &[Todo]) -> String {
        let active: Vec<TimerView> = timers.iter().filter(|t| t.is_active()).cloned().collect();
        format!(
            "{}\n{}\n{}",
            Self::render_timer_table(&active),
            Self::render_todo_table(todos, false),
            Self::render_help_line()
        )
    }

    /// One-line command summary.
    pub fn render_help_line() -> String {
        "Commands: add <min> [title] | task <min> <title> | todo <title> | list | \
         status | done <id> | del <id> | help | quit"
            .to_string()
    }

    /// Full command reference.
    pub fn render_help() -> String {
        [
            "Available Commands:",
            "  add <minutes> [title]   - Add a new timer",
            "  task <minutes> <title>  - Add a todo with a linked timer",
            "  todo <title>            - Add a new todo",
            "  list                    - Show all todos",
            "  status                  - Show all timers",
            "  done <id>               - Mark todo as complete",
            "  del <id>                - Delete a timer or todo",
            "  pause <id>              - Pause a timer",
            "  resume <id>             - Resume a paused timer",
            "  clear                   - Clear completed todos and finished timers",
            "  quit / q                - Exit the application",
        ]
        .join("\n")
    }

    /// Banner printed when entering interactive mode.
    pub fn render_welcome() -> String {
        format!(
            "{}\n  <*> CLI Pomodoro Timer\n\n  Interactive Mode\n  Type 'help' for commands, 'quit' to exit\n{}",
            RULE, RULE
        )
    }

    /// Banner printed when a timer completes.
    pub fn render_completion(report: &CompletionReport) -> String {
        format!(
            "*** Timer Complete! ***\n  Session:  {}\n  Duration: {} minutes\n  Great work! Take a break! c[_]",
            report.title,
            report.total.as_secs() / 60
        )
    }

    // ------------------------------------------------------------------------
    // Printing
    // ------------------------------------------------------------------------

    pub fn show_welcome() {
        println!("{}", Self::render_welcome());
        println!();
    }

    pub fn show_help() {
        println!();
        println!("{}", Self::render_help());
        println!();
    }

    pub fn show_dashboard(timers: &[TimerView], todos: &[Todo]) {
        println!();
        println!("{}", Self::render_dashboard(timers, todos));
        println!();
    }

    /// Shows all todos or only pending ones, followed by totals.
    pub fn show_todos(todos: &[Todo], show_completed: bool, counts: &TodoCounts) {
        println!();
        print!("{}", Self::render_todo_table(todos, show_completed));
        println!();
        println!("{}", Self::render_counts(counts));
    }

    pub fn show_completion(report: &CompletionReport) {
        println!();
        println!("{}", Self::render_completion(report));
    }

    /// Shows a success message.
    pub fn show_success(message: &str) {
        println!("[v] {}", message);
    }

    /// Shows an informational message.
    pub fn show_info(message: &str) {
        println!("-> {}", message);
    }

    /// Shows a warning on stderr.
    pub fn show_warning(message: &str) {
        eprintln!("[!] {}", message);
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    /// Abbreviated form of a todo id, as shown in tables.
    pub fn short_id(id: &str) -> &str {
        match id.char_indices().nth(SHORT_ID_LEN) {
            Some((end, _)) => &id[..end],
            None => id,
        }
    }

    /// Formats seconds as (minutes, seconds).
    fn format_time(total_seconds: u64) -> (u64, u64) {
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        (minutes, seconds)
    }
}

/// Cuts `text` to `width` characters, marking the cut with `~`.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

// ============================================================================
// Tests
// ============================================================================
