//! Terminal sessions.
//!
//! - [`run_interactive`]: line-oriented mode with many timers and todos
//! - [`run_single`]: classic mode counting down one timer in place
//!
//! Both own the timer poller for their lifetime and react to
//! [`TimerEvent`]s coming from the manager.

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use super::dispatch::{Dispatcher, Reply};
use super::display::Display;
use crate::timer::{CompletionReport, TimerEvent, TimerManager};
use crate::todo::{TodoCompletion, TodoManager};
use crate::types::{TimerId, TimerStatus};

/// Refresh rate of the single-timer countdown line.
const COUNTDOWN_REFRESH: Duration = Duration::from_secs(1);

const PROMPT: &str = "> ";

// ============================================================================
// Interactive Mode
// ============================================================================

/// Runs the interactive loop until `quit`, end of input or Ctrl-C.
///
/// Live timers are cancelled on exit; timers are never persisted.
///
/// # Errors
///
/// Returns an error if the prompt cannot be written.
pub async fn run_interactive(
    timers: TimerManager,
    todos: Arc<TodoManager>,
    mut events: mpsc::UnboundedReceiver<TimerEvent>,
) -> Result<()> {
    let dispatcher = Dispatcher::new(timers.clone(), todos.clone());
    let mut lines = spawn_line_reader();
    let poller = timers.spawn_poller();

    Display::show_welcome();
    Display::show_dashboard(&timers.snapshot(), &todos.list_pending());
    prompt()?;

    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else {
                    tracing::debug!("Input closed");
                    break;
                };
                match dispatcher.handle_line(&line) {
                    Some(Reply::Quit) => break,
                    Some(reply) => reply.show(),
                    None => {}
                }
                prompt()?;
            }
            Some(event) = events.recv() => {
                if let TimerEvent::Completed(report) = event {
                    show_completion(&report);
                    prompt()?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    poller.abort();
    timers.cancel_all();
    println!("Goodbye!");
    Ok(())
}

/// Reads stdin lines on a plain thread.
///
/// A blocking stdin read cannot be cancelled, so it must not live on the
/// runtime's blocking pool or shutdown would wait for the next Enter.
fn spawn_line_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to read input: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

fn prompt() -> Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{}", PROMPT).context("Failed to write prompt")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}

// ============================================================================
// Single-Timer Mode
// ============================================================================

/// Counts one timer down on a single refreshed line.
///
/// Returns once the timer completes or the user presses Ctrl-C, which
/// cancels it.
///
/// # Errors
///
/// Returns an error if the timer cannot be created, e.g. for a
/// non-positive duration.
pub async fn run_single(
    timers: TimerManager,
    mut events: mpsc::UnboundedReceiver<TimerEvent>,
    minutes: i64,
    title: &str,
    linked_todo: Option<String>,
) -> Result<()> {
    let id = timers.add_minutes(minutes, title, linked_todo)?;
    let view = timers.get(id.as_str())?;

    println!();
    println!("<*> Starting timer: {} ({} minutes)", view.title, minutes);
    println!("Press Ctrl+C to cancel");
    println!();

    let poller = timers.spawn_poller();
    let mut ticker = interval(COUNTDOWN_REFRESH);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let view = timers.get(id.as_str())?;
                print!("\r<*> {} remaining...  ", Display::format_duration(view.remaining));
                std::io::stdout().flush().context("Failed to flush stdout")?;
            }
            Some(event) = events.recv() => {
                if let TimerEvent::Completed(report) = event {
                    if report.id == id {
                        println!();
                        show_completion(&report);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                let view = timers.delete(id.as_str())?;
                println!();
                match cancel_outcome(view.status) {
                    CancelOutcome::Cancelled => println!("Timer cancelled."),
                    // Completion won the race; its side effects may still be running.
                    CancelOutcome::AlreadyCompleted => match completed_report(&mut events, &id) {
                        Some(report) => show_completion(&report),
                        None => Display::show_info(&format!(
                            "Timer '{}' already completed",
                            view.title
                        )),
                    },
                }
                break;
            }
        }
    }

    poller.abort();
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum CancelOutcome {
    Cancelled,
    AlreadyCompleted,
}

fn cancel_outcome(status: TimerStatus) -> CancelOutcome {
    if status == TimerStatus::Completed {
        CancelOutcome::AlreadyCompleted
    } else {
        CancelOutcome::Cancelled
    }
}

/// Takes the `Completed` event for `id` if it has already been published.
fn completed_report(
    events: &mut mpsc::UnboundedReceiver<TimerEvent>,
    id: &TimerId,
) -> Option<CompletionReport> {
    while let Ok(event) = events.try_recv() {
        if let TimerEvent::Completed(report) = event {
            if &report.id == id {
                return Some(report);
            }
        }
    }
    None
}

/// Prints a completion banner plus the outcome of its side effects.
fn show_completion(report: &CompletionReport) {
    Display::show_completion(report);
    if let Some(TodoCompletion::Completed { title }) = &report.todo {
        Display::show_info(&format!("Todo '{}' marked as complete", title));
    }
    for warning in &report.warnings {
        Display::show_warning(&warning.to_string());
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod cancel_tests {
        use super::*;

        fn report(id: &TimerId) -> CompletionReport {
            CompletionReport {
                id: id.clone(),
                title: "Focus".to_string(),
                total: Duration::from_secs(60),
                linked_todo: None,
                todo: None,
                warnings: Vec::new(),
            }
        }

        #[test]
        fn test_cancel_outcome() {
            assert_eq!(cancel_outcome(TimerStatus::Cancelled), CancelOutcome::Cancelled);
            assert_eq!(
                cancel_outcome(TimerStatus::Completed),
                CancelOutcome::AlreadyCompleted
            );
        }

        #[test]
        fn test_completed_report_finds_queued_event() {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let id = TimerId::generate();
            let other = TimerId::generate();
            tx.send(TimerEvent::Cancelled { id: other.clone() }).unwrap();
            tx.send(TimerEvent::Completed(report(&other))).unwrap();
            tx.send(TimerEvent::Completed(report(&id))).unwrap();

            let found = completed_report(&mut rx, &id).unwrap();
            assert_eq!(found.id, id);
        }

        #[test]
        fn test_completed_report_none_when_not_published() {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let id = TimerId::generate();
            tx.send(TimerEvent::Cancelled { id: id.clone() }).unwrap();

            assert!(completed_report(&mut rx, &id).is_none());
        }
    }
}
