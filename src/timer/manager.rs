//! Concurrent timer manager.
//!
//! [`TimerManager`] owns every timer of the process. It is a cheap `Clone`
//! handle over shared state, constructed once and passed to the command
//! dispatcher, the renderer and the poller task.
//!
//! # Locking
//!
//! ```text
//! RwLock<HashMap<TimerId, Arc<Mutex<Timer>>>>
//!   read  : lookups, pause/resume/delete, snapshots, polling
//!   write : add, clear_finished
//! ```
//!
//! Each timer has its own mutex, so commands on different timers never
//! wait for each other, while commands on the same timer (including the
//! poller's expiration transition) are totally ordered. The clock is read
//! after the timer lock is taken.
//!
//! # Completion
//!
//! The poller flips an expired timer to COMPLETED under its lock; only the
//! caller that performs that flip gets an [`ExpiredTimer`] back, which is
//! what makes completion side effects fire at most once. A concurrent
//! `delete` decides under the same lock, so exactly one of CANCELLED and
//! COMPLETED wins. Side effects (todo store, notifier) run after every lock
//! has been released.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::clock::{Clock, SystemClock};
use super::entity::Timer;
use super::error::{SideEffect, TimerError};
use super::event::{CompletionReport, TimerEvent};
use crate::notification::Notifier;
use crate::todo::{TodoCompletion, TodoStore};
use crate::types::{TimerId, TimerView};

// ============================================================================
// Constants
// ============================================================================

/// Default poll interval.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Shortest poll interval the poller accepts.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Title used when a timer is added without one.
pub const DEFAULT_TITLE: &str = "Focus Session";

/// Notification title for completed timers.
pub const COMPLETION_TITLE: &str = "Pomodoro Complete!";

type SharedTimer = Arc<Mutex<Timer>>;
type Registry = HashMap<TimerId, SharedTimer>;

// ============================================================================
// ExpiredTimer
// ============================================================================

/// A timer that has just been transitioned to COMPLETED and whose side
/// effects are still pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredTimer {
    pub id: TimerId,
    pub title: String,
    pub total: Duration,
    pub linked_todo: Option<String>,
    seq: u64,
}

// ============================================================================
// TimerManager
// ============================================================================

/// Owns all timers and drives their countdown.
///
/// Configure with the `with_*` methods before cloning the handle.
#[derive(Clone)]
pub struct TimerManager {
    timers: Arc<RwLock<Registry>>,
    next_seq: Arc<AtomicU64>,
    clock: Arc<dyn Clock>,
    todo_store: Option<Arc<dyn TodoStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    events: Option<mpsc::UnboundedSender<TimerEvent>>,
    tick_interval: Duration,
    default_title: String,
}

impl TimerManager {
    /// Creates an empty manager on the system clock, with no collaborators.
    #[must_use]
    pub fn new() -> Self {
        Self {
            timers: Arc::new(RwLock::new(HashMap::new())),
            next_seq: Arc::new(AtomicU64::new(0)),
            clock: Arc::new(SystemClock),
            todo_store: None,
            notifier: None,
            events: None,
            tick_interval: DEFAULT_TICK_INTERVAL,
            default_title: DEFAULT_TITLE.to_string(),
        }
    }

    /// Uses the given clock instead of the system clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets how often the poller checks for expired timers, raised to at
    /// least [`MIN_TICK_INTERVAL`].
    #[must_use]
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval.max(MIN_TICK_INTERVAL);
        self
    }

    /// Sets the title used for untitled timers.
    ///
    /// A blank title keeps [`DEFAULT_TITLE`].
    #[must_use]
    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.default_title = match title.trim() {
            "" => DEFAULT_TITLE.to_string(),
            trimmed => trimmed.to_string(),
        };
        self
    }

    /// Marks linked todos complete in `store` when their timer completes.
    #[must_use]
    pub fn with_todo_store(mut self, store: Arc<dyn TodoStore>) -> Self {
        self.todo_store = Some(store);
        self
    }

    /// Sends completion notifications through `notifier`.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Publishes [`TimerEvent`]s on `events`.
    #[must_use]
    pub fn with_events(mut self, events: mpsc::UnboundedSender<TimerEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Poll interval used by [`TimerManager::run`].
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Creates and starts a new timer.
    ///
    /// An empty title is replaced by the default title.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidDuration`] for a zero duration.
    pub fn add(
        &self,
        duration: Duration,
        title: &str,
        linked_todo: Option<String>,
    ) -> Result<TimerId, TimerError> {
        if duration.is_zero() {
            return Err(TimerError::InvalidDuration(
                "duration must be positive".to_string(),
            ));
        }

        let title = match title.trim() {
            "" => self.default_title.clone(),
            trimmed => trimmed.to_string(),
        };
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);

        let mut timers = self.registry_write();
        let id = Self::fresh_id(&timers);
        let timer = Timer::new(
            id.clone(),
            title.clone(),
            duration,
            linked_todo,
            seq,
            self.clock.now(),
        );
        timers.insert(id.clone(), Arc::new(Mutex::new(timer)));
        drop(timers);

        tracing::info!("Timer {} '{}' started ({:?})", id, title, duration);
        self.emit(TimerEvent::Started {
            id: id.clone(),
            title,
            total: duration,
        });
        Ok(id)
    }

    /// Creates and starts a timer of `minutes` minutes.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidDuration`] if `minutes` is not positive.
    pub fn add_minutes(
        &self,
        minutes: i64,
        title: &str,
        linked_todo: Option<String>,
    ) -> Result<TimerId, TimerError> {
        self.add(minutes_to_duration(minutes)?, title, linked_todo)
    }

    /// Pauses a running timer.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::NotFound`] for an unknown id and
    /// [`TimerError::InvalidState`] unless the timer is running.
    pub fn pause(&self, id: &str) -> Result<TimerView, TimerError> {
        let shared = self.resolve(id)?;
        let mut timer = lock(&shared);
        let now = self.clock.now();
        timer.pause(now)?;

        let view = timer.view(now);
        tracing::info!("Timer {} paused with {:?} left", view.id, view.remaining);
        self.emit(TimerEvent::Paused {
            id: view.id.clone(),
            remaining: view.remaining,
        });
        Ok(view)
    }

    /// Resumes a paused timer.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::NotFound`] for an unknown id and
    /// [`TimerError::InvalidState`] unless the timer is paused.
    pub fn resume(&self, id: &str) -> Result<TimerView, TimerError> {
        let shared = self.resolve(id)?;
        let mut timer = lock(&shared);
        let now = self.clock.now();
        timer.resume(now)?;

        let view = timer.view(now);
        tracing::info!("Timer {} resumed with {:?} left", view.id, view.remaining);
        self.emit(TimerEvent::Resumed {
            id: view.id.clone(),
            remaining: view.remaining,
        });
        Ok(view)
    }

    /// Cancels a timer. Deleting a finished timer is a no-op.
    ///
    /// The timer stays queryable until [`TimerManager::clear_finished`].
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::NotFound`] for an unknown id.
    pub fn delete(&self, id: &str) -> Result<TimerView, TimerError> {
        let shared = self.resolve(id)?;
        let mut timer = lock(&shared);
        let now = self.clock.now();

        if timer.cancel(now) {
            tracing::info!("Timer {} cancelled", timer.id());
            self.emit(TimerEvent::Cancelled {
                id: timer.id().clone(),
            });
        } else {
            tracing::debug!("Timer {} already {}, delete ignored", timer.id(), timer.status());
        }
        Ok(timer.view(now))
    }

    /// Removes completed and cancelled timers. Returns how many were removed.
    pub fn clear_finished(&self) -> usize {
        let mut timers = self.registry_write();
        let before = timers.len();
        timers.retain(|_, timer| !lock(timer).status().is_terminal());
        let removed = before - timers.len();
        tracing::debug!("Cleared {} finished timer(s)", removed);
        removed
    }

    /// Cancels every live timer without firing completion side effects.
    ///
    /// Used on shutdown. Returns how many timers were cancelled.
    pub fn cancel_all(&self) -> usize {
        let timers = self.registry_read();
        let mut cancelled = 0;
        for shared in timers.values() {
            let mut timer = lock(shared);
            if timer.cancel(self.clock.now()) {
                cancelled += 1;
                self.emit(TimerEvent::Cancelled {
                    id: timer.id().clone(),
                });
            }
        }
        if cancelled > 0 {
            tracing::info!("Cancelled {} timer(s)", cancelled);
        }
        cancelled
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Returns a consistent copy of every timer, oldest first.
    ///
    /// All timers are locked together and read against a single clock
    /// reading, so the result reflects one instant and never shows a
    /// half-applied command.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TimerView> {
        let timers = self.registry_read();
        let mut guards: Vec<MutexGuard<'_, Timer>> = timers.values().map(|t| lock(t)).collect();
        guards.sort_by_key(|timer| timer.seq());

        let now = self.clock.now();
        guards.iter().map(|timer| timer.view(now)).collect()
    }

    /// Running and paused timers, oldest first.
    #[must_use]
    pub fn active(&self) -> Vec<TimerView> {
        self.snapshot()
            .into_iter()
            .filter(TimerView::is_active)
            .collect()
    }

    /// Returns true if any timer is running or paused.
    #[must_use]
    pub fn has_active(&self) -> bool {
        self.registry_read()
            .values()
            .any(|timer| lock(timer).status().is_active())
    }

    /// Returns one timer.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::NotFound`] for an unknown id.
    pub fn get(&self, id: &str) -> Result<TimerView, TimerError> {
        let shared = self.resolve(id)?;
        let timer = lock(&shared);
        Ok(timer.view(self.clock.now()))
    }

    /// Number of timers held, finished ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry_read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry_read().is_empty()
    }

    // ------------------------------------------------------------------------
    // Completion
    // ------------------------------------------------------------------------

    /// Transitions every expired running timer to COMPLETED.
    ///
    /// Each returned entry is produced exactly once per timer, no matter
    /// how many callers poll concurrently.
    #[must_use]
    pub fn collect_expired(&self) -> Vec<ExpiredTimer> {
        let timers = self.registry_read();
        let mut expired = Vec::new();

        for shared in timers.values() {
            let mut timer = lock(shared);
            if timer.complete(self.clock.now()) {
                tracing::info!("Timer {} '{}' completed", timer.id(), timer.title());
                expired.push(ExpiredTimer {
                    id: timer.id().clone(),
                    title: timer.title().to_string(),
                    total: timer.total(),
                    linked_todo: timer.linked_todo().map(String::from),
                    seq: timer.seq(),
                });
            }
        }

        expired.sort_by_key(|timer| timer.seq);
        expired
    }

    /// Runs the completion side effects for timers returned by
    /// [`TimerManager::collect_expired`] and publishes `Completed` events.
    ///
    /// May block on the notifier or the todo store; must not be called
    /// while holding any manager lock.
    pub fn dispatch_completions(&self, expired: Vec<ExpiredTimer>) -> Vec<CompletionReport> {
        expired
            .into_iter()
            .map(|timer| {
                let report = self.run_side_effects(timer);
                self.emit(TimerEvent::Completed(report.clone()));
                report
            })
            .collect()
    }

    /// Completes expired timers and runs their side effects in one call.
    pub fn poll_expired(&self) -> Vec<CompletionReport> {
        let expired = self.collect_expired();
        if expired.is_empty() {
            return Vec::new();
        }
        self.dispatch_completions(expired)
    }

    /// Polls for expired timers forever at the configured interval.
    ///
    /// Side effects run on the blocking thread pool, one task per timer,
    /// and are not awaited: a slow notifier or todo store neither stalls
    /// the runtime nor delays the completion of other timers.
    pub async fn run(&self) {
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            for timer in self.collect_expired() {
                self.spawn_dispatch(timer);
            }
        }
    }

    /// Spawns [`TimerManager::run`] on the current tokio runtime.
    ///
    /// Abort the returned handle to stop polling.
    pub fn spawn_poller(&self) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move { manager.run().await })
    }

    fn spawn_dispatch(&self, timer: ExpiredTimer) {
        let manager = self.clone();
        let id = timer.id.clone();
        let dispatch =
            tokio::task::spawn_blocking(move || manager.dispatch_completions(vec![timer]));
        tokio::spawn(async move {
            if let Err(e) = dispatch.await {
                tracing::error!("Completion side effects for timer {} aborted: {}", id, e);
            }
        });
    }

    fn run_side_effects(&self, timer: ExpiredTimer) -> CompletionReport {
        let mut warnings = Vec::new();

        let notifier = self.notifier.as_ref().filter(|notifier| {
            let available = notifier.is_available();
            if !available {
                tracing::debug!("Notifier unavailable, skipping notification for {}", timer.id);
            }
            available
        });
        if let Some(notifier) = notifier {
            let message = format!("'{}' finished! Time for a break.", timer.title);
            if let Err(e) = notifier.notify(COMPLETION_TITLE, &message) {
                tracing::warn!("Failed to send notification for timer {}: {}", timer.id, e);
                warnings.push(TimerError::SideEffect {
                    effect: SideEffect::Notification,
                    message: e.to_string(),
                });
            }
        }

        let todo = match (&timer.linked_todo, &self.todo_store) {
            (Some(todo_id), Some(store)) => match store.mark_complete(todo_id) {
                Ok(outcome) => {
                    if outcome == TodoCompletion::NotFound {
                        tracing::debug!("Linked todo {} no longer exists", todo_id);
                    }
                    Some(outcome)
                }
                Err(e) => {
                    tracing::warn!("Failed to complete linked todo {}: {}", todo_id, e);
                    warnings.push(TimerError::SideEffect {
                        effect: SideEffect::LinkedTodo,
                        message: e.to_string(),
                    });
                    None
                }
            },
            _ => None,
        };

        CompletionReport {
            id: timer.id,
            title: timer.title,
            total: timer.total,
            linked_todo: timer.linked_todo,
            todo,
            warnings,
        }
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    /// Finds a timer by exact id or unique prefix.
    fn resolve(&self, id: &str) -> Result<SharedTimer, TimerError> {
        let timers = self.registry_read();
        if let Some(timer) = timers.get(id) {
            return Ok(Arc::clone(timer));
        }

        let mut matches = timers.iter().filter(|(key, _)| key.matches_prefix(id));
        match (matches.next(), matches.next()) {
            (Some((_, timer)), None) => Ok(Arc::clone(timer)),
            (Some(_), Some(_)) => Err(TimerError::AmbiguousId(id.to_string())),
            (None, _) => Err(TimerError::NotFound(id.to_string())),
        }
    }

    /// Generates an id whose short form is not used by any held timer.
    fn fresh_id(timers: &Registry) -> TimerId {
        loop {
            let candidate = TimerId::generate();
            if !timers.keys().any(|id| id.short() == candidate.short()) {
                return candidate;
            }
        }
    }

    fn emit(&self, event: TimerEvent) {
        if let Some(events) = &self.events {
            if events.send(event).is_err() {
                tracing::debug!("Timer event receiver dropped");
            }
        }
    }

    fn registry_read(&self) -> RwLockReadGuard<'_, Registry> {
        self.timers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn registry_write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.timers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TimerManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Locks one timer. Every critical section leaves the timer consistent,
/// so a poisoned lock is still safe to use.
fn lock(timer: &SharedTimer) -> MutexGuard<'_, Timer> {
    timer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Converts a signed minute count into a duration.
///
/// # Errors
///
/// Returns [`TimerError::InvalidDuration`] for zero, negative, or
/// overflowing values.
pub fn minutes_to_duration(minutes: i64) -> Result<Duration, TimerError> {
    if minutes <= 0 {
        return Err(TimerError::InvalidDuration(format!(
            "{} minutes; duration must be positive",
            minutes
        )));
    }
    u64::try_from(minutes)
        .ok()
        .and_then(|m| m.checked_mul(60))
        .map(Duration::from_secs)
        .ok_or_else(|| TimerError::InvalidDuration(format!("{} minutes is too long", minutes)))
}

// ============================================================================
// Tests
// ============================================================================
