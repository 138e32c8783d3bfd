//! Completion notifications.
//!
//! The timer manager only sees the [`Notifier`] trait. Three sinks ship:
//!
//! - [`DesktopNotifier`]: native desktop notifications via `notify-rust`
//! - [`SilentNotifier`]: drops everything (`--no-notify`)
//! - [`MockNotifier`]: records messages for tests
//!
//! Sending may block on the notification server, so callers run it off the
//! async runtime.

pub mod error;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub use self::error::NotificationError;

/// Application name shown by the notification server.
pub const APP_NAME: &str = "pomo";

/// How long a desktop notification stays on screen, in milliseconds.
pub const NOTIFICATION_TIMEOUT_MS: u32 = 10_000;

/// A sink for user-facing notifications.
pub trait Notifier: Send + Sync {
    /// Shows one notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification could not be delivered.
    fn notify(&self, title: &str, message: &str) -> Result<(), NotificationError>;

    /// Returns true if notifications can currently be shown.
    fn is_available(&self) -> bool;
}

// ============================================================================
// DesktopNotifier
// ============================================================================

/// Sends notifications to the desktop notification server.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopNotifier;

impl DesktopNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<(), NotificationError> {
        notify_rust::Notification::new()
            .summary(title)
            .body(message)
            .appname(APP_NAME)
            .timeout(notify_rust::Timeout::Milliseconds(NOTIFICATION_TIMEOUT_MS))
            .show()
            .map(|_| ())
            .map_err(|e| NotificationError::SendFailed(e.to_string()))?;

        tracing::debug!("Notification sent: {}", title);
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }
}

// ============================================================================
// SilentNotifier
// ============================================================================

/// Notifier that discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, title: &str, _message: &str) -> Result<(), NotificationError> {
        tracing::debug!("Notification suppressed: {}", title);
        Ok(())
    }

    fn is_available(&self) -> bool {
        false
    }
}

// ============================================================================
// MockNotifier
// ============================================================================

/// Records notifications instead of showing them.
#[derive(Debug)]
pub struct MockNotifier {
    notifications: Mutex<Vec<(String, String)>>,
    available: AtomicBool,
    should_fail: AtomicBool,
}

impl MockNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            notifications: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
            should_fail: AtomicBool::new(false),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Recorded `(title, message)` pairs, oldest first.
    #[must_use]
    pub fn get_notifications(&self) -> Vec<(String, String)> {
        self.recorded().clone()
    }

    #[must_use]
    pub fn notification_count(&self) -> usize {
        self.recorded().len()
    }

    pub fn clear_recorded(&self) {
        self.recorded().clear();
    }

    fn recorded(&self) -> MutexGuard<'_, Vec<(String, String)>> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for MockNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<(), NotificationError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(NotificationError::SendFailed("Mock failure".to_string()));
        }
        self.recorded().push((title.to_string(), message.to_string()));
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
