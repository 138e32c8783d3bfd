//! Notification error types.

use thiserror::Error;

/// Errors that can occur when sending a notification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotificationError {
    /// The notification server rejected or failed to deliver the message.
    #[error("Failed to send notification: {0}")]
    SendFailed(String),

    /// No notification server is reachable.
    #[error("Notification service is not available")]
    NotAvailable,
}

impl NotificationError {
    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::SendFailed(_) => "Check that a notification daemon is running",
            Self::NotAvailable => "Run with --no-notify to disable notifications",
        }
    }
}
