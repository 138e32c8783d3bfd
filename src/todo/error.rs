//! Todo store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or changing the todo list.
#[derive(Debug, Error)]
pub enum TodoError {
    /// Reading or writing the todo file failed.
    #[error("Todo file error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The todo list could not be encoded.
    #[error("Failed to serialize todos: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No todo has this id (or id prefix).
    #[error("Todo with ID '{0}' not found")]
    NotFound(String),
}

impl TodoError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if retrying the operation may succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Serialization(_))
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Io { .. } => "Check permissions of the data directory or pass --data-dir",
            Self::Serialization(_) => "Report this as a bug",
            Self::NotFound(_) => "Run 'todo list --all' to see todo IDs",
        }
    }
}
