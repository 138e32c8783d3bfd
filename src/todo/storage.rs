//! JSON file persistence for todos.
//!
//! The whole list is stored as one pretty-printed JSON array. Writes go to
//! a sibling temporary file which is then renamed over the target, so a
//! crash mid-write never leaves a truncated file behind.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::error::TodoError;
use super::Todo;

/// File name of the todo list inside the data directory.
pub const TODOS_FILE: &str = "todos.json";

/// Reads and writes `todos.json` in a data directory.
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
    todos_file: PathBuf,
}

impl Storage {
    /// Creates a storage rooted at `data_dir`. Nothing is touched on disk
    /// until the first save.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let todos_file = data_dir.join(TODOS_FILE);
        Self {
            data_dir,
            todos_file,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the todo file.
    pub fn path(&self) -> &Path {
        &self.todos_file
    }

    /// Loads all todos.
    ///
    /// A missing file yields an empty list. A file that does not parse is
    /// logged and also yields an empty list; it is overwritten on the next
    /// save.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Io`] if the file exists but cannot be read.
    pub fn load(&self) -> Result<Vec<Todo>, TodoError> {
        let content = match fs::read_to_string(&self.todos_file) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(TodoError::io(&self.todos_file, e)),
        };

        match serde_json::from_str(&content) {
            Ok(todos) => Ok(todos),
            Err(e) => {
                tracing::warn!(
                    "Ignoring corrupted todo file {}: {}",
                    self.todos_file.display(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    /// Replaces the stored list with `todos`.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Io`] if the directory or file cannot be written.
    pub fn save(&self, todos: &[Todo]) -> Result<(), TodoError> {
        fs::create_dir_all(&self.data_dir).map_err(|e| TodoError::io(&self.data_dir, e))?;

        let json = serde_json::to_string_pretty(todos)?;
        let tmp = self.todos_file.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| TodoError::io(&tmp, e))?;
        fs::rename(&tmp, &self.todos_file).map_err(|e| TodoError::io(&self.todos_file, e))?;

        tracing::debug!("Saved {} todo(s) to {}", todos.len(), self.todos_file.display());
        Ok(())
    }

    /// Removes every stored todo.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Io`] if the file cannot be written.
    pub fn clear(&self) -> Result<(), TodoError> {
        self.save(&[])
    }
}
