//! Persisted todo list.
//!
//! This module provides:
//! - The [`Todo`] record stored in `todos.json`
//! - The [`TodoStore`] trait the timer manager uses to complete linked todos
//! - [`TodoManager`], the file-backed implementation
//! - [`MockTodoStore`] for tests

pub mod error;
pub mod storage;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub use self::error::TodoError;
pub use self::storage::{Storage, TODOS_FILE};

use crate::types::short_uuid;

// ============================================================================
// Todo
// ============================================================================

/// One todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Local>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Local>>,
    /// Length of the timer started for this todo, in minutes.
    #[serde(default)]
    pub timer_minutes: Option<u32>,
}

impl Todo {
    /// Creates a pending todo with a fresh id.
    pub fn new(title: impl Into<String>, timer_minutes: Option<u32>) -> Self {
        Self {
            id: short_uuid(),
            title: title.into(),
            completed: false,
            created_at: Local::now(),
            completed_at: None,
            timer_minutes,
        }
    }

    /// Marks the todo completed. Returns false if it already was.
    pub fn mark_complete(&mut self) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        self.completed_at = Some(Local::now());
        true
    }

    /// Returns true if `id` equals this todo's id or is a prefix of it.
    #[must_use]
    pub fn matches(&self, id: &str) -> bool {
        !id.is_empty() && self.id.starts_with(id)
    }
}

// ============================================================================
// TodoStore
// ============================================================================

/// Result of completing a linked todo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoCompletion {
    /// The todo was pending and is now completed
    Completed { title: String },
    /// The todo had already been completed
    AlreadyCompleted { title: String },
    /// No todo has this id
    NotFound,
}

/// Store the timer manager completes linked todos in.
pub trait TodoStore: Send + Sync {
    /// Marks a todo completed.
    ///
    /// An unknown id is reported as [`TodoCompletion::NotFound`], not as an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error if the change could not be persisted.
    fn mark_complete(&self, id: &str) -> Result<TodoCompletion, TodoError>;
}

/// Todo totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodoCounts {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
}

// ============================================================================
// TodoManager
// ============================================================================

/// File-backed todo list.
///
/// Every mutation is applied to a copy of the list, saved, and only then
/// committed, so memory and disk never disagree after a failed write.
#[derive(Debug)]
pub struct TodoManager {
    storage: Storage,
    todos: Mutex<Vec<Todo>>,
}

impl TodoManager {
    /// Loads the list from `storage`.
    ///
    /// # Errors
    ///
    /// Returns an error if the todo file exists but cannot be read.
    pub fn new(storage: Storage) -> Result<Self, TodoError> {
        let todos = storage.load()?;
        tracing::debug!(
            "Loaded {} todo(s) from {}",
            todos.len(),
            storage.path().display()
        );
        Ok(Self {
            storage,
            todos: Mutex::new(todos),
        })
    }

    /// Opens the list stored in `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the todo file exists but cannot be read.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, TodoError> {
        Self::new(Storage::new(data_dir))
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Re-reads the list from disk, discarding the in-memory copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the todo file cannot be read.
    pub fn reload(&self) -> Result<(), TodoError> {
        let todos = self.storage.load()?;
        *self.lock() = todos;
        Ok(())
    }

    /// Adds a pending todo.
    ///
    /// # Errors
    ///
    /// Returns an error if the list could not be saved.
    pub fn add(&self, title: &str, timer_minutes: Option<u32>) -> Result<Todo, TodoError> {
        let todo = Todo::new(title.trim(), timer_minutes);
        self.update(|todos| {
            todos.push(todo.clone());
            Ok(())
        })?;
        tracing::info!("Todo {} '{}' added", todo.id, todo.title);
        Ok(todo)
    }

    /// Marks a todo completed. Completing a completed todo changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::NotFound`] for an unknown id, or an error if the
    /// list could not be saved.
    pub fn complete(&self, id: &str) -> Result<Todo, TodoError> {
        let todo = self.update(|todos| {
            let todo = find_mut(todos, id)?;
            todo.mark_complete();
            Ok(todo.clone())
        })?;
        tracing::info!("Todo {} '{}' completed", todo.id, todo.title);
        Ok(todo)
    }

    /// Removes a todo and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::NotFound`] for an unknown id, or an error if the
    /// list could not be saved.
    pub fn delete(&self, id: &str) -> Result<Todo, TodoError> {
        let todo = self.update(|todos| {
            let index = position(todos, id).ok_or_else(|| TodoError::NotFound(id.to_string()))?;
            Ok(todos.remove(index))
        })?;
        tracing::info!("Todo {} '{}' deleted", todo.id, todo.title);
        Ok(todo)
    }

    /// Looks up a todo by exact id or prefix.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Todo> {
        let todos = self.lock();
        find(&todos, id).cloned()
    }

    #[must_use]
    pub fn list_all(&self) -> Vec<Todo> {
        self.lock().clone()
    }

    #[must_use]
    pub fn list_pending(&self) -> Vec<Todo> {
        self.lock().iter().filter(|t| !t.completed).cloned().collect()
    }

    #[must_use]
    pub fn list_completed(&self) -> Vec<Todo> {
        self.lock().iter().filter(|t| t.completed).cloned().collect()
    }

    /// Removes completed todos and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the list could not be saved.
    pub fn clear_completed(&self) -> Result<usize, TodoError> {
        let removed = self.update(|todos| {
            let before = todos.len();
            todos.retain(|todo| !todo.completed);
            Ok(before - todos.len())
        })?;
        tracing::info!("Cleared {} completed todo(s)", removed);
        Ok(removed)
    }

    #[must_use]
    pub fn count(&self) -> TodoCounts {
        let todos = self.lock();
        let completed = todos.iter().filter(|t| t.completed).count();
        TodoCounts {
            total: todos.len(),
            pending: todos.len() - completed,
            completed,
        }
    }

    /// Applies `change` to a copy of the list, saves it, then commits it.
    ///
    /// The file is left untouched when `change` leaves the list as it was.
    fn update<T>(
        &self,
        change: impl FnOnce(&mut Vec<Todo>) -> Result<T, TodoError>,
    ) -> Result<T, TodoError> {
        let mut todos = self.lock();
        let mut next = todos.clone();
        let result = change(&mut next)?;
        if next != *todos {
            self.storage.save(&next)?;
            *todos = next;
        }
        Ok(result)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Todo>> {
        self.todos.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TodoStore for TodoManager {
    fn mark_complete(&self, id: &str) -> Result<TodoCompletion, TodoError> {
        let outcome = self.update(|todos| {
            let todo = match find_mut(todos, id) {
                Ok(todo) => todo,
                Err(_) => return Ok(TodoCompletion::NotFound),
            };
            let title = todo.title.clone();
            if todo.mark_complete() {
                Ok(TodoCompletion::Completed { title })
            } else {
                Ok(TodoCompletion::AlreadyCompleted { title })
            }
        })?;
        if let TodoCompletion::Completed { title } = &outcome {
            tracing::info!("Linked todo {} '{}' completed", id, title);
        }
        Ok(outcome)
    }
}

/// Index of the todo with this exact id, else of the first prefix match.
fn position(todos: &[Todo], id: &str) -> Option<usize> {
    todos
        .iter()
        .position(|todo| todo.id == id)
        .or_else(|| todos.iter().position(|todo| todo.matches(id)))
}

fn find<'a>(todos: &'a [Todo], id: &str) -> Option<&'a Todo> {
    position(todos, id).map(|index| &todos[index])
}

fn find_mut<'a>(todos: &'a mut [Todo], id: &str) -> Result<&'a mut Todo, TodoError> {
    let index = position(todos, id).ok_or_else(|| TodoError::NotFound(id.to_string()))?;
    Ok(&mut todos[index])
}

// ============================================================================
// MockTodoStore
// ============================================================================

/// In-memory [`TodoStore`] that records every call.
#[derive(Debug, Default)]
pub struct MockTodoStore {
    todos: Mutex<Vec<(String, String, bool)>>,
    calls: Mutex<Vec<String>>,
    should_fail: AtomicBool,
}

impl MockTodoStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pending todo.
    pub fn insert(&self, id: &str, title: &str) {
        lock(&self.todos).push((id.to_string(), title.to_string(), false));
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Ids passed to `mark_complete`, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Returns true if the todo exists and is completed.
    #[must_use]
    pub fn is_completed(&self, id: &str) -> bool {
        lock(&self.todos)
            .iter()
            .any(|(todo_id, _, completed)| todo_id == id && *completed)
    }
}

impl TodoStore for MockTodoStore {
    fn mark_complete(&self, id: &str) -> Result<TodoCompletion, TodoError> {
        lock(&self.calls).push(id.to_string());
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(TodoError::io(
                "mock",
                std::io::Error::other("Mock failure"),
            ));
        }

        let mut todos = lock(&self.todos);
        let Some((_, title, completed)) = todos.iter_mut().find(|(todo_id, _, _)| todo_id == id)
        else {
            return Ok(TodoCompletion::NotFound);
        };
        let title = title.clone();
        if *completed {
            return Ok(TodoCompletion::AlreadyCompleted { title });
        }
        *completed = true;
        Ok(TodoCompletion::Completed { title })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_manager() -> (TodoManager, TempDir) {
        let dir = TempDir::new().unwrap();
        let manager = TodoManager::open(dir.path()).unwrap();
        (manager, dir)
    }

    mod todo_tests {
        use super::*;

        #[test]
        fn test_new_todo_is_pending() {
            let todo = Todo::new("Write report", Some(25));

            assert_eq!(todo.id.len(), 8);
            assert!(!todo.completed);
            assert_eq!(todo.completed_at, None);
            assert_eq!(todo.timer_minutes, Some(25));
        }

        #[test]
        fn test_mark_complete_once() {
            let mut todo = Todo::new("Write report", None);

            assert!(todo.mark_complete());
            let first = todo.completed_at;
            assert!(!todo.mark_complete());

            assert!(todo.completed);
            assert_eq!(todo.completed_at, first);
        }

        #[test]
        fn test_matches_prefix() {
            let mut todo = Todo::new("a", None);
            todo.id = "abcdef12".to_string();

            assert!(todo.matches("abc"));
            assert!(todo.matches("abcdef12"));
            assert!(!todo.matches("x"));
            assert!(!todo.matches(""));
        }

        #[test]
        fn test_deserialize_with_missing_optional_fields() {
            let json = r#"{"id":"abcdef12","title":"Old","created_at":"2024-01-01T09:00:00+00:00"}"#;
            let todo: Todo = serde_json::from_str(json).unwrap();

            assert!(!todo.completed);
            assert_eq!(todo.timer_minutes, None);
        }
    }

    mod manager_tests {
        use super::*;

        #[test]
        fn test_add_persists() {
            let (manager, dir) = create_manager();

            let todo = manager.add("  Write report  ", Some(25)).unwrap();
            assert_eq!(todo.title, "Write report");

            let reopened = TodoManager::open(dir.path()).unwrap();
            assert_eq!(reopened.list_all(), vec![todo]);
        }

        #[test]
        fn test_complete_by_prefix() {
            let (manager, _dir) = create_manager();
            let todo = manager.add("Write report", None).unwrap();

            let done = manager.complete(&todo.id[..4]).unwrap();

            assert_eq!(done.id, todo.id);
            assert!(done.completed);
            assert!(done.completed_at.is_some());
        }

        #[test]
        fn test_complete_unknown_is_not_found() {
            let (manager, _dir) = create_manager();
            let err = manager.complete("missing").unwrap_err();
            assert!(matches!(err, TodoError::NotFound(_)));
        }

        #[test]
        fn test_delete() {
            let (manager, _dir) = create_manager();
            let a = manager.add("a", None).unwrap();
            let b = manager.add("b", None).unwrap();

            let deleted = manager.delete(&a.id).unwrap();

            assert_eq!(deleted.id, a.id);
            assert_eq!(manager.list_all(), vec![b]);
            assert!(matches!(
                manager.delete(&a.id),
                Err(TodoError::NotFound(_))
            ));
        }

        #[test]
        fn test_lists_and_counts() {
            let (manager, _dir) = create_manager();
            let a = manager.add("a", None).unwrap();
            manager.add("b", None).unwrap();
            manager.add("c", None).unwrap();
            manager.complete(&a.id).unwrap();

            assert_eq!(manager.list_pending().len(), 2);
            assert_eq!(manager.list_completed().len(), 1);
            assert_eq!(
                manager.count(),
                TodoCounts {
                    total: 3,
                    pending: 2,
                    completed: 1
                }
            );
        }

        #[test]
        fn test_clear_completed() {
            let (manager, dir) = create_manager();
            let a = manager.add("a", None).unwrap();
            let b = manager.add("b", None).unwrap();
            manager.complete(&a.id).unwrap();

            assert_eq!(manager.clear_completed().unwrap(), 1);
            assert_eq!(manager.clear_completed().unwrap(), 0);

            let reopened = TodoManager::open(dir.path()).unwrap();
            assert_eq!(reopened.list_all(), vec![b]);
        }

        #[test]
        fn test_get() {
            let (manager, _dir) = create_manager();
            let todo = manager.add("a", None).unwrap();

            assert_eq!(manager.get(&todo.id), Some(todo));
            assert_eq!(manager.get("zzzzzzzz"), None);
        }

        #[test]
        fn test_reload_picks_up_external_changes() {
            let (manager, dir) = create_manager();
            let other = TodoManager::open(dir.path()).unwrap();
            other.add("from elsewhere", None).unwrap();

            assert!(manager.list_all().is_empty());
            manager.reload().unwrap();
            assert_eq!(manager.list_all().len(), 1);
        }

        #[test]
        fn test_failed_save_keeps_memory_unchanged() {
            let dir = TempDir::new().unwrap();
            let data_dir = dir.path().join("data");
            let manager = TodoManager::open(&data_dir).unwrap();
            std::fs::write(&data_dir, "file, not a directory").unwrap();

            assert!(manager.add("a", None).is_err());
            assert!(manager.list_all().is_empty());
        }

        #[test]
        fn test_unchanged_list_is_not_saved() {
            let dir = TempDir::new().unwrap();
            let data_dir = dir.path().join("data");
            let manager = TodoManager::open(&data_dir).unwrap();
            let todo = manager.add("Write report", None).unwrap();
            manager.complete(&todo.id).unwrap();

            // Any save from here on would fail.
            std::fs::remove_dir_all(&data_dir).unwrap();
            std::fs::write(&data_dir, "file, not a directory").unwrap();

            assert_eq!(
                manager.mark_complete(&todo.id).unwrap(),
                TodoCompletion::AlreadyCompleted {
                    title: "Write report".to_string()
                }
            );
            assert_eq!(
                manager.mark_complete("missing").unwrap(),
                TodoCompletion::NotFound
            );
            assert!(manager.complete(&todo.id).unwrap().completed);
            assert!(manager.clear_completed().is_err());
        }
    }

    mod store_tests {
        use super::*;

        #[test]
        fn test_mark_complete_outcomes() {
            let (manager, _dir) = create_manager();
            let todo = manager.add("Write report", None).unwrap();

            assert_eq!(
                manager.mark_complete(&todo.id).unwrap(),
                TodoCompletion::Completed {
                    title: "Write report".to_string()
                }
            );
            assert_eq!(
                manager.mark_complete(&todo.id).unwrap(),
                TodoCompletion::AlreadyCompleted {
                    title: "Write report".to_string()
                }
            );
            assert_eq!(
                manager.mark_complete("missing").unwrap(),
                TodoCompletion::NotFound
            );
        }

        #[test]
        fn test_mock_store() {
            let store = MockTodoStore::new();
            store.insert("t1", "Write report");

            assert_eq!(
                store.mark_complete("t1").unwrap(),
                TodoCompletion::Completed {
                    title: "Write report".to_string()
                }
            );
            assert!(store.is_completed("t1"));
            assert_eq!(store.mark_complete("t2").unwrap(), TodoCompletion::NotFound);
            assert_eq!(store.calls(), vec!["t1".to_string(), "t2".to_string()]);

            store.set_should_fail(true);
            assert!(store.mark_complete("t1").is_err());
        }
    }
}
