//! Domain types for the todo application.
//!
//! A todo list is an ordered sequence of items. Items keep insertion order:
//! append on add, in-place flip on toggle, and removal is the only other
//! way the sequence changes.

use serde::{Deserialize, Serialize};

/// Unique identifier for a todo item
///
/// Monotonic within a process; allocation goes through an injected
/// [`IdGenerator`](todoflow_core::environment::IdGenerator), never a
/// module-level counter. Serializes as a bare number so persisted blobs
/// stay compatible with the `{id, text, complete}` layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(u64);

impl TodoId {
    /// Creates a `TodoId` from a raw value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single todo item
///
/// Exactly the persisted field set: created by add, `complete` flipped
/// only by toggle, removed only by remove. Text is never edited.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Unique identifier
    pub id: TodoId,
    /// What needs to be done (non-empty, enforced by the caller)
    pub text: String,
    /// Whether the item is checked off
    pub complete: bool,
}

impl TodoItem {
    /// Creates a new, incomplete todo item
    #[must_use]
    pub const fn new(id: TodoId, text: String) -> Self {
        Self {
            id,
            text,
            complete: false,
        }
    }

    /// Flips the completion flag
    pub const fn toggle(&mut self) {
        self.complete = !self.complete;
    }
}

/// State of the todo list
///
/// The single in-memory state object. It is only ever replaced through
/// the store's reducer; nothing mutates it from the outside.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TodoState {
    /// All todos, in insertion order
    pub todos: Vec<TodoItem>,
}

impl TodoState {
    /// Creates a new empty todo state
    #[must_use]
    pub const fn new() -> Self {
        Self { todos: Vec::new() }
    }

    /// Returns the number of todos
    #[must_use]
    pub fn count(&self) -> usize {
        self.todos.len()
    }

    /// Returns the number of completed todos
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|t| t.complete).count()
    }

    /// Returns a todo by id
    #[must_use]
    pub fn get(&self, id: TodoId) -> Option<&TodoItem> {
        self.todos.iter().find(|t| t.id == id)
    }

    /// Checks whether a todo with this id exists
    #[must_use]
    pub fn exists(&self, id: TodoId) -> bool {
        self.get(id).is_some()
    }
}
