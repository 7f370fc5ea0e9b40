//! Actions for the todo list.
//!
//! The action set is a closed sum type, exhaustively matched by the
//! reducer. The original widget dispatched on `type` strings and silently
//! swallowed unknown tags; here an unknown action cannot be constructed in
//! the first place.

use crate::types::{TodoId, TodoItem};

/// Everything that can be asked of the todo store
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TodoAction {
    /// Replace the whole list (hydration)
    Set(Vec<TodoItem>),

    /// Append one item to the list
    Add(TodoItem),

    /// Drop the item with this id
    Remove(TodoId),

    /// Flip `complete` on the item with this id
    Toggle(TodoId),

    /// Read the persisted list and feed it back as [`TodoAction::Set`]
    ///
    /// The one deferred action the application uses: the reducer leaves
    /// state untouched and returns a future effect that does the read.
    Load,
}

/// Action creators
///
/// Pure constructors from user-level intent to an action value. No
/// validation happens here - non-empty text is the caller's contract.
impl TodoAction {
    /// Replace the whole list
    #[must_use]
    pub const fn set(todos: Vec<TodoItem>) -> Self {
        Self::Set(todos)
    }

    /// Append an item
    #[must_use]
    pub const fn add(item: TodoItem) -> Self {
        Self::Add(item)
    }

    /// Remove the item with this id
    #[must_use]
    pub const fn remove(id: TodoId) -> Self {
        Self::Remove(id)
    }

    /// Toggle the item with this id
    #[must_use]
    pub const fn toggle(id: TodoId) -> Self {
        Self::Toggle(id)
    }
}
