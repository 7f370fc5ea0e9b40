//! Persistence adapter: the todo list as a JSON blob under a fixed key.
//!
//! The persisted layout is a JSON array of `{id, text, complete}` records,
//! byte-compatible with the original widget's local-storage entry, under
//! the original's key. Reads fall back to the empty list: an absent blob is
//! a fresh install, a malformed one is logged and discarded rather than
//! taking down startup.

use crate::types::TodoItem;
use todoflow_storage::BlobStore;

/// Storage key for the todo list blob
pub const STORAGE_KEY: &str = "_$_todo";

/// Serializes the todo list to its persisted JSON form
///
/// # Errors
///
/// Returns a `serde_json::Error` if serialization fails, which for this
/// data model only happens on allocation failure.
pub fn encode(todos: &[TodoItem]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(todos)
}

/// Parses a persisted blob back into a todo list
///
/// # Errors
///
/// Returns a `serde_json::Error` if the blob is not a JSON array of
/// `{id, text, complete}` records.
pub fn decode(blob: &[u8]) -> Result<Vec<TodoItem>, serde_json::Error> {
    serde_json::from_slice(blob)
}

/// Reads the persisted todo list, defaulting to empty
///
/// Absent blob: fresh start, no noise. Unreadable or malformed blob:
/// logged at warn and treated as empty.
pub fn load_todos(storage: &dyn BlobStore) -> Vec<TodoItem> {
    let blob = match storage.load(STORAGE_KEY) {
        Ok(Some(blob)) => blob,
        Ok(None) => {
            tracing::debug!(key = STORAGE_KEY, "No persisted todos, starting empty");
            return Vec::new();
        }
        Err(error) => {
            tracing::warn!(key = STORAGE_KEY, %error, "Could not read persisted todos");
            return Vec::new();
        }
    };

    match decode(&blob) {
        Ok(todos) => {
            tracing::debug!(key = STORAGE_KEY, count = todos.len(), "Hydrated todos");
            todos
        }
        Err(error) => {
            tracing::warn!(
                key = STORAGE_KEY,
                %error,
                "Persisted todos are malformed, starting empty"
            );
            Vec::new()
        }
    }
}

/// Writes the todo list back to storage
///
/// Failures are logged and dropped: a failed write never corrupts the
/// in-memory state, and the next change will try again.
pub fn save_todos(storage: &dyn BlobStore, todos: &[TodoItem]) {
    let blob = match encode(todos) {
        Ok(blob) => blob,
        Err(error) => {
            tracing::warn!(key = STORAGE_KEY, %error, "Could not serialize todos");
            return;
        }
    };

    if let Err(error) = storage.save(STORAGE_KEY, &blob) {
        tracing::warn!(key = STORAGE_KEY, %error, "Could not persist todos");
    }
}
