//! Todo list application built on the todoflow architecture.
//!
//! The whole application is one unidirectional loop: an input line becomes
//! an action, the action runs through the reducer inside the store, the new
//! state is rendered, and every change to the list is written back to blob
//! storage under a fixed key. It demonstrates:
//!
//! - A sum-type action set, exhaustively matched (a malformed action is
//!   unrepresentable, not a silent no-op)
//! - Persistence as reducer effects rather than hidden I/O
//! - Injected id generation (no global counter)
//! - Testing with `ReducerTest` and proptest
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use todoflow::{TodoAction, TodoEnvironment, TodoId, TodoItem, TodoReducer, TodoState};
//! use todoflow_runtime::Store;
//! use todoflow_storage::FileStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create environment and store
//! let storage = Arc::new(FileStore::new(".todoflow")?);
//! let env = TodoEnvironment::new(storage);
//! let store = Store::new(TodoState::default(), TodoReducer::new(), env);
//!
//! // Hydrate from storage, then add an item
//! store
//!     .send_and_wait_for(
//!         TodoAction::Load,
//!         |a| matches!(a, TodoAction::Set(_)),
//!         Duration::from_secs(5),
//!     )
//!     .await?;
//!
//! store
//!     .send(TodoAction::add(TodoItem::new(TodoId::new(1), "Buy milk".to_string())))
//!     .await?;
//!
//! let count = store.state(|s| s.count()).await;
//! println!("Total todos: {count}");
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod persistence;
pub mod reducer;
pub mod types;
pub mod ui;

// Re-export commonly used types
pub use actions::TodoAction;
pub use reducer::{TodoEnvironment, TodoReducer};
pub use types::{TodoId, TodoItem, TodoState};
