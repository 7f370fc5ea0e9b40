//! Reducer logic for the todo list.
//!
//! The only business logic in the system: four list transitions plus the
//! deferred hydration read. Every branch that changes the list also
//! schedules a write-back effect, mirroring the original widget's
//! write-on-every-change behavior, but as an explicit effect instead of
//! hidden I/O.

use crate::actions::TodoAction;
use crate::persistence;
use crate::types::TodoState;
use std::sync::Arc;
use todoflow_core::effect::{Effect, Effects};
use todoflow_core::reducer::Reducer;
use todoflow_core::smallvec;
use todoflow_storage::BlobStore;

/// Environment dependencies for the todo reducer
#[derive(Clone)]
pub struct TodoEnvironment {
    /// Blob storage holding the persisted todo list
    pub storage: Arc<dyn BlobStore>,
}

impl TodoEnvironment {
    /// Creates a new `TodoEnvironment`
    #[must_use]
    pub fn new(storage: Arc<dyn BlobStore>) -> Self {
        Self { storage }
    }
}

/// Reducer for the todo list
#[derive(Clone, Debug)]
pub struct TodoReducer;

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Effect that writes the current list back to storage
    ///
    /// Captures a snapshot of the todos; the write happens off the reducer
    /// path. Overlapping writes are last-write-wins.
    fn persist(state: &TodoState, env: &TodoEnvironment) -> Effect<TodoAction> {
        let todos = state.todos.clone();
        let storage = Arc::clone(&env.storage);
        Effect::Future(Box::pin(async move {
            persistence::save_todos(storage.as_ref(), &todos);
            None
        }))
    }
}

impl Default for TodoReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for TodoReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects<Self::Action> {
        match action {
            TodoAction::Set(todos) => {
                state.todos = todos;
                smallvec![Self::persist(state, env)]
            }

            TodoAction::Add(item) => {
                state.todos.push(item);
                smallvec![Self::persist(state, env)]
            }

            TodoAction::Remove(id) => {
                state.todos.retain(|todo| todo.id != id);
                smallvec![Self::persist(state, env)]
            }

            TodoAction::Toggle(id) => {
                match state.todos.iter_mut().find(|todo| todo.id == id) {
                    Some(todo) => todo.toggle(),
                    None => tracing::trace!(%id, "Toggle for unknown id, list unchanged"),
                }
                smallvec![Self::persist(state, env)]
            }

            TodoAction::Load => {
                // State untouched; the read happens in the effect and feeds
                // back a Set.
                let storage = Arc::clone(&env.storage);
                smallvec![Effect::Future(Box::pin(async move {
                    Some(TodoAction::Set(persistence::load_todos(storage.as_ref())))
                }))]
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can panic
mod tests {
    use super::*;
    use crate::types::{TodoId, TodoItem};
    use todoflow_storage::MemoryStore;
    use todoflow_testing::{assertions, ReducerTest};

    fn create_test_env() -> TodoEnvironment {
        TodoEnvironment::new(Arc::new(MemoryStore::new()))
    }

    fn item(id: u64, text: &str) -> TodoItem {
        TodoItem::new(TodoId::new(id), text.to_string())
    }

    #[test]
    fn add_appends_in_insertion_order() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState {
                todos: vec![item(1, "a")],
            })
            .when_action(TodoAction::add(item(2, "buy milk")))
            .then_state(|state| {
                assert_eq!(state.count(), 2);
                assert_eq!(state.todos[1].text, "buy milk");
                assert!(!state.todos[1].complete);
            })
            .then_effects(|effects| assertions::assert_effect_count(effects, 1))
            .run();
    }

    #[test]
    fn remove_drops_only_the_target() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState {
                todos: vec![item(1, "a"), item(2, "b")],
            })
            .when_action(TodoAction::remove(TodoId::new(1)))
            .then_state(|state| {
                assert_eq!(state.count(), 1);
                assert_eq!(state.todos[0].id, TodoId::new(2));
            })
            .then_effects(|effects| assertions::assert_effect_count(effects, 1))
            .run();
    }

    #[test]
    fn toggle_flips_only_the_target() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState {
                todos: vec![item(1, "a"), item(2, "b")],
            })
            .when_action(TodoAction::toggle(TodoId::new(1)))
            .then_state(|state| {
                assert!(state.todos[0].complete);
                assert!(!state.todos[1].complete);
            })
            .then_effects(|effects| assertions::assert_effect_count(effects, 1))
            .run();
    }

    #[test]
    fn toggle_unknown_id_leaves_list_unchanged() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState {
                todos: vec![item(1, "a")],
            })
            .when_action(TodoAction::toggle(TodoId::new(99)))
            .then_state(|state| {
                assert_eq!(state.todos, vec![item(1, "a")]);
            })
            .run();
    }

    #[test]
    fn set_replaces_the_whole_list() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState {
                todos: vec![item(1, "old")],
            })
            .when_action(TodoAction::set(vec![item(2, "new")]))
            .then_state(|state| {
                assert_eq!(state.todos, vec![item(2, "new")]);
            })
            .then_effects(|effects| assertions::assert_effect_count(effects, 1))
            .run();
    }

    #[test]
    fn load_leaves_state_untouched_and_defers_the_read() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState {
                todos: vec![item(1, "a")],
            })
            .when_action(TodoAction::Load)
            .then_state(|state| {
                assert_eq!(state.todos, vec![item(1, "a")]);
            })
            .then_effects(|effects| assertions::assert_effect_count(effects, 1))
            .run();
    }

    #[test]
    fn reduce_is_deterministic_for_the_same_input() {
        let env = create_test_env();
        let reducer = TodoReducer::new();
        let initial = TodoState {
            todos: vec![item(1, "a"), item(2, "b")],
        };
        let action = TodoAction::toggle(TodoId::new(2));

        let mut first = initial.clone();
        let mut second = initial.clone();
        reducer.reduce(&mut first, action.clone(), &env);
        reducer.reduce(&mut second, action, &env);

        assert_eq!(first, second);
        // The original is untouched by either run
        assert!(!initial.todos[1].complete);
    }
}
