//! Given-When-Then harness for exercising reducers synchronously.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use todoflow_core::effect::Effect;
use todoflow_core::reducer::Reducer;

/// Runs a single reducer step and checks the outcome.
///
/// The harness calls `reduce` once with the given state, action, and
/// environment, then hands the mutated state and the returned effects to
/// the registered checks.
///
/// # Example
///
/// ```ignore
/// use todoflow_testing::ReducerTest;
///
/// ReducerTest::new(TodoReducer::new())
///     .with_env(test_environment())
///     .given_state(TodoState::default())
///     .when_action(TodoAction::toggle(id))
///     .then_state(|state| assert!(state.todos[0].complete))
///     .then_effects(|effects| assert_eq!(effects.len(), 1))
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    env: Option<E>,
    state: Option<S>,
    action: Option<A>,
    check_state: Option<Box<dyn FnOnce(&S)>>,
    check_effects: Option<Box<dyn FnOnce(&[Effect<A>])>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Starts a harness around `reducer`.
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            env: None,
            state: None,
            action: None,
            check_state: None,
            check_effects: None,
        }
    }

    /// Supplies the environment the reducer will see.
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.env = Some(env);
        self
    }

    /// Supplies the state as it stands before the action.
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.state = Some(state);
        self
    }

    /// Supplies the action under test.
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Registers a check against the state after the action.
    #[must_use]
    pub fn then_state(mut self, check: impl FnOnce(&S) + 'static) -> Self {
        self.check_state = Some(Box::new(check));
        self
    }

    /// Registers a check against the effects the reducer returned.
    #[must_use]
    pub fn then_effects(mut self, check: impl FnOnce(&[Effect<A>]) + 'static) -> Self {
        self.check_effects = Some(Box::new(check));
        self
    }

    /// Executes the step and the registered checks.
    ///
    /// # Panics
    ///
    /// Panics when `given_state`, `when_action`, or `with_env` was skipped,
    /// or when a check fails.
    #[allow(clippy::expect_used)] // Test harness, misuse should abort loudly
    pub fn run(self) {
        let mut state = self.state.expect("given_state was not called");
        let action = self.action.expect("when_action was not called");
        let env = self.env.expect("with_env was not called");

        let effects = self.reducer.reduce(&mut state, action, &env);

        if let Some(check) = self.check_state {
            check(&state);
        }
        if let Some(check) = self.check_effects {
            check(&effects);
        }
    }
}

/// Shorthand assertions over effect lists.
pub mod assertions {
    use todoflow_core::effect::Effect;

    /// Asserts that a reducer produced no effects.
    ///
    /// # Panics
    ///
    /// Panics if the effect list is non-empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(effects.is_empty(), "expected no effects, got {effects:?}");
    }

    /// Asserts that a reducer produced exactly `count` effects.
    ///
    /// # Panics
    ///
    /// Panics if the effect count differs.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effect_count<A: std::fmt::Debug>(effects: &[Effect<A>], count: usize) {
        assert_eq!(
            effects.len(),
            count,
            "expected {count} effects, got {effects:?}"
        );
    }
}
