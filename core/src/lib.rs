//! # Todoflow Core
//!
//! The building blocks of todoflow's unidirectional data flow.
//!
//! A feature is a `State` type, an `Action` enum naming every input that
//! can touch that state, and a [`Reducer`] that folds actions into the
//! state. The reducer never performs I/O itself; it returns [`Effect`]
//! values describing the work, and the runtime crate executes them.
//! External dependencies reach the reducer only through its `Environment`
//! parameter, which is what makes the whole thing testable without a
//! runtime.
//!
//! ```ignore
//! use todoflow_core::*;
//!
//! impl Reducer for TodoReducer {
//!     type State = TodoState;
//!     type Action = TodoAction;
//!     type Environment = TodoEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut TodoState,
//!         action: TodoAction,
//!         env: &TodoEnvironment,
//!     ) -> Effects<TodoAction> {
//!         match action {
//!             TodoAction::Add(item) => {
//!                 state.todos.push(item);
//!                 Effects::new()
//!             }
//!             // ...
//!         }
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

pub use effect::{Effect, EffectId, Effects};
pub use reducer::Reducer;

/// The trait every feature's business logic implements
///
/// A reducer deterministically folds `(state, action, environment)` into
/// an in-place state update plus a list of effect descriptions. Follow-up
/// work such as storage writes or delayed actions lives in those effects,
/// never in the reducer body.
pub mod reducer {
    use super::effect::Effects;

    /// Folds actions into state and emits effect descriptions
    ///
    /// Implementations bind three associated types: the `State` they own,
    /// the `Action` enum they accept, and the `Environment` carrying their
    /// injected dependencies.
    pub trait Reducer {
        /// State this reducer owns
        type State;

        /// Every input this reducer accepts
        type Action;

        /// Injected dependencies, behind traits
        type Environment;

        /// Applies `action` to `state` and returns the follow-up effects
        ///
        /// The same `(state, action)` pair always yields the same
        /// transition; anything nondeterministic or I/O-bound belongs in
        /// the returned effects.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Effects<Self::Action>;
    }
}

/// Side effects as plain values
///
/// Nothing here runs anything. An [`Effect`] is a description the runtime
/// interprets later, which is what keeps reducers pure. Deferred work is
/// an [`Effect::Future`] or [`Effect::Delay`], and cancellation is a
/// first-class variant instead of a convention.
pub mod effect {
    use futures::future::BoxFuture;
    use smallvec::SmallVec;
    use std::time::Duration;

    /// Effect list returned by a reducer.
    ///
    /// Most reducer branches return zero or one effect, so the inline
    /// capacity avoids heap allocation on the hot path.
    pub type Effects<A> = SmallVec<[Effect<A>; 4]>;

    /// Identifier for a cancellable effect.
    ///
    /// A reducer registers a deferred effect under an id with
    /// [`Effect::Cancellable`]; a later action can return
    /// [`Effect::Cancel`] with the same id to abort it.
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct EffectId(String);

    impl EffectId {
        /// Creates a new effect id
        #[must_use]
        pub fn new(id: impl Into<String>) -> Self {
            Self(id.into())
        }

        /// Returns the id as a string slice
        #[must_use]
        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl std::fmt::Display for EffectId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl From<&str> for EffectId {
        fn from(id: &str) -> Self {
            Self::new(id)
        }
    }

    /// A description of side-effecting work for the runtime to perform
    ///
    /// Reducers return these; the store interprets them. `Action` is the
    /// type an effect may feed back into the store when it completes.
    pub enum Effect<Action> {
        /// Nothing to do
        None,

        /// Children run concurrently
        Parallel(Vec<Effect<Action>>),

        /// Children run one after another, each draining before the next
        Sequential(Vec<Effect<Action>>),

        /// Dispatch `action` once `duration` has elapsed
        Delay {
            /// Wait before dispatching
            duration: Duration,
            /// What to dispatch
            action: Box<Action>,
        },

        /// An async computation; a `Some` result is fed back into the
        /// store as a new action
        Future(BoxFuture<'static, Option<Action>>),

        /// A deferred effect registered under an id so it can be aborted
        /// by a later [`Effect::Cancel`] with the same id
        Cancellable {
            /// Registration key for cancellation
            id: EffectId,
            /// The deferred effect to run
            effect: Box<Effect<Action>>,
        },

        /// Abort the in-flight cancellable effect registered under this id
        Cancel(EffectId),
    }

    // Hand-written because the boxed future has no Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Cancellable { id, effect } => f
                    .debug_struct("Effect::Cancellable")
                    .field("id", id)
                    .field("effect", effect)
                    .finish(),
                Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Groups `effects` to run concurrently
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Groups `effects` to run one after another
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Wrap this effect so it can be aborted via [`Effect::Cancel`]
        #[must_use]
        pub fn cancellable(self, id: impl Into<EffectId>) -> Effect<Action> {
            Effect::Cancellable {
                id: id.into(),
                effect: Box::new(self),
            }
        }
    }

    impl From<String> for EffectId {
        fn from(id: String) -> Self {
            Self(id)
        }
    }
}

/// Traits for everything a reducer must not reach for directly
///
/// Production implementations sit next to the traits here; deterministic
/// doubles live in `todoflow-testing`.
pub mod environment {
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Source of the current time
    ///
    /// ```
    /// use todoflow_core::environment::{Clock, SystemClock};
    ///
    /// let now = SystemClock.now();
    /// ```
    pub trait Clock: Send + Sync {
        /// The current instant in UTC
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// `IdGenerator` trait - abstracts id allocation for testability
    ///
    /// Replaces the hidden global counter pattern: the generator is owned
    /// by the composition root and handed to whoever mints ids, so tests
    /// can inject a deterministic one.
    pub trait IdGenerator: Send + Sync {
        /// Allocate the next id. Successive calls return strictly
        /// increasing values.
        fn next_id(&self) -> u64;
    }

    /// Monotonic id generator backed by an atomic counter
    ///
    /// Seed it from the startup timestamp in production so ids from
    /// successive process runs do not collide, or from a fixed value in
    /// tests for reproducibility.
    ///
    /// # Examples
    ///
    /// ```
    /// use todoflow_core::environment::{IdGenerator, SequentialIdGenerator};
    ///
    /// let ids = SequentialIdGenerator::seeded(100);
    /// assert_eq!(ids.next_id(), 101);
    /// assert_eq!(ids.next_id(), 102);
    /// ```
    #[derive(Debug)]
    pub struct SequentialIdGenerator {
        counter: AtomicU64,
    }

    impl SequentialIdGenerator {
        /// Creates a generator whose first id is `seed + 1`
        #[must_use]
        pub const fn seeded(seed: u64) -> Self {
            Self {
                counter: AtomicU64::new(seed),
            }
        }
    }

    impl IdGenerator for SequentialIdGenerator {
        fn next_id(&self) -> u64 {
            self.counter.fetch_add(1, Ordering::Relaxed) + 1
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used)] // Test code can panic
mod tests {
    use super::effect::{Effect, EffectId};
    use super::environment::{IdGenerator, SequentialIdGenerator};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn sequential_ids_are_strictly_increasing() {
        let ids = SequentialIdGenerator::seeded(41);
        let a = ids.next_id();
        let b = ids.next_id();
        let c = ids.next_id();
        assert_eq!(a, 42);
        assert!(a < b && b < c);
    }

    #[test]
    fn sequential_ids_are_unique_across_threads() {
        let ids = Arc::new(SequentialIdGenerator::seeded(0));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let ids = Arc::clone(&ids);
            handles.push(std::thread::spawn(move || {
                (0..250).map(|_| ids.next_id()).collect::<Vec<_>>()
            }));
        }

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap_or_default())
            .collect();
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
    }

    #[test]
    fn effect_debug_hides_future_internals() {
        let effect: Effect<u32> = Effect::Future(Box::pin(async { Some(1) }));
        assert_eq!(format!("{effect:?}"), "Effect::Future(<future>)");
    }

    #[test]
    fn cancellable_wraps_and_formats() {
        let effect: Effect<u32> = Effect::Delay {
            duration: Duration::from_millis(5),
            action: Box::new(7),
        }
        .cancellable("reminder");

        match &effect {
            Effect::Cancellable { id, .. } => assert_eq!(id, &EffectId::new("reminder")),
            other => panic!("expected Cancellable, got {other:?}"),
        }
    }
}
