//! # Todoflow Testing
//!
//! Deterministic doubles for the environment traits, a Given-When-Then
//! harness for single reducer steps, and shared proptest strategies.
//!
//! ```ignore
//! use todoflow_testing::{test_clock, ReducerTest};
//!
//! ReducerTest::new(TodoReducer::new())
//!     .with_env(test_environment())
//!     .given_state(TodoState::default())
//!     .when_action(TodoAction::add(item))
//!     .then_state(|state| assert_eq!(state.todos.len(), 1))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use todoflow_core::environment::{Clock, IdGenerator};

/// Reducer test harness with Given-When-Then syntax
pub mod reducer_test;

pub use mocks::{test_clock, CountingIdGenerator, FixedClock};
pub use reducer_test::{assertions, ReducerTest};

/// Deterministic stand-ins for the production clock and id generator
pub mod mocks {
    use super::{Clock, DateTime, IdGenerator, Utc};
    use std::sync::atomic::{AtomicU64, Ordering};

    /// A clock pinned to one instant
    ///
    /// ```
    /// use todoflow_testing::mocks::FixedClock;
    /// use todoflow_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Pins the clock to `time`
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// The conventional test instant, 2025-01-01 00:00:00 UTC
    ///
    /// # Panics
    ///
    /// Only if the hardcoded timestamp stops parsing, which it cannot.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Id generator that counts up from 1
    ///
    /// Gives tests small, predictable ids regardless of wall-clock time.
    ///
    /// # Example
    ///
    /// ```
    /// use todoflow_testing::mocks::CountingIdGenerator;
    /// use todoflow_core::environment::IdGenerator;
    ///
    /// let ids = CountingIdGenerator::new();
    /// assert_eq!(ids.next_id(), 1);
    /// assert_eq!(ids.next_id(), 2);
    /// ```
    #[derive(Debug, Default)]
    pub struct CountingIdGenerator {
        counter: AtomicU64,
    }

    impl CountingIdGenerator {
        /// Starts counting at 1
        #[must_use]
        pub const fn new() -> Self {
            Self {
                counter: AtomicU64::new(0),
            }
        }
    }

    impl IdGenerator for CountingIdGenerator {
        fn next_id(&self) -> u64 {
            self.counter.fetch_add(1, Ordering::Relaxed) + 1
        }
    }
}

/// Property-based testing strategies
///
/// Shared proptest strategies for domain-shaped inputs.
pub mod strategies {
    use proptest::prelude::*;

    /// Non-empty printable text, the kind a user would type into the
    /// entry field
    pub fn nonempty_text() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 ]{1,40}".prop_filter("text must be non-empty", |s| !s.is_empty())
    }
}
