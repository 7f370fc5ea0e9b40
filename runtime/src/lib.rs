//! # Todoflow Runtime
//!
//! Runtime implementation for the todoflow architecture.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: The runtime that manages state and executes effects
//! - **Effect Executor**: Executes effect descriptions and feeds actions back to reducers
//! - **Effect Handle**: Completion tracking for the effects of a dispatched action
//!
//! ## Example
//!
//! ```ignore
//! use todoflow_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action
//! store.send(Action::DoSomething).await?;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use todoflow_core::effect::{Effect, EffectId};
use todoflow_core::reducer::Reducer;
use tokio::sync::{watch, RwLock};
use tokio::task::AbortHandle;

/// Failure modes of the store runtime
pub mod error {
    use thiserror::Error;

    /// What can go wrong when talking to a [`super::Store`]
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// `send()` was called after shutdown had begun.
        #[error("store is shutting down")]
        ShutdownInProgress,

        /// Shutdown gave up while effects were still in flight.
        #[error("shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// A deadline expired: `send_and_wait_for` saw no matching action,
        /// or `wait_with_timeout` still had effects in flight.
        #[error("timed out waiting for effects")]
        Timeout,

        /// The action broadcast channel is gone, usually because the store
        /// was dropped mid-wait.
        #[error("action channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Completion token for the effects one dispatched action produced
///
/// [`Store::send`] hands one back per action; awaiting it tells you the
/// action's effects (including nested feedback) have drained.
///
/// ```ignore
/// let mut handle = store.send(TodoAction::Load).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Builds a handle and the tracking half the executor threads through
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: tx,
        };

        (handle, tracking)
    }

    /// A handle with nothing left to wait on
    ///
    /// Handy as the seed value when a loop keeps the most recent handle.
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(());
        let _ = tx.send(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Parks until the tracked effect count falls to zero
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            let _ = self.completion.changed().await;
        }
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] when effects are still running at
    /// the deadline.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Executor-side half of an [`EffectHandle`]
///
/// Shares the counter with the handle and owns the notifier that wakes
/// waiters when the counter bottoms out.
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: watch::Sender<()>,
}

impl EffectTracking {
    /// Marks one more effect in flight
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Marks one effect finished, waking waiters on the last one
    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            let _ = self.notifier.send(());
        }
    }
}

/// Drop guard tying [`EffectTracking::decrement`] to task teardown
///
/// Fires on normal completion, panic, and abort alike.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Drop guard for the store-wide pending counter shutdown polls
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The store: serialized dispatch plus an async effect executor
pub mod store {
    use super::{
        AbortHandle, Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, DecrementGuard, Duration,
        Effect, EffectHandle, EffectId, EffectTracking, HashMap, Mutex, Ordering, PoisonError,
        Reducer, RwLock, StoreError,
    };
    use tokio::sync::broadcast;

    /// Owns the state, the reducer, and the environment, and runs effects
    ///
    /// There is no ambient global: every state transition goes through
    /// [`Store::send`], serialized on the state's write lock, and effects
    /// feed their follow-up actions back through the same path.
    ///
    /// `S` is the state, `A` the action, `E` the environment, `R` the
    /// reducer tying the three together.
    ///
    /// ```ignore
    /// let store = Store::new(TodoState::default(), TodoReducer::new(), env);
    /// store.send(TodoAction::add(item)).await?;
    /// ```
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Fan-out of effect-produced actions to observers.
        ///
        /// Only feedback actions travel here, never the caller's own
        /// dispatches. Waiting on it is how hydration completion is
        /// detected.
        action_broadcast: broadcast::Sender<A>,
        /// Abort handles for in-flight cancellable effects, keyed by id.
        ///
        /// An entry stays registered until cancelled or replaced; aborting a
        /// task that already finished is a no-op.
        cancellations: Arc<Mutex<HashMap<EffectId, AbortHandle>>>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + Clone + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + Clone + 'static,
    {
        /// Builds a store around `initial_state`, ready to dispatch
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            let (action_broadcast, _) = broadcast::channel(16);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
                cancellations: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        /// Dispatches an action: reduce under the write lock, then launch
        /// the returned effects
        ///
        /// Returns as soon as the effects are started; the
        /// [`EffectHandle`] is how callers wait for them. Concurrent sends
        /// serialize at the reducer, while their effects interleave
        /// freely.
        ///
        /// Every dispatch emits a structured tracing event and bumps the
        /// `todoflow.store.actions_total` counter.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is
        /// shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Dropping action, shutdown in progress");
                metrics::counter!("todoflow.store.rejected_total").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            tracing::debug!("Dispatching action");
            metrics::counter!("todoflow.store.actions_total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;
                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut state, action, &self.environment);
                metrics::histogram!("todoflow.reducer.seconds").record(start.elapsed().as_secs_f64());
                tracing::trace!(effects = effects.len(), "Reducer returned");
                effects
            };

            for effect in effects {
                self.execute_effect_internal(effect, tracking.clone());
            }

            Ok(handle)
        }

        /// Dispatches `action` and blocks until an effect feeds back an
        /// action matching `predicate`
        ///
        /// Request-response over the feedback loop. The returned action is
        /// broadcast only after its own state transition committed, so on
        /// success the caller may read state without racing the reducer.
        ///
        /// # Errors
        ///
        /// [`StoreError::Timeout`] when no match arrives in time,
        /// [`StoreError::ChannelClosed`] when the broadcast side is gone,
        /// plus anything `send` itself returns.
        ///
        /// ```ignore
        /// let set = store
        ///     .send_and_wait_for(
        ///         TodoAction::Load,
        ///         |a| matches!(a, TodoAction::Set(_)),
        ///         Duration::from_secs(5),
        ///     )
        ///     .await?;
        /// ```
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            // Subscribe first so a fast effect cannot broadcast before we
            // are listening.
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(seen) if predicate(&seen) => return Ok(seen),
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            // The timeout covers a terminal action lost to lag.
                            tracing::warn!(skipped, "Observer fell behind on the action channel");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        }
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Opens a receiver on the feedback actions
        ///
        /// A lagging receiver skips old actions rather than stalling the
        /// executor.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Reads state through a closure, holding the lock only for the call
        ///
        /// ```ignore
        /// let count = store.state(|s| s.todos.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&state)
        }

        /// Initiate graceful shutdown and wait for pending effects
        ///
        /// After this call, `send()` rejects new actions. Waits up to
        /// `timeout` for already-running effects to finish.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] with the number of
        /// effects still running if the timeout elapses first.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            self.shutdown.store(true, Ordering::Release);
            tracing::info!("Shutdown requested, draining effects");

            let deadline = tokio::time::Instant::now() + timeout;
            loop {
                let pending = self.pending_effects.load(Ordering::SeqCst);
                if pending == 0 {
                    tracing::info!("Shutdown drained cleanly");
                    return Ok(());
                }
                if tokio::time::Instant::now() >= deadline {
                    tracing::warn!(pending, "Shutdown deadline hit with effects still running");
                    return Err(StoreError::ShutdownTimeout(pending));
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }

        /// Register an abort handle for a cancellable effect
        ///
        /// Latest registration wins: a previous in-flight effect under the
        /// same id is aborted.
        fn register_cancellable(&self, id: EffectId, handle: AbortHandle) {
            let mut map = self
                .cancellations
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = map.insert(id, handle) {
                previous.abort();
            }
        }

        /// Abort the in-flight cancellable effect registered under `id`
        fn cancel_effect(&self, id: &EffectId) {
            let handle = {
                let mut map = self
                    .cancellations
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                map.remove(id)
            };
            match handle {
                Some(handle) => {
                    tracing::debug!(effect_id = %id, "Cancelling effect");
                    handle.abort();
                }
                None => {
                    tracing::trace!(effect_id = %id, "No in-flight effect to cancel");
                }
            }
        }

        /// Spawn an effect body on the runtime with completion tracking
        ///
        /// Bumps both the handle counter and the store-wide pending counter
        /// before spawning; [`DecrementGuard`] and [`AtomicCounterGuard`]
        /// undo them when the task finishes, panics, or is aborted.
        fn spawn_tracked<Fut>(&self, tracking: &EffectTracking, body: Fut) -> AbortHandle
        where
            Fut: std::future::Future<Output = ()> + Send + 'static,
        {
            tracking.increment();
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let guard = DecrementGuard(tracking.clone());
            let pending = AtomicCounterGuard(Arc::clone(&self.pending_effects));

            tokio::spawn(async move {
                let _guard = guard;
                let _pending = pending;
                body.await;
            })
            .abort_handle()
        }

        /// Execute one effect description
        ///
        /// Deferred variants run in their own tokio task; a failing effect
        /// is logged and dropped, it never touches state directly.
        #[allow(clippy::needless_pass_by_value)] // each arm consumes the tracking context
        fn execute_effect_internal(&self, effect: Effect<A>, tracking: EffectTracking) {
            match effect {
                Effect::None => {
                    metrics::counter!("todoflow.effects.total", "kind" => "none").increment(1);
                }
                Effect::Future(fut) => {
                    metrics::counter!("todoflow.effects.total", "kind" => "future").increment(1);
                    let store = self.clone();
                    self.spawn_tracked(&tracking, async move {
                        if let Some(action) = fut.await {
                            store.feed_back(action).await;
                        } else {
                            tracing::trace!("Future effect finished without an action");
                        }
                    });
                }
                Effect::Delay { duration, action } => {
                    metrics::counter!("todoflow.effects.total", "kind" => "delay").increment(1);
                    let store = self.clone();
                    self.spawn_tracked(&tracking, async move {
                        tokio::time::sleep(duration).await;
                        store.feed_back(*action).await;
                    });
                }
                Effect::Parallel(effects) => {
                    metrics::counter!("todoflow.effects.total", "kind" => "parallel").increment(1);
                    // Concurrent: every child shares this action's tracking.
                    for child in effects {
                        self.execute_effect_internal(child, tracking.clone());
                    }
                }
                Effect::Sequential(effects) => {
                    metrics::counter!("todoflow.effects.total", "kind" => "sequential")
                        .increment(1);
                    let store = self.clone();
                    self.spawn_tracked(&tracking, async move {
                        // Each step gets its own handle so the next one only
                        // starts once the previous step has fully drained.
                        for step in effects {
                            let (mut done, step_tracking) = EffectHandle::new();
                            store.execute_effect_internal(step, step_tracking);
                            done.wait().await;
                        }
                    });
                }
                Effect::Cancellable { id, effect } => {
                    metrics::counter!("todoflow.effects.total", "kind" => "cancellable")
                        .increment(1);
                    match *effect {
                        Effect::Delay { duration, action } => {
                            let store = self.clone();
                            let task = self.spawn_tracked(&tracking, async move {
                                tokio::time::sleep(duration).await;
                                store.feed_back(*action).await;
                            });
                            self.register_cancellable(id, task);
                        }
                        Effect::Future(fut) => {
                            let store = self.clone();
                            let task = self.spawn_tracked(&tracking, async move {
                                if let Some(action) = fut.await {
                                    store.feed_back(action).await;
                                }
                            });
                            self.register_cancellable(id, task);
                        }
                        other => {
                            // Only deferred effects run in an abortable task.
                            tracing::warn!(
                                effect_id = %id,
                                "Cancellable wraps a non-deferred effect, running it uncancellable"
                            );
                            self.execute_effect_internal(other, tracking);
                        }
                    }
                }
                Effect::Cancel(id) => {
                    metrics::counter!("todoflow.effects.total", "kind" => "cancel").increment(1);
                    self.cancel_effect(&id);
                }
            }
        }

        /// Feed an effect-produced action back into the store
        ///
        /// Dispatches the action, then broadcasts it to observers. The
        /// ordering means an observer that sees the action can rely on the
        /// state transition already being committed.
        async fn feed_back(&self, action: A) {
            match self.send(action.clone()).await {
                Ok(_) => {
                    let _ = self.action_broadcast.send(action);
                }
                Err(error) => {
                    tracing::warn!(%error, "Dropped effect-produced action");
                }
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
                cancellations: Arc::clone(&self.cancellations),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;
