//! # School Session Runtime
//!
//! Runtime implementation for the reducer architecture used by the session
//! tracker.
//!
//! ## Core Components
//!
//! - **Store**: owns the state, runs the reducer and executes effects
//! - **Effect executor**: turns effect descriptions into tokio tasks and feeds
//!   produced actions back into the reducer
//! - **Cancellation registry**: tasks spawned under [`Effect::Cancellable`] are
//!   tracked by id so timers and subscriptions can be torn down
//!
//! ## Example
//!
//! ```ignore
//! use school_session_runtime::Store;
//!
//! let store = Store::new(MonitorState::default(), SessionMonitor::new(), env);
//!
//! store.send(MonitorAction::Restore).await?;
//! let phase = store.state(|s| s.phase.clone()).await;
//! ```

use school_session_core::{
    effect::{Effect, EffectId},
    reducer::Reducer,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tokio::task::AbortHandle;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// Returned when `send()` is called after shutdown started.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timed out waiting for effects tracked by an [`EffectHandle`](super::EffectHandle)
        #[error("Timeout waiting for effects")]
        Timeout,
    }
}

pub use error::StoreError;

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`]. Waiting on it resolves once every
/// [`Effect::Future`] produced directly by that action has completed.
/// Intervals and streams are not tracked, otherwise a handle for an action
/// that starts a timer would never resolve.
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Wait for all tracked effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                // Every tracking context is gone, nothing left to wait for
                break;
            }
        }
    }

    /// Wait for all tracked effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires first.
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

/// Internal: effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements the effect counter on drop
///
/// Runs on completion, panic and abort alike.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (store-wide pending effects)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Internal: tasks spawned under a cancellation id
#[derive(Clone, Default)]
struct CancellationRegistry {
    tasks: Arc<Mutex<HashMap<EffectId, Vec<AbortHandle>>>>,
}

impl CancellationRegistry {
    fn register(&self, id: EffectId, handle: AbortHandle) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        let handles = tasks.entry(id).or_default();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    fn cancel(&self, id: EffectId) -> usize {
        let handles = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .unwrap_or_default();
        abort_all(handles)
    }

    fn cancel_all(&self) -> usize {
        let drained: Vec<AbortHandle> = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .flat_map(|(_, handles)| handles)
            .collect();
        abort_all(drained)
    }

    fn running(&self, id: EffectId) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .map_or(0, |handles| handles.iter().filter(|h| !h.is_finished()).count())
    }
}

fn abort_all(handles: Vec<AbortHandle>) -> usize {
    let mut aborted = 0;
    for handle in handles {
        if !handle.is_finished() {
            handle.abort();
            aborted += 1;
        }
    }
    aborted
}

/// Store module - the runtime for reducers
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, CancellationRegistry, DecrementGuard,
        Duration, Effect, EffectHandle, EffectId, EffectTracking, Ordering, Reducer, RwLock,
        StoreError,
    };
    use futures::StreamExt;
    use tokio::sync::broadcast;
    use tokio::time::{Instant, MissedTickBehavior};

    /// Buffered actions per [`Store::subscribe_actions`] receiver
    pub const ACTION_BROADCAST_CAPACITY: usize = 64;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
    ///
    /// Cloning a Store is cheap and yields a handle to the same state.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        cancellations: CancellationRegistry,
        /// Actions produced by effects (futures, timers, streams) are broadcast
        /// here before being fed back into the reducer.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Subscribers to [`Store::subscribe_actions`] that fall more than
        /// [`ACTION_BROADCAST_CAPACITY`] actions behind start lagging.
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            let (action_broadcast, _) = broadcast::channel(ACTION_BROADCAST_CAPACITY);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                cancellations: CancellationRegistry::default(),
                action_broadcast,
            }
        }

        /// Access the injected environment
        #[must_use]
        pub const fn environment(&self) -> &E {
            &self.environment
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Starts executing the returned effects
        ///
        /// `send()` returns once effects have been started, not completed.
        /// Cancellations ([`Effect::Cancel`]) take effect before it returns.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError>
        where
            R: Clone,
            E: Clone,
        {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.commands.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;
                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();
                self.reducer.reduce(&mut *state, action, &self.environment)
            };

            tracing::trace!("Executing {} effects", effects.len());
            for effect in effects {
                self.execute_effect(effect, tracking.clone(), None);
            }

            Ok(handle)
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let logged_in = store.state(|s| s.is_monitoring()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Subscribe to actions produced by effects
        ///
        /// The action passed to [`Store::send`] itself is not broadcast.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Number of live tasks registered under a cancellation id
        #[must_use]
        pub fn running_tasks(&self, id: EffectId) -> usize {
            self.cancellations.running(id)
        }

        /// Number of finite effects still executing across the whole store
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::Acquire)
        }

        /// Yield to the scheduler until no finite effect is running
        ///
        /// Intended for tests on a paused tokio clock: after advancing time,
        /// `settle()` lets timer ticks and their feedback actions run to
        /// completion without advancing the clock further.
        pub async fn settle(&self) {
            let mut quiet_rounds = 0;
            while quiet_rounds < 3 {
                tokio::task::yield_now().await;
                if self.pending_effects.load(Ordering::Acquire) == 0 {
                    quiet_rounds += 1;
                } else {
                    quiet_rounds = 0;
                }
            }
        }

        /// Stop accepting actions, abort timers and subscriptions, and wait for
        /// in-flight effects to finish
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if finite effects are still
        /// running when `timeout` expires.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating store shutdown");
            self.shutdown.store(true, Ordering::Release);

            let aborted = self.cancellations.cancel_all();
            tracing::debug!(aborted, "Aborted cancellable tasks");

            let deadline = Instant::now() + timeout;
            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);
                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }
                if Instant::now() >= deadline {
                    tracing::error!(pending_effects = pending, "Shutdown timed out");
                    return Err(StoreError::ShutdownTimeout(pending));
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }

        /// Spawn a task, registering it under `scope` when cancellable
        fn spawn_scoped<F>(&self, scope: Option<EffectId>, task: F)
        where
            F: std::future::Future<Output = ()> + Send + 'static,
        {
            let handle = tokio::spawn(task);
            if let Some(id) = scope {
                self.cancellations.register(id, handle.abort_handle());
            }
        }

        /// Begin a finite effect: bump both the action's and the store's counters
        fn begin_finite(&self, tracking: &EffectTracking) -> (DecrementGuard, AtomicCounterGuard) {
            tracking.increment();
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            (
                DecrementGuard(tracking.clone()),
                AtomicCounterGuard(Arc::clone(&self.pending_effects)),
            )
        }

        /// Feed an action produced by an effect back into the store
        async fn feed_back(&self, action: A) -> Result<(), StoreError>
        where
            R: Clone,
            E: Clone,
        {
            let _ = self.action_broadcast.send(action.clone());
            self.send(action).await.map(|_| ())
        }

        /// Execute an effect
        ///
        /// # Error Handling Strategy
        ///
        /// Effects are fire-and-forget. A failing effect reports its failure as
        /// an action; a panicking task is logged by tokio and the store keeps
        /// running. Guards keep counters correct on panic and abort.
        fn execute_effect(
            &self,
            effect: Effect<A>,
            tracking: EffectTracking,
            scope: Option<EffectId>,
        ) where
            R: Clone,
            E: Clone,
        {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    tracing::trace!("Executing Effect::Future");
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    let guards = self.begin_finite(&tracking);
                    let store = self.clone();

                    self.spawn_scoped(scope, async move {
                        let _guards = guards;
                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action, sending to store");
                            let _ = store.feed_back(action).await;
                        }
                    });
                },
                Effect::Interval { period, action } => {
                    tracing::trace!("Executing Effect::Interval (period: {:?})", period);
                    metrics::counter!("store.effects.executed", "type" => "interval").increment(1);
                    let store = self.clone();

                    self.spawn_scoped(scope, async move {
                        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
                        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                        loop {
                            ticker.tick().await;
                            if store.feed_back((*action).clone()).await.is_err() {
                                tracing::debug!("Interval stopped: store is shutting down");
                                break;
                            }
                        }
                    });
                },
                Effect::Stream(mut stream) => {
                    tracing::trace!("Executing Effect::Stream");
                    metrics::counter!("store.effects.executed", "type" => "stream").increment(1);
                    let store = self.clone();

                    self.spawn_scoped(scope, async move {
                        while let Some(action) = stream.next().await {
                            if store.feed_back(action).await.is_err() {
                                break;
                            }
                        }
                        tracing::trace!("Effect::Stream completed");
                    });
                },
                Effect::Cancellable { id, effect } => {
                    tracing::trace!(%id, "Executing Effect::Cancellable");
                    self.execute_effect(*effect, tracking, Some(id));
                },
                Effect::Cancel { id } => {
                    let aborted = self.cancellations.cancel(id);
                    tracing::debug!(%id, aborted, "Cancelled effect tasks");
                    metrics::counter!("store.effects.executed", "type" => "cancel").increment(1);
                },
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
                cancellations: self.cancellations.clone(),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;
