//! # School Session Core
//!
//! Core traits and types shared by the school session crates.
//!
//! The session tracker is written as a state machine in the reducer style:
//!
//! - **State**: what the monitor currently believes (idle, monitoring, logging out)
//! - **Action**: every input (host commands, timer ticks, results of I/O)
//! - **Reducer**: pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: description of a side effect (timer, storage call, subscription)
//! - **Environment**: injected dependencies (session store, clock, activity source)
//!
//! Effects are values. Nothing in a reducer touches storage or timers directly;
//! the runtime crate executes the returned descriptions.
//!
//! ## Example
//!
//! ```ignore
//! use school_session_core::*;
//!
//! impl Reducer for LampReducer {
//!     type State = LampState;
//!     type Action = LampAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut LampState,
//!         action: LampAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<LampAction>; 4]> {
//!         state.on = matches!(action, LampAction::SwitchOn);
//!         smallvec![Effect::None]
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{SmallVec, smallvec};

/// Reducer module - the core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They are deterministic given the environment and trivially unit-testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Updates `state` in place and returns effect descriptions for the
        /// runtime to execute. Most actions produce zero to two effects, so the
        /// return type stays on the stack in the common case.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution), composable and cancellable.
pub mod effect {
    use futures::Stream;
    use std::fmt;
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Identifier used to cancel long-running effects.
    ///
    /// Every task spawned for an effect wrapped in [`Effect::Cancellable`]
    /// is registered under its id; [`Effect::Cancel`] aborts all of them.
    ///
    /// # Examples
    ///
    /// ```
    /// use school_session_core::effect::EffectId;
    ///
    /// const HEARTBEAT: EffectId = EffectId::new("heartbeat");
    /// assert_eq!(HEARTBEAT.as_str(), "heartbeat");
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct EffectId(&'static str);

    impl EffectId {
        /// Create an effect id from a static name.
        #[must_use]
        pub const fn new(name: &'static str) -> Self {
            Self(name)
        }

        /// The name this id was created with.
        #[must_use]
        pub const fn as_str(&self) -> &'static str {
            self.0
        }
    }

    impl fmt::Display for EffectId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Dispatch `action` every `period`, starting one period from now
        ///
        /// Runs until cancelled, so it is almost always wrapped in
        /// [`Effect::Cancellable`].
        Interval {
            /// Time between two dispatches
            period: Duration,
            /// Action dispatched on every tick
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),

        /// Stream of actions, each fed back into the reducer as it arrives
        Stream(Pin<Box<dyn Stream<Item = Action> + Send>>),

        /// Register the tasks spawned for `effect` under `id`
        Cancellable {
            /// Cancellation handle
            id: EffectId,
            /// Effect to run
            effect: Box<Effect<Action>>,
        },

        /// Abort every running task registered under `id`
        ///
        /// Cancelling an id with nothing registered is a no-op.
        Cancel {
            /// Cancellation handle
            id: EffectId,
        },
    }

    // Manual Debug implementation since Future and Stream don't implement Debug
    impl<Action> fmt::Debug for Effect<Action>
    where
        Action: fmt::Debug,
    {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Interval { period, action } => f
                    .debug_struct("Effect::Interval")
                    .field("period", period)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Stream(_) => write!(f, "Effect::Stream(<stream>)"),
                Effect::Cancellable { id, effect } => f
                    .debug_struct("Effect::Cancellable")
                    .field("id", id)
                    .field("effect", effect)
                    .finish(),
                Effect::Cancel { id } => f.debug_struct("Effect::Cancel").field("id", id).finish(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap this effect so it can later be aborted with [`Effect::Cancel`]
        #[must_use]
        pub fn cancellable(self, id: EffectId) -> Effect<Action> {
            Effect::Cancellable {
                id,
                effect: Box::new(self),
            }
        }

        /// Returns `true` for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};
    use std::sync::Arc;

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use school_session_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let earlier = clock.now();
    /// assert!(clock.now() >= earlier);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    impl<C: Clock + ?Sized> Clock for Arc<C> {
        fn now(&self) -> DateTime<Utc> {
            (**self).now()
        }
    }
}

pub use effect::{Effect, EffectId};
pub use environment::{Clock, SystemClock};
pub use reducer::Reducer;
