//! Session reducers.
//!
//! Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.

pub mod monitor;

pub use monitor::SessionMonitor;
