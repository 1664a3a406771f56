//! # School Session Testing
//!
//! Testing utilities and helpers for the school session crates.
//!
//! This crate provides:
//! - Controllable [`Clock`] implementations
//! - A Given-When-Then harness for reducers ([`ReducerTest`])
//! - Effect assertion helpers
//! - Tracing setup for tests
//!
//! ## Example
//!
//! ```ignore
//! use school_session_testing::ManualClock;
//!
//! let clock = ManualClock::new(test_clock().now());
//! let store = PersistentSessionStore::new(MemoryStorage::new(), clock.clone(), policy);
//! clock.advance(chrono::Duration::minutes(61));
//! assert!(store.get_current().await?.is_none());
//! ```

use chrono::{DateTime, Utc};
use school_session_core::environment::Clock;


pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Arc, Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use school_session_testing::mocks::FixedClock;
    /// use school_session_core::environment::Clock;
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
        /// Create a new fixed clock with the given time
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

    /// Clock moved by hand
    ///
    /// Clones share the same time, so a test can keep one handle and give
    /// another to the code under test.
    ///
    /// # Example
    ///
    /// ```
    /// use school_session_testing::{ManualClock, test_clock};
    /// use school_session_core::environment::Clock;
    ///
    /// let clock = ManualClock::new(test_clock().now());
    /// let start = clock.now();
    /// clock.advance(chrono::Duration::minutes(3));
    /// assert_eq!(clock.now() - start, chrono::Duration::minutes(3));
    /// ```
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a clock starting at `time`
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: chrono::Duration) {
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }

        /// Jump to an absolute time
        pub fn set(&self, to: DateTime<Utc>) {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner) = to;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Wall clock that follows tokio's clock
    ///
    /// Under `#[tokio::test(start_paused = true)]`, `tokio::time::advance`
    /// moves timers and this clock together, so timestamps written by timer
    /// ticks line up with the simulated time. [`TokioClock::jump`] moves the
    /// wall clock alone, which is what a host that was asleep looks like:
    /// time passed, but no timer fired.
    ///
    /// Must be created and read inside a tokio runtime.
    #[derive(Debug, Clone)]
    pub struct TokioClock {
        origin: DateTime<Utc>,
        started: tokio::time::Instant,
        skew: Arc<Mutex<chrono::Duration>>,
    }

    impl TokioClock {
        /// Create a clock reading `origin` at the current tokio instant
        #[must_use]
        pub fn new(origin: DateTime<Utc>) -> Self {
            Self {
                origin,
                started: tokio::time::Instant::now(),
                skew: Arc::new(Mutex::new(chrono::Duration::zero())),
            }
        }

        /// Move the wall clock forward without firing any timer
        pub fn jump(&self, by: chrono::Duration) {
            let mut skew = self.skew.lock().unwrap_or_else(PoisonError::into_inner);
            *skew += by;
        }
    }

    impl Clock for TokioClock {
        fn now(&self) -> DateTime<Utc> {
            let elapsed = chrono::Duration::from_std(self.started.elapsed())
                .unwrap_or_else(|_| chrono::Duration::zero());
            let skew = *self.skew.lock().unwrap_or_else(PoisonError::into_inner);
            self.origin + elapsed + skew
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test helpers and utilities
pub mod helpers {
    /// Install a `tracing` subscriber that writes through the test harness
    ///
    /// Honors `RUST_LOG`. Safe to call from every test: only the first call
    /// installs the subscriber.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use helpers::init_tracing;
pub use mocks::{FixedClock, ManualClock, TokioClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(test_clock().now());
        let handle = clock.clone();
        handle.advance(chrono::Duration::seconds(90));
        assert_eq!(clock.now(), test_clock().now() + chrono::Duration::seconds(90));

        clock.set(test_clock().now());
        assert_eq!(handle.now(), test_clock().now());
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_follows_paused_time() {
        let clock = TokioClock::new(test_clock().now());
        tokio::time::advance(Duration::from_secs(15)).await;
        assert_eq!(clock.now(), test_clock().now() + chrono::Duration::seconds(15));

        clock.jump(chrono::Duration::minutes(5));
        assert_eq!(
            clock.now(),
            test_clock().now() + chrono::Duration::seconds(15) + chrono::Duration::minutes(5)
        );
    }
}
