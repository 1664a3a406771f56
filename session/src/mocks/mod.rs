//! Mock implementations for testing.
//!
//! These mocks are available with the `test-utils` feature.

pub mod notifier;
pub mod session;
pub mod storage;

pub use notifier::RecordingNotifier;
pub use session::MockSessionStore;
pub use storage::GatedStorage;
