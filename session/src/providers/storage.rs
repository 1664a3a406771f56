//! Key/value storage backing the session slot.

use crate::error::Result;
use std::future::Future;

/// Persistent key/value storage, shaped like browser local storage.
///
/// Values are opaque strings; the session store owns their encoding.
///
/// # Implementation Notes
///
/// - A write replaces the whole value for the key
/// - Removing a missing key succeeds
/// - Readers never observe a partially written value
pub trait SessionStorage: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be read.
    fn read(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be written.
    fn write(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;

    /// Remove the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be written.
    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}
