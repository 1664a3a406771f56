//! Recording logout notifier for testing.

use crate::providers::LogoutNotifier;
use crate::state::LogoutNotice;
use std::sync::{Arc, Mutex, PoisonError};

/// Notifier that keeps every notice it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<LogoutNotice>>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices received so far, oldest first.
    #[must_use]
    pub fn notices(&self) -> Vec<LogoutNotice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of notices received so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl LogoutNotifier for RecordingNotifier {
    fn notify(&self, notice: LogoutNotice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}
