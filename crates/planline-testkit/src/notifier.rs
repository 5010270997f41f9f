//! Recording notifier

use parking_lot::Mutex;
use planline_engine::{NoticeLevel, Notifier};

/// Notifier that remembers every notice it saw
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeLevel, String)>>,
}

impl RecordingNotifier {
    /// Empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, in order
    #[must_use]
    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices.lock().clone()
    }

    /// Whether any notice at `level` contains `needle`
    #[must_use]
    pub fn contains(&self, level: NoticeLevel, needle: &str) -> bool {
        self.notices
            .lock()
            .iter()
            .any(|(l, message)| *l == level && message.contains(needle))
    }

    /// Drop everything recorded
    pub fn clear(&self) {
        self.notices.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.notices.lock().push((level, message.to_string()));
    }
}
