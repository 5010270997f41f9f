//! Editor configuration

use std::time::Duration;

/// Tunables of the editor's live behavior
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Quiet period after the last keystroke before a search is issued
    pub debounce: Duration,
    /// Shortest code fragment worth sending to the catalog
    pub min_query_len: usize,
}

impl EditorConfig {
    /// Defaults matching interactive use
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            min_query_len: 4,
        }
    }

    /// Override the debounce window
    #[inline]
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Override the minimum query length
    #[inline]
    #[must_use]
    pub fn with_min_query_len(mut self, len: usize) -> Self {
        self.min_query_len = len;
        self
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::new()
    }
}
