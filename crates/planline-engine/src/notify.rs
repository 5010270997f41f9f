//! The user-facing notification boundary
//!
//! Toast rendering lives outside this engine; everything user-visible
//! flows through [`Notifier`] so hosts can route it wherever they like.

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Neutral information
    Info,
    /// Something completed
    Success,
    /// Needs attention, nothing broke
    Warn,
    /// Something failed
    Error,
}

/// Sink for user-facing notices
pub trait Notifier: Send + Sync {
    /// Deliver one notice
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// Default sink routing notices to `tracing`
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info | NoticeLevel::Success => tracing::info!(target: "planline::notice", "{message}"),
            NoticeLevel::Warn => tracing::warn!(target: "planline::notice", "{message}"),
            NoticeLevel::Error => tracing::error!(target: "planline::notice", "{message}"),
        }
    }
}
