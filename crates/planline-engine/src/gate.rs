//! The suppression gate guarding bulk programmatic resets
//!
//! While a reset is rebuilding the draft (new plan, plan switch, full
//! reload), every live entry point — dirty-marking, search triggering,
//! save submission — must become a no-op, or the reset's own mutations
//! would be misread as operator edits. The gate is an explicit phase
//! behind a reentrancy counter, not a loose boolean, so every entry point
//! consults the same state.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// What the editor is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorPhase {
    /// Normal interactive editing
    Active,
    /// A bulk programmatic reset is in flight
    Resetting,
}

/// Reentrancy-counted gate over the editor's live pipeline
#[derive(Debug, Default)]
pub struct SuppressionGate {
    resets: AtomicUsize,
}

impl SuppressionGate {
    /// New gate in the `Active` phase
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> EditorPhase {
        if self.resets.load(Ordering::Acquire) > 0 {
            EditorPhase::Resetting
        } else {
            EditorPhase::Active
        }
    }

    /// Whether live entry points must no-op right now
    #[inline]
    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        self.phase() == EditorPhase::Resetting
    }

    /// Enter the `Resetting` phase
    ///
    /// Synchronous: the gate is closed before the caller touches the
    /// draft. Release via [`ResetGuard::settle`], which defers to the
    /// next scheduler tick so notifications produced by the reset itself
    /// stay inside the closed window.
    #[must_use]
    pub fn enter_reset(self: &Arc<Self>) -> ResetGuard {
        self.resets.fetch_add(1, Ordering::AcqRel);
        tracing::debug!("suppression gate closed");
        ResetGuard {
            gate: Arc::clone(self),
            released: false,
        }
    }

    fn release(&self) {
        let prev = self.resets.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0);
        if prev == 1 {
            tracing::debug!("suppression gate open");
        }
    }
}

/// Open handle on a closed gate
///
/// Dropping the guard releases inline as a fallback; the intended path is
/// [`ResetGuard::settle`].
#[derive(Debug)]
pub struct ResetGuard {
    gate: Arc<SuppressionGate>,
    released: bool,
}

impl ResetGuard {
    /// Release after the current tick's side effects have settled
    pub async fn settle(mut self) {
        tokio::task::yield_now().await;
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.gate.release();
        }
    }
}

impl Drop for ResetGuard {
    fn drop(&mut self) {
        self.release_once();
    }
}
