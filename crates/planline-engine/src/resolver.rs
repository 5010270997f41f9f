//! Live resolution of typed catalog codes
//!
//! Keystrokes in a row's code field become debounced catalog lookups.
//! Superseding is an explicit generation counter per row: every keystroke
//! bumps the row's generation, and a lookup task compares its own
//! generation twice — after the debounce sleep (a newer keystroke cancels
//! the pending trigger) and when the response arrives (a stale response
//! is discarded no matter when it lands). Requests themselves are never
//! cancelled, only ignored.

use crate::config::EditorConfig;
use crate::gate::SuppressionGate;
use crate::notify::{NoticeLevel, Notifier};
use crate::SharedDraft;
use dashmap::DashMap;
use planline_client::PlanApi;
use planline_model::{LocalId, Resolution};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// What became of one keystroke's lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// An exact match was bound into the row
    Bound {
        /// Canonical code of the bound product
        code: String,
    },
    /// Candidates exist but none matches exactly; nothing bound
    Ambiguous {
        /// Number of candidates returned
        candidates: usize,
    },
    /// The catalog knows nothing like this code
    NoMatch,
    /// A newer keystroke superseded this one
    Superseded,
    /// Too short to be worth a query
    TooShort,
    /// Same value as the last processed query; nothing to do
    Unchanged,
    /// A bulk reset swallowed the result
    Suppressed,
    /// The row disappeared while the lookup was in flight
    RowGone,
    /// The lookup itself failed; typing may continue
    SearchFailed {
        /// Transport or server detail
        detail: String,
    },
}

/// Debounced, generation-guarded code resolver
pub struct SearchBindResolver {
    api: Arc<dyn PlanApi>,
    draft: SharedDraft,
    gate: Arc<SuppressionGate>,
    notifier: Arc<dyn Notifier>,
    debounce: Duration,
    min_query_len: usize,
    generations: Arc<DashMap<LocalId, u64>>,
    last_processed: Arc<DashMap<LocalId, String>>,
}

impl SearchBindResolver {
    /// Resolver over the shared draft
    pub(crate) fn new(
        api: Arc<dyn PlanApi>,
        draft: SharedDraft,
        gate: Arc<SuppressionGate>,
        notifier: Arc<dyn Notifier>,
        config: &EditorConfig,
    ) -> Self {
        Self {
            api,
            draft,
            gate,
            notifier,
            debounce: config.debounce,
            min_query_len: config.min_query_len,
            generations: Arc::new(DashMap::new()),
            last_processed: Arc::new(DashMap::new()),
        }
    }

    /// React to one keystroke in a row's code field
    ///
    /// Bumps the row's generation and spawns the debounced lookup task.
    /// Returns the task handle (useful to observe the outcome), or `None`
    /// while a bulk reset suppresses the pipeline.
    pub fn keystroke(&self, row: LocalId, typed: &str) -> Option<JoinHandle<ResolveOutcome>> {
        if self.gate.is_suppressed() {
            tracing::trace!(%row, "keystroke ignored while resetting");
            return None;
        }
        let generation = {
            let mut entry = self.generations.entry(row).or_insert(0);
            *entry += 1;
            *entry
        };
        let task = LookupTask {
            api: Arc::clone(&self.api),
            draft: Arc::clone(&self.draft),
            gate: Arc::clone(&self.gate),
            notifier: Arc::clone(&self.notifier),
            generations: Arc::clone(&self.generations),
            last_processed: Arc::clone(&self.last_processed),
            row,
            typed: typed.trim().to_string(),
            generation,
            debounce: self.debounce,
            min_query_len: self.min_query_len,
        };
        Some(tokio::spawn(task.run()))
    }

    /// Forget per-row resolution state (row deleted, draft rebuilt)
    pub(crate) fn forget_row(&self, row: LocalId) {
        self.generations.remove(&row);
        self.last_processed.remove(&row);
    }

    /// Forget all per-row resolution state
    pub(crate) fn forget_all(&self) {
        self.generations.clear();
        self.last_processed.clear();
    }
}

struct LookupTask {
    api: Arc<dyn PlanApi>,
    draft: SharedDraft,
    gate: Arc<SuppressionGate>,
    notifier: Arc<dyn Notifier>,
    generations: Arc<DashMap<LocalId, u64>>,
    last_processed: Arc<DashMap<LocalId, String>>,
    row: LocalId,
    typed: String,
    generation: u64,
    debounce: Duration,
    min_query_len: usize,
}

impl LookupTask {
    fn is_current(&self) -> bool {
        self.generations
            .get(&self.row)
            .map(|entry| *entry.value())
            == Some(self.generation)
    }

    async fn run(self) -> ResolveOutcome {
        tokio::time::sleep(self.debounce).await;
        if !self.is_current() {
            return ResolveOutcome::Superseded;
        }
        if self.typed.chars().count() < self.min_query_len {
            return ResolveOutcome::TooShort;
        }
        let already_processed = self
            .last_processed
            .get(&self.row)
            .is_some_and(|entry| entry.value() == &self.typed);
        if already_processed {
            return ResolveOutcome::Unchanged;
        }
        self.last_processed.insert(self.row, self.typed.clone());

        tracing::debug!(row = %self.row, query = %self.typed, "issuing catalog search");
        let candidates = match self.api.search_catalog(&self.typed).await {
            Ok(candidates) => candidates,
            Err(err) => {
                // pending state cleared so retyping the same code retries
                self.last_processed.remove(&self.row);
                self.notifier
                    .notify(NoticeLevel::Warn, &format!("product search failed: {err}"));
                return ResolveOutcome::SearchFailed {
                    detail: err.to_string(),
                };
            }
        };
        if !self.is_current() {
            tracing::debug!(row = %self.row, query = %self.typed, "stale search response discarded");
            return ResolveOutcome::Superseded;
        }

        // arbitrate against the value the row holds now, not the query
        let entered = {
            let draft = self.draft.lock();
            match draft.row(self.row) {
                Some(row) => row.fields().product_code.clone(),
                None => return ResolveOutcome::RowGone,
            }
        };

        let exact = candidates
            .iter()
            .find(|candidate| candidate.product_id.eq_ignore_ascii_case(&entered));
        match exact {
            Some(hit) => {
                if self.gate.is_suppressed() {
                    return ResolveOutcome::Suppressed;
                }
                let resolution = Resolution {
                    product: hit.id,
                    code: hit.product_id.clone(),
                    name: hit.product_name.clone(),
                };
                {
                    let mut draft = self.draft.lock();
                    let Some(row) = draft.row_mut(self.row) else {
                        return ResolveOutcome::RowGone;
                    };
                    row.bind_resolution(resolution);
                }
                self.notifier.notify(
                    NoticeLevel::Success,
                    &format!("product {} matched and bound", hit.product_id),
                );
                ResolveOutcome::Bound {
                    code: hit.product_id.clone(),
                }
            }
            None if !candidates.is_empty() => {
                self.notifier.notify(
                    NoticeLevel::Warn,
                    "code found but not an exact match; enter the full code",
                );
                ResolveOutcome::Ambiguous {
                    candidates: candidates.len(),
                }
            }
            None => {
                self.notifier
                    .notify(NoticeLevel::Warn, &format!("no product matches '{entered}'"));
                ResolveOutcome::NoMatch
            }
        }
    }
}
