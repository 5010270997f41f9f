//! Two-phase batched persistence
//!
//! Creates first, then updates. A phase completes only when every request
//! in it has settled; requests within a phase run in parallel and settle
//! independently, so one row's failure neither cancels its siblings nor
//! masquerades as their outcome. The aggregate report keeps successes and
//! failures distinct — a mixed save is reported as mixed.

use crate::separator::{InvalidRow, Separation};
use crate::SharedDraft;
use futures::future::join_all;
use planline_client::{PlanApi, PlanPatch};
use planline_model::{LocalId, ServerId};
use std::sync::Arc;

/// Where the submission currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePhase {
    /// Nothing submitted yet
    Idle,
    /// Create calls in flight
    Creating,
    /// Patch calls in flight
    Updating,
    /// Every request settled without failure
    Done,
    /// Settled with at least one failure
    Failed,
}

fn advance(phase: &mut SavePhase, next: SavePhase) {
    tracing::debug!(from = ?phase, to = ?next, "save phase");
    *phase = next;
}

/// Which call a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStage {
    /// Parent plan patch
    Plan,
    /// Row create
    Create,
    /// Row patch
    Update,
}

/// One failed call, with the row it belongs to
#[derive(Debug, Clone)]
pub struct RowFailure {
    /// Row identity within the draft, if row-scoped
    pub local_id: Option<LocalId>,
    /// Server identity, when the row has one
    pub server_id: Option<ServerId>,
    /// Label for notices
    pub label: String,
    /// Failing stage
    pub stage: SubmitStage,
    /// Server-supplied detail, field-level when available
    pub detail: String,
}

/// Aggregate outcome of one save
#[derive(Debug, Clone, Default)]
pub struct SaveReport {
    /// Parent write (scalar patch, or the create of a new plan) went through
    pub plan_saved: bool,
    /// Rows created
    pub created: usize,
    /// Rows patched
    pub updated: usize,
    /// Calls that failed, per row
    pub failures: Vec<RowFailure>,
    /// New rows excluded by local validation
    pub invalid: Vec<InvalidRow>,
    /// Rows never attempted because an earlier stage failed
    pub skipped: usize,
}

/// Overall reading of a [`SaveReport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing was eligible; nothing happened
    NoOp,
    /// Everything submitted went through
    Success,
    /// Some calls succeeded, some did not
    Partial,
    /// Nothing succeeded
    Failure,
}

impl SaveReport {
    fn successes(&self) -> usize {
        self.created + self.updated + usize::from(self.plan_saved)
    }

    fn problems(&self) -> usize {
        self.failures.len() + self.invalid.len()
    }

    /// Overall reading; mixed results stay mixed
    #[must_use]
    pub fn outcome(&self) -> SaveOutcome {
        match (self.successes(), self.problems()) {
            (0, 0) => SaveOutcome::NoOp,
            (_, 0) => SaveOutcome::Success,
            (0, _) => SaveOutcome::Failure,
            _ => SaveOutcome::Partial,
        }
    }

    /// Whether the save amounted to nothing at all
    #[inline]
    #[must_use]
    pub fn is_no_op(&self) -> bool {
        self.outcome() == SaveOutcome::NoOp && self.skipped == 0
    }
}

/// Executes separations against the backend
pub struct BatchCoordinator {
    api: Arc<dyn PlanApi>,
}

impl BatchCoordinator {
    /// Coordinator over the given backend
    pub(crate) fn new(api: Arc<dyn PlanApi>) -> Self {
        Self { api }
    }

    /// Run one save: optional parent patch, then creates, then updates
    ///
    /// The parent patch goes first and aborts the row phases when it
    /// fails (the rows stay dirty locally, so a retry resubmits them).
    /// Phase two never starts before every phase-one request has settled.
    pub async fn run(
        &self,
        draft: &SharedDraft,
        separation: Separation,
        plan_patch: Option<(ServerId, PlanPatch)>,
    ) -> SaveReport {
        let mut phase = SavePhase::Idle;
        let mut report = SaveReport {
            invalid: separation.invalid_new,
            ..SaveReport::default()
        };

        if let Some((plan_id, patch)) = plan_patch {
            match self.api.update_plan(plan_id, patch).await {
                Ok(_) => {
                    report.plan_saved = true;
                    draft.lock().mark_plan_pristine();
                }
                Err(err) => {
                    tracing::warn!(%plan_id, %err, "plan patch failed; row phases skipped");
                    report.failures.push(RowFailure {
                        local_id: None,
                        server_id: Some(plan_id),
                        label: "plan".to_string(),
                        stage: SubmitStage::Plan,
                        detail: err.detail(),
                    });
                    report.skipped = separation.to_create.len() + separation.to_update.len();
                    advance(&mut phase, SavePhase::Failed);
                    return report;
                }
            }
        }

        advance(&mut phase, SavePhase::Creating);
        let created = join_all(separation.to_create.into_iter().map(|create| {
            let api = Arc::clone(&self.api);
            async move {
                let result = api.create_item(create.payload).await;
                (create.local_id, create.label, result)
            }
        }))
        .await;
        for (local_id, label, result) in created {
            match result {
                Ok(dto) => {
                    let replaced =
                        draft
                            .lock()
                            .replace_created(local_id, dto.id, dto.transferred_pcs);
                    if !replaced {
                        tracing::warn!(%local_id, "created row could not be replaced locally");
                    }
                    report.created += 1;
                }
                Err(err) => {
                    tracing::warn!(%local_id, %err, "row create failed");
                    report.failures.push(RowFailure {
                        local_id: Some(local_id),
                        server_id: None,
                        label,
                        stage: SubmitStage::Create,
                        detail: err.detail(),
                    });
                }
            }
        }

        advance(&mut phase, SavePhase::Updating);
        let updated = join_all(separation.to_update.into_iter().map(|row| {
            let api = Arc::clone(&self.api);
            async move {
                let result = api.update_item(row.server_id, row.patch).await;
                (row.local_id, row.server_id, row.label, result)
            }
        }))
        .await;
        for (local_id, server_id, label, result) in updated {
            match result {
                Ok(_) => {
                    if let Some(row) = draft.lock().row_mut(local_id) {
                        row.mark_pristine();
                    }
                    report.updated += 1;
                }
                Err(err) => {
                    tracing::warn!(%server_id, %err, "row patch failed");
                    report.failures.push(RowFailure {
                        local_id: Some(local_id),
                        server_id: Some(server_id),
                        label,
                        stage: SubmitStage::Update,
                        detail: err.detail(),
                    });
                }
            }
        }

        let outcome = if report.failures.is_empty() {
            SavePhase::Done
        } else {
            SavePhase::Failed
        };
        advance(&mut phase, outcome);
        tracing::info!(
            created = report.created,
            updated = report.updated,
            failed = report.failures.len(),
            invalid = report.invalid.len(),
            "save settled"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_readings() {
        let mut report = SaveReport::default();
        assert_eq!(report.outcome(), SaveOutcome::NoOp);
        assert!(report.is_no_op());

        report.created = 1;
        assert_eq!(report.outcome(), SaveOutcome::Success);

        report.failures.push(RowFailure {
            local_id: Some(LocalId(12)),
            server_id: None,
            label: "E003".into(),
            stage: SubmitStage::Create,
            detail: "field 'planned_quantity': too small".into(),
        });
        assert_eq!(report.outcome(), SaveOutcome::Partial);

        report.created = 0;
        assert_eq!(report.outcome(), SaveOutcome::Failure);
    }

    #[test]
    fn invalid_rows_are_not_a_no_op() {
        let report = SaveReport {
            invalid: vec![crate::separator::InvalidRow {
                local_id: LocalId(12),
                label: "row 12".into(),
                problems: vec![],
            }],
            ..SaveReport::default()
        };
        assert_eq!(report.outcome(), SaveOutcome::Failure);
        assert!(!report.is_no_op());
    }
}
