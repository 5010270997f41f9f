//! The editor facade
//!
//! Owns the shared draft, the suppression gate, the resolver and the
//! coordinator, and exposes the operations a host wires to its UI:
//! load/select/new-plan resets, row edits, live code input, delete and
//! save. All mutation funnels through here, so every entry point checks
//! the same gate.

use crate::config::EditorConfig;
use crate::coordinator::{BatchCoordinator, RowFailure, SaveReport, SubmitStage};
use crate::error::EngineError;
use crate::gate::{EditorPhase, ResetGuard, SuppressionGate};
use crate::notify::{NoticeLevel, Notifier};
use crate::resolver::{ResolveOutcome, SearchBindResolver};
use crate::separator::{inline_payload, separate, InvalidRow};
use crate::commands::{EditorCommand, Subscription};
use crate::SharedDraft;
use chrono::NaiveDate;
use parking_lot::Mutex;
use planline_client::{NewPlanPayload, PlanApi, PlanDto, PlanPatch};
use planline_model::{
    loaded_fields, DraftRow, FieldName, FieldValue, LocalId, PlanDraft, PlanField, PlanScalars,
    Provenance, ServerId,
};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Which plan a refresh should leave selected
enum Selection {
    /// First plan in the listing
    First,
    /// Whatever is selected now, when still present
    Keep,
    /// A specific plan
    Id(ServerId),
}

/// Orchestrates one plan-editing session
pub struct PlanEditor {
    api: Arc<dyn PlanApi>,
    notifier: Arc<dyn Notifier>,
    gate: Arc<SuppressionGate>,
    draft: SharedDraft,
    plans: Mutex<Vec<PlanDto>>,
    known_items: Mutex<Vec<ServerId>>,
    snapshot: Mutex<Option<PlanDto>>,
    selected_row: Mutex<Option<LocalId>>,
    resolver: SearchBindResolver,
    coordinator: BatchCoordinator,
}

impl PlanEditor {
    /// Editor with default configuration
    #[must_use]
    pub fn new(api: Arc<dyn PlanApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_config(api, notifier, EditorConfig::new())
    }

    /// Editor with explicit configuration
    #[must_use]
    pub fn with_config(
        api: Arc<dyn PlanApi>,
        notifier: Arc<dyn Notifier>,
        config: EditorConfig,
    ) -> Self {
        let gate = Arc::new(SuppressionGate::new());
        let draft: SharedDraft = Arc::new(Mutex::new(PlanDraft::new_unsaved(
            PlanScalars::for_month(today()),
        )));
        let resolver = SearchBindResolver::new(
            Arc::clone(&api),
            Arc::clone(&draft),
            Arc::clone(&gate),
            Arc::clone(&notifier),
            &config,
        );
        let coordinator = BatchCoordinator::new(Arc::clone(&api));
        Self {
            api,
            notifier,
            gate,
            draft,
            plans: Mutex::new(Vec::new()),
            known_items: Mutex::new(Vec::new()),
            snapshot: Mutex::new(None),
            selected_row: Mutex::new(None),
            resolver,
            coordinator,
        }
    }

    /// Current gate phase
    #[must_use]
    pub fn phase(&self) -> EditorPhase {
        self.gate.phase()
    }

    /// Close the gate for a host-driven bulk reset
    ///
    /// Everything live — dirty-marking, code lookups, saves — no-ops
    /// until the returned guard settles. The editor's own resets use the
    /// same mechanism.
    #[must_use]
    pub fn begin_bulk_reset(&self) -> ResetGuard {
        self.gate.enter_reset()
    }

    /// Read the draft under its lock
    pub fn inspect<R>(&self, f: impl FnOnce(&PlanDraft) -> R) -> R {
        f(&self.draft.lock())
    }

    /// Whether anything differs from the last confirmed sync
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.draft.lock().is_dirty()
    }

    /// Server identity of the selected plan, absent for an unsaved draft
    #[must_use]
    pub fn current_plan(&self) -> Option<ServerId> {
        self.draft.lock().id()
    }

    /// Load all plans, select the first and seed the allocator
    pub async fn load(&self) -> Result<(), EngineError> {
        tracing::info!("loading plans");
        self.refresh(Selection::First).await
    }

    /// Re-fetch everything, keeping the current selection when possible
    pub async fn reload(&self) -> Result<(), EngineError> {
        tracing::info!("reloading plans");
        self.refresh(Selection::Keep).await
    }

    /// Switch to another already-listed plan
    ///
    /// Unsaved-changes confirmation is the host's job: consult
    /// [`Self::is_dirty`] first and save or discard as the operator
    /// decides.
    pub async fn select_plan(&self, id: ServerId) -> Result<(), EngineError> {
        let dto = self
            .plans
            .lock()
            .iter()
            .find(|plan| plan.id == id)
            .cloned()
            .ok_or(EngineError::PlanNotFound(id))?;
        let known = self.known_items.lock().clone();

        let guard = self.gate.enter_reset();
        *self.draft.lock() = draft_from_dto(&dto, &known);
        *self.snapshot.lock() = Some(dto);
        *self.selected_row.lock() = None;
        self.resolver.forget_all();
        guard.settle().await;
        Ok(())
    }

    /// Start drafting a brand-new plan spanning the current month
    pub async fn start_new_plan(&self) {
        let known = self.known_items.lock().clone();

        let guard = self.gate.enter_reset();
        {
            let mut draft = self.draft.lock();
            *draft = PlanDraft::new_unsaved(PlanScalars::for_month(today()));
            draft.reseed_allocator(known);
        }
        *self.snapshot.lock() = None;
        *self.selected_row.lock() = None;
        self.resolver.forget_all();
        guard.settle().await;

        self.notifier.notify(NoticeLevel::Info, "drafting a new plan");
    }

    /// Throw away edits and re-init from the last loaded snapshot
    pub async fn cancel_edit(&self) {
        let snapshot = self.snapshot.lock().clone();
        let known = self.known_items.lock().clone();

        let guard = self.gate.enter_reset();
        {
            let mut draft = self.draft.lock();
            match &snapshot {
                Some(dto) => *draft = draft_from_dto(dto, &known),
                None => {
                    *draft = PlanDraft::new_unsaved(PlanScalars::for_month(today()));
                    draft.reseed_allocator(known);
                }
            }
        }
        *self.selected_row.lock() = None;
        self.resolver.forget_all();
        guard.settle().await;

        self.notifier.notify(NoticeLevel::Info, "changes discarded");
    }

    /// Append a fresh row and select it
    ///
    /// Returns `None` while a reset suppresses the pipeline.
    pub fn add_row(&self) -> Option<LocalId> {
        if self.gate.is_suppressed() {
            return None;
        }
        let local_id = self.draft.lock().add_row(today());
        *self.selected_row.lock() = Some(local_id);
        self.notifier.notify(
            NoticeLevel::Info,
            &format!("added row with temporary id {local_id}"),
        );
        Some(local_id)
    }

    /// Set one field on one row
    ///
    /// Returns `Ok(false)` while a reset suppresses the pipeline.
    pub fn set_field(
        &self,
        row: LocalId,
        name: FieldName,
        value: FieldValue,
    ) -> Result<bool, EngineError> {
        if self.gate.is_suppressed() {
            tracing::trace!(%row, ?name, "edit ignored while resetting");
            return Ok(false);
        }
        let mut draft = self.draft.lock();
        let target = draft.row_mut(row).ok_or(EngineError::RowNotFound(row))?;
        target.set_field(name, value)?;
        Ok(true)
    }

    /// Set a patchable parent field
    pub fn set_plan_field(&self, field: PlanField, value: NaiveDate) -> bool {
        if self.gate.is_suppressed() {
            return false;
        }
        self.draft.lock().set_plan_field(field, value);
        true
    }

    /// One keystroke in a row's code field
    ///
    /// Stores the text (dirty-marking it on an existing row) and hands it
    /// to the resolver. The returned handle observes the lookup outcome.
    pub fn code_input(
        &self,
        row: LocalId,
        typed: &str,
    ) -> Result<Option<JoinHandle<ResolveOutcome>>, EngineError> {
        if self.gate.is_suppressed() {
            return Ok(None);
        }
        {
            let mut draft = self.draft.lock();
            let target = draft.row_mut(row).ok_or(EngineError::RowNotFound(row))?;
            target.set_field(FieldName::ProductCode, FieldValue::Text(typed.trim().to_string()))?;
        }
        Ok(self.resolver.keystroke(row, typed))
    }

    /// Remember a row for [`Self::delete_selected`]
    pub fn select_row(&self, row: LocalId) -> Result<(), EngineError> {
        if self.draft.lock().row(row).is_none() {
            return Err(EngineError::RowNotFound(row));
        }
        *self.selected_row.lock() = Some(row);
        Ok(())
    }

    /// Currently selected row
    #[must_use]
    pub fn selected_row(&self) -> Option<LocalId> {
        *self.selected_row.lock()
    }

    /// Delete one row: server delete for existing rows, local removal
    /// for unsaved ones
    ///
    /// Returns `Ok(false)` while a reset suppresses the pipeline.
    pub async fn delete_row(&self, row: LocalId) -> Result<bool, EngineError> {
        if self.gate.is_suppressed() {
            return Ok(false);
        }
        let (provenance, server_id, label) = {
            let draft = self.draft.lock();
            let target = draft.row(row).ok_or(EngineError::RowNotFound(row))?;
            (target.provenance(), target.server_id(), target.label())
        };

        if let (Provenance::Existing, Some(server_id)) = (provenance, server_id) {
            if let Err(err) = self.api.delete_item(server_id).await {
                self.notifier.notify(
                    NoticeLevel::Error,
                    &format!("could not delete {label}: {err}"),
                );
                return Err(err.into());
            }
        }

        self.draft.lock().remove_row(row);
        self.resolver.forget_row(row);
        {
            let mut selected = self.selected_row.lock();
            if *selected == Some(row) {
                *selected = None;
            }
        }
        self.notifier
            .notify(NoticeLevel::Info, &format!("deleted {label}"));
        Ok(true)
    }

    /// Delete whatever [`Self::select_row`] marked
    pub async fn delete_selected(&self) -> Result<bool, EngineError> {
        let selected = *self.selected_row.lock();
        let Some(row) = selected else {
            self.notifier
                .notify(NoticeLevel::Warn, "select a row to delete first");
            return Ok(false);
        };
        self.delete_row(row).await
    }

    /// Persist the draft
    ///
    /// For a plan the server knows: parent patch when dated fields are
    /// dirty, then creates, then updates, each phase settling fully. For
    /// an unsaved plan: one create carrying all rows inline. A save with
    /// nothing eligible is a no-op, not an error. After a fully clean
    /// save the editor refreshes from the server; after a mixed one it
    /// keeps the draft so failed rows stay available for retry.
    pub async fn save(&self) -> Result<SaveReport, EngineError> {
        if self.gate.is_suppressed() {
            tracing::debug!("save suppressed during reset");
            return Ok(SaveReport::default());
        }
        match self.current_plan() {
            None => self.save_new_plan().await,
            Some(plan_id) => self.save_existing(plan_id).await,
        }
    }

    /// Dispatch bus commands until the bus closes
    pub async fn run_commands(&self, mut commands: Subscription) {
        while let Some(command) = commands.recv().await {
            match command {
                EditorCommand::Save => {
                    if let Err(err) = self.save().await {
                        tracing::error!(%err, "save command failed");
                    }
                }
                EditorCommand::AddRow => {
                    let _ = self.add_row();
                }
                EditorCommand::DeleteSelected => {
                    if let Err(err) = self.delete_selected().await {
                        tracing::error!(%err, "delete command failed");
                    }
                }
                EditorCommand::NewPlan => self.start_new_plan().await,
            }
        }
    }

    async fn save_existing(&self, plan_id: ServerId) -> Result<SaveReport, EngineError> {
        let (separation, plan_patch) = {
            let draft = self.draft.lock();
            (separate(&draft, plan_id), plan_patch_from(&draft))
        };

        for invalid in &separation.invalid_new {
            self.notifier.notify(
                NoticeLevel::Error,
                &format!("{} is not valid: {}", invalid.label, problems_text(invalid)),
            );
        }

        if separation.is_empty() && separation.invalid_new.is_empty() && plan_patch.is_none() {
            self.notifier.notify(NoticeLevel::Info, "no changes to save");
            return Ok(SaveReport::default());
        }

        let report = self
            .coordinator
            .run(&self.draft, separation, plan_patch.map(|p| (plan_id, p)))
            .await;
        self.announce(&report);

        // refresh only after a fully clean save; failed or invalid rows
        // must stay in the draft for retry
        if report.failures.is_empty() && report.invalid.is_empty() && !report.is_no_op() {
            self.reload().await?;
        }
        Ok(report)
    }

    async fn save_new_plan(&self) -> Result<SaveReport, EngineError> {
        let (payload, invalid, dirty) = {
            let draft = self.draft.lock();
            let mut invalid = Vec::new();
            let mut items = Vec::new();
            for row in draft.rows() {
                match inline_payload(row) {
                    Ok(item) => items.push(item),
                    Err(problems) => invalid.push(InvalidRow {
                        local_id: row.local_id(),
                        label: row.label(),
                        problems,
                    }),
                }
            }
            let scalars = draft.scalars();
            (
                NewPlanPayload {
                    start_date: scalars.start_date,
                    end_date: scalars.end_date,
                    items,
                },
                invalid,
                draft.is_dirty(),
            )
        };

        // a brand-new plan goes out in one piece; any invalid row stops it
        if !invalid.is_empty() {
            for row in &invalid {
                self.notifier.notify(
                    NoticeLevel::Error,
                    &format!("{} is not valid: {}", row.label, problems_text(row)),
                );
            }
            self.notifier
                .notify(NoticeLevel::Error, "save cancelled: every row must be valid");
            return Ok(SaveReport {
                invalid,
                ..SaveReport::default()
            });
        }
        if !dirty {
            self.notifier.notify(NoticeLevel::Info, "no changes to save");
            return Ok(SaveReport::default());
        }

        let submitted = payload.items.len();
        match self.api.create_plan(payload).await {
            Ok(created) => {
                self.notifier.notify(
                    NoticeLevel::Success,
                    &format!("plan {} created", created.plan_number),
                );
                self.refresh(Selection::Id(created.id)).await?;
                Ok(SaveReport {
                    created: submitted,
                    plan_saved: true,
                    ..SaveReport::default()
                })
            }
            Err(err) => {
                self.notifier.notify(
                    NoticeLevel::Error,
                    &format!("could not create the plan: {err}"),
                );
                Ok(SaveReport {
                    failures: vec![RowFailure {
                        local_id: None,
                        server_id: None,
                        label: "plan".to_string(),
                        stage: SubmitStage::Plan,
                        detail: err.detail(),
                    }],
                    ..SaveReport::default()
                })
            }
        }
    }

    fn announce(&self, report: &SaveReport) {
        for failure in &report.failures {
            self.notifier.notify(
                NoticeLevel::Error,
                &format!("{}: {}", failure.label, failure.detail),
            );
        }
        match report.outcome() {
            crate::coordinator::SaveOutcome::NoOp => {
                self.notifier.notify(NoticeLevel::Info, "no changes to save");
            }
            crate::coordinator::SaveOutcome::Success => {
                self.notifier.notify(
                    NoticeLevel::Success,
                    &format!(
                        "saved: {} created, {} updated",
                        report.created, report.updated
                    ),
                );
            }
            crate::coordinator::SaveOutcome::Partial => {
                self.notifier.notify(
                    NoticeLevel::Warn,
                    &format!(
                        "partially saved: {} went through, {} failed",
                        report.created + report.updated,
                        report.failures.len()
                    ),
                );
            }
            crate::coordinator::SaveOutcome::Failure => {
                self.notifier
                    .notify(NoticeLevel::Error, "nothing could be saved");
            }
        }
    }

    async fn refresh(&self, selection: Selection) -> Result<(), EngineError> {
        let plans = self.api.list_plans().await?;
        let items = self.api.list_items().await?;
        let item_ids: Vec<ServerId> = items.iter().map(|item| item.id).collect();

        let target = match selection {
            Selection::First => plans.first().cloned(),
            Selection::Keep => {
                let current = self.draft.lock().id();
                current
                    .and_then(|id| plans.iter().find(|plan| plan.id == id).cloned())
                    .or_else(|| plans.first().cloned())
            }
            Selection::Id(id) => plans
                .iter()
                .find(|plan| plan.id == id)
                .cloned()
                .or_else(|| plans.first().cloned()),
        };

        let guard = self.gate.enter_reset();
        *self.plans.lock() = plans;
        *self.known_items.lock() = item_ids.clone();
        match &target {
            Some(dto) => {
                *self.draft.lock() = draft_from_dto(dto, &item_ids);
                *self.snapshot.lock() = Some(dto.clone());
            }
            None => {
                let mut draft = PlanDraft::new_unsaved(PlanScalars::for_month(today()));
                draft.reseed_allocator(item_ids.iter().copied());
                *self.draft.lock() = draft;
                *self.snapshot.lock() = None;
                self.notifier.notify(NoticeLevel::Warn, "no plans available");
            }
        }
        *self.selected_row.lock() = None;
        self.resolver.forget_all();
        guard.settle().await;
        Ok(())
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn draft_from_dto(dto: &PlanDto, known: &[ServerId]) -> PlanDraft {
    let scalars = PlanScalars {
        plan_number: dto.plan_number.clone(),
        plan_type: dto.plan_type.clone(),
        is_serialized: dto.is_serialized,
        start_date: dto.start_date,
        end_date: dto.end_date,
    };
    let rows = dto
        .items
        .iter()
        .map(|item| {
            DraftRow::from_server(
                item.id,
                loaded_fields(
                    item.product,
                    item.product_id.clone(),
                    item.product_name.clone(),
                    item.planned_quantity,
                    item.planned_date,
                    item.status,
                    item.transferred_pcs,
                ),
            )
        })
        .collect();
    let mut draft = PlanDraft::from_loaded(dto.id, scalars, rows);
    draft.reseed_allocator(known.iter().copied());
    draft
}

fn plan_patch_from(draft: &PlanDraft) -> Option<PlanPatch> {
    let dirty = draft.dirty_plan_fields();
    if dirty.is_empty() {
        return None;
    }
    let mut patch = PlanPatch::default();
    for field in dirty {
        match field {
            PlanField::StartDate => patch.start_date = Some(draft.scalars().start_date),
            PlanField::EndDate => patch.end_date = Some(draft.scalars().end_date),
        }
    }
    Some(patch)
}

fn problems_text(row: &InvalidRow) -> String {
    row.problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use planline_model::ItemStatus;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn plan_patch_covers_exactly_the_dirty_fields() {
        let mut draft = PlanDraft::new_unsaved(PlanScalars::for_month(date("2026-08-06")));
        assert!(plan_patch_from(&draft).is_none());

        draft.set_plan_field(PlanField::EndDate, date("2026-09-15"));
        let patch = plan_patch_from(&draft).unwrap();
        assert_eq!(patch.end_date, Some(date("2026-09-15")));
        assert_eq!(patch.start_date, None);
    }

    #[test]
    fn draft_from_dto_maps_rows_and_seeds_the_allocator() {
        let dto = PlanDto {
            id: ServerId(1),
            plan_number: "PP-2026-08".into(),
            plan_type: "monthly".into(),
            is_serialized: false,
            start_date: date("2026-08-01"),
            end_date: date("2026-08-31"),
            items: vec![planline_client::PlanItemDto {
                id: ServerId(10),
                production_plan: Some(ServerId(1)),
                product: Some(ServerId(3)),
                product_id: Some("E001".into()),
                product_name: Some("Widget".into()),
                planned_quantity: 5,
                planned_date: Some(date("2026-08-10")),
                status: ItemStatus::Pending,
                transferred_pcs: 0,
            }],
            created_at: None,
            updated_at: None,
        };

        let mut draft = draft_from_dto(&dto, &[ServerId(10), ServerId(11)]);

        assert_eq!(draft.id(), Some(ServerId(1)));
        assert_eq!(draft.len(), 1);
        let row = draft.row(LocalId(10)).unwrap();
        assert_eq!(row.provenance(), Provenance::Existing);
        assert_eq!(row.fields().product_code, "E001");

        // allocator floor sits above every known item id
        let added = draft.add_row(date("2026-08-06"));
        assert_eq!(added, LocalId(12));
    }
}
