//! The editable plan draft: parent scalars plus the ordered row list

use crate::id::{IdAllocator, LocalId, ServerId};
use crate::row::{DraftRow, Provenance, RowFields};
use chrono::{Datelike, Days, NaiveDate};
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Parent fields that may be patched after creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PlanField {
    /// Plan validity start
    StartDate,
    /// Plan validity end
    EndDate,
}

/// Scalar fields of the parent plan
#[derive(Debug, Clone)]
pub struct PlanScalars {
    /// Human-readable plan number; assigned by the server on creation
    pub plan_number: String,
    /// Plan periodicity
    pub plan_type: String,
    /// Whether items on this plan carry serial numbers
    pub is_serialized: bool,
    /// Plan validity start
    pub start_date: NaiveDate,
    /// Plan validity end
    pub end_date: NaiveDate,
}

impl PlanScalars {
    /// Defaults for a plan drafted on `today`: the current calendar month
    #[must_use]
    pub fn for_month(today: NaiveDate) -> Self {
        let first = today.with_day(1).unwrap_or(today);
        let last = first
            .checked_add_months(chrono::Months::new(1))
            .and_then(|next| next.checked_sub_days(Days::new(1)))
            .unwrap_or(today);
        Self {
            plan_number: String::new(),
            plan_type: "monthly".to_string(),
            is_serialized: false,
            start_date: first,
            end_date: last,
        }
    }
}

/// One production plan being edited, with its line items
///
/// The row list is ordered and keyed by [`LocalId`]. The embedded
/// allocator mints ids for added rows; it must be reseeded from the
/// authoritative server id set at every full reload.
#[derive(Debug, Clone)]
pub struct PlanDraft {
    id: Option<ServerId>,
    scalars: PlanScalars,
    dirty: BTreeSet<PlanField>,
    rows: IndexMap<LocalId, DraftRow>,
    allocator: IdAllocator,
}

impl PlanDraft {
    /// Draft for a plan that does not exist on the server yet
    #[must_use]
    pub fn new_unsaved(scalars: PlanScalars) -> Self {
        Self {
            id: None,
            scalars,
            dirty: BTreeSet::new(),
            rows: IndexMap::new(),
            allocator: IdAllocator::new(),
        }
    }

    /// Draft rebuilt from a plan loaded off the server
    ///
    /// `rows` must all be `Existing`; order is preserved.
    #[must_use]
    pub fn from_loaded(id: ServerId, scalars: PlanScalars, rows: Vec<DraftRow>) -> Self {
        let mut map = IndexMap::with_capacity(rows.len());
        for row in rows {
            debug_assert_eq!(row.provenance(), Provenance::Existing);
            map.insert(row.local_id(), row);
        }
        Self {
            id: Some(id),
            scalars,
            dirty: BTreeSet::new(),
            rows: map,
            allocator: IdAllocator::new(),
        }
    }

    /// Re-seed the allocator from the authoritative children id set
    pub fn reseed_allocator<I>(&mut self, known: I)
    where
        I: IntoIterator<Item = ServerId>,
    {
        self.allocator.reseed(known);
        debug_assert!(self
            .rows
            .values()
            .filter_map(DraftRow::server_id)
            .all(|id| id.0 < self.allocator.watermark()));
    }

    /// Server identity of the plan, absent until first save
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<ServerId> {
        self.id
    }

    /// Parent scalar fields
    #[inline]
    #[must_use]
    pub fn scalars(&self) -> &PlanScalars {
        &self.scalars
    }

    /// Parent fields changed since the last confirmed sync
    #[inline]
    #[must_use]
    pub fn dirty_plan_fields(&self) -> &BTreeSet<PlanField> {
        &self.dirty
    }

    /// Set a patchable parent field
    pub fn set_plan_field(&mut self, field: PlanField, value: NaiveDate) {
        match field {
            PlanField::StartDate => self.scalars.start_date = value,
            PlanField::EndDate => self.scalars.end_date = value,
        }
        self.dirty.insert(field);
    }

    /// Clear parent-field dirt after a confirmed sync
    pub fn mark_plan_pristine(&mut self) {
        self.dirty.clear();
    }

    /// Clear all dirt, parent and rows
    pub fn mark_all_pristine(&mut self) {
        self.dirty.clear();
        for row in self.rows.values_mut() {
            row.mark_pristine();
        }
    }

    /// Add a locally minted row at the end of the list
    pub fn add_row(&mut self, today: NaiveDate) -> LocalId {
        let local_id = self.allocator.next_temp_id();
        self.rows.insert(local_id, DraftRow::new_local(local_id, today));
        local_id
    }

    /// Remove a row, preserving the order of the rest
    pub fn remove_row(&mut self, local_id: LocalId) -> Option<DraftRow> {
        self.rows.shift_remove(&local_id)
    }

    /// Look up a row
    #[inline]
    #[must_use]
    pub fn row(&self, local_id: LocalId) -> Option<&DraftRow> {
        self.rows.get(&local_id)
    }

    /// Look up a row mutably
    pub fn row_mut(&mut self, local_id: LocalId) -> Option<&mut DraftRow> {
        self.rows.get_mut(&local_id)
    }

    /// Rows in display order
    pub fn rows(&self) -> impl Iterator<Item = &DraftRow> {
        self.rows.values()
    }

    /// Number of rows
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the draft has no rows
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether anything differs from the last confirmed sync
    ///
    /// True when a parent field or any row is dirty, or when an
    /// unpersisted row is present.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
            || self
                .rows
                .values()
                .any(|row| row.is_dirty() || row.provenance() == Provenance::New)
    }

    /// Replace a `New` row the server just accepted with its `Existing` form
    ///
    /// The replacement keeps the row's position and is keyed by the
    /// assigned server id. Should that id already be held as the local id
    /// of another unsaved row, that row is moved to a fresh temporary id
    /// first — local ids are join keys, not identity.
    pub fn replace_created(
        &mut self,
        local_id: LocalId,
        server_id: ServerId,
        transferred_pcs: i64,
    ) -> bool {
        if !self.rows.contains_key(&local_id) {
            tracing::warn!(%local_id, "created row vanished before replacement");
            return false;
        }
        self.allocator.reseed([server_id]);

        let new_key = LocalId::from(server_id);
        if new_key != local_id && self.rows.contains_key(&new_key) {
            let fresh = self.allocator.next_temp_id();
            if let Some(colliding) = self.rows.shift_remove(&new_key) {
                debug_assert_eq!(colliding.provenance(), Provenance::New);
                self.rows.insert(fresh, colliding.rekeyed(fresh));
                tracing::warn!(%new_key, %fresh, "unsaved row moved off a freshly assigned server id");
            }
        }

        let Some(index) = self.rows.get_index_of(&local_id) else {
            return false;
        };
        let Some(row) = self.rows.shift_remove(&local_id) else {
            return false;
        };
        let created = row.into_created(server_id, transferred_pcs);
        self.rows
            .shift_insert(index.min(self.rows.len()), created.local_id(), created);
        true
    }
}

/// Build row fields for a loaded server item
///
/// Keeps the wire-to-draft field mapping in one place for callers that
/// translate server rows.
#[must_use]
pub fn loaded_fields(
    product: Option<ServerId>,
    product_code: Option<String>,
    product_name: Option<String>,
    planned_quantity: i64,
    planned_date: Option<NaiveDate>,
    status: crate::status::ItemStatus,
    transferred_pcs: i64,
) -> RowFields {
    RowFields {
        product,
        product_code: product_code.unwrap_or_default(),
        product_name,
        planned_quantity: Some(planned_quantity),
        planned_date,
        status,
        transferred_pcs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::{FieldName, FieldValue};
    use crate::status::ItemStatus;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn loaded_row(id: u64) -> DraftRow {
        DraftRow::from_server(
            ServerId(id),
            loaded_fields(
                Some(ServerId(1)),
                Some("E001".into()),
                Some("Widget".into()),
                5,
                Some(date("2026-08-10")),
                ItemStatus::Pending,
                0,
            ),
        )
    }

    fn loaded_draft() -> PlanDraft {
        let mut draft = PlanDraft::from_loaded(
            ServerId(1),
            PlanScalars::for_month(date("2026-08-06")),
            vec![loaded_row(10), loaded_row(11)],
        );
        draft.reseed_allocator([ServerId(10), ServerId(11)]);
        draft
    }

    #[test]
    fn month_defaults_span_the_calendar_month() {
        let scalars = PlanScalars::for_month(date("2026-08-06"));
        assert_eq!(scalars.start_date, date("2026-08-01"));
        assert_eq!(scalars.end_date, date("2026-08-31"));

        let feb = PlanScalars::for_month(date("2024-02-15"));
        assert_eq!(feb.end_date, date("2024-02-29"));
    }

    #[test]
    fn added_rows_get_ids_above_the_server_watermark() {
        let mut draft = loaded_draft();

        let a = draft.add_row(date("2026-08-06"));
        let b = draft.add_row(date("2026-08-06"));

        assert_eq!(a, LocalId(12));
        assert_eq!(b, LocalId(13));
        assert_eq!(draft.len(), 4);
    }

    #[test]
    fn parent_field_edits_are_tracked() {
        let mut draft = loaded_draft();
        assert!(!draft.is_dirty());

        draft.set_plan_field(PlanField::EndDate, date("2026-09-15"));

        assert!(draft.is_dirty());
        assert_eq!(
            draft.dirty_plan_fields().iter().copied().collect::<Vec<_>>(),
            vec![PlanField::EndDate]
        );
        draft.mark_plan_pristine();
        assert!(!draft.is_dirty());
    }

    #[test]
    fn unsaved_row_makes_the_draft_dirty() {
        let mut draft = loaded_draft();
        draft.add_row(date("2026-08-06"));
        assert!(draft.is_dirty());
    }

    #[test]
    fn replace_created_keeps_position_and_order() {
        let mut draft = loaded_draft();
        let temp = draft.add_row(date("2026-08-06"));

        assert!(draft.replace_created(temp, ServerId(40), 0));

        let ids: Vec<_> = draft.rows().map(DraftRow::local_id).collect();
        assert_eq!(ids, vec![LocalId(10), LocalId(11), LocalId(40)]);
        let created = draft.row(LocalId(40)).unwrap();
        assert_eq!(created.provenance(), Provenance::Existing);
        assert!(!created.is_dirty());
        // the replaced temp id no longer resolves
        assert!(draft.row(temp).is_none());
    }

    #[test]
    fn replace_created_moves_a_colliding_unsaved_row() {
        let mut draft = loaded_draft();
        let first = draft.add_row(date("2026-08-06")); // 12
        let second = draft.add_row(date("2026-08-06")); // 13
        draft
            .row_mut(second)
            .unwrap()
            .set_field(FieldName::ProductCode, FieldValue::Text("E004".into()))
            .unwrap();

        // server assigns the id the second unsaved row happens to hold
        assert!(draft.replace_created(first, ServerId(13), 0));

        let created = draft.row(LocalId(13)).unwrap();
        assert_eq!(created.provenance(), Provenance::Existing);

        // the unsaved row survived under a fresh temp id, state intact
        let moved = draft
            .rows()
            .find(|r| r.provenance() == Provenance::New)
            .unwrap();
        assert!(moved.local_id().0 > 13);
        assert_eq!(moved.fields().product_code, "E004");
    }

    #[test]
    fn remove_row_preserves_order() {
        let mut draft = loaded_draft();
        draft.add_row(date("2026-08-06"));

        let removed = draft.remove_row(LocalId(10)).unwrap();
        assert_eq!(removed.server_id(), Some(ServerId(10)));

        let ids: Vec<_> = draft.rows().map(DraftRow::local_id).collect();
        assert_eq!(ids, vec![LocalId(11), LocalId(12)]);
    }
}
