//! Partitioning the draft into create and update work
//!
//! Provenance decides the bucket, never id magnitude. New rows go out
//! wholesale once they validate; existing rows go out as a patch of
//! exactly their dirty fields, filtered to the whitelist of fields the
//! server accepts after creation. Invalid new rows are carried aside so
//! they never block the rows that are ready.

use planline_client::{ItemPatch, NewItemPayload};
use planline_model::{
    validate_new_row, DraftRow, FieldName, LocalId, PlanDraft, Provenance, RowValidationError,
    ServerId,
};

/// Fields the server accepts in an item patch
///
/// Everything else is either not editable on existing rows or rejected
/// before this stage.
pub const PATCH_FIELDS: [FieldName; 4] = [
    FieldName::PlannedQuantity,
    FieldName::PlannedDate,
    FieldName::Status,
    FieldName::Product,
];

/// A new row ready to be created
#[derive(Debug, Clone)]
pub struct CreateDraft {
    /// Row this payload came from
    pub local_id: LocalId,
    /// Label for notices and reports
    pub label: String,
    /// Payload to post
    pub payload: NewItemPayload,
}

/// A changed existing row ready to be patched
#[derive(Debug, Clone)]
pub struct RowPatch {
    /// Row this patch came from
    pub local_id: LocalId,
    /// Server identity to patch
    pub server_id: ServerId,
    /// Label for notices and reports
    pub label: String,
    /// Exactly the dirty, whitelisted fields
    pub patch: ItemPatch,
}

/// A new row that failed local validation
#[derive(Debug, Clone)]
pub struct InvalidRow {
    /// Offending row
    pub local_id: LocalId,
    /// Label for notices and reports
    pub label: String,
    /// Everything wrong with it
    pub problems: Vec<RowValidationError>,
}

/// Result of partitioning the draft
#[derive(Debug, Clone, Default)]
pub struct Separation {
    /// New rows to post
    pub to_create: Vec<CreateDraft>,
    /// Existing rows to patch
    pub to_update: Vec<RowPatch>,
    /// New rows excluded by validation
    pub invalid_new: Vec<InvalidRow>,
}

impl Separation {
    /// Whether nothing would be submitted
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty()
    }
}

/// Partition the draft's rows for submission to `plan_id`
#[must_use]
pub fn separate(draft: &PlanDraft, plan_id: ServerId) -> Separation {
    let mut separation = Separation::default();

    for row in draft.rows() {
        match row.provenance() {
            Provenance::New => match create_payload(row, plan_id) {
                Ok(payload) => separation.to_create.push(CreateDraft {
                    local_id: row.local_id(),
                    label: row.label(),
                    payload,
                }),
                Err(problems) => {
                    tracing::debug!(row = %row.local_id(), ?problems, "new row held back");
                    separation.invalid_new.push(InvalidRow {
                        local_id: row.local_id(),
                        label: row.label(),
                        problems,
                    });
                }
            },
            Provenance::Existing => {
                if !row.is_dirty() {
                    continue;
                }
                let Some(server_id) = row.server_id() else {
                    tracing::warn!(row = %row.local_id(), "existing row without server id skipped");
                    continue;
                };
                let patch = dirty_patch(row);
                if patch.is_empty() {
                    // dirty fields all outside the whitelist
                    continue;
                }
                separation.to_update.push(RowPatch {
                    local_id: row.local_id(),
                    server_id,
                    label: row.label(),
                    patch,
                });
            }
        }
    }

    tracing::debug!(
        creates = separation.to_create.len(),
        updates = separation.to_update.len(),
        invalid = separation.invalid_new.len(),
        "draft separated"
    );
    separation
}

/// Wholesale payload for a validated new row
///
/// Server-owned and display-only fields (local id, code text, display
/// name, transferred pieces) never enter the payload.
fn create_payload(
    row: &DraftRow,
    plan_id: ServerId,
) -> Result<NewItemPayload, Vec<RowValidationError>> {
    let problems = validate_new_row(row);
    let fields = row.fields();
    match (
        problems.is_empty(),
        fields.product,
        fields.planned_quantity,
        fields.planned_date,
    ) {
        (true, Some(product), Some(planned_quantity), Some(planned_date)) => Ok(NewItemPayload {
            production_plan: plan_id,
            product,
            planned_quantity,
            planned_date,
            status: fields.status,
        }),
        _ => Err(problems),
    }
}

/// Inline payload for a row posted together with a brand-new plan
pub(crate) fn inline_payload(
    row: &DraftRow,
) -> Result<planline_client::InlineItemPayload, Vec<RowValidationError>> {
    let problems = validate_new_row(row);
    let fields = row.fields();
    match (
        problems.is_empty(),
        fields.product,
        fields.planned_quantity,
        fields.planned_date,
    ) {
        (true, Some(product), Some(planned_quantity), Some(planned_date)) => {
            Ok(planline_client::InlineItemPayload {
                product,
                planned_quantity,
                planned_date,
                status: fields.status,
            })
        }
        _ => Err(problems),
    }
}

/// Patch of exactly the dirty, whitelisted fields
fn dirty_patch(row: &DraftRow) -> ItemPatch {
    let fields = row.fields();
    let mut patch = ItemPatch::default();
    for name in row.dirty_fields() {
        if !PATCH_FIELDS.contains(name) {
            continue;
        }
        match name {
            FieldName::PlannedQuantity => patch.planned_quantity = fields.planned_quantity,
            FieldName::PlannedDate => patch.planned_date = fields.planned_date,
            FieldName::Status => patch.status = Some(fields.status),
            FieldName::Product => patch.product = fields.product,
            FieldName::ProductCode | FieldName::ProductName => {}
        }
    }
    patch
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use planline_model::{
        loaded_fields, FieldValue, ItemStatus, PlanScalars, Resolution,
    };
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn draft_with_two_existing() -> PlanDraft {
        let rows = vec![
            DraftRow::from_server(
                ServerId(10),
                loaded_fields(
                    Some(ServerId(3)),
                    Some("E001".into()),
                    Some("Widget".into()),
                    5,
                    Some(date("2026-08-10")),
                    ItemStatus::Pending,
                    0,
                ),
            ),
            DraftRow::from_server(
                ServerId(11),
                loaded_fields(
                    Some(ServerId(4)),
                    Some("E002".into()),
                    Some("Gadget".into()),
                    3,
                    Some(date("2026-08-12")),
                    ItemStatus::Pending,
                    0,
                ),
            ),
        ];
        let mut draft =
            PlanDraft::from_loaded(ServerId(1), PlanScalars::for_month(date("2026-08-06")), rows);
        draft.reseed_allocator([ServerId(10), ServerId(11)]);
        draft
    }

    #[test]
    fn untouched_draft_separates_to_nothing() {
        let draft = draft_with_two_existing();
        let separation = separate(&draft, ServerId(1));
        assert!(separation.is_empty());
        assert!(separation.invalid_new.is_empty());
    }

    #[test]
    fn edited_and_added_rows_land_in_their_buckets() {
        let mut draft = draft_with_two_existing();

        draft
            .row_mut(LocalId(10))
            .unwrap()
            .set_field(FieldName::PlannedQuantity, FieldValue::Integer(9))
            .unwrap();

        let added = draft.add_row(date("2026-08-06"));
        draft.row_mut(added).unwrap().bind_resolution(Resolution {
            product: ServerId(5),
            code: "E003".into(),
            name: "Sprocket".into(),
        });

        let separation = separate(&draft, ServerId(1));

        assert_eq!(separation.to_create.len(), 1);
        assert_eq!(separation.to_update.len(), 1);
        assert!(separation.invalid_new.is_empty());

        let create = &separation.to_create[0];
        assert_eq!(create.local_id, added);
        assert_eq!(create.payload.product, ServerId(5));
        assert_eq!(create.payload.production_plan, ServerId(1));

        let update = &separation.to_update[0];
        assert_eq!(update.server_id, ServerId(10));
        let body = serde_json::to_value(&update.patch).unwrap();
        assert_eq!(body, serde_json::json!({ "planned_quantity": 9 }));
    }

    #[test]
    fn patch_has_exactly_the_dirty_whitelisted_keys() {
        let mut draft = draft_with_two_existing();
        let row = draft.row_mut(LocalId(10)).unwrap();
        row.set_field(FieldName::PlannedQuantity, FieldValue::Integer(2))
            .unwrap();
        row.set_field(
            FieldName::Status,
            FieldValue::Status(ItemStatus::InProduction),
        )
        .unwrap();
        // display-only edit must never reach the wire
        row.set_field(FieldName::ProductName, FieldValue::Text("Renamed".into()))
            .unwrap();

        let separation = separate(&draft, ServerId(1));
        let body = serde_json::to_value(&separation.to_update[0].patch).unwrap();
        let keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["planned_quantity", "status"]);
    }

    #[test]
    fn whitelist_only_dirt_produces_no_patch() {
        let mut draft = draft_with_two_existing();
        draft
            .row_mut(LocalId(10))
            .unwrap()
            .set_field(FieldName::ProductName, FieldValue::Text("Renamed".into()))
            .unwrap();

        let separation = separate(&draft, ServerId(1));
        assert!(separation.to_update.is_empty());
    }

    #[test]
    fn invalid_new_rows_never_block_valid_ones() {
        let mut draft = draft_with_two_existing();

        let invalid = draft.add_row(date("2026-08-06")); // no product bound
        let valid = draft.add_row(date("2026-08-06"));
        draft.row_mut(valid).unwrap().bind_resolution(Resolution {
            product: ServerId(5),
            code: "E003".into(),
            name: "Sprocket".into(),
        });

        let separation = separate(&draft, ServerId(1));

        assert_eq!(separation.to_create.len(), 1);
        assert_eq!(separation.to_create[0].local_id, valid);
        assert_eq!(separation.invalid_new.len(), 1);
        assert_eq!(separation.invalid_new[0].local_id, invalid);
        assert_eq!(
            separation.invalid_new[0].problems,
            vec![RowValidationError::UnresolvedProduct]
        );
    }

    #[test]
    fn new_rows_ignore_dirty_bookkeeping() {
        let mut draft = draft_with_two_existing();
        let added = draft.add_row(date("2026-08-06"));
        let row = draft.row_mut(added).unwrap();
        row.bind_resolution(Resolution {
            product: ServerId(5),
            code: "E003".into(),
            name: "Sprocket".into(),
        });
        // a new row has no dirty set worth consulting
        assert!(row.dirty_fields().is_empty());

        let separation = separate(&draft, ServerId(1));
        assert_eq!(separation.to_create.len(), 1);
    }
}
