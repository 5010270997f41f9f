//! Save scenarios across the separator, coordinator and editor

use planline_engine::{
    EditorConfig, NoticeLevel, PlanEditor, SaveOutcome, SubmitStage,
};
use planline_model::{
    FieldName, FieldValue, ItemStatus, LocalId, PlanField, Provenance, ServerId,
};
use planline_testkit::{d, InMemoryPlanApi, RecordingNotifier};
use std::sync::Arc;
use std::time::Duration;

fn setup() -> (Arc<InMemoryPlanApi>, Arc<RecordingNotifier>, PlanEditor) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    let api = Arc::new(InMemoryPlanApi::with_standard_fixture());
    let notifier = Arc::new(RecordingNotifier::new());
    let editor = PlanEditor::with_config(
        api.clone(),
        notifier.clone(),
        EditorConfig::new().with_debounce(Duration::from_millis(5)),
    );
    (api, notifier, editor)
}

#[tokio::test]
async fn edit_one_add_one_leave_one_untouched() {
    let (api, _notifier, editor) = setup();
    editor.load().await.unwrap();

    // edit child 10's quantity, add a new child, leave child 11 alone
    editor
        .set_field(LocalId(10), FieldName::PlannedQuantity, FieldValue::Integer(9))
        .unwrap();
    let added = editor.add_row().unwrap();
    editor
        .set_field(added, FieldName::Product, FieldValue::Reference(ServerId(5)))
        .unwrap();

    let report = editor.save().await.unwrap();

    assert_eq!(report.outcome(), SaveOutcome::Success);
    assert_eq!(report.created, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(api.create_calls(), 1);
    assert_eq!(api.update_calls(), 1);
    assert_eq!(api.plan_patch_calls(), 0);

    // the one patch went to child 10 and carried exactly the quantity
    let patches = api.recorded_patches();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].0, ServerId(10));
    assert_eq!(
        serde_json::to_value(&patches[0].1).unwrap(),
        serde_json::json!({ "planned_quantity": 9 })
    );

    // child 11 generated no call of any kind
    assert_eq!(api.item(ServerId(11)).unwrap().planned_quantity, 3);
    assert_eq!(api.item(ServerId(10)).unwrap().planned_quantity, 9);

    // clean save refreshed from the server: everything existing, pristine
    editor.inspect(|draft| {
        assert_eq!(draft.len(), 3);
        assert!(draft
            .rows()
            .all(|row| row.provenance() == Provenance::Existing && !row.is_dirty()));
    });
}

#[tokio::test]
async fn failed_create_does_not_mask_successful_update() {
    let (api, notifier, editor) = setup();
    editor.load().await.unwrap();

    editor
        .set_field(LocalId(10), FieldName::PlannedQuantity, FieldValue::Integer(8))
        .unwrap();
    let added = editor.add_row().unwrap();
    editor
        .set_field(added, FieldName::Product, FieldValue::Reference(ServerId(5)))
        .unwrap();
    api.fail_next_create("field 'planned_quantity': not enough stock");

    let report = editor.save().await.unwrap();

    // one success, one failure, reported as mixed
    assert_eq!(report.outcome(), SaveOutcome::Partial);
    assert_eq!(report.created, 0);
    assert_eq!(report.updated, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].stage, SubmitStage::Create);
    assert_eq!(report.failures[0].local_id, Some(added));
    assert!(report.failures[0].detail.contains("not enough stock"));
    assert!(notifier.contains(NoticeLevel::Error, "not enough stock"));

    editor.inspect(|draft| {
        // child 10 is pristine, its patch went through
        assert!(!draft.row(LocalId(10)).unwrap().is_dirty());
        // the new row is retained locally, still unsaved, for retry
        let retained = draft.row(added).unwrap();
        assert_eq!(retained.provenance(), Provenance::New);
    });
    // no refresh happened that would have discarded the failed row
    assert_eq!(editor.current_plan(), Some(ServerId(1)));
}

#[tokio::test]
async fn untouched_draft_saves_as_a_no_op() {
    let (api, notifier, editor) = setup();
    editor.load().await.unwrap();

    let report = editor.save().await.unwrap();

    assert_eq!(report.outcome(), SaveOutcome::NoOp);
    assert!(report.is_no_op());
    assert_eq!(api.create_calls(), 0);
    assert_eq!(api.update_calls(), 0);
    assert_eq!(api.plan_patch_calls(), 0);
    assert!(notifier.contains(NoticeLevel::Info, "no changes to save"));
}

#[tokio::test]
async fn invalid_new_row_does_not_block_the_valid_one() {
    let (api, notifier, editor) = setup();
    editor.load().await.unwrap();

    let invalid = editor.add_row().unwrap(); // never resolved
    let valid = editor.add_row().unwrap();
    editor
        .set_field(valid, FieldName::Product, FieldValue::Reference(ServerId(6)))
        .unwrap();

    let report = editor.save().await.unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(report.invalid.len(), 1);
    assert_eq!(report.invalid[0].local_id, invalid);
    assert_eq!(report.outcome(), SaveOutcome::Partial);
    assert_eq!(api.create_calls(), 1);
    assert!(notifier.contains(NoticeLevel::Error, "not valid"));

    editor.inspect(|draft| {
        // the valid row was replaced by its persisted form
        assert!(draft
            .rows()
            .any(|row| row.provenance() == Provenance::Existing
                && row.fields().product == Some(ServerId(6))));
        // the invalid row is still there for the operator to finish
        assert_eq!(draft.row(invalid).unwrap().provenance(), Provenance::New);
    });
}

#[tokio::test]
async fn dirty_plan_dates_go_out_as_a_parent_patch() {
    let (api, _notifier, editor) = setup();
    editor.load().await.unwrap();

    assert!(editor.set_plan_field(PlanField::EndDate, d("2026-09-15")));

    let report = editor.save().await.unwrap();

    assert_eq!(report.outcome(), SaveOutcome::Success);
    assert!(report.plan_saved);
    assert_eq!(api.plan_patch_calls(), 1);
    assert_eq!(api.create_calls(), 0);
    assert_eq!(api.update_calls(), 0);

    editor.inspect(|draft| {
        assert_eq!(draft.scalars().end_date, d("2026-09-15"));
        assert!(draft.dirty_plan_fields().is_empty());
    });
}

#[tokio::test]
async fn failed_parent_patch_skips_the_row_phases() {
    let (api, notifier, editor) = setup();
    editor.load().await.unwrap();

    editor.set_plan_field(PlanField::StartDate, d("2026-08-02"));
    editor
        .set_field(LocalId(10), FieldName::PlannedQuantity, FieldValue::Integer(7))
        .unwrap();
    api.fail_next_plan_patch("plan is locked");

    let report = editor.save().await.unwrap();

    assert_eq!(report.outcome(), SaveOutcome::Failure);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].stage, SubmitStage::Plan);
    assert_eq!(report.skipped, 1);
    assert_eq!(api.update_calls(), 0);
    assert!(notifier.contains(NoticeLevel::Error, "plan is locked"));

    // the row edit survives for retry
    editor.inspect(|draft| assert!(draft.row(LocalId(10)).unwrap().is_dirty()));
}

#[tokio::test]
async fn deleting_rows_hits_the_server_only_for_existing_ones() {
    let (api, _notifier, editor) = setup();
    editor.load().await.unwrap();

    // unsaved row: local removal only
    let added = editor.add_row().unwrap();
    assert!(editor.delete_row(added).await.unwrap());
    assert_eq!(api.delete_calls(), 0);

    // persisted row: server delete then local removal
    assert!(editor.delete_row(LocalId(10)).await.unwrap());
    assert_eq!(api.delete_calls(), 1);
    assert!(api.item(ServerId(10)).is_none());
    editor.inspect(|draft| {
        assert!(draft.row(LocalId(10)).is_none());
        assert_eq!(draft.len(), 1);
    });
}

#[tokio::test]
async fn saving_a_new_plan_posts_everything_in_one_piece() {
    let (api, notifier, editor) = setup();
    editor.load().await.unwrap();

    editor.start_new_plan().await;
    assert_eq!(editor.current_plan(), None);

    let row = editor.add_row().unwrap();
    editor
        .set_field(row, FieldName::Product, FieldValue::Reference(ServerId(3)))
        .unwrap();
    editor
        .set_field(row, FieldName::PlannedQuantity, FieldValue::Integer(4))
        .unwrap();

    let report = editor.save().await.unwrap();

    assert_eq!(report.outcome(), SaveOutcome::Success);
    assert_eq!(report.created, 1);
    assert!(report.plan_saved);
    assert_eq!(api.plan_create_calls(), 1);
    assert_eq!(api.create_calls(), 0, "items went inline, not as separate posts");
    assert!(notifier.contains(NoticeLevel::Success, "created"));

    // the editor now sits on the created plan, loaded back from the server
    assert_eq!(editor.current_plan(), Some(ServerId(2)));
    editor.inspect(|draft| {
        assert_eq!(draft.len(), 1);
        assert!(draft.rows().all(|r| r.provenance() == Provenance::Existing));
    });
}

#[tokio::test]
async fn a_new_plan_with_an_invalid_row_is_not_posted() {
    let (api, notifier, editor) = setup();
    editor.load().await.unwrap();

    editor.start_new_plan().await;
    let _unfinished = editor.add_row().unwrap();

    let report = editor.save().await.unwrap();

    assert_eq!(api.plan_create_calls(), 0);
    assert_eq!(report.invalid.len(), 1);
    assert_eq!(report.outcome(), SaveOutcome::Failure);
    assert!(notifier.contains(NoticeLevel::Error, "every row must be valid"));
}

#[tokio::test]
async fn new_row_ids_sit_above_every_known_server_id() {
    let (_api, _notifier, editor) = setup();
    editor.load().await.unwrap();

    let first = editor.add_row().unwrap();
    let second = editor.add_row().unwrap();

    // fixture's highest item id is 11
    assert_eq!(first, LocalId(12));
    assert_eq!(second, LocalId(13));
}

#[tokio::test]
async fn status_edit_patches_the_wire_string() {
    let (api, _notifier, editor) = setup();
    editor.load().await.unwrap();

    editor
        .set_field(
            LocalId(11),
            FieldName::Status,
            FieldValue::Status(ItemStatus::InProduction),
        )
        .unwrap();
    editor.save().await.unwrap();

    let patches = api.recorded_patches();
    assert_eq!(patches.len(), 1);
    assert_eq!(
        serde_json::to_value(&patches[0].1).unwrap(),
        serde_json::json!({ "status": "in_production" })
    );
    assert_eq!(
        api.item(ServerId(11)).unwrap().status,
        ItemStatus::InProduction
    );
}
