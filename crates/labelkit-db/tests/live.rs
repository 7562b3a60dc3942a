//! Live integration tests for labelkit-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/labelkit-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use labelkit_core::{Label, MatchRule};
use labelkit_db::{
    create_label, delete_label, get_label, list_active_labels, list_labels, update_label,
    LabelPatch, NewLabel,
};
use serde_json::json;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_label(text: &str) -> NewLabel {
    NewLabel {
        text: text.to_string(),
        background: "#000000".to_string(),
        position: "bottom-center".to_string(),
        condition: "all".to_string(),
        rule_type: None,
        rule_config: None,
        product_ids: json!([]),
        active: true,
    }
}

// ---------------------------------------------------------------------------
// Create / read
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn create_then_get_round_trips_columns(pool: sqlx::PgPool) {
    let mut input = new_label("Sale");
    input.condition = "rule_based".to_string();
    input.rule_type = Some("special_price".to_string());
    input.rule_config = Some(json!({"from": 10, "to": 50}));

    let created = create_label(&pool, &input)
        .await
        .expect("create_label failed");
    let fetched = get_label(&pool, created.id)
        .await
        .expect("get_label failed")
        .expect("label should exist");

    assert_eq!(fetched.text, "Sale");
    assert_eq!(fetched.rule_config, Some(json!({"from": 10, "to": 50})));
    assert_eq!(fetched.product_ids, json!([]));
    assert!(fetched.active);
    assert_eq!(fetched.created_at, fetched.updated_at);

    let label = Label::from(fetched);
    assert!(matches!(label.match_rule(), MatchRule::RuleBased(_)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_unknown_id_returns_none(pool: sqlx::PgPool) {
    let found = get_label(&pool, Uuid::new_v4())
        .await
        .expect("get_label failed");
    assert!(found.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn invalid_position_is_rejected_by_schema(pool: sqlx::PgPool) {
    let mut input = new_label("Sale");
    input.position = "middle".to_string();
    let result = create_label(&pool, &input).await;
    assert!(result.is_err(), "check constraint should reject 'middle'");
}

#[sqlx::test(migrations = "../../migrations")]
async fn active_listing_excludes_inactive_labels(pool: sqlx::PgPool) {
    create_label(&pool, &new_label("First"))
        .await
        .expect("create first");
    let mut hidden = new_label("Hidden");
    hidden.active = false;
    create_label(&pool, &hidden).await.expect("create hidden");
    create_label(&pool, &new_label("Second"))
        .await
        .expect("create second");

    let all = list_labels(&pool).await.expect("list_labels failed");
    assert_eq!(all.len(), 3);

    let active = list_active_labels(&pool)
        .await
        .expect("list_active_labels failed");
    let texts: Vec<_> = active.iter().map(|row| row.text.as_str()).collect();
    assert_eq!(texts.len(), 2);
    assert!(!texts.contains(&"Hidden"));
}

// ---------------------------------------------------------------------------
// Update / delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn partial_update_touches_only_given_columns(pool: sqlx::PgPool) {
    let mut input = new_label("New");
    input.condition = "rule_based".to_string();
    input.rule_type = Some("new_arrival".to_string());
    input.rule_config = Some(json!({"days": 30}));
    let created = create_label(&pool, &input).await.expect("create");

    let patch = LabelPatch {
        text: Some("Just in".to_string()),
        rule_config: Some(Some(json!({"days": 14}))),
        ..LabelPatch::default()
    };
    let updated = update_label(&pool, created.id, &patch)
        .await
        .expect("update_label failed")
        .expect("label should exist");

    assert_eq!(updated.text, "Just in");
    assert_eq!(updated.rule_config, Some(json!({"days": 14})));
    assert_eq!(updated.rule_type.as_deref(), Some("new_arrival"));
    assert_eq!(updated.background, "#000000");
    assert!(updated.updated_at >= created.updated_at);
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_can_clear_nullable_columns(pool: sqlx::PgPool) {
    let mut input = new_label("Sale");
    input.condition = "rule_based".to_string();
    input.rule_type = Some("special_price".to_string());
    input.rule_config = Some(json!({"from": 5}));
    let created = create_label(&pool, &input).await.expect("create");

    let patch = LabelPatch {
        condition: Some("all".to_string()),
        rule_type: Some(None),
        rule_config: Some(None),
        ..LabelPatch::default()
    };
    let updated = update_label(&pool, created.id, &patch)
        .await
        .expect("update_label failed")
        .expect("label should exist");

    assert_eq!(updated.condition, "all");
    assert!(updated.rule_type.is_none());
    assert!(updated.rule_config.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_unknown_id_returns_none(pool: sqlx::PgPool) {
    let patch = LabelPatch {
        active: Some(false),
        ..LabelPatch::default()
    };
    let result = update_label(&pool, Uuid::new_v4(), &patch)
        .await
        .expect("update_label failed");
    assert!(result.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn delete_reports_whether_a_row_was_removed(pool: sqlx::PgPool) {
    let created = create_label(&pool, &new_label("Gone"))
        .await
        .expect("create");

    assert!(delete_label(&pool, created.id).await.expect("delete"));
    assert!(!delete_label(&pool, created.id).await.expect("delete again"));
    assert!(get_label(&pool, created.id)
        .await
        .expect("get_label failed")
        .is_none());
}
