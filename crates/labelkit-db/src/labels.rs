//! Database operations for the `labels` table.

use chrono::{DateTime, SecondsFormat, Utc};
use labelkit_core::Label;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const LABEL_COLUMNS: &str = "id, text, background, position, condition, rule_type, rule_config, \
                             product_ids, active, created_at, updated_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `labels` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LabelRow {
    pub id: Uuid,
    pub text: String,
    pub background: String,
    pub position: String,
    pub condition: String,
    pub rule_type: Option<String>,
    pub rule_config: Option<Value>,
    /// Always a JSON array; the column defaults to `'[]'`.
    pub product_ids: Value,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LabelRow> for Label {
    fn from(row: LabelRow) -> Self {
        Label {
            id: row.id.to_string(),
            text: row.text,
            background: Some(row.background),
            position: Some(row.position),
            condition: Some(row.condition),
            rule_type: row.rule_type,
            rule_config: row.rule_config,
            product_ids: Some(row.product_ids),
            active: row.active,
            created_at: Some(row.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            updated_at: Some(row.updated_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

/// Column values for a new label. Defaults are resolved by the caller.
#[derive(Debug, Clone)]
pub struct NewLabel {
    pub text: String,
    pub background: String,
    pub position: String,
    pub condition: String,
    pub rule_type: Option<String>,
    pub rule_config: Option<Value>,
    pub product_ids: Value,
    pub active: bool,
}

/// A partial update. `None` leaves the column untouched; for the nullable
/// columns `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct LabelPatch {
    pub text: Option<String>,
    pub background: Option<String>,
    pub position: Option<String>,
    pub condition: Option<String>,
    pub rule_type: Option<Option<String>>,
    pub rule_config: Option<Option<Value>>,
    pub product_ids: Option<Value>,
    pub active: Option<bool>,
}

impl LabelPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.background.is_none()
            && self.position.is_none()
            && self.condition.is_none()
            && self.rule_type.is_none()
            && self.rule_config.is_none()
            && self.product_ids.is_none()
            && self.active.is_none()
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns every label, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_labels(pool: &PgPool) -> Result<Vec<LabelRow>, DbError> {
    let rows = sqlx::query_as::<_, LabelRow>(&format!(
        "SELECT {LABEL_COLUMNS} FROM labels ORDER BY created_at DESC, id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns active labels in creation order, the order badges stack in.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_labels(pool: &PgPool) -> Result<Vec<LabelRow>, DbError> {
    let rows = sqlx::query_as::<_, LabelRow>(&format!(
        "SELECT {LABEL_COLUMNS} FROM labels WHERE active = true ORDER BY created_at, id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single label, or `None` if no row has this id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_label(pool: &PgPool, id: Uuid) -> Result<Option<LabelRow>, DbError> {
    let row = sqlx::query_as::<_, LabelRow>(&format!(
        "SELECT {LABEL_COLUMNS} FROM labels WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts a label under a freshly generated UUID and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including check-constraint
/// violations for unknown positions, conditions, or rule types.
pub async fn create_label(pool: &PgPool, label: &NewLabel) -> Result<LabelRow, DbError> {
    let row = sqlx::query_as::<_, LabelRow>(&format!(
        "INSERT INTO labels \
             (id, text, background, position, condition, rule_type, rule_config, product_ids, active) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {LABEL_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&label.text)
    .bind(&label.background)
    .bind(&label.position)
    .bind(&label.condition)
    .bind(label.rule_type.as_deref())
    .bind(label.rule_config.as_ref())
    .bind(&label.product_ids)
    .bind(label.active)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Applies a partial update and bumps `updated_at`. Concurrent updates are
/// last-write-wins per column.
///
/// Returns `None` when no row has this id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_label(
    pool: &PgPool,
    id: Uuid,
    patch: &LabelPatch,
) -> Result<Option<LabelRow>, DbError> {
    let row = sqlx::query_as::<_, LabelRow>(&format!(
        "UPDATE labels SET \
             text = COALESCE($2, text), \
             background = COALESCE($3, background), \
             position = COALESCE($4, position), \
             condition = COALESCE($5, condition), \
             rule_type = CASE WHEN $6 THEN $7 ELSE rule_type END, \
             rule_config = CASE WHEN $8 THEN $9 ELSE rule_config END, \
             product_ids = COALESCE($10, product_ids), \
             active = COALESCE($11, active), \
             updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {LABEL_COLUMNS}"
    ))
    .bind(id)
    .bind(patch.text.as_deref())
    .bind(patch.background.as_deref())
    .bind(patch.position.as_deref())
    .bind(patch.condition.as_deref())
    .bind(patch.rule_type.is_some())
    .bind(patch.rule_type.clone().flatten())
    .bind(patch.rule_config.is_some())
    .bind(patch.rule_config.clone().flatten())
    .bind(patch.product_ids.as_ref())
    .bind(patch.active)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Deletes a label. Returns `false` when no row had this id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_label(pool: &PgPool, id: Uuid) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM labels WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn row_converts_to_wire_label() {
        let id = Uuid::new_v4();
        let created = DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let row = LabelRow {
            id,
            text: "Sale".to_string(),
            background: "#ff0000".to_string(),
            position: "top-right".to_string(),
            condition: "rule_based".to_string(),
            rule_type: Some("special_price".to_string()),
            rule_config: Some(json!({"from": 10, "to": 50})),
            product_ids: json!([]),
            active: true,
            created_at: created,
            updated_at: created,
        };

        let label = Label::from(row);
        assert_eq!(label.id, id.to_string());
        assert_eq!(label.position.as_deref(), Some("top-right"));
        assert_eq!(label.created_at.as_deref(), Some("2026-03-01T10:00:00.000Z"));
        assert!(label.match_rule() != labelkit_core::MatchRule::AllProducts);
    }

    #[test]
    fn empty_patch() {
        assert!(LabelPatch::default().is_empty());
        let patch = LabelPatch {
            rule_type: Some(None),
            ..LabelPatch::default()
        };
        assert!(!patch.is_empty());
    }
}
