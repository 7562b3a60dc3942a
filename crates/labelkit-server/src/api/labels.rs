//! Admin CRUD over labels.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use labelkit_core::{decode_embedded_json, validate_label, Condition, Label, LabelPosition};
use labelkit_db::{LabelPatch, NewLabel};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

const DEFAULT_BACKGROUND: &str = "#000000";

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateLabelRequest {
    #[serde(default)]
    pub text: String,
    pub background: Option<String>,
    pub position: Option<String>,
    pub condition: Option<String>,
    pub rule_type: Option<String>,
    pub rule_config: Option<Value>,
    pub product_ids: Option<Value>,
    pub active: Option<bool>,
}

// Outer None = "not in request" (keep current), Some(None) = "explicitly
// cleared", Some(Some(v)) = "set to value".
#[allow(clippy::option_option)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UpdateLabelRequest {
    pub text: Option<String>,
    pub background: Option<String>,
    pub position: Option<String>,
    pub condition: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub rule_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub rule_config: Option<Option<Value>>,
    pub product_ids: Option<Value>,
    pub active: Option<bool>,
}

/// Marks a field as present even when its value is `null`.
#[allow(clippy::option_option)]
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn parse_id(req_id: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| not_found(req_id))
}

fn not_found(req_id: &str) -> ApiError {
    ApiError::new(req_id, "not_found", "label not found")
}

fn validation_error(req_id: &str, message: impl Into<String>) -> ApiError {
    ApiError::new(req_id, "validation_error", message)
}

fn trimmed(value: String) -> String {
    value.trim().to_string()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(trimmed).filter(|v| !v.is_empty())
}

/// Product ids are stored as a JSON array; a JSON-encoded array string is
/// accepted too.
fn product_id_list(req_id: &str, raw: Option<Value>) -> Result<Value, ApiError> {
    match raw.and_then(decode_embedded_json) {
        None => Ok(Value::Array(Vec::new())),
        Some(list @ Value::Array(_)) => Ok(list),
        Some(_) => Err(validation_error(req_id, "productIds must be an array")),
    }
}

fn validate(req_id: &str, label: &Label) -> Result<(), ApiError> {
    validate_label(label).map_err(|e| validation_error(req_id, e.to_string()))
}

/// Canonical stored condition; call only after [`validate`].
fn stored_condition(label: &Label) -> String {
    Condition::parse(label.condition.as_deref())
        .unwrap_or(Condition::All)
        .as_str()
        .to_string()
}

/// Canonical stored position; call only after [`validate`].
fn stored_position(label: &Label) -> String {
    label
        .position
        .as_deref()
        .and_then(LabelPosition::parse)
        .unwrap_or(LabelPosition::ADMIN_DEFAULT)
        .as_str()
        .to_string()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/labels
pub(super) async fn list_labels(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<Label>>>, ApiError> {
    let rows = labelkit_db::list_labels(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(Label::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/labels/{id}
pub(super) async fn get_label(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<Label>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &raw_id)?;

    let row = labelkit_db::get_label(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid))?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/labels
pub(super) async fn create_label(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateLabelRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Label>>), ApiError> {
    let rid = &req_id.0;

    let candidate = Label {
        id: String::new(),
        text: trimmed(body.text),
        background: Some(
            body.background
                .map(trimmed)
                .unwrap_or_else(|| DEFAULT_BACKGROUND.to_string()),
        ),
        position: Some(
            non_blank(body.position)
                .unwrap_or_else(|| LabelPosition::ADMIN_DEFAULT.as_str().to_string()),
        ),
        condition: body.condition.map(trimmed),
        rule_type: non_blank(body.rule_type),
        rule_config: body.rule_config.and_then(decode_embedded_json),
        product_ids: Some(product_id_list(rid, body.product_ids)?),
        active: body.active.unwrap_or(true),
        created_at: None,
        updated_at: None,
    };
    validate(rid, &candidate)?;

    let new_label = NewLabel {
        condition: stored_condition(&candidate),
        position: stored_position(&candidate),
        text: candidate.text,
        background: candidate.background.unwrap_or_default(),
        rule_type: candidate.rule_type,
        rule_config: candidate.rule_config,
        product_ids: candidate.product_ids.unwrap_or_default(),
        active: candidate.active,
    };

    let row = labelkit_db::create_label(&state.pool, &new_label)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    tracing::info!(label_id = %row.id, "label created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: row.into(),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PATCH /api/v1/labels/{id}: sparse update, validated against the merged
/// result.
pub(super) async fn update_label(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(raw_id): Path<String>,
    Json(body): Json<UpdateLabelRequest>,
) -> Result<Json<ApiResponse<Label>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &raw_id)?;

    let existing = labelkit_db::get_label(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid))?;

    let mut merged = Label::from(existing);
    if let Some(text) = body.text {
        merged.text = trimmed(text);
    }
    if let Some(background) = body.background {
        merged.background = Some(trimmed(background));
    }
    if let Some(position) = body.position {
        merged.position = Some(trimmed(position));
    }
    if let Some(condition) = body.condition {
        merged.condition = Some(trimmed(condition));
    }
    if let Some(rule_type) = body.rule_type.clone() {
        merged.rule_type = non_blank(rule_type);
    }
    if let Some(rule_config) = body.rule_config.clone() {
        merged.rule_config = rule_config.and_then(decode_embedded_json);
    }
    let product_ids = body
        .product_ids
        .map(|raw| product_id_list(rid, Some(raw)))
        .transpose()?;
    if let Some(ids) = &product_ids {
        merged.product_ids = Some(ids.clone());
    }
    if let Some(active) = body.active {
        merged.active = active;
    }
    validate(rid, &merged)?;

    let patch = LabelPatch {
        text: Some(merged.text.clone()),
        background: merged.background.clone(),
        position: Some(stored_position(&merged)),
        condition: Some(stored_condition(&merged)),
        rule_type: body.rule_type.map(|_| merged.rule_type.clone()),
        rule_config: body.rule_config.map(|_| merged.rule_config.clone()),
        product_ids,
        active: body.active,
    };

    let row = labelkit_db::update_label(&state.pool, id, &patch)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid))?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/labels/{id}
pub(super) async fn delete_label(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let rid = &req_id.0;
    let id = parse_id(rid, &raw_id)?;

    let deleted = labelkit_db::delete_label(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !deleted {
        return Err(not_found(rid));
    }
    tracing::info!(label_id = %id, "label deleted");

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}
