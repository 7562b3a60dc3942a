use axum::{extract::State, Json};
use labelkit_core::Label;

use super::AppState;

/// GET /api/v1/storefront/labels (and the app-proxy path).
///
/// Returns a bare array of active labels in creation order. The storefront
/// script treats any failure as "no labels", so a database error degrades to
/// an empty list instead of an error envelope.
pub(super) async fn list_labels(State(state): State<AppState>) -> Json<Vec<Label>> {
    match labelkit_db::list_active_labels(&state.pool).await {
        Ok(rows) => Json(rows.into_iter().map(Label::from).collect()),
        Err(e) => {
            tracing::error!(error = %e, "storefront label query failed");
            Json(Vec::new())
        }
    }
}
