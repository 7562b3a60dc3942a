use axum::{
    extract::{Query, State},
    Extension, Json,
};
use labelkit_shopify::{ProductPage, ProductQuery, ShopifyError};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ProductsQuery {
    pub first: Option<u32>,
    pub after: Option<String>,
    pub query: Option<String>,
}

fn map_shopify_error(request_id: String, error: &ShopifyError) -> ApiError {
    tracing::warn!(error = %error, "shopify product lookup failed");
    match error {
        ShopifyError::RateLimited { .. } | ShopifyError::Throttled { .. } => ApiError::new(
            request_id,
            "rate_limited",
            "shopify is throttling requests; retry shortly",
        ),
        _ => ApiError::new(request_id, "upstream_error", "shopify product lookup failed"),
    }
}

/// GET /api/v1/products: one page of the shop's catalog for the label picker.
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<ProductsQuery>,
) -> Result<Json<ApiResponse<ProductPage>>, ApiError> {
    let Some(client) = state.shopify.as_ref() else {
        return Err(ApiError::new(
            req_id.0,
            "shopify_unconfigured",
            "shopify credentials are not configured",
        ));
    };

    let query = ProductQuery::new(params.first, params.after, params.query);
    let page = client
        .list_products(&query)
        .await
        .map_err(|e| map_shopify_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: page,
        meta: ResponseMeta::new(req_id.0),
    }))
}
