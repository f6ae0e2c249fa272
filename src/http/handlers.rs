//! Inbound route handlers and status mapping.

use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::FetchError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::upstream::types::ProductId;

/// `GET /product/{productid}/similar`
///
/// 200 with the reachable subset (possibly empty), 404 when the root id is
/// unknown, 500 on any other resolution failure. Absorbed per-item failures
/// never surface here.
pub async fn similar_products(
    State(state): State<AppState>,
    Path(productid): Path<String>,
) -> Response {
    let start_time = Instant::now();

    let Ok(root) = ProductId::new(productid) else {
        metrics::record_request(StatusCode::NOT_FOUND, start_time);
        return StatusCode::NOT_FOUND.into_response();
    };

    match state.service.get_similar_products(&root).await {
        Ok(details) => {
            metrics::record_request(StatusCode::OK, start_time);
            (StatusCode::OK, Json(details)).into_response()
        }
        Err(FetchError::NotFound(_)) => {
            tracing::warn!(product_id = %root, "Product not found");
            metrics::record_request(StatusCode::NOT_FOUND, start_time);
            StatusCode::NOT_FOUND.into_response()
        }
        Err(err) => {
            tracing::error!(product_id = %root, error = %err, "Error getting similar products");
            metrics::record_request(StatusCode::INTERNAL_SERVER_ERROR, start_time);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
