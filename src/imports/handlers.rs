// HTTP handler for the order-import endpoint

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::imports::{ImportError, ImportOrderRequest, ImportOutcome};

/// Handler for POST /api/imports
/// Runs the order-import reconciliation workflow for one external order.
#[utoipa::path(
    post,
    path = "/api/imports",
    request_body = ImportOrderRequest,
    responses(
        (status = 201, description = "Order imported; flags report which optional records were created", body = ImportOutcome),
        (status = 400, description = "Invalid request payload"),
        (status = 404, description = "Order not found at the gateway"),
        (status = 422, description = "Missing tax identifier or non-positive sale amount"),
        (status = 502, description = "Order gateway failure")
    ),
    tag = "imports"
)]
pub async fn import_order_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<ImportOrderRequest>,
) -> Result<(StatusCode, Json<ImportOutcome>), ImportError> {
    request
        .validate()
        .map_err(|e| ImportError::ValidationError(e.to_string()))?;

    let outcome = state.import_service.import_order(request).await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}
