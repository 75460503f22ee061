// HTTP handlers for commission endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::commissions::calculator::{commission_amount, mark_paid};
use crate::commissions::{
    Commission, CommissionError, CreateCommissionRequest, NewCommission, PayCommissionRequest,
};

/// Handler for POST /api/commissions
/// Derives a commission from an existing sale and a beneficiary percentage.
#[utoipa::path(
    post,
    path = "/api/commissions",
    request_body = CreateCommissionRequest,
    responses(
        (status = 201, description = "Commission created", body = Commission),
        (status = 404, description = "Sale not found"),
        (status = 422, description = "Percentage outside [0, 100]")
    ),
    tag = "commissions"
)]
pub async fn create_commission_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateCommissionRequest>,
) -> Result<(StatusCode, Json<Commission>), CommissionError> {
    let sale = state
        .commissions_repo
        .find_sale(request.sale_id, request.requester_id)
        .await?
        .ok_or(CommissionError::SaleNotFound(request.sale_id))?;

    // Derivation is the only gate; the amount is frozen from here on.
    let amount = commission_amount(sale.amount, request.percentage)?;

    let commission = state
        .commissions_repo
        .insert(NewCommission {
            user_id: request.requester_id,
            sale_id: sale.id,
            beneficiary_kind: request.beneficiary_kind,
            beneficiary_id: request.beneficiary_id,
            base_amount: sale.amount,
            percentage: request.percentage,
            amount,
        })
        .await?;

    tracing::info!(
        "Created commission {} ({} of sale {})",
        commission.id,
        commission.amount,
        commission.sale_id
    );
    Ok((StatusCode::CREATED, Json(commission)))
}

/// Handler for PATCH /api/commissions/{id}/pay
/// Marks a commission as paid; the payment date is mandatory.
#[utoipa::path(
    patch,
    path = "/api/commissions/{id}/pay",
    params(
        ("id" = Uuid, Path, description = "Commission ID")
    ),
    request_body = PayCommissionRequest,
    responses(
        (status = 200, description = "Commission marked as paid", body = Commission),
        (status = 400, description = "Missing payment date"),
        (status = 404, description = "Commission not found")
    ),
    tag = "commissions"
)]
pub async fn pay_commission_handler(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PayCommissionRequest>,
) -> Result<Json<Commission>, CommissionError> {
    state
        .commissions_repo
        .find_by_id(id, request.requester_id)
        .await?
        .ok_or(CommissionError::NotFound(id))?;

    let (status, paid_at) = mark_paid(request.paid_at)?;

    let commission = state
        .commissions_repo
        .set_paid(id, request.requester_id, status, paid_at)
        .await?;

    tracing::info!("Commission {} marked as paid on {}", id, paid_at);
    Ok(Json(commission))
}
