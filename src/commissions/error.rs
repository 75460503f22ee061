use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

/// Error types for commission operations
#[derive(Debug, thiserror::Error)]
pub enum CommissionError {
    #[error("Percentage {0} is outside [0, 100]")]
    InvalidPercentage(Decimal),

    #[error("Marking a commission as paid requires a payment date")]
    MissingPaymentDate,

    #[error("Sale {0} not found")]
    SaleNotFound(Uuid),

    #[error("Commission {0} not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for CommissionError {
    fn from(err: sqlx::Error) -> Self {
        CommissionError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for CommissionError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            CommissionError::InvalidPercentage(pct) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Percentage {} is outside [0, 100]", pct),
            ),
            CommissionError::MissingPaymentDate => (
                StatusCode::BAD_REQUEST,
                "Marking a commission as paid requires a payment date".to_string(),
            ),
            CommissionError::SaleNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Sale {} not found", id))
            }
            CommissionError::NotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Commission {} not found", id))
            }
            CommissionError::DatabaseError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
