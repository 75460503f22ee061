use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::imports::gateway::GatewayError;
use crate::imports::repository::StoreError;

/// Error taxonomy for the order-import workflow. Errors here abort the
/// import; soft failures (unparseable schedule fragment, validity text,
/// certificate kind) never reach this enum.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Order gateway failure: {0}")]
    Gateway(String),

    #[error("Order {0} not found")]
    OrderNotFound(String),

    #[error("Client profile carries neither CPF nor CNPJ")]
    MissingIdentifier,

    #[error("Sale amount must be greater than zero")]
    InvalidAmount,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<GatewayError> for ImportError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::OrderNotFound(order_id) => ImportError::OrderNotFound(order_id),
            GatewayError::Transport(msg) => ImportError::Gateway(msg),
        }
    }
}

impl From<StoreError> for ImportError {
    fn from(err: StoreError) -> Self {
        ImportError::DatabaseError(err.0)
    }
}

impl IntoResponse for ImportError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ImportError::Gateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ImportError::OrderNotFound(order_id) => (
                StatusCode::NOT_FOUND,
                format!("Order {} not found", order_id),
            ),
            ImportError::MissingIdentifier => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Client profile carries neither CPF nor CNPJ".to_string(),
            ),
            ImportError::InvalidAmount => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Sale amount must be greater than zero".to_string(),
            ),
            ImportError::DatabaseError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ImportError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
