// Client for the third-party order-management webhook. The engine treats it
// as an opaque dependency: any transport or payload-shape mismatch surfaces
// as a transport error, a `success: false` envelope as order-not-found.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use uuid::Uuid;

use crate::imports::{OrderEnvelope, OrderRecord};

/// Errors from the external order gateway. The core does not retry.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("order {0} not found at the order gateway")]
    OrderNotFound(String),

    #[error("order gateway transport error: {0}")]
    Transport(String),
}

/// Source of external order records.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn fetch_order(
        &self,
        order_id: &str,
        requester_id: Uuid,
    ) -> Result<OrderRecord, GatewayError>;
}

/// HTTP implementation posting `{orderId, requesterId}` to the configured
/// webhook URL. The request timeout is the only bound on wait time.
#[derive(Debug, Clone)]
pub struct HttpOrderGateway {
    client: Client,
    webhook_url: String,
}

impl HttpOrderGateway {
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }
}

#[async_trait]
impl OrderGateway for HttpOrderGateway {
    async fn fetch_order(
        &self,
        order_id: &str,
        requester_id: Uuid,
    ) -> Result<OrderRecord, GatewayError> {
        tracing::debug!("Fetching order {} from gateway", order_id);

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&json!({
                "orderId": order_id,
                "requesterId": requester_id,
            }))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Transport(format!(
                "order gateway returned {}",
                status
            )));
        }

        let envelope: OrderEnvelope = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("invalid gateway payload: {}", e)))?;

        match envelope.data {
            Some(data) if envelope.success => Ok(data),
            _ => Err(GatewayError::OrderNotFound(order_id.to_string())),
        }
    }
}
