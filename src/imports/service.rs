use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::imports::status_parser::{
    certificate_kind_from_product, parse_status, valid_until, validity_years, OrderStatusTag,
};
use crate::imports::{
    ClientKind, ImportError, ImportOrderRequest, ImportOutcome, ImportStore, NewCertificate,
    NewClient, NewSale, NewSchedule, OrderGateway, SaleStatus,
};
use crate::normalize::{latest_activity_date, noon_utc, parse_currency};

/// Orchestrates the order-import reconciliation workflow.
///
/// Steps are strictly sequential: fetch order → resolve client → build sale
/// → detect schedule → detect certificate. Failures in the first three steps
/// abort the import; schedule/certificate failures are reported through the
/// outcome flags because the sale is already valid without them. There is no
/// rollback across steps — records committed by an earlier step stay.
#[derive(Clone)]
pub struct ImportService {
    gateway: Arc<dyn OrderGateway>,
    store: Arc<dyn ImportStore>,
}

impl ImportService {
    pub fn new(gateway: Arc<dyn OrderGateway>, store: Arc<dyn ImportStore>) -> Self {
        Self { gateway, store }
    }

    /// Import one external order for the requesting user.
    pub async fn import_order(
        &self,
        request: ImportOrderRequest,
    ) -> Result<ImportOutcome, ImportError> {
        let requester_id = request.requester_id;

        // Step 1: fetch the external order.
        let order = self
            .gateway
            .fetch_order(&request.order_id, requester_id)
            .await?;
        let tag = parse_status(&order.status);
        tracing::debug!(
            "Order {} fetched, status {:?} -> {:?}",
            order.order_id,
            order.status,
            tag
        );

        // Step 2: resolve the client. The document is the natural key;
        // an existing client is reused untouched.
        let profile = &order.client_profile;
        let document = profile.document().ok_or(ImportError::MissingIdentifier)?;

        let (client_id, client_created) = match self
            .store
            .find_client_by_document(requester_id, document)
            .await?
        {
            Some(existing) => {
                tracing::debug!("Reusing client {} for document match", existing.id);
                (existing.id, false)
            }
            None => {
                let kind = if profile.is_organization() {
                    ClientKind::Pj
                } else {
                    ClientKind::Pf
                };
                let client = self
                    .store
                    .insert_client(NewClient {
                        user_id: requester_id,
                        kind,
                        document: document.to_string(),
                        name: profile.display_name(),
                        email: profile.email.clone(),
                        phone: profile.phone.clone(),
                    })
                    .await?;
                tracing::info!("Created client {} from order {}", client.id, order.order_id);
                (client.id, true)
            }
        };

        // Step 3: build the sale. The amount gate runs before any insert
        // in this step.
        let amount = parse_currency(&request.sale_value);
        if amount <= Decimal::ZERO {
            return Err(ImportError::InvalidAmount);
        }

        let status = if tag == OrderStatusTag::Completed {
            SaleStatus::Issued
        } else {
            SaleStatus::Pending
        };
        let sale_date = request
            .sale_date
            .or_else(|| {
                latest_activity_date(order.payment_history.iter().map(|p| p.date.as_str()))
            })
            .unwrap_or_else(|| Utc::now().date_naive());

        let sale = self
            .store
            .insert_sale(NewSale {
                user_id: requester_id,
                client_id: Some(client_id),
                amount,
                status,
                payment_status: request.payment_status.unwrap_or_default(),
                sale_date: noon_utc(sale_date),
                due_date: request.due_date,
            })
            .await?;
        tracing::info!(
            "Created sale {} ({}) from order {}",
            sale.id,
            sale.status,
            order.order_id
        );

        // Step 4: schedule, only for a parseable scheduling directive.
        // Failures here leave the sale in place and are only flagged.
        let mut schedule_id = None;
        match tag {
            OrderStatusTag::Scheduled(scheduled_at) => {
                match self
                    .store
                    .insert_schedule(NewSchedule {
                        user_id: requester_id,
                        sale_id: sale.id,
                        scheduled_at,
                    })
                    .await
                {
                    Ok(schedule) => {
                        tracing::info!("Created schedule {} for sale {}", schedule.id, sale.id);
                        schedule_id = Some(schedule.id);
                    }
                    Err(e) => {
                        tracing::warn!("Sale {} kept without schedule: {}", sale.id, e);
                    }
                }
            }
            OrderStatusTag::ScheduledUnparsed => {
                tracing::warn!(
                    "Order {} mentions scheduling but the date fragment did not parse; skipping",
                    order.order_id
                );
            }
            _ => {}
        }

        // Step 5: certificate, only for completed orders. Same soft-failure
        // policy as the schedule.
        let mut certificate_id = None;
        if tag == OrderStatusTag::Completed {
            let kind = certificate_kind_from_product(
                order
                    .product_data
                    .product_name_selected
                    .as_deref()
                    .unwrap_or(""),
            );
            let years = validity_years(order.product_data.validity.as_deref().unwrap_or(""));
            let base_date = request
                .certificate_date
                .unwrap_or_else(|| Utc::now().date_naive());
            let cost_price = order
                .product_data
                .value
                .as_ref()
                .map(|v| v.to_decimal())
                .unwrap_or(Decimal::ZERO);

            match self
                .store
                .insert_certificate(NewCertificate {
                    user_id: requester_id,
                    sale_id: sale.id,
                    kind,
                    issued_for: profile.display_name(),
                    base_date,
                    valid_until: valid_until(base_date, years),
                    cost_price,
                })
                .await
            {
                Ok(certificate) => {
                    tracing::info!(
                        "Created {} certificate {} for sale {}, valid until {}",
                        certificate.kind,
                        certificate.id,
                        sale.id,
                        certificate.valid_until
                    );
                    certificate_id = Some(certificate.id);
                }
                Err(e) => {
                    tracing::warn!("Sale {} kept without certificate: {}", sale.id, e);
                }
            }
        }

        Ok(ImportOutcome {
            client_id,
            client_created,
            sale_id: sale.id,
            schedule_created: schedule_id.is_some(),
            schedule_id,
            certificate_created: certificate_id.is_some(),
            certificate_id,
        })
    }
}
