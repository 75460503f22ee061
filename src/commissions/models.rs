use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Commission lifecycle. Reaching `Paid` requires an explicit payment date;
/// see the calculator rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    Pending,
    ToReceive,
    Paid,
}

impl Default for CommissionStatus {
    fn default() -> Self {
        CommissionStatus::Pending
    }
}

/// Beneficiary role eligible for commission on a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BeneficiaryKind {
    Referrer,
    Vendor,
}

/// A derived financial record tied to a sale and a beneficiary.
///
/// The amount is computed once at creation and is not recomputed if the
/// underlying sale amount later changes.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Commission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub sale_id: Uuid,
    pub beneficiary_kind: BeneficiaryKind,
    pub beneficiary_id: Uuid,
    pub base_amount: Decimal,
    pub percentage: Decimal,
    pub amount: Decimal,
    pub status: CommissionStatus,
    pub paid_at: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCommission {
    pub user_id: Uuid,
    pub sale_id: Uuid,
    pub beneficiary_kind: BeneficiaryKind,
    pub beneficiary_id: Uuid,
    pub base_amount: Decimal,
    pub percentage: Decimal,
    pub amount: Decimal,
}

/// Request DTO for deriving a commission from an existing sale.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCommissionRequest {
    pub requester_id: Uuid,
    pub sale_id: Uuid,
    pub beneficiary_kind: BeneficiaryKind,
    pub beneficiary_id: Uuid,
    /// Percentage of the sale amount, must be within `[0, 100]`.
    pub percentage: Decimal,
}

/// Request DTO for marking a commission as paid.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PayCommissionRequest {
    /// The user paying the commission; the lookup and the update are both
    /// scoped to this id, like every other data access.
    pub requester_id: Uuid,
    /// Required: a commission cannot transition to Paid without it.
    pub paid_at: Option<NaiveDate>,
}
