use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::commissions::{Commission, CommissionError, CommissionStatus, NewCommission};
use crate::imports::Sale;

/// Repository for commission records.
#[derive(Clone)]
pub struct CommissionsRepository {
    pool: PgPool,
}

impl CommissionsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the sale a commission derives from, scoped to the requester.
    pub async fn find_sale(
        &self,
        sale_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Sale>, CommissionError> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, user_id, client_id, amount, status, payment_status, sale_date, due_date, created_at
            FROM sales
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(sale_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    pub async fn insert(&self, commission: NewCommission) -> Result<Commission, CommissionError> {
        let commission = sqlx::query_as::<_, Commission>(
            r#"
            INSERT INTO commissions
                (user_id, sale_id, beneficiary_kind, beneficiary_id, base_amount, percentage, amount, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, sale_id, beneficiary_kind, beneficiary_id,
                      base_amount, percentage, amount, status, paid_at, created_at
            "#,
        )
        .bind(commission.user_id)
        .bind(commission.sale_id)
        .bind(commission.beneficiary_kind)
        .bind(commission.beneficiary_id)
        .bind(commission.base_amount)
        .bind(commission.percentage)
        .bind(commission.amount)
        .bind(CommissionStatus::Pending)
        .fetch_one(&self.pool)
        .await?;

        Ok(commission)
    }

    pub async fn find_by_id(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Commission>, CommissionError> {
        let commission = sqlx::query_as::<_, Commission>(
            r#"
            SELECT id, user_id, sale_id, beneficiary_kind, beneficiary_id,
                   base_amount, percentage, amount, status, paid_at, created_at
            FROM commissions
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(commission)
    }

    pub async fn set_paid(
        &self,
        id: Uuid,
        user_id: Uuid,
        status: CommissionStatus,
        paid_at: NaiveDate,
    ) -> Result<Commission, CommissionError> {
        let commission = sqlx::query_as::<_, Commission>(
            r#"
            UPDATE commissions
            SET status = $3, paid_at = $4
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, sale_id, beneficiary_kind, beneficiary_id,
                      base_amount, percentage, amount, status, paid_at, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(status)
        .bind(paid_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(commission)
    }
}
