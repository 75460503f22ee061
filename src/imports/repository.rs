use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::imports::{
    Certificate, Client, ClientStatus, NewCertificate, NewClient, NewSale, NewSchedule, Sale,
    Schedule, ScheduleStatus,
};

/// Persistence failure, detached from the backing store.
#[derive(Debug, thiserror::Error)]
#[error("database error: {0}")]
pub struct StoreError(pub String);

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError(err.to_string())
    }
}

/// The persistence primitives the import engine depends on. Each insert is a
/// separate operation; the engine issues no multi-record transactions,
/// consistent with its no-rollback policy.
#[async_trait]
pub trait ImportStore: Send + Sync {
    /// Lookup before insert — mandatory to keep clients unique per
    /// `(document, user_id)`.
    async fn find_client_by_document(
        &self,
        user_id: Uuid,
        document: &str,
    ) -> Result<Option<Client>, StoreError>;

    async fn insert_client(&self, client: NewClient) -> Result<Client, StoreError>;

    async fn insert_sale(&self, sale: NewSale) -> Result<Sale, StoreError>;

    async fn insert_schedule(&self, schedule: NewSchedule) -> Result<Schedule, StoreError>;

    async fn insert_certificate(
        &self,
        certificate: NewCertificate,
    ) -> Result<Certificate, StoreError>;
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgImportStore {
    pool: PgPool,
}

impl PgImportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImportStore for PgImportStore {
    async fn find_client_by_document(
        &self,
        user_id: Uuid,
        document: &str,
    ) -> Result<Option<Client>, StoreError> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, user_id, kind, document, name, email, phone, status, created_at
            FROM clients
            WHERE document = $1 AND user_id = $2
            "#,
        )
        .bind(document)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    async fn insert_client(&self, client: NewClient) -> Result<Client, StoreError> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (user_id, kind, document, name, email, phone, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, kind, document, name, email, phone, status, created_at
            "#,
        )
        .bind(client.user_id)
        .bind(client.kind)
        .bind(&client.document)
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(ClientStatus::Active)
        .fetch_one(&self.pool)
        .await?;

        Ok(client)
    }

    async fn insert_sale(&self, sale: NewSale) -> Result<Sale, StoreError> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (user_id, client_id, amount, status, payment_status, sale_date, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, client_id, amount, status, payment_status, sale_date, due_date, created_at
            "#,
        )
        .bind(sale.user_id)
        .bind(sale.client_id)
        .bind(sale.amount)
        .bind(sale.status)
        .bind(sale.payment_status)
        .bind(sale.sale_date)
        .bind(sale.due_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(sale)
    }

    async fn insert_schedule(&self, schedule: NewSchedule) -> Result<Schedule, StoreError> {
        let schedule = sqlx::query_as::<_, Schedule>(
            r#"
            INSERT INTO schedules (user_id, sale_id, scheduled_at, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, sale_id, scheduled_at, status, created_at
            "#,
        )
        .bind(schedule.user_id)
        .bind(schedule.sale_id)
        .bind(schedule.scheduled_at)
        .bind(ScheduleStatus::Scheduled)
        .fetch_one(&self.pool)
        .await?;

        Ok(schedule)
    }

    async fn insert_certificate(
        &self,
        certificate: NewCertificate,
    ) -> Result<Certificate, StoreError> {
        let certificate = sqlx::query_as::<_, Certificate>(
            r#"
            INSERT INTO certificates (user_id, sale_id, kind, issued_for, base_date, valid_until, cost_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, sale_id, kind, issued_for, base_date, valid_until, cost_price, created_at
            "#,
        )
        .bind(certificate.user_id)
        .bind(certificate.sale_id)
        .bind(certificate.kind)
        .bind(&certificate.issued_for)
        .bind(certificate.base_date)
        .bind(certificate.valid_until)
        .bind(certificate.cost_price)
        .fetch_one(&self.pool)
        .await?;

        Ok(certificate)
    }
}
