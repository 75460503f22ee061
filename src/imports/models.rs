use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::normalize::RawMoney;

// ============================================================================
// External order payload (read-only, loosely typed — defaulted at the boundary)
// ============================================================================

/// Response envelope returned by the external order-management system.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<OrderRecord>,
}

/// An order as reported by the external order-management system.
///
/// The `status` field is free text and may embed a scheduling directive
/// (`"Agendado Dia DD/MM/YYYY HH:MM"`) or the completion literal
/// (`"Concluído"`); see the status parser.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub client_profile: ClientProfile,
    #[serde(default)]
    pub product_data: ProductData,
    #[serde(default)]
    pub payment_history: Vec<PaymentEntry>,
    #[serde(default)]
    pub documents: Vec<DocumentEntry>,
}

/// Buyer profile embedded in the external order. At least one of `cpf` /
/// `cnpj` is required downstream — it is the natural key for deduplication.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientProfile {
    /// `"PF"` or `"PJ"`; not always present, so the kind is also inferred
    /// from which tax identifier is filled in.
    #[serde(rename = "type")]
    pub client_type: Option<String>,
    pub cpf: Option<String>,
    pub cnpj: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub social_reason: Option<String>,
    pub trade_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductData {
    pub product_name_selected: Option<String>,
    /// Free text such as `"1 ano"` or `"2 anos"`.
    pub validity: Option<String>,
    pub value: Option<RawMoney>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEntry {
    /// `"DD/MM/YYYY HH:MM"` text, most recent entry wins for date defaults.
    #[serde(default)]
    pub date: String,
    pub action: Option<String>,
    pub message: Option<String>,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEntry {
    pub document_type: Option<String>,
    pub status: Option<String>,
}

impl ClientProfile {
    fn non_empty(field: &Option<String>) -> Option<&str> {
        field.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Whether the profile describes an organization: a CNPJ is present or
    /// the external type says so.
    pub fn is_organization(&self) -> bool {
        Self::non_empty(&self.cnpj).is_some()
            || self
                .client_type
                .as_deref()
                .is_some_and(|t| t.trim().eq_ignore_ascii_case("PJ"))
    }

    /// The tax identifier used for client deduplication: CNPJ for
    /// organizations, CPF otherwise. `None` when neither is filled in.
    pub fn document(&self) -> Option<&str> {
        Self::non_empty(&self.cnpj).or_else(|| Self::non_empty(&self.cpf))
    }

    /// Synthesize a display name: organizations prefer the social reason,
    /// then the trade name; persons use `"{name} {surname}"`. Each side
    /// falls back to the other before the unidentified-client literal.
    pub fn display_name(&self) -> String {
        let person = {
            let name = Self::non_empty(&self.name).unwrap_or("");
            let surname = Self::non_empty(&self.surname).unwrap_or("");
            format!("{} {}", name, surname).trim().to_string()
        };
        let organization = Self::non_empty(&self.social_reason)
            .or_else(|| Self::non_empty(&self.trade_name))
            .unwrap_or("")
            .to_string();

        let (preferred, fallback) = if self.is_organization() {
            (organization, person)
        } else {
            (person, organization)
        };

        if !preferred.is_empty() {
            preferred
        } else if !fallback.is_empty() {
            fallback
        } else {
            "Cliente não identificado".to_string()
        }
    }
}

// ============================================================================
// Persisted entities
// ============================================================================

/// Client kind, mirroring the Brazilian tax-identifier split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ClientKind {
    Pf,
    Pj,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    Active,
    Inactive,
}

/// Sale status derived from the external order status:
/// `"Concluído"` maps to Issued, everything else starts Pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Pending,
    Issued,
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Issued => "issued",
            SaleStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SalePaymentStatus {
    Unpaid,
    Paid,
}

impl Default for SalePaymentStatus {
    fn default() -> Self {
        SalePaymentStatus::Unpaid
    }
}

/// Schedule lifecycle; the import engine only ever creates `Scheduled`,
/// the rest belong to the calendar screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Scheduled,
    Done,
    Cancelled,
    Rescheduled,
}

/// Digital-certificate type, pattern-matched from the product name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum CertificateKind {
    A1,
    A3,
}

impl CertificateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateKind::A1 => "A1",
            CertificateKind::A3 => "A3",
        }
    }
}

impl std::fmt::Display for CertificateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A buyer, unique per `(document, user_id)`. Never deleted by the import
/// engine and never overwritten when reused.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Client {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: ClientKind,
    pub document: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: ClientStatus,
    pub created_at: DateTime<Utc>,
}

/// Fields for a client insert.
#[derive(Debug, Clone)]
pub struct NewClient {
    pub user_id: Uuid,
    pub kind: ClientKind,
    pub document: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Sale {
    pub id: Uuid,
    pub user_id: Uuid,
    pub client_id: Option<Uuid>,
    pub amount: Decimal,
    pub status: SaleStatus,
    pub payment_status: SalePaymentStatus,
    pub sale_date: DateTime<Utc>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSale {
    pub user_id: Uuid,
    pub client_id: Option<Uuid>,
    pub amount: Decimal,
    pub status: SaleStatus,
    pub payment_status: SalePaymentStatus,
    pub sale_date: DateTime<Utc>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Schedule {
    pub id: Uuid,
    pub user_id: Uuid,
    pub sale_id: Uuid,
    pub scheduled_at: NaiveDateTime,
    pub status: ScheduleStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub user_id: Uuid,
    pub sale_id: Uuid,
    pub scheduled_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Certificate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub sale_id: Uuid,
    pub kind: CertificateKind,
    pub issued_for: String,
    pub base_date: NaiveDate,
    pub valid_until: NaiveDate,
    pub cost_price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCertificate {
    pub user_id: Uuid,
    pub sale_id: Uuid,
    pub kind: CertificateKind,
    pub issued_for: String,
    pub base_date: NaiveDate,
    pub valid_until: NaiveDate,
    pub cost_price: Decimal,
}

// ============================================================================
// Request / response DTOs
// ============================================================================

/// Request DTO for importing an external order.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ImportOrderRequest {
    #[validate(length(min = 1, message = "order_id must not be empty"))]
    pub order_id: String,
    /// The user performing the import; all lookups and inserts are scoped
    /// to this id, never to ambient session state.
    pub requester_id: Uuid,
    /// User-supplied sale value as entered (`"R$ 1.234,56"` or plain).
    #[validate(length(min = 1, message = "sale_value must not be empty"))]
    pub sale_value: String,
    /// Defaults to the most recent payment-history date, then today.
    pub sale_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_status: Option<SalePaymentStatus>,
    /// Base date for certificate validity; defaults to today.
    pub certificate_date: Option<NaiveDate>,
}

/// Identifiers of everything the import created or reused, plus flags for
/// the optional artifacts. A sale without a schedule/certificate is a
/// reported partial success, not an error.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImportOutcome {
    pub client_id: Uuid,
    /// False when an existing client was reused by document match.
    pub client_created: bool,
    pub sale_id: Uuid,
    pub schedule_id: Option<Uuid>,
    pub schedule_created: bool,
    pub certificate_id: Option<Uuid>,
    pub certificate_created: bool,
}
