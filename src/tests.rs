// End-to-end tests for the order-import workflow.
// The engine runs against an in-memory store and a stub gateway, so these
// exercise the full reconciliation pipeline without a database.

use super::*;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

use crate::imports::{
    Certificate, CertificateKind, Client, ClientKind, ClientStatus, GatewayError, ImportError,
    ImportOrderRequest, ImportStore, NewCertificate, NewClient, NewSale, NewSchedule,
    OrderGateway, OrderRecord, PaymentEntry, ClientProfile, ProductData, Sale, SaleStatus,
    Schedule, ScheduleStatus, StoreError,
};
use crate::normalize::{noon_utc, RawMoney};

// ============================================================================
// Test doubles
// ============================================================================

/// Gateway returning a canned order, or order-not-found when empty.
struct StubGateway {
    record: Option<OrderRecord>,
}

#[async_trait]
impl OrderGateway for StubGateway {
    async fn fetch_order(
        &self,
        order_id: &str,
        _requester_id: Uuid,
    ) -> Result<OrderRecord, GatewayError> {
        self.record
            .clone()
            .ok_or_else(|| GatewayError::OrderNotFound(order_id.to_string()))
    }
}

/// In-memory store recording every insert the engine issues.
#[derive(Default)]
struct InMemoryStore {
    clients: Mutex<Vec<Client>>,
    sales: Mutex<Vec<Sale>>,
    schedules: Mutex<Vec<Schedule>>,
    certificates: Mutex<Vec<Certificate>>,
    fail_schedules: bool,
    fail_certificates: bool,
}

impl InMemoryStore {
    fn seed_client(&self, user_id: Uuid, document: &str) -> Client {
        let client = Client {
            id: Uuid::new_v4(),
            user_id,
            kind: ClientKind::Pf,
            document: document.to_string(),
            name: "Maria Silva".to_string(),
            email: None,
            phone: None,
            status: ClientStatus::Active,
            created_at: Utc::now(),
        };
        self.clients.lock().unwrap().push(client.clone());
        client
    }
}

#[async_trait]
impl ImportStore for InMemoryStore {
    async fn find_client_by_document(
        &self,
        user_id: Uuid,
        document: &str,
    ) -> Result<Option<Client>, StoreError> {
        Ok(self
            .clients
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.user_id == user_id && c.document == document)
            .cloned())
    }

    async fn insert_client(&self, new: NewClient) -> Result<Client, StoreError> {
        let client = Client {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            kind: new.kind,
            document: new.document,
            name: new.name,
            email: new.email,
            phone: new.phone,
            status: ClientStatus::Active,
            created_at: Utc::now(),
        };
        self.clients.lock().unwrap().push(client.clone());
        Ok(client)
    }

    async fn insert_sale(&self, new: NewSale) -> Result<Sale, StoreError> {
        let sale = Sale {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            client_id: new.client_id,
            amount: new.amount,
            status: new.status,
            payment_status: new.payment_status,
            sale_date: new.sale_date,
            due_date: new.due_date,
            created_at: Utc::now(),
        };
        self.sales.lock().unwrap().push(sale.clone());
        Ok(sale)
    }

    async fn insert_schedule(&self, new: NewSchedule) -> Result<Schedule, StoreError> {
        if self.fail_schedules {
            return Err(StoreError("schedules table unavailable".to_string()));
        }
        let schedule = Schedule {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            sale_id: new.sale_id,
            scheduled_at: new.scheduled_at,
            status: ScheduleStatus::Scheduled,
            created_at: Utc::now(),
        };
        self.schedules.lock().unwrap().push(schedule.clone());
        Ok(schedule)
    }

    async fn insert_certificate(&self, new: NewCertificate) -> Result<Certificate, StoreError> {
        if self.fail_certificates {
            return Err(StoreError("certificates table unavailable".to_string()));
        }
        let certificate = Certificate {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            sale_id: new.sale_id,
            kind: new.kind,
            issued_for: new.issued_for,
            base_date: new.base_date,
            valid_until: new.valid_until,
            cost_price: new.cost_price,
            created_at: Utc::now(),
        };
        self.certificates.lock().unwrap().push(certificate.clone());
        Ok(certificate)
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn order_with_status(status: &str) -> OrderRecord {
    OrderRecord {
        order_id: "PED-1".to_string(),
        status: status.to_string(),
        client_profile: ClientProfile {
            cpf: Some("12345678901".to_string()),
            name: Some("Maria".to_string()),
            surname: Some("Silva".to_string()),
            ..ClientProfile::default()
        },
        product_data: ProductData {
            product_name_selected: Some("A3 Pessoa Física".to_string()),
            validity: Some("2 anos".to_string()),
            value: Some(RawMoney::Text("R$ 150,00".to_string())),
        },
        payment_history: vec![],
        documents: vec![],
    }
}

fn request_for(requester_id: Uuid) -> ImportOrderRequest {
    ImportOrderRequest {
        order_id: "PED-1".to_string(),
        requester_id,
        sale_value: "R$ 1.500,00".to_string(),
        sale_date: None,
        due_date: None,
        payment_status: None,
        certificate_date: Some(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()),
    }
}

fn service_for(record: OrderRecord, store: Arc<InMemoryStore>) -> ImportService {
    ImportService::new(Arc::new(StubGateway { record: Some(record) }), store)
}

// ============================================================================
// Import engine tests
// ============================================================================

/// A completed order creates a client, an issued sale and a certificate
/// with the computed validity; no schedule.
#[tokio::test]
async fn test_import_completed_order() {
    let store = Arc::new(InMemoryStore::default());
    let requester = Uuid::new_v4();
    let service = service_for(order_with_status("Concluído"), store.clone());

    let outcome = service.import_order(request_for(requester)).await.unwrap();

    assert!(outcome.client_created);
    assert!(outcome.certificate_created);
    assert!(!outcome.schedule_created);
    assert!(outcome.schedule_id.is_none());

    let sales = store.sales.lock().unwrap();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].status, SaleStatus::Issued);
    assert_eq!(sales[0].amount, dec!(1500.00));
    assert_eq!(sales[0].client_id, Some(outcome.client_id));

    let certificates = store.certificates.lock().unwrap();
    assert_eq!(certificates.len(), 1);
    assert_eq!(certificates[0].kind, CertificateKind::A3);
    assert_eq!(
        certificates[0].valid_until,
        NaiveDate::from_ymd_opt(2026, 1, 10).unwrap()
    );
    assert_eq!(certificates[0].issued_for, "Maria Silva");
    assert_eq!(certificates[0].cost_price, dec!(150.00));
}

/// A scheduling directive with a parseable date fragment creates a
/// schedule at exactly that local datetime; the sale stays pending.
#[tokio::test]
async fn test_import_scheduled_order() {
    let store = Arc::new(InMemoryStore::default());
    let requester = Uuid::new_v4();
    let service = service_for(
        order_with_status("Agendado Dia 18/08/2025 14:00"),
        store.clone(),
    );

    let outcome = service.import_order(request_for(requester)).await.unwrap();

    assert!(outcome.schedule_created);
    assert!(!outcome.certificate_created);

    let schedules = store.schedules.lock().unwrap();
    assert_eq!(schedules.len(), 1);
    let expected = NaiveDate::from_ymd_opt(2025, 8, 18)
        .unwrap()
        .and_hms_opt(14, 0, 0)
        .unwrap();
    assert_eq!(schedules[0].scheduled_at, expected);
    assert_eq!(schedules[0].sale_id, outcome.sale_id);

    let sales = store.sales.lock().unwrap();
    assert_eq!(sales[0].status, SaleStatus::Pending);
}

/// A bare "Agendado" without the date fragment is a tolerated soft
/// failure: the import succeeds with no schedule and no error.
#[tokio::test]
async fn test_import_scheduled_without_fragment_skips_silently() {
    let store = Arc::new(InMemoryStore::default());
    let service = service_for(order_with_status("Agendado"), store.clone());

    let outcome = service
        .import_order(request_for(Uuid::new_v4()))
        .await
        .unwrap();

    assert!(!outcome.schedule_created);
    assert!(outcome.schedule_id.is_none());
    assert!(store.schedules.lock().unwrap().is_empty());
    assert_eq!(store.sales.lock().unwrap().len(), 1);
}

/// Importing for a document that already has a client reuses that client
/// without creating a second row.
#[tokio::test]
async fn test_import_reuses_existing_client() {
    let store = Arc::new(InMemoryStore::default());
    let requester = Uuid::new_v4();
    let existing = store.seed_client(requester, "12345678901");
    let service = service_for(order_with_status("Pendente"), store.clone());

    let outcome = service.import_order(request_for(requester)).await.unwrap();

    assert!(!outcome.client_created);
    assert_eq!(outcome.client_id, existing.id);
    assert_eq!(store.clients.lock().unwrap().len(), 1);
}

/// Client deduplication is scoped to the requesting user: the same
/// document under another user gets its own client row.
#[tokio::test]
async fn test_import_client_scope_is_per_user() {
    let store = Arc::new(InMemoryStore::default());
    let other_user = Uuid::new_v4();
    store.seed_client(other_user, "12345678901");
    let service = service_for(order_with_status("Pendente"), store.clone());

    let outcome = service
        .import_order(request_for(Uuid::new_v4()))
        .await
        .unwrap();

    assert!(outcome.client_created);
    assert_eq!(store.clients.lock().unwrap().len(), 2);
}

/// A zero sale value fails with InvalidAmount and no sale, schedule or
/// certificate is persisted.
#[tokio::test]
async fn test_import_rejects_zero_amount() {
    let store = Arc::new(InMemoryStore::default());
    let service = service_for(order_with_status("Concluído"), store.clone());

    let mut request = request_for(Uuid::new_v4());
    request.sale_value = "R$ 0,00".to_string();
    let err = service.import_order(request).await.unwrap_err();

    assert!(matches!(err, ImportError::InvalidAmount));
    assert!(store.sales.lock().unwrap().is_empty());
    assert!(store.schedules.lock().unwrap().is_empty());
    assert!(store.certificates.lock().unwrap().is_empty());
}

/// A profile without CPF or CNPJ aborts before any write.
#[tokio::test]
async fn test_import_rejects_missing_identifier() {
    let store = Arc::new(InMemoryStore::default());
    let mut record = order_with_status("Concluído");
    record.client_profile = ClientProfile::default();
    let service = service_for(record, store.clone());

    let err = service
        .import_order(request_for(Uuid::new_v4()))
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::MissingIdentifier));
    assert!(store.clients.lock().unwrap().is_empty());
    assert!(store.sales.lock().unwrap().is_empty());
}

/// Non-completion statuses never produce a certificate.
#[tokio::test]
async fn test_import_non_completed_statuses_have_no_certificate() {
    for status in ["Pendente", "Cancelado"] {
        let store = Arc::new(InMemoryStore::default());
        let service = service_for(order_with_status(status), store.clone());

        let outcome = service
            .import_order(request_for(Uuid::new_v4()))
            .await
            .unwrap();

        assert!(!outcome.certificate_created, "status {}", status);
        assert!(store.certificates.lock().unwrap().is_empty());
        assert_eq!(store.sales.lock().unwrap()[0].status, SaleStatus::Pending);
    }
}

/// Without a user-chosen sale date, the most recent payment-history entry
/// provides the date, persisted at noon UTC.
#[tokio::test]
async fn test_import_sale_date_defaults_from_payment_history() {
    let store = Arc::new(InMemoryStore::default());
    let mut record = order_with_status("Pendente");
    record.payment_history = vec![
        PaymentEntry {
            date: "10/01/2024 09:00".to_string(),
            ..PaymentEntry::default()
        },
        PaymentEntry {
            date: "18/08/2025 14:00".to_string(),
            ..PaymentEntry::default()
        },
    ];
    let service = service_for(record, store.clone());

    service
        .import_order(request_for(Uuid::new_v4()))
        .await
        .unwrap();

    let sales = store.sales.lock().unwrap();
    let expected = noon_utc(NaiveDate::from_ymd_opt(2025, 8, 18).unwrap());
    assert_eq!(sales[0].sale_date, expected);
}

/// A schedule insert failure after the sale committed is a partial
/// success: the import still returns Ok with the flag cleared.
#[tokio::test]
async fn test_import_schedule_failure_is_partial_success() {
    let store = Arc::new(InMemoryStore {
        fail_schedules: true,
        ..InMemoryStore::default()
    });
    let service = service_for(
        order_with_status("Agendado Dia 18/08/2025 14:00"),
        store.clone(),
    );

    let outcome = service
        .import_order(request_for(Uuid::new_v4()))
        .await
        .unwrap();

    assert!(!outcome.schedule_created);
    assert!(outcome.schedule_id.is_none());
    assert_eq!(store.sales.lock().unwrap().len(), 1);
}

/// A certificate insert failure on a completed order is the same partial
/// success: the issued sale stays, the outcome flag is cleared.
#[tokio::test]
async fn test_import_certificate_failure_is_partial_success() {
    let store = Arc::new(InMemoryStore {
        fail_certificates: true,
        ..InMemoryStore::default()
    });
    let service = service_for(order_with_status("Concluído"), store.clone());

    let outcome = service
        .import_order(request_for(Uuid::new_v4()))
        .await
        .unwrap();

    assert!(!outcome.certificate_created);
    assert!(outcome.certificate_id.is_none());
    assert!(store.certificates.lock().unwrap().is_empty());

    let sales = store.sales.lock().unwrap();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].status, SaleStatus::Issued);
}

/// An order the gateway does not know surfaces as OrderNotFound.
#[tokio::test]
async fn test_import_order_not_found() {
    let store = Arc::new(InMemoryStore::default());
    let service = ImportService::new(Arc::new(StubGateway { record: None }), store.clone());

    let err = service
        .import_order(request_for(Uuid::new_v4()))
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::OrderNotFound(_)));
    assert!(store.clients.lock().unwrap().is_empty());
}

// ============================================================================
// Handler tests (import endpoint over the real router)
// ============================================================================

fn test_state(record: Option<OrderRecord>, store: Arc<InMemoryStore>) -> AppState {
    // The import endpoint never touches the pool; lazy connect keeps these
    // tests independent from a running database.
    let pool = PgPool::connect_lazy("postgresql://localhost/certsales_unused")
        .expect("lazy pool");
    AppState {
        db: pool.clone(),
        import_service: ImportService::new(Arc::new(StubGateway { record }), store),
        commissions_repo: CommissionsRepository::new(pool),
    }
}

#[tokio::test]
async fn test_import_endpoint_created() {
    let store = Arc::new(InMemoryStore::default());
    let state = test_state(Some(order_with_status("Concluído")), store);
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server
        .post("/api/imports")
        .json(&json!({
            "order_id": "PED-1",
            "requester_id": Uuid::new_v4(),
            "sale_value": "R$ 1.500,00",
            "certificate_date": "2024-01-10"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert!(body["client_created"].as_bool().unwrap());
    assert!(body["certificate_created"].as_bool().unwrap());
    assert!(body["schedule_id"].is_null());
}

#[tokio::test]
async fn test_import_endpoint_rejects_zero_amount() {
    let store = Arc::new(InMemoryStore::default());
    let state = test_state(Some(order_with_status("Concluído")), store);
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server
        .post("/api/imports")
        .json(&json!({
            "order_id": "PED-1",
            "requester_id": Uuid::new_v4(),
            "sale_value": "R$ 0,00"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("greater than zero"));
}

#[tokio::test]
async fn test_import_endpoint_validates_payload() {
    let store = Arc::new(InMemoryStore::default());
    let state = test_state(Some(order_with_status("Concluído")), store);
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server
        .post("/api/imports")
        .json(&json!({
            "order_id": "",
            "requester_id": Uuid::new_v4(),
            "sale_value": "R$ 10,00"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

/// Paying a commission demands the requester identity up front: a payload
/// without it is rejected before any lookup, so the scoped queries can
/// never run unscoped.
#[tokio::test]
async fn test_pay_endpoint_requires_requester_id() {
    let store = Arc::new(InMemoryStore::default());
    let state = test_state(None, store);
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server
        .patch(&format!("/api/commissions/{}/pay", Uuid::new_v4()))
        .json(&json!({ "paid_at": "2025-06-01" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_import_endpoint_order_not_found() {
    let store = Arc::new(InMemoryStore::default());
    let state = test_state(None, store);
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server
        .post("/api/imports")
        .json(&json!({
            "order_id": "PED-404",
            "requester_id": Uuid::new_v4(),
            "sale_value": "R$ 10,00"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
