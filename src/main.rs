mod commissions;
mod db;
mod imports;
mod normalize;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{patch, post},
    Router,
};
use sqlx::PgPool;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use commissions::CommissionsRepository;
use imports::{HttpOrderGateway, ImportService, PgImportStore};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        imports::handlers::import_order_handler,
        commissions::handlers::create_commission_handler,
        commissions::handlers::pay_commission_handler,
    ),
    components(
        schemas(
            imports::ImportOrderRequest,
            imports::ImportOutcome,
            imports::SalePaymentStatus,
            commissions::Commission,
            commissions::CreateCommissionRequest,
            commissions::PayCommissionRequest,
            commissions::CommissionStatus,
            commissions::BeneficiaryKind,
        )
    ),
    tags(
        (name = "imports", description = "Order-import reconciliation endpoints"),
        (name = "commissions", description = "Commission derivation endpoints")
    ),
    info(
        title = "Certificate Sales API",
        version = "1.0.0",
        description = "Back end for a digital-certificate resale operation: order-import reconciliation and commission derivation"
    )
)]
struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub import_service: ImportService,
    pub commissions_repo: CommissionsRepository,
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS middleware
pub fn create_router(state: AppState) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()))
        // API routes
        .route("/api/imports", post(imports::import_order_handler))
        .route("/api/commissions", post(commissions::create_commission_handler))
        .route("/api/commissions/:id/pay", patch(commissions::pay_commission_handler))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Certificate Sales API - Starting...");

    // Get configuration from environment variables
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set in environment");
    let gateway_url = std::env::var("ORDER_GATEWAY_URL")
        .expect("ORDER_GATEWAY_URL must be set in environment");
    let gateway_timeout_secs: u64 = std::env::var("ORDER_GATEWAY_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);
    let host = std::env::var("HOST")
        .unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string());

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    // Run SQLx migrations on startup
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    // Wire up the order gateway client and the import engine
    let gateway = HttpOrderGateway::new(gateway_url, Duration::from_secs(gateway_timeout_secs))
        .expect("Failed to build order gateway client");
    let state = AppState {
        db: db_pool.clone(),
        import_service: ImportService::new(
            Arc::new(gateway),
            Arc::new(PgImportStore::new(db_pool.clone())),
        ),
        commissions_repo: CommissionsRepository::new(db_pool),
    };

    // Create the application router
    let app = create_router(state);

    // Start the Axum server
    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Certificate Sales API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}

#[cfg(test)]
mod tests;
