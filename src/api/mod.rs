use crate::config::AppConfig;
use crate::database::sqlite::SqliteDatabase;
use crate::errors::{AppError, Result};
use crate::services::advisor::AdvisorService;
use crate::services::appointments::AppointmentService;
use crate::services::market_data::MarketDataService;
use crate::services::notifications::NotificationService;
use crate::utils::middleware::{rate_limit_middleware, request_id_middleware, RateLimiter};
use axum::http::HeaderValue;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use hyper::Method;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

pub mod docs;
pub mod routes;
pub mod types;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::chat_message,
        routes::book_appointment,
        routes::list_appointments,
        routes::appointment_stats,
        routes::get_appointment,
        routes::update_appointment,
        routes::market_quote,
        routes::health_check,
    ),
    components(
        schemas(
            types::ChatRequest,
            types::ChatResponse,
            types::BookingResponse,
            types::UpdateAppointmentRequest,
            types::HealthResponse,
            types::HealthServices,
            types::ErrorResponse,
            crate::services::appointments::BookingRequest,
            crate::models::appointment::Appointment,
            crate::models::appointment::AppointmentStatus,
            crate::models::appointment::AppointmentStats,
            crate::models::market::StockQuote,
        )
    ),
    tags(
        (name = "Chat", description = "AI advisor chat proxy. A websocket channel is available at /api/chat/ws/{session_id}; POST /api/chat is the request/response fallback."),
        (name = "Appointments", description = "Consultation booking (public) and admin reads gated by the admin_token query parameter."),
        (name = "Market", description = "Stock quotes for the portfolio widgets."),
        (name = "Health", description = "Service health.")
    )
)]
pub struct ApiDoc;

/// Shared handler state. Everything is constructed once in
/// `start_http_server` from the loaded configuration; no globals.
#[derive(Clone)]
pub struct AppState {
    pub appointments: Arc<AppointmentService>,
    pub advisor: Arc<AdvisorService>,
    pub market: Arc<MarketDataService>,
    pub database: Arc<SqliteDatabase>,
}

impl AppState {
    pub fn build(config: &AppConfig, database: Arc<SqliteDatabase>) -> Self {
        let notifications = Arc::new(NotificationService::new(config.smtp.clone()));
        let appointments = Arc::new(AppointmentService::new(
            database.clone(),
            notifications,
            config.admin_token.clone(),
        ));
        let advisor = Arc::new(AdvisorService::new(&config.llm));
        let market = Arc::new(MarketDataService::new(config.alpha_vantage_api_key.clone()));

        Self {
            appointments,
            advisor,
            market,
            database,
        }
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PATCH, Method::OPTIONS];
    if config.allow_any_origin() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    }
}

pub fn build_router(state: AppState, config: &AppConfig) -> Router {
    let openapi = ApiDoc::openapi();
    let limiter = Arc::new(RateLimiter::new(config.rate_limit_per_sec));

    Router::new()
        .route("/api/chat", post(routes::chat_message))
        .route("/api/chat/ws/:session_id", get(routes::chat_ws))
        .route("/api/appointments/book", post(routes::book_appointment))
        .route("/api/appointments", get(routes::list_appointments))
        .route("/api/appointments/stats", get(routes::appointment_stats))
        .route(
            "/api/appointments/:id",
            get(routes::get_appointment).patch(routes::update_appointment),
        )
        .route("/api/market/quote/:symbol", get(routes::market_quote))
        .route("/health", get(routes::health_check))
        // OpenAPI documentation routes
        .route("/docs/openapi.json", get(openapi_json))
        .route("/docs/markdown", get(api_markdown))
        .route("/docs", get(api_documentation))
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", openapi.clone()))
        .merge(Redoc::with_url("/api/redoc", openapi))
        // Innermost first: the rate limiter must sit inside the Extension
        // layers that provide its state.
        .layer(axum::middleware::from_fn(rate_limit_middleware))
        .layer(Extension(state))
        .layer(Extension(limiter))
        .layer(cors_layer(config))
        .layer(axum::middleware::from_fn(request_id_middleware))
}

/// Main entry point for the API server. Connects the database, builds all
/// services from the configuration, and serves until shutdown.
pub async fn start_http_server(config: AppConfig) -> Result<()> {
    let database = Arc::new(SqliteDatabase::new(&config.database_path).await?);
    let state = AppState::build(&config, database);
    let app = build_router(state, &config);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port)
        .parse()
        .map_err(|e| AppError::ConfigError(format!("Invalid listen address: {}", e)))?;

    tracing::info!(addr = %addr, "HTTP API listening");
    tracing::info!("API documentation available at http://{}/api/docs", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::TransportError(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| AppError::TransportError(format!("Server error: {}", e)))?;

    Ok(())
}

/// Export OpenAPI specification as JSON
async fn openapi_json() -> Json<Value> {
    let openapi = ApiDoc::openapi();
    Json(serde_json::to_value(openapi).unwrap_or_default())
}

/// Serves the API documentation as downloadable Markdown.
async fn api_markdown() -> impl IntoResponse {
    let markdown = docs::generate_markdown_docs();
    (
        [
            ("Content-Type", "text/markdown"),
            (
                "Content-Disposition",
                "attachment; filename=\"API_DOCUMENTATION.md\"",
            ),
        ],
        markdown,
    )
}

/// Serves the main API documentation HTML page.
async fn api_documentation() -> impl IntoResponse {
    axum::response::Html(docs::generate_documentation_html())
}
