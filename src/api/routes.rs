use crate::api::types::*;
use crate::errors::{AppError, Result};
use crate::models::appointment::{AppointmentStats, AppointmentStatus};
use crate::models::market::StockQuote;
use crate::services::appointments::BookingRequest;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::AppState;

/// Send a message to the AI advisor over plain request/response. This is
/// also the fallback channel when the websocket is unavailable.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Advisor reply (apology text when the upstream provider fails)", body = ChatResponse),
        (status = 400, description = "Empty or oversized message", body = ErrorResponse),
    ),
    tag = "Chat"
)]
pub async fn chat_message(
    Extension(state): Extension<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    crate::utils::validation::Validator::validate_chat_message(&request.message)?;

    let session_id = request
        .session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let reply = state.advisor.respond(&session_id, request.message.trim()).await;

    Ok(Json(ChatResponse {
        response: reply.response,
        session_id,
        timestamp: Utc::now(),
        provider: reply.provider,
    }))
}

/// Real-time chat channel. The first client frame must be `{"token": ...}`;
/// afterwards it is strictly one request, one response.
pub async fn chat_ws(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    Extension(state): Extension<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_chat_socket(socket, session_id, state))
}

async fn handle_chat_socket(mut socket: WebSocket, session_id: String, state: AppState) {
    tracing::info!(session_id = %session_id, "websocket connection established");

    // First frame authenticates the channel. The token is only checked for
    // presence; the admin secret never travels over this channel.
    let authenticated = match socket.recv().await {
        Some(Ok(Message::Text(first))) => serde_json::from_str::<serde_json::Value>(&first)
            .ok()
            .and_then(|v| v.get("token").and_then(|t| t.as_str()).map(str::to_string))
            .is_some_and(|t| !t.is_empty()),
        _ => false,
    };

    if !authenticated {
        let _ = socket
            .send(Message::Text(
                json!({"error": "Authentication required"}).to_string(),
            ))
            .await;
        let _ = socket.send(Message::Close(None)).await;
        return;
    }

    if socket
        .send(Message::Text(
            json!({"type": "auth_success", "message": "Authentication successful"}).to_string(),
        ))
        .await
        .is_err()
    {
        return;
    }

    // One turn at a time: receive, answer, repeat. A failed send discards
    // the in-flight turn and closes the channel; the client falls back to
    // POST /api/chat.
    loop {
        let frame = match socket.recv().await {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                tracing::warn!(session_id = %session_id, error = %e, "websocket receive failed");
                break;
            }
        };

        let Some(message) = serde_json::from_str::<serde_json::Value>(&frame)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .filter(|m| !m.trim().is_empty())
        else {
            continue;
        };

        if socket
            .send(Message::Text(
                json!({"type": "typing", "status": "start"}).to_string(),
            ))
            .await
            .is_err()
        {
            break;
        }

        let reply = state.advisor.respond(&session_id, message.trim()).await;

        let sent = socket
            .send(Message::Text(
                json!({
                    "type": "message",
                    "response": reply.response,
                    "timestamp": Utc::now(),
                    "provider": reply.provider,
                })
                .to_string(),
            ))
            .await;
        if sent.is_err() {
            break;
        }

        if socket
            .send(Message::Text(
                json!({"type": "typing", "status": "stop"}).to_string(),
            ))
            .await
            .is_err()
        {
            break;
        }
    }

    tracing::info!(session_id = %session_id, "websocket connection closed");
}

/// Book a consultation (public, no auth).
#[utoipa::path(
    post,
    path = "/api/appointments/book",
    request_body = BookingRequest,
    responses(
        (status = 200, description = "Appointment created with status pending", body = BookingResponse),
        (status = 400, description = "Missing or invalid booking fields", body = ErrorResponse),
    ),
    tag = "Appointments"
)]
pub async fn book_appointment(
    Extension(state): Extension<AppState>,
    Json(request): Json<BookingRequest>,
) -> Result<Json<BookingResponse>> {
    let name = request.name.clone();
    let phone = request.phone.clone();
    let appointment = state.appointments.book(request).await?;

    Ok(Json(BookingResponse {
        appointment,
        message: format!(
            "Thank you {}! Your appointment request has been received. We will contact you at {} to confirm.",
            name.trim(),
            phone.trim()
        ),
    }))
}

/// List appointments, newest first (admin only).
#[utoipa::path(
    get,
    path = "/api/appointments",
    params(ListAppointmentsQuery),
    responses(
        (status = 200, description = "All matching appointments", body = [crate::models::appointment::Appointment]),
        (status = 401, description = "Bad or missing admin token", body = ErrorResponse),
    ),
    tag = "Appointments"
)]
pub async fn list_appointments(
    Extension(state): Extension<AppState>,
    Query(query): Query<ListAppointmentsQuery>,
) -> Result<impl IntoResponse> {
    // Token check comes first; a bad token is a 401 no matter what the
    // other query parameters look like.
    state
        .appointments
        .authorize_admin(query.admin_token.as_deref())?;

    let status = match query.status.as_deref() {
        Some(s) => Some(AppointmentStatus::parse(s).ok_or_else(|| {
            AppError::ValidationError(format!("Unknown status filter: {}", s))
        })?),
        None => None,
    };

    let appointments = state
        .appointments
        .list(query.admin_token.as_deref(), status, query.limit, query.offset)
        .await?;
    Ok(Json(appointments))
}

/// Appointment counts by status (admin only).
#[utoipa::path(
    get,
    path = "/api/appointments/stats",
    params(AdminQuery),
    responses(
        (status = 200, description = "Counts by status", body = AppointmentStats),
        (status = 401, description = "Bad or missing admin token", body = ErrorResponse),
    ),
    tag = "Appointments"
)]
pub async fn appointment_stats(
    Extension(state): Extension<AppState>,
    Query(query): Query<AdminQuery>,
) -> Result<Json<AppointmentStats>> {
    let stats = state.appointments.stats(query.admin_token.as_deref()).await?;
    Ok(Json(stats))
}

/// Single appointment details (admin only).
#[utoipa::path(
    get,
    path = "/api/appointments/{id}",
    params(
        ("id" = Uuid, Path, description = "Appointment id"),
        AdminQuery,
    ),
    responses(
        (status = 200, description = "The appointment", body = crate::models::appointment::Appointment),
        (status = 401, description = "Bad or missing admin token", body = ErrorResponse),
        (status = 404, description = "No such appointment", body = ErrorResponse),
    ),
    tag = "Appointments"
)]
pub async fn get_appointment(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AdminQuery>,
) -> Result<impl IntoResponse> {
    let appointment = state
        .appointments
        .get(query.admin_token.as_deref(), &id)
        .await?;

    match appointment {
        Some(appointment) => Ok(Json(appointment).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Appointment not found"})),
        )
            .into_response()),
    }
}

/// Update appointment status/notes (admin only). Everything else about the
/// record is immutable.
#[utoipa::path(
    patch,
    path = "/api/appointments/{id}",
    params(
        ("id" = Uuid, Path, description = "Appointment id"),
        AdminQuery,
    ),
    request_body = UpdateAppointmentRequest,
    responses(
        (status = 200, description = "The updated appointment", body = crate::models::appointment::Appointment),
        (status = 401, description = "Bad or missing admin token", body = ErrorResponse),
        (status = 404, description = "No such appointment", body = ErrorResponse),
    ),
    tag = "Appointments"
)]
pub async fn update_appointment(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AdminQuery>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<impl IntoResponse> {
    let updated = state
        .appointments
        .update(
            query.admin_token.as_deref(),
            &id,
            request.status,
            request.admin_notes.as_deref(),
        )
        .await?;

    match updated {
        Some(appointment) => Ok(Json(appointment).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Appointment not found"})),
        )
            .into_response()),
    }
}

/// Current quote for a stock symbol.
#[utoipa::path(
    get,
    path = "/api/market/quote/{symbol}",
    params(("symbol" = String, Path, description = "Stock symbol, e.g. RELIANCE.NS")),
    responses(
        (status = 200, description = "Quote (cached up to 5 minutes)", body = StockQuote),
        (status = 502, description = "Market data provider failure", body = ErrorResponse),
    ),
    tag = "Market"
)]
pub async fn market_quote(
    Extension(state): Extension<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<StockQuote>> {
    let quote = state.market.get_quote(&symbol).await?;
    Ok(Json(quote))
}

/// Detailed health check.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service health", body = HealthResponse)),
    tag = "Health"
)]
pub async fn health_check(Extension(state): Extension<AppState>) -> Json<HealthResponse> {
    let database = if state.database.health_check().await {
        "operational"
    } else {
        "degraded"
    };
    let llm = if state.advisor.is_configured() {
        "configured"
    } else {
        "mock"
    };

    Json(HealthResponse {
        status: if database == "operational" {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        services: HealthServices {
            api: "operational".to_string(),
            database: database.to_string(),
            llm: llm.to_string(),
        },
    })
}
