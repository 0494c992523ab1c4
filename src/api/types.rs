use crate::models::appointment::{Appointment, AppointmentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
    /// Client-generated opaque token correlating chat turns within one
    /// visit. A fresh one is issued when absent.
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub provider: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingResponse {
    pub appointment: Appointment,
    pub message: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AdminQuery {
    /// Static shared secret gating admin reads.
    pub admin_token: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListAppointmentsQuery {
    pub admin_token: Option<String>,
    /// Optional status filter (pending|confirmed|completed|cancelled).
    pub status: Option<String>,
    /// Page size, clamped to 100.
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAppointmentRequest {
    pub status: Option<AppointmentStatus>,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub services: HealthServices,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthServices {
    pub api: String,
    pub database: String,
    pub llm: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
