use crate::database::sqlite::SqliteDatabase;
use crate::errors::{AppError, Result};
use crate::models::appointment::{Appointment, AppointmentStats, AppointmentStatus};
use crate::services::notifications::NotificationService;
use crate::utils::validation::Validator;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service_type: String,
    pub preferred_date: String,
    pub preferred_time: String,
    pub message: Option<String>,
}

const MAX_LIST_LIMIT: i64 = 100;
pub const DEFAULT_LIST_LIMIT: i64 = 50;

pub struct AppointmentService {
    database: Arc<SqliteDatabase>,
    notifications: Arc<NotificationService>,
    admin_token: String,
}

impl AppointmentService {
    pub fn new(
        database: Arc<SqliteDatabase>,
        notifications: Arc<NotificationService>,
        admin_token: String,
    ) -> Self {
        Self {
            database,
            notifications,
            admin_token,
        }
    }

    /// Plain-text comparison against the configured shared secret. All admin
    /// reads go through this; there are no sessions and no expiry.
    pub fn authorize_admin(&self, token: Option<&str>) -> Result<()> {
        match token {
            Some(token) if token == self.admin_token => Ok(()),
            _ => Err(AppError::AuthError("Admin access required".to_string())),
        }
    }

    fn validate_booking(request: &BookingRequest) -> Result<()> {
        Validator::validate_name(&request.name)?;
        Validator::validate_email(&request.email)?;
        Validator::validate_phone(&request.phone)?;
        Validator::validate_service_type(&request.service_type)?;
        Validator::validate_preferred_date(&request.preferred_date)?;
        Validator::validate_preferred_time(&request.preferred_time)?;
        Ok(())
    }

    /// Validate and persist a booking. The record always starts out
    /// `pending` with server-side timestamps; whatever the client sent for
    /// those is ignored. Duplicate submissions create duplicate records.
    pub async fn book(&self, request: BookingRequest) -> Result<Appointment> {
        Self::validate_booking(&request)?;

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            phone: request.phone.trim().to_string(),
            service_type: request.service_type.trim().to_string(),
            preferred_date: request.preferred_date.trim().to_string(),
            preferred_time: request.preferred_time.trim().to_string(),
            message: request.message.filter(|m| !m.trim().is_empty()),
            status: AppointmentStatus::Pending,
            admin_notes: None,
            created_at: now,
            updated_at: now,
        };

        self.database.store_appointment(&appointment).await?;
        tracing::info!(id = %appointment.id, name = %appointment.name, "new appointment booked");

        // Best-effort: an email failure must never fail the booking
        if let Err(e) = self.notifications.send_booking_confirmation(&appointment).await {
            tracing::warn!(id = %appointment.id, error = %e, "booking notification failed");
        }

        Ok(appointment)
    }

    pub async fn list(
        &self,
        admin_token: Option<&str>,
        status: Option<AppointmentStatus>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Appointment>> {
        self.authorize_admin(admin_token)?;
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        let offset = offset.unwrap_or(0).max(0);
        self.database.list_appointments(status, limit, offset).await
    }

    pub async fn stats(&self, admin_token: Option<&str>) -> Result<AppointmentStats> {
        self.authorize_admin(admin_token)?;
        self.database.appointment_stats().await
    }

    pub async fn get(&self, admin_token: Option<&str>, id: &Uuid) -> Result<Option<Appointment>> {
        self.authorize_admin(admin_token)?;
        self.database.get_appointment(id).await
    }

    pub async fn update(
        &self,
        admin_token: Option<&str>,
        id: &Uuid,
        status: Option<AppointmentStatus>,
        admin_notes: Option<&str>,
    ) -> Result<Option<Appointment>> {
        self.authorize_admin(admin_token)?;
        let updated = self.database.update_appointment(id, status, admin_notes).await?;
        if let Some(appointment) = &updated {
            tracing::info!(id = %appointment.id, status = %appointment.status.as_str(), "appointment updated");
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmtpConfig;

    async fn service() -> AppointmentService {
        let database = Arc::new(SqliteDatabase::in_memory().await.unwrap());
        let smtp = SmtpConfig {
            host: None,
            port: 587,
            username: None,
            password: None,
            from_email: "noreply@walletwealth.co.in".to_string(),
            notify_email: None,
        };
        AppointmentService::new(
            database,
            Arc::new(NotificationService::new(smtp)),
            "secret-token".to_string(),
        )
    }

    fn valid_booking() -> BookingRequest {
        BookingRequest {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            phone: "123".to_string(),
            service_type: "Tax Planning".to_string(),
            preferred_date: "2099-01-01".to_string(),
            preferred_time: "10:00 AM".to_string(),
            message: None,
        }
    }

    #[tokio::test]
    async fn booking_starts_pending_with_server_timestamps() {
        let service = service().await;
        let before = Utc::now();
        let appointment = service.book(valid_booking()).await.unwrap();

        assert_eq!(appointment.status, AppointmentStatus::Pending);
        assert!(appointment.created_at >= before);
        assert!(appointment.created_at <= Utc::now());
    }

    #[tokio::test]
    async fn past_date_is_rejected() {
        let service = service().await;
        let request = BookingRequest {
            preferred_date: "2020-01-01".to_string(),
            ..valid_booking()
        };
        let err = service.book(request).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let service = service().await;
        for request in [
            BookingRequest { name: "".to_string(), ..valid_booking() },
            BookingRequest { email: "not-an-email".to_string(), ..valid_booking() },
            BookingRequest { phone: " ".to_string(), ..valid_booking() },
            BookingRequest { service_type: "".to_string(), ..valid_booking() },
            BookingRequest { preferred_time: "".to_string(), ..valid_booking() },
        ] {
            let err = service.book(request).await.unwrap_err();
            assert!(matches!(err, AppError::ValidationError(_)));
        }
    }

    #[tokio::test]
    async fn duplicate_bookings_create_distinct_records() {
        let service = service().await;
        let first = service.book(valid_booking()).await.unwrap();
        let second = service.book(valid_booking()).await.unwrap();
        assert_ne!(first.id, second.id);

        let all = service
            .list(Some("secret-token"), None, None, None)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn admin_reads_require_exact_token() {
        let service = service().await;

        let err = service.list(None, None, None, None).await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(_)));

        let err = service
            .list(Some("wrong-token"), None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthError(_)));

        let err = service.stats(Some("")).await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(_)));

        assert!(service.stats(Some("secret-token")).await.is_ok());
    }

    #[tokio::test]
    async fn stats_reflect_updates() {
        let service = service().await;
        let appointment = service.book(valid_booking()).await.unwrap();
        service.book(valid_booking()).await.unwrap();

        service
            .update(
                Some("secret-token"),
                &appointment.id,
                Some(AppointmentStatus::Confirmed),
                None,
            )
            .await
            .unwrap();

        let stats = service.stats(Some("secret-token")).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.confirmed, 1);
    }
}
