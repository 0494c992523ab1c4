use std::sync::Arc;

use axum::extract::Query;
use axum::Extension;
use chrono::Utc;
use walletwealth_backend::api::types::ListAppointmentsQuery;
use walletwealth_backend::api::{routes, AppState};
use walletwealth_backend::config::{AppConfig, SmtpConfig};
use walletwealth_backend::database::sqlite::SqliteDatabase;
use walletwealth_backend::errors::AppError;
use walletwealth_backend::models::appointment::AppointmentStatus;
use walletwealth_backend::services::appointments::{AppointmentService, BookingRequest};
use walletwealth_backend::services::notifications::NotificationService;

const ADMIN_TOKEN: &str = "integration-test-secret";

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
        ADMIN_TOKEN.to_string(),
    )
}

fn booking(name: &str) -> BookingRequest {
    BookingRequest {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        phone: "9940116967".to_string(),
        service_type: "Financial Planning".to_string(),
        preferred_date: "2099-06-15".to_string(),
        preferred_time: "11:30 AM".to_string(),
        message: Some("First consultation".to_string()),
    }
}

#[tokio::test]
async fn booking_then_admin_lifecycle() {
    let service = service().await;
    let token = Some(ADMIN_TOKEN);

    let created = service.book(booking("Priya Raman")).await.unwrap();
    assert_eq!(created.status, AppointmentStatus::Pending);
    assert!(created.admin_notes.is_none());

    // Admin can see it
    let fetched = service.get(token, &created.id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "Priya Raman");
    assert_eq!(fetched.message.as_deref(), Some("First consultation"));

    // Confirm it with a note
    let updated = service
        .update(
            token,
            &created.id,
            Some(AppointmentStatus::Confirmed),
            Some("called back, confirmed"),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, AppointmentStatus::Confirmed);
    assert_eq!(updated.admin_notes.as_deref(), Some("called back, confirmed"));
    assert!(updated.updated_at >= created.updated_at);
    // Booking fields are immutable through updates
    assert_eq!(updated.name, created.name);
    assert_eq!(updated.created_at, created.created_at);

    let stats = service.stats(token).await.unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.confirmed, 1);
    assert_eq!(stats.pending, 0);
}

#[tokio::test]
async fn list_is_newest_first_with_status_filter() {
    let service = service().await;
    let token = Some(ADMIN_TOKEN);

    let first = service.book(booking("Anand Kumar")).await.unwrap();
    let second = service.book(booking("Beulah Thomas")).await.unwrap();
    service
        .update(token, &first.id, Some(AppointmentStatus::Cancelled), None)
        .await
        .unwrap();

    let all = service.list(token, None, None, None).await.unwrap();
    assert_eq!(all.len(), 2);
    // Newest first
    assert_eq!(all[0].id, second.id);

    let cancelled = service
        .list(token, Some(AppointmentStatus::Cancelled), None, None)
        .await
        .unwrap();
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].id, first.id);

    let pending = service
        .list(token, Some(AppointmentStatus::Pending), None, None)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, second.id);
}

#[tokio::test]
async fn pagination_limits_are_clamped() {
    let service = service().await;
    let token = Some(ADMIN_TOKEN);

    for i in 0..5 {
        service.book(booking(&format!("Client {}", i))).await.unwrap();
    }

    let page = service.list(token, None, Some(2), None).await.unwrap();
    assert_eq!(page.len(), 2);

    let rest = service.list(token, None, Some(2), Some(4)).await.unwrap();
    assert_eq!(rest.len(), 1);

    // Oversized limits fall back to the hard cap instead of erroring
    let all = service.list(token, None, Some(10_000), None).await.unwrap();
    assert_eq!(all.len(), 5);
}

#[tokio::test]
async fn admin_endpoints_reject_bad_tokens() {
    let service = service().await;
    let created = service.book(booking("Priya Raman")).await.unwrap();

    for token in [None, Some("wrong"), Some(""), Some("INTEGRATION-TEST-SECRET")] {
        assert!(matches!(
            service.list(token, None, None, None).await.unwrap_err(),
            AppError::AuthError(_)
        ));
        assert!(matches!(
            service.stats(token).await.unwrap_err(),
            AppError::AuthError(_)
        ));
        assert!(matches!(
            service.get(token, &created.id).await.unwrap_err(),
            AppError::AuthError(_)
        ));
        assert!(matches!(
            service
                .update(token, &created.id, Some(AppointmentStatus::Confirmed), None)
                .await
                .unwrap_err(),
            AppError::AuthError(_)
        ));
    }

    // The record is untouched after all those rejected attempts
    let fetched = service
        .get(Some(ADMIN_TOKEN), &created.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.status, AppointmentStatus::Pending);
}

#[tokio::test]
async fn minimal_booking_from_the_public_form_is_accepted() {
    let service = service().await;

    // Presence is enough; no minimum lengths on name or phone
    let request = BookingRequest {
        name: "A".to_string(),
        email: "a@x.com".to_string(),
        phone: "123".to_string(),
        service_type: "Tax Planning".to_string(),
        preferred_date: "2099-01-01".to_string(),
        preferred_time: "10:00 AM".to_string(),
        message: None,
    };

    let before = Utc::now();
    let created = service.book(request).await.unwrap();
    assert_eq!(created.status, AppointmentStatus::Pending);
    assert!(created.created_at >= before);
    assert!(created.message.is_none());
}

#[tokio::test]
async fn whitespace_only_message_is_dropped() {
    let service = service().await;
    let request = BookingRequest {
        message: Some("   ".to_string()),
        ..booking("Priya Raman")
    };
    let created = service.book(request).await.unwrap();
    assert!(created.message.is_none());
}

#[tokio::test]
async fn bad_token_wins_over_bad_status_filter() {
    let database = Arc::new(SqliteDatabase::in_memory().await.unwrap());
    let state = AppState::build(&AppConfig::default(), database);

    // An unknown status filter must not leak a 400 past a failed token check
    let result = routes::list_appointments(
        Extension(state.clone()),
        Query(ListAppointmentsQuery {
            admin_token: Some("wrong-token".to_string()),
            status: Some("bogus".to_string()),
            limit: None,
            offset: None,
        }),
    )
    .await;
    match result {
        Err(AppError::AuthError(_)) => {}
        Err(other) => panic!("expected AuthError, got {:?}", other),
        Ok(_) => panic!("expected AuthError, got Ok"),
    }

    // With the right token the bad filter is still a validation error
    let result = routes::list_appointments(
        Extension(state),
        Query(ListAppointmentsQuery {
            admin_token: Some("change-me".to_string()),
            status: Some("bogus".to_string()),
            limit: None,
            offset: None,
        }),
    )
    .await;
    match result {
        Err(AppError::ValidationError(_)) => {}
        Err(other) => panic!("expected ValidationError, got {:?}", other),
        Ok(_) => panic!("expected ValidationError, got Ok"),
    }
}

#[tokio::test]
async fn unknown_appointment_id_is_none_not_error() {
    let service = service().await;
    let token = Some(ADMIN_TOKEN);
    let missing = uuid::Uuid::new_v4();

    assert!(service.get(token, &missing).await.unwrap().is_none());
    assert!(service
        .update(token, &missing, Some(AppointmentStatus::Completed), None)
        .await
        .unwrap()
        .is_none());
}
