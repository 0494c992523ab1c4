use crate::config::SmtpConfig;
use crate::errors::{AppError, Result};
use crate::models::appointment::Appointment;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

/// Sends booking emails over SMTP. Entirely optional: without an SMTP host
/// every send is a no-op, and callers treat failures as warnings (a broken
/// mail relay must never fail a booking).
pub struct NotificationService {
    smtp: SmtpConfig,
}

impl NotificationService {
    pub fn new(smtp: SmtpConfig) -> Self {
        Self { smtp }
    }

    pub async fn send_booking_confirmation(&self, appointment: &Appointment) -> Result<()> {
        let Some(host) = self.smtp.host.clone() else {
            tracing::debug!("SMTP not configured, skipping booking emails");
            return Ok(());
        };

        let subject = "Your Wallet Wealth consultation request".to_string();
        let body = format!(
            "Dear {},\n\nThank you for booking a {} consultation with Wallet Wealth. \
We have received your request for {} at {} and will contact you at {} to confirm.\n\n\
Warm regards,\nWallet Wealth LLP",
            appointment.name,
            appointment.service_type,
            appointment.preferred_date,
            appointment.preferred_time,
            appointment.phone
        );
        self.send_email(&host, &appointment.email, &subject, &body)?;

        if let Some(notify_email) = self.smtp.notify_email.clone() {
            let subject = format!("New appointment request: {}", appointment.name);
            let body = format!(
                "New booking received.\n\nName: {}\nEmail: {}\nPhone: {}\nService: {}\n\
Date: {} {}\nMessage: {}\nId: {}",
                appointment.name,
                appointment.email,
                appointment.phone,
                appointment.service_type,
                appointment.preferred_date,
                appointment.preferred_time,
                appointment.message.as_deref().unwrap_or("-"),
                appointment.id
            );
            self.send_email(&host, &notify_email, &subject, &body)?;
        }

        Ok(())
    }

    fn send_email(&self, host: &str, to_email: &str, subject: &str, body: &str) -> Result<()> {
        let email = Message::builder()
            .from(
                self.smtp
                    .from_email
                    .parse()
                    .map_err(|e| AppError::UpstreamError(format!("From parse error: {}", e)))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| AppError::UpstreamError(format!("To parse error: {}", e)))?)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| AppError::UpstreamError(format!("Message build error: {}", e)))?;

        let mut mailer = SmtpTransport::starttls_relay(host)
            .map_err(|e| AppError::UpstreamError(format!("SMTP relay error: {}", e)))?
            .port(self.smtp.port);

        if let (Some(user), Some(pass)) = (self.smtp.username.clone(), self.smtp.password.clone()) {
            mailer = mailer.credentials(Credentials::new(user, pass));
        }

        mailer
            .build()
            .send(&email)
            .map_err(|e| AppError::UpstreamError(format!("Send error: {}", e)))?;

        tracing::info!(to = %to_email, "notification email sent");
        Ok(())
    }
}
