use crate::errors::{AppError, Result};
use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 \-]*$").unwrap());

pub struct Validator;

impl Validator {
    pub fn validate_name(name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::ValidationError("Name is required".to_string()));
        }
        if name.len() > 255 {
            return Err(AppError::ValidationError(
                "Name must be less than 255 characters".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_email(email: &str) -> Result<()> {
        if !EMAIL_REGEX.is_match(email) {
            return Err(AppError::ValidationError("Invalid email format".to_string()));
        }

        if email.len() > 254 {
            return Err(AppError::ValidationError("Email too long".to_string()));
        }

        Ok(())
    }

    pub fn validate_phone(phone: &str) -> Result<()> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(AppError::ValidationError(
                "Phone number is required".to_string(),
            ));
        }
        if phone.len() > 20 {
            return Err(AppError::ValidationError(
                "Phone number must be less than 20 characters".to_string(),
            ));
        }
        if !PHONE_REGEX.is_match(phone) {
            return Err(AppError::ValidationError(
                "Invalid phone number format. Use digits, spaces or dashes, optionally prefixed with +.".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_service_type(service_type: &str) -> Result<()> {
        let service_type = service_type.trim();
        if service_type.is_empty() {
            return Err(AppError::ValidationError(
                "Service type is required".to_string(),
            ));
        }
        if service_type.len() > 100 {
            return Err(AppError::ValidationError(
                "Service type must be less than 100 characters".to_string(),
            ));
        }
        Ok(())
    }

    /// Booking dates come in as YYYY-MM-DD; dates before today (UTC) are
    /// rejected.
    pub fn validate_preferred_date(date: &str) -> Result<()> {
        let parsed = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| {
            AppError::ValidationError(
                "Invalid preferred date. Expected format: YYYY-MM-DD".to_string(),
            )
        })?;

        if parsed < Utc::now().date_naive() {
            return Err(AppError::ValidationError(
                "Preferred date cannot be in the past".to_string(),
            ));
        }

        Ok(())
    }

    pub fn validate_preferred_time(time: &str) -> Result<()> {
        let time = time.trim();
        if time.is_empty() {
            return Err(AppError::ValidationError(
                "Preferred time is required".to_string(),
            ));
        }
        if time.len() > 20 {
            return Err(AppError::ValidationError(
                "Preferred time must be less than 20 characters".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_chat_message(message: &str) -> Result<()> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::ValidationError(
                "Message cannot be empty".to_string(),
            ));
        }
        if message.len() > 5000 {
            return Err(AppError::ValidationError(
                "Message must be less than 5000 characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn accepts_valid_email() {
        assert!(Validator::validate_email("a@x.com").is_ok());
        assert!(Validator::validate_email("sridharan@walletwealth.co.in").is_ok());
    }

    #[test]
    fn rejects_malformed_email() {
        assert!(Validator::validate_email("not-an-email").is_err());
        assert!(Validator::validate_email("a@b").is_err());
    }

    #[test]
    fn rejects_past_dates() {
        let yesterday = (Utc::now().date_naive() - Duration::days(1))
            .format("%Y-%m-%d")
            .to_string();
        assert!(Validator::validate_preferred_date(&yesterday).is_err());
    }

    #[test]
    fn accepts_today_and_future_dates() {
        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        assert!(Validator::validate_preferred_date(&today).is_ok());
        assert!(Validator::validate_preferred_date("2099-01-01").is_ok());
    }

    #[test]
    fn rejects_garbage_dates() {
        assert!(Validator::validate_preferred_date("tomorrow").is_err());
        assert!(Validator::validate_preferred_date("01/01/2099").is_err());
    }

    #[test]
    fn phone_bounds() {
        assert!(Validator::validate_phone("9940116967").is_ok());
        assert!(Validator::validate_phone("+91 99401 16967").is_ok());
        // Short numbers are accepted; the booking form only promises presence
        assert!(Validator::validate_phone("123").is_ok());
        assert!(Validator::validate_phone("").is_err());
        assert!(Validator::validate_phone("abcdefghij").is_err());
    }

    #[test]
    fn chat_message_bounds() {
        assert!(Validator::validate_chat_message("hello").is_ok());
        assert!(Validator::validate_chat_message("   ").is_err());
        assert!(Validator::validate_chat_message(&"x".repeat(5001)).is_err());
    }
}
