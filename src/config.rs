use crate::errors::{AppError, Result};

/// SMTP settings for booking notification emails. Email is optional:
/// when `host` is unset the notification service is a no-op.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_email: String,
    pub notify_email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Ordered provider chain, e.g. ["groq", "openai"]. Providers without a
    /// configured API key are skipped at construction.
    pub providers: Vec<String>,
    pub groq_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_path: String,
    /// Comma-separated CORS allow-list; "*" allows any origin.
    pub cors_origins: Vec<String>,
    /// Static shared secret gating the admin read endpoints.
    pub admin_token: String,
    pub rate_limit_per_sec: u64,
    pub llm: LlmConfig,
    pub alpha_vantage_api_key: Option<String>,
    pub smtp: SmtpConfig,
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Load configuration from the environment. `ADMIN_TOKEN` is the only
    /// hard requirement; everything else has a default or degrades to a
    /// mock/no-op implementation.
    pub fn from_env() -> Result<Self> {
        let admin_token = env_opt("ADMIN_TOKEN")
            .ok_or_else(|| AppError::ConfigError("ADMIN_TOKEN must be set".to_string()))?;

        let port = env_opt("PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);

        let database_path =
            env_opt("DATABASE_PATH").unwrap_or_else(|| "walletwealth.db".to_string());

        let cors_origins = env_opt("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let rate_limit_per_sec = env_opt("RATE_LIMIT_PER_SEC")
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        let providers = env_opt("LLM_PROVIDERS")
            .unwrap_or_else(|| "groq".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let llm = LlmConfig {
            providers,
            groq_api_key: env_opt("GROQ_API_KEY"),
            openai_api_key: env_opt("OPENAI_API_KEY"),
            anthropic_api_key: env_opt("ANTHROPIC_API_KEY"),
            model: env_opt("LLM_MODEL"),
            temperature: env_opt("LLM_TEMPERATURE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.7),
            max_tokens: env_opt("LLM_MAX_TOKENS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1024),
            timeout_secs: env_opt("LLM_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        };

        let smtp = SmtpConfig {
            host: env_opt("SMTP_HOST"),
            port: env_opt("SMTP_PORT").and_then(|v| v.parse().ok()).unwrap_or(587),
            username: env_opt("SMTP_USER"),
            password: env_opt("SMTP_PASSWORD"),
            from_email: env_opt("FROM_EMAIL")
                .unwrap_or_else(|| "noreply@walletwealth.co.in".to_string()),
            notify_email: env_opt("NOTIFY_EMAIL"),
        };

        Ok(Self {
            port,
            database_path,
            cors_origins,
            admin_token,
            rate_limit_per_sec,
            llm,
            alpha_vantage_api_key: env_opt("ALPHA_VANTAGE_API_KEY"),
            smtp,
        })
    }

    pub fn allow_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

impl Default for AppConfig {
    /// Defaults suitable for tests and local development. `from_env` is the
    /// production path; this mirrors its fallback values with no secrets.
    fn default() -> Self {
        Self {
            port: 8080,
            database_path: "walletwealth.db".to_string(),
            cors_origins: vec!["*".to_string()],
            admin_token: "change-me".to_string(),
            rate_limit_per_sec: 5,
            llm: LlmConfig {
                providers: vec!["groq".to_string()],
                groq_api_key: None,
                openai_api_key: None,
                anthropic_api_key: None,
                model: None,
                temperature: 0.7,
                max_tokens: 1024,
                timeout_secs: 30,
            },
            alpha_vantage_api_key: None,
            smtp: SmtpConfig {
                host: None,
                port: 587,
                username: None,
                password: None,
                from_email: "noreply@walletwealth.co.in".to_string(),
                notify_email: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_origin_allows_any() {
        let config = AppConfig::default();
        assert!(config.allow_any_origin());

        let config = AppConfig {
            cors_origins: vec!["https://www.walletwealth.co.in".to_string()],
            ..AppConfig::default()
        };
        assert!(!config.allow_any_origin());
    }
}
