use crate::config::LlmConfig;
use crate::errors::{AppError, Result};
use crate::models::chat::{ChatMessage, ChatRole, SessionHistory, PROMPT_WINDOW};
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

/// Returned verbatim to the user whenever every provider in the chain fails.
pub const APOLOGY: &str = "I apologize, but I encountered an error processing your request. \
Please try again or contact support.";

/// Canned reply when no provider has an API key configured. Keeps the chat
/// widget usable in local development.
const MOCK_RESPONSE: &str = "Thank you for reaching out to Wallet Wealth. Our AI advisor is \
not configured in this environment, but our team would be happy to help - please book a \
consultation through the appointments page or call us at 9940116967.";

fn system_prompt() -> String {
    format!(
        "You are an AI Financial Advisor for Wallet Wealth LLP, a SEBI Registered Investment \
Advisor based in Chennai, India.\n\
\n\
Company: Wallet Wealth LLP - \"The Winners Choice\"\n\
SEBI Registration: INA200015440\n\
CEO: S. Sridharan (20+ years experience, Associate Financial Planner certification)\n\
Contact: 9940116967 | sridharan@walletwealth.co.in\n\
Location: Chennai, Tamil Nadu, India\n\
Services: Mutual Fund Advisory, Portfolio Management, Financial Planning, Tax Planning, \
Retirement Planning, Insurance Planning\n\
\n\
Guidelines:\n\
- Be professional and helpful\n\
- Speak as part of the team (use \"we\", \"our\", \"us\")\n\
- For CEO questions, say \"Our CEO is S. Sridharan...\"\n\
- Never guarantee returns or make unrealistic promises\n\
- Remind users that final investment decisions should be made after consulting a certified \
financial advisor at Wallet Wealth\n\
\n\
Current date: {}",
        chrono::Utc::now().format("%Y-%m-%d")
    )
}

/// One external LLM completion backend. Providers are tried in configured
/// order; the first success wins.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

pub struct GroqProvider {
    client: Client,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl GroqProvider {
    pub fn new(api_key: String, model: Option<String>, temperature: f64, max_tokens: u32) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.unwrap_or_else(|| "llama-3.3-70b-versatile".to_string()),
            temperature,
            max_tokens,
        }
    }
}

#[async_trait]
impl CompletionProvider for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        openai_style_completion(
            &self.client,
            "https://api.groq.com/openai/v1/chat/completions",
            &self.api_key,
            &self.model,
            self.temperature,
            self.max_tokens,
            messages,
        )
        .await
    }
}

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: Option<String>, temperature: f64, max_tokens: u32) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.unwrap_or_else(|| "gpt-4-turbo-preview".to_string()),
            temperature,
            max_tokens,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        openai_style_completion(
            &self.client,
            "https://api.openai.com/v1/chat/completions",
            &self.api_key,
            &self.model,
            self.temperature,
            self.max_tokens,
            messages,
        )
        .await
    }
}

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicProvider {
    pub fn new(api_key: String, model: Option<String>, max_tokens: u32) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.unwrap_or_else(|| "claude-3-sonnet-20240229".to_string()),
            max_tokens,
        }
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        // Anthropic takes the system prompt out of band
        let system = messages
            .iter()
            .find(|m| m.role == ChatRole::System)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let turns: Vec<_> = messages
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .collect();

        let payload = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": system,
            "messages": turns,
        });

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamError(format!(
                "Anthropic returned status {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response.json().await?;
        body["content"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                AppError::UpstreamError("Anthropic response missing completion text".to_string())
            })
    }
}

async fn openai_style_completion(
    client: &Client,
    url: &str,
    api_key: &str,
    model: &str,
    temperature: f64,
    max_tokens: u32,
    messages: &[ChatMessage],
) -> Result<String> {
    let payload = json!({
        "model": model,
        "messages": messages,
        "temperature": temperature,
        "max_tokens": max_tokens,
    });

    let response = client
        .post(url)
        .header("Authorization", format!("Bearer {}", api_key))
        .json(&payload)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(AppError::UpstreamError(format!(
            "Provider returned status {}",
            response.status()
        )));
    }

    let body: serde_json::Value = response.json().await?;
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| {
            AppError::UpstreamError("Provider response missing completion text".to_string())
        })
}

#[derive(Debug, Clone)]
pub struct AdvisorReply {
    pub response: String,
    pub provider: String,
}

/// Proxies chat turns to the configured provider chain and keeps a bounded
/// per-session history in memory. No conversation state survives a restart.
pub struct AdvisorService {
    providers: Vec<Box<dyn CompletionProvider>>,
    histories: DashMap<String, SessionHistory>,
    timeout: Duration,
}

impl AdvisorService {
    pub fn new(config: &LlmConfig) -> Self {
        let mut providers: Vec<Box<dyn CompletionProvider>> = Vec::new();
        for name in &config.providers {
            match name.as_str() {
                "groq" => {
                    if let Some(key) = config.groq_api_key.clone() {
                        providers.push(Box::new(GroqProvider::new(
                            key,
                            config.model.clone(),
                            config.temperature,
                            config.max_tokens,
                        )));
                    }
                }
                "openai" => {
                    if let Some(key) = config.openai_api_key.clone() {
                        providers.push(Box::new(OpenAiProvider::new(
                            key,
                            config.model.clone(),
                            config.temperature,
                            config.max_tokens,
                        )));
                    }
                }
                "anthropic" => {
                    if let Some(key) = config.anthropic_api_key.clone() {
                        providers.push(Box::new(AnthropicProvider::new(
                            key,
                            config.model.clone(),
                            config.max_tokens,
                        )));
                    }
                }
                other => {
                    tracing::warn!(provider = %other, "unknown LLM provider in chain, skipping");
                }
            }
        }

        if providers.is_empty() {
            tracing::warn!("no LLM provider configured - chat will return mock responses");
        }

        Self {
            providers,
            histories: DashMap::new(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Constructor for tests and custom chains.
    pub fn with_providers(providers: Vec<Box<dyn CompletionProvider>>, timeout: Duration) -> Self {
        Self {
            providers,
            histories: DashMap::new(),
            timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.providers.is_empty()
    }

    /// Run one chat turn. Provider failures never surface as errors: the
    /// caller always gets a reply, with the fixed apology once the whole
    /// chain is exhausted.
    pub async fn respond(&self, session_id: &str, message: &str) -> AdvisorReply {
        if self.providers.is_empty() {
            self.remember(session_id, message, MOCK_RESPONSE);
            return AdvisorReply {
                response: MOCK_RESPONSE.to_string(),
                provider: "mock".to_string(),
            };
        }

        let mut messages = vec![ChatMessage::system(system_prompt())];
        if let Some(history) = self.histories.get(session_id) {
            // Only the recent window goes upstream; the full history stays local
            messages.extend_from_slice(history.recent(PROMPT_WINDOW));
        }
        messages.push(ChatMessage::user(message));

        for provider in &self.providers {
            match tokio::time::timeout(self.timeout, provider.complete(&messages)).await {
                Ok(Ok(response)) => {
                    self.remember(session_id, message, &response);
                    tracing::info!(provider = %provider.name(), session_id = %session_id, "chat turn completed");
                    return AdvisorReply {
                        response,
                        provider: provider.name().to_string(),
                    };
                }
                Ok(Err(e)) => {
                    tracing::warn!(provider = %provider.name(), error = %e, "provider failed, trying next");
                }
                Err(_) => {
                    tracing::warn!(provider = %provider.name(), timeout_secs = self.timeout.as_secs(), "provider timed out, trying next");
                }
            }
        }

        tracing::error!(session_id = %session_id, "all LLM providers failed");
        AdvisorReply {
            response: APOLOGY.to_string(),
            provider: "error".to_string(),
        }
    }

    fn remember(&self, session_id: &str, user: &str, assistant: &str) {
        self.histories
            .entry(session_id.to_string())
            .or_default()
            .push_exchange(ChatMessage::user(user), ChatMessage::assistant(assistant));
    }

    /// Number of messages currently remembered for a session.
    pub fn history_len(&self, session_id: &str) -> usize {
        self.histories
            .get(session_id)
            .map(|h| h.messages().len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticProvider {
        name: &'static str,
        reply: &'static str,
    }

    #[async_trait]
    impl CompletionProvider for StaticProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
            Ok(self.reply.to_string())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl CompletionProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
            Err(AppError::UpstreamError("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn first_healthy_provider_wins() {
        let service = AdvisorService::with_providers(
            vec![
                Box::new(FailingProvider),
                Box::new(StaticProvider {
                    name: "backup",
                    reply: "hello from backup",
                }),
            ],
            Duration::from_secs(5),
        );

        let reply = service.respond("s1", "hello").await;
        assert_eq!(reply.response, "hello from backup");
        assert_eq!(reply.provider, "backup");
    }

    #[tokio::test]
    async fn exhausted_chain_returns_apology() {
        let service = AdvisorService::with_providers(
            vec![Box::new(FailingProvider), Box::new(FailingProvider)],
            Duration::from_secs(5),
        );

        let reply = service.respond("s1", "hello").await;
        assert_eq!(reply.response, APOLOGY);
        assert_eq!(reply.provider, "error");
        // Failed turns are not remembered
        assert_eq!(service.history_len("s1"), 0);
    }

    #[tokio::test]
    async fn successful_turns_accumulate_history() {
        let service = AdvisorService::with_providers(
            vec![Box::new(StaticProvider {
                name: "stub",
                reply: "ok",
            })],
            Duration::from_secs(5),
        );

        service.respond("s1", "first").await;
        service.respond("s1", "second").await;
        assert_eq!(service.history_len("s1"), 4);
        // Sessions are isolated
        assert_eq!(service.history_len("s2"), 0);
    }

    struct SlowProvider;

    #[async_trait]
    impl CompletionProvider for SlowProvider {
        fn name(&self) -> &str {
            "slow"
        }

        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("too late".to_string())
        }
    }

    #[tokio::test]
    async fn timed_out_provider_falls_through() {
        let service = AdvisorService::with_providers(
            vec![
                Box::new(SlowProvider),
                Box::new(StaticProvider {
                    name: "fast",
                    reply: "quick answer",
                }),
            ],
            Duration::from_millis(50),
        );

        let reply = service.respond("s1", "hello").await;
        assert_eq!(reply.response, "quick answer");
        assert_eq!(reply.provider, "fast");
    }

    #[tokio::test]
    async fn unconfigured_service_returns_mock() {
        let service = AdvisorService::with_providers(vec![], Duration::from_secs(5));
        assert!(!service.is_configured());

        let reply = service.respond("s1", "hello").await;
        assert_eq!(reply.provider, "mock");
        assert!(!reply.response.is_empty());
    }
}
