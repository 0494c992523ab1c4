use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use walletwealth_backend::errors::{AppError, Result};
use walletwealth_backend::models::chat::{ChatMessage, ChatRole, HISTORY_LIMIT, PROMPT_WINDOW};
use walletwealth_backend::services::advisor::{
    AdvisorService, CompletionProvider, APOLOGY,
};

/// Records every prompt it receives so tests can inspect what the service
/// actually sends upstream.
struct RecordingProvider {
    calls: Arc<AtomicUsize>,
    seen: Arc<std::sync::Mutex<Vec<Vec<ChatMessage>>>>,
}

impl RecordingProvider {
    fn new() -> (Self, Arc<AtomicUsize>, Arc<std::sync::Mutex<Vec<Vec<ChatMessage>>>>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        (
            Self {
                calls: calls.clone(),
                seen: seen.clone(),
            },
            calls,
            seen,
        )
    }
}

#[async_trait]
impl CompletionProvider for RecordingProvider {
    fn name(&self) -> &str {
        "recording"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(messages.to_vec());
        Ok("recorded reply".to_string())
    }
}

struct FailingProvider;

#[async_trait]
impl CompletionProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        Err(AppError::UpstreamError("upstream unavailable".to_string()))
    }
}

#[tokio::test]
async fn prompt_carries_system_context_and_history() {
    let (provider, calls, seen) = RecordingProvider::new();
    let service = AdvisorService::with_providers(vec![Box::new(provider)], Duration::from_secs(5));

    service.respond("session-a", "What services do you offer?").await;
    service.respond("session-a", "And who is your CEO?").await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let prompts = seen.lock().unwrap();

    // First turn: system prompt + the user message
    assert_eq!(prompts[0].len(), 2);
    assert_eq!(prompts[0][0].role, ChatRole::System);
    assert!(prompts[0][0].content.contains("Wallet Wealth LLP"));
    assert_eq!(prompts[0][1].role, ChatRole::User);

    // Second turn: system prompt + remembered exchange + new message
    assert_eq!(prompts[1].len(), 4);
    assert_eq!(prompts[1][1].content, "What services do you offer?");
    assert_eq!(prompts[1][2].content, "recorded reply");
    assert_eq!(prompts[1][3].content, "And who is your CEO?");
}

#[tokio::test]
async fn sessions_do_not_share_history() {
    let (provider, _, seen) = RecordingProvider::new();
    let service = AdvisorService::with_providers(vec![Box::new(provider)], Duration::from_secs(5));

    service.respond("session-a", "first question").await;
    service.respond("session-b", "unrelated question").await;

    let prompts = seen.lock().unwrap();
    // session-b starts fresh: system prompt + its own message only
    assert_eq!(prompts[1].len(), 2);
    assert_eq!(prompts[1][1].content, "unrelated question");
}

#[tokio::test]
async fn history_stays_within_the_context_window() {
    let (provider, _, _) = RecordingProvider::new();
    let service = AdvisorService::with_providers(vec![Box::new(provider)], Duration::from_secs(5));

    for i in 0..(HISTORY_LIMIT) {
        service.respond("session-a", &format!("question {}", i)).await;
    }
    assert_eq!(service.history_len("session-a"), HISTORY_LIMIT);
}

#[tokio::test]
async fn long_sessions_forward_only_the_recent_window() {
    let (provider, _, seen) = RecordingProvider::new();
    let service = AdvisorService::with_providers(vec![Box::new(provider)], Duration::from_secs(5));

    for i in 0..15 {
        service.respond("session-a", &format!("question {}", i)).await;
    }

    let prompts = seen.lock().unwrap();
    let last = prompts.last().unwrap();

    // System prompt + the 20 most recent history entries + the new message
    assert_eq!(last.len(), 1 + PROMPT_WINDOW + 1);
    assert_eq!(last[0].role, ChatRole::System);
    // 28 entries were remembered before this turn; the oldest forwarded one
    // is question 4
    assert_eq!(last[1].content, "question 4");
    assert_eq!(last.last().unwrap().content, "question 14");
}

#[tokio::test]
async fn exhausted_chain_yields_apology_and_no_memory() {
    let service = AdvisorService::with_providers(
        vec![Box::new(FailingProvider), Box::new(FailingProvider)],
        Duration::from_secs(5),
    );

    let reply = service.respond("session-a", "hello").await;
    assert_eq!(reply.response, APOLOGY);
    assert_eq!(reply.provider, "error");
    assert_eq!(service.history_len("session-a"), 0);

    // A later successful turn is unaffected by the earlier failure
    let (provider, _, seen) = RecordingProvider::new();
    let service = AdvisorService::with_providers(
        vec![Box::new(FailingProvider), Box::new(provider)],
        Duration::from_secs(5),
    );
    let reply = service.respond("session-a", "hello again").await;
    assert_eq!(reply.provider, "recording");
    let prompts = seen.lock().unwrap();
    assert_eq!(prompts[0].len(), 2);
}
