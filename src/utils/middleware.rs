use axum::extract::{ConnectInfo, Request};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

/// Fixed-window per-IP request counter.
#[derive(Debug)]
pub struct RateLimiter {
    requests_per_sec: u64,
    window: Duration,
    entries: DashMap<String, (u64, Instant)>,
}

impl RateLimiter {
    pub fn new(requests_per_sec: u64) -> Self {
        Self {
            requests_per_sec,
            window: Duration::from_secs(1),
            entries: DashMap::new(),
        }
    }

    pub fn check_rate_limit(&self, key: &str) -> bool {
        let now = Instant::now();
        // Drop closed windows so the map only holds currently active clients
        self.entries
            .retain(|_, (_, started)| now.duration_since(*started) <= self.window);

        let mut entry = self.entries.entry(key.to_string()).or_insert((0, now));

        if now.duration_since(entry.1) > self.window {
            *entry = (1, now);
        } else {
            entry.0 += 1;
        }

        entry.0 <= self.requests_per_sec
    }
}

pub async fn rate_limit_middleware(
    axum::Extension(limiter): axum::Extension<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if !limiter.check_rate_limit(&ip) {
        tracing::warn!(ip = %ip, "rate limit exceeded");
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    Ok(next.run(request).await)
}

/// Tags every request with a uuid and wraps it in a tracing span.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    req.extensions_mut().insert(request_id.clone());
    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        uri = %req.uri()
    );
    next.run(req).instrument(span).await
}
